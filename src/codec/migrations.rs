//! Post-parse migrations. The decoder reads every supported version into the
//! same model; each migration then lifts one old-format quirk to the current
//! semantics. Migrations run in table order against the stored version.

use std::rc::Rc;

use crate::codec::decoder::DecodeAux;
use crate::codec::{
    VERSION_WITH_INCLUDE_FILE_KIND, VERSION_WITH_INVERTED_SERIALIZATION, VERSION_WITH_MAKE_MACRO,
    VERSION_WITH_STABLE_ENCODING,
};
use crate::config::options::StringConfiguration;
use crate::config::tools::CompilerConfiguration;
use crate::config::ConfigurationDescriptor;

pub struct Migration {
    pub name: &'static str,
    /// The migration applies to documents stored below this version.
    pub applies_below: i32,
    pub apply: fn(&mut ConfigurationDescriptor, &DecodeAux),
}

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        name: "rewrite-make-commands",
        applies_below: VERSION_WITH_MAKE_MACRO,
        apply: rewrite_make_commands,
    },
    Migration {
        name: "reclassify-include-files",
        applies_below: VERSION_WITH_INCLUDE_FILE_KIND,
        apply: reclassify_include_files,
    },
];

/// Runs every applicable migration, then reconciles items absent from each
/// configuration with the serialization scheme of the stored version.
pub fn run(descriptor: &mut ConfigurationDescriptor, aux: &DecodeAux) {
    for migration in MIGRATIONS {
        if aux.stored_version < migration.applies_below {
            log::debug!(
                "Applying migration {} to version {} document",
                migration.name,
                aux.stored_version
            );
            (migration.apply)(descriptor, aux);
        }
    }
    fill_absent_items(descriptor, aux);
    if aux.stored_version < VERSION_WITH_STABLE_ENCODING {
        log::warn!(
            "Project was written by an older release (version {}); it will be upgraded to \
             version {} on the next save",
            aux.stored_version,
            crate::codec::CURRENT_VERSION
        );
        descriptor.modified = true;
    }
}

/// Old writers stored plain `make` invocations; the generated makefiles now
/// synthesize a ${MAKE} macro and commands must go through it.
fn rewrite_make_commands(descriptor: &mut ConfigurationDescriptor, _aux: &DecodeAux) {
    fn rewrite(command: &mut StringConfiguration) {
        let value = command.value();
        if value == "make" {
            command.set_value("${MAKE}");
        } else if let Some(rest) = value.strip_prefix("make ") {
            let rewritten = format!("${{MAKE}} {}", rest);
            command.set_value(&rewritten);
        }
    }
    fn rewrite_raw(command: &mut String) {
        if command == "make" {
            *command = "${MAKE}".to_string();
        } else if let Some(rest) = command.strip_prefix("make ") {
            *command = format!("${{MAKE}} {}", rest);
        }
    }
    for conf in &mut descriptor.confs {
        rewrite(&mut conf.makefile.build_command);
        rewrite(&mut conf.makefile.clean_command);
        for artifact in &mut conf.required_projects {
            rewrite_raw(&mut artifact.build_command);
            rewrite_raw(&mut artifact.clean_command);
        }
    }
}

/// Header files used to be stored in the include-directory list. Move any
/// entry that looks like a header over to the include-file list.
fn reclassify_include_files(descriptor: &mut ConfigurationDescriptor, _aux: &DecodeAux) {
    fn is_header(path: &str) -> bool {
        [".h", ".hpp", ".hxx", ".hh"]
            .iter()
            .any(|suffix| path.ends_with(suffix))
    }
    fn reclassify(compiler: &mut CompilerConfiguration) {
        let headers = compiler.include_directories.remove_if(is_header);
        for header in headers {
            compiler.include_files.add(&header);
        }
    }
    for conf in &mut descriptor.confs {
        reclassify(&mut conf.c_compiler);
        reclassify(&mut conf.cpp_compiler);
        for item in conf.item_configurations.values_mut() {
            if let Some(compiler) = item.c.as_mut() {
                reclassify(compiler);
            }
            if let Some(compiler) = item.cpp.as_mut() {
                reclassify(compiler);
            }
        }
        for folder in conf.folder_configurations.values_mut() {
            if let Some(compiler) = folder.c.as_mut() {
                reclassify(compiler);
            }
            if let Some(compiler) = folder.cpp.as_mut() {
                reclassify(compiler);
            }
        }
    }
}

/// The meaning of an item missing from a configuration flipped at version
/// 88: before, absent meant included; since, absent means excluded. This
/// runs for every load so both schemes land on explicit exclusion state.
fn fill_absent_items(descriptor: &mut ConfigurationDescriptor, aux: &DecodeAux) {
    let inverted = aux.stored_version >= VERSION_WITH_INVERTED_SERIALIZATION;
    let items = descriptor.sorted_items();
    for conf in &mut descriptor.confs {
        let touched = aux.touched_items.get(&conf.name);
        for path in &items {
            let seen = touched.map_or(false, |t| t.contains(path));
            if !seen && inverted {
                conf.item_configuration_mut(Rc::clone(path))
                    .excluded
                    .set_value(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use crate::config::{ConfigurationType, MakeConfiguration};

    fn descriptor_with_items(items: &[&str]) -> ConfigurationDescriptor {
        let mut descriptor = ConfigurationDescriptor::new(Path::new("/tmp/p"));
        for item in items {
            descriptor.logical_folders.add_item(Rc::from(*item));
        }
        descriptor
            .confs
            .push(MakeConfiguration::new("Debug", ConfigurationType::Application));
        descriptor
    }

    fn aux(version: i32, touched: &[&str]) -> DecodeAux {
        let mut touched_items = HashMap::new();
        touched_items.insert(
            "Debug".to_string(),
            touched.iter().map(|t| Rc::from(*t)).collect::<HashSet<Rc<str>>>(),
        );
        DecodeAux {
            stored_version: version,
            touched_items,
        }
    }

    #[test]
    fn absent_item_is_excluded_since_inverted_serialization() {
        let mut descriptor = descriptor_with_items(&["a.c", "b.c"]);
        run(&mut descriptor, &aux(100, &["a.c"]));
        assert!(!descriptor.confs[0].is_item_excluded("a.c"));
        assert!(descriptor.confs[0].is_item_excluded("b.c"));
    }

    #[test]
    fn absent_item_is_included_before_inverted_serialization() {
        let mut descriptor = descriptor_with_items(&["a.c", "b.c"]);
        run(&mut descriptor, &aux(87, &["a.c"]));
        assert!(!descriptor.confs[0].is_item_excluded("a.c"));
        assert!(!descriptor.confs[0].is_item_excluded("b.c"));
    }

    #[test]
    fn old_make_commands_are_rewritten_to_the_macro() {
        let mut descriptor = descriptor_with_items(&[]);
        descriptor.confs[0]
            .makefile
            .build_command
            .set_value("make -f Makefile.custom all");
        run(&mut descriptor, &aux(75, &[]));
        assert_eq!(
            descriptor.confs[0].makefile.build_command.value(),
            "${MAKE} -f Makefile.custom all"
        );
        // Version 76 and later commands pass through untouched.
        let mut recent = descriptor_with_items(&[]);
        recent.confs[0]
            .makefile
            .build_command
            .set_value("make -f Makefile.custom all");
        run(&mut recent, &aux(90, &[]));
        assert_eq!(
            recent.confs[0].makefile.build_command.value(),
            "make -f Makefile.custom all"
        );
    }

    #[test]
    fn headers_move_from_directories_to_include_files() {
        let mut descriptor = descriptor_with_items(&[]);
        descriptor.confs[0].c_compiler.include_directories.add("src");
        descriptor.confs[0]
            .c_compiler
            .include_directories
            .add("config.h");
        run(&mut descriptor, &aux(92, &[]));
        assert_eq!(
            descriptor.confs[0].c_compiler.include_directories.value(),
            &["src"]
        );
        assert_eq!(
            descriptor.confs[0].c_compiler.include_files.value(),
            &["config.h"]
        );
    }

    #[test]
    fn old_documents_are_marked_for_rewrite() {
        let mut descriptor = descriptor_with_items(&[]);
        run(&mut descriptor, &aux(94, &[]));
        assert!(descriptor.modified);

        let mut recent = descriptor_with_items(&[]);
        run(&mut recent, &aux(100, &[]));
        assert!(!recent.modified);
    }
}
