//! Encoder for the two configuration streams. The shared stream carries
//! everything meant for version control; the private stream carries the
//! local state (active configuration, disk layout). Output is always the
//! current format version and only modified settings are written, so the
//! files stay small and diff friendly.

use std::collections::BTreeMap;

use crate::codec::elements::*;
use crate::codec::writer::XmlWriter;
use crate::codec::CURRENT_VERSION;
use crate::config::artifacts::{LibraryItem, MakeArtifact};
use crate::config::items::{Folder, FolderKind, ItemTool};
use crate::config::tools::{ArchiverConfiguration, CompilerConfiguration, LinkerConfiguration};
use crate::config::{ConfigurationDescriptor, MakeConfiguration};

/// Serializes the stream shared through version control.
pub fn encode_public(descriptor: &ConfigurationDescriptor) -> String {
    let mut w = XmlWriter::new();
    w.start(CONFIGURATION_DESCRIPTOR_ELEMENT);
    w.attribute(VERSION_ATTR, &CURRENT_VERSION.to_string());

    encode_logical_folder(&mut w, &descriptor.logical_folders, true);
    if !descriptor.source_roots.is_empty() {
        encode_path_list(&mut w, SOURCE_ROOT_LIST_ELEMENT, &descriptor.source_roots);
    }
    if !descriptor.test_roots.is_empty() {
        encode_path_list(&mut w, TEST_ROOT_LIST_ELEMENT, &descriptor.test_roots);
    }
    w.text_element(PROJECT_MAKEFILE_ELEMENT, &descriptor.project_makefile_name);

    w.start(CONFS_ELEMENT);
    for conf in &descriptor.confs {
        encode_conf(&mut w, descriptor, conf);
    }
    w.end();

    w.end();
    w.finish()
}

/// Serializes the local-only stream.
pub fn encode_private(descriptor: &ConfigurationDescriptor) -> String {
    let mut w = XmlWriter::new();
    w.start(CONFIGURATION_DESCRIPTOR_ELEMENT);
    w.attribute(VERSION_ATTR, &CURRENT_VERSION.to_string());
    w.text_element(
        DEFAULT_CONF_ELEMENT,
        &descriptor.active.unwrap_or(0).to_string(),
    );
    if let Some(disk) = &descriptor.disk_folders {
        encode_disk_folder(&mut w, disk);
    }
    w.end();
    w.finish()
}

fn encode_logical_folder(w: &mut XmlWriter, folder: &Folder, is_root: bool) {
    w.start(LOGICAL_FOLDER_ELEMENT);
    w.attribute(NAME_ATTR, &folder.name);
    w.attribute(DISPLAY_NAME_ATTR, &folder.display_name);
    w.attribute(PROJECT_FILES_ATTR, TRUE_VALUE);
    let kind = if is_root {
        FOLDER_KIND_ROOT
    } else if folder.kind == FolderKind::TestLogicalFolder {
        FOLDER_KIND_TEST
    } else {
        FOLDER_KIND_SOURCE
    };
    w.attribute(KIND_ATTR, kind);
    if let Some(root) = &folder.root {
        w.attribute(ROOT_ATTR, root);
    }
    for nested in &folder.folders {
        encode_logical_folder(w, nested, false);
    }
    for item in &folder.items {
        w.text_element(ITEM_PATH_ELEMENT, item);
    }
    w.end();
}

fn encode_disk_folder(w: &mut XmlWriter, folder: &Folder) {
    w.start(DISK_FOLDER_ELEMENT);
    if let Some(root) = &folder.root {
        w.attribute(ROOT_ATTR, root);
    }
    w.attribute(NAME_ATTR, &folder.name);
    for nested in &folder.folders {
        encode_disk_folder(w, nested);
    }
    for item in &folder.items {
        w.text_element(DISK_FILE_ELEMENT, item);
    }
    w.end();
}

fn encode_path_list(w: &mut XmlWriter, element: &str, paths: &[String]) {
    w.start(element);
    for path in paths {
        w.text_element(LIST_ELEMENT, path);
    }
    w.end();
}

/// The deduplicated flags strings of one configuration, indexed by their
/// dictionary id. Sorted so ids are stable across saves.
fn build_flags_dictionary(conf: &MakeConfiguration) -> BTreeMap<String, i32> {
    let mut strings: Vec<String> = Vec::new();
    let mut push = |compiler: &CompilerConfiguration| {
        if compiler.important_flags.modified() {
            strings.push(compiler.important_flags.value().to_string());
        }
    };
    push(&conf.c_compiler);
    push(&conf.cpp_compiler);
    push(&conf.fortran_compiler);
    push(&conf.assembler);
    for item in conf.item_configurations.values() {
        for compiler in [&item.c, &item.cpp, &item.fortran, &item.assembler]
            .iter()
            .filter_map(|c| c.as_ref())
        {
            push(compiler);
        }
    }
    for folder in conf.folder_configurations.values() {
        for compiler in [&folder.c, &folder.cpp].iter().filter_map(|c| c.as_ref()) {
            push(compiler);
        }
    }
    strings.sort();
    strings.dedup();
    strings
        .into_iter()
        .enumerate()
        .map(|(id, flags)| (flags, id as i32))
        .collect()
}

fn encode_conf(w: &mut XmlWriter, descriptor: &ConfigurationDescriptor, conf: &MakeConfiguration) {
    let dictionary = build_flags_dictionary(conf);

    w.start(CONF_ELEMENT);
    w.attribute(NAME_ATTR, &conf.name);
    w.attribute(TYPE_ATTR, &conf.configuration_type.ordinal().to_string());

    w.start(TOOLS_SET_ELEMENT);
    w.text_element(COMPILER_SET_ELEMENT, conf.compiler_set.value());
    if conf.dependency_checking.modified() {
        w.bool_element(DEPENDENCY_CHECKING_ELEMENT, conf.dependency_checking.value());
    }
    if conf.rebuild_prop_changed.modified() {
        w.bool_element(REBUILD_PROP_CHANGED_ELEMENT, conf.rebuild_prop_changed.value());
    }
    if conf.c_required.modified() {
        w.bool_element(C_REQUIRED_ELEMENT, conf.c_required.value());
    }
    if conf.cpp_required.modified() {
        w.bool_element(CPP_REQUIRED_ELEMENT, conf.cpp_required.value());
    }
    if conf.fortran_required.modified() {
        w.bool_element(FORTRAN_REQUIRED_ELEMENT, conf.fortran_required.value());
    }
    if conf.assembler_required.modified() {
        w.bool_element(ASSEMBLER_REQUIRED_ELEMENT, conf.assembler_required.value());
    }
    w.end();

    if conf.configuration_type.is_makefile_driven() {
        w.start(MAKEFILE_TYPE_ELEMENT);
        w.start(MAKETOOL_ELEMENT);
        w.text_element(
            BUILD_COMMAND_WORKING_DIR_ELEMENT,
            conf.makefile.working_directory.value(),
        );
        w.text_element(BUILD_COMMAND_ELEMENT, conf.makefile.build_command.value());
        w.text_element(CLEAN_COMMAND_ELEMENT, conf.makefile.clean_command.value());
        w.text_element(EXECUTABLE_PATH_ELEMENT, conf.makefile.executable_path.value());
        w.end();
        w.end();
    } else {
        w.start(COMPILE_TYPE_ELEMENT);
        encode_compiler_tool(w, C_COMPILER_TOOL_ELEMENT, &conf.c_compiler, &dictionary);
        encode_compiler_tool(w, CPP_COMPILER_TOOL_ELEMENT, &conf.cpp_compiler, &dictionary);
        encode_compiler_tool(
            w,
            FORTRAN_COMPILER_TOOL_ELEMENT,
            &conf.fortran_compiler,
            &dictionary,
        );
        encode_compiler_tool(w, ASSEMBLER_TOOL_ELEMENT, &conf.assembler, &dictionary);
        if conf.configuration_type.is_archive() {
            encode_archiver(w, &conf.archiver);
        } else {
            encode_linker(w, &conf.linker);
        }
        if !conf.required_projects.is_empty() {
            w.start(REQUIRED_PROJECTS_ELEMENT);
            for artifact in &conf.required_projects {
                encode_artifact(w, artifact);
            }
            w.end();
        }
        w.end();
    }

    if conf.configuration_type.is_qt() {
        w.start(QT_ELEMENT);
        w.text_element(QT_DESTDIR_ELEMENT, conf.qt.destdir.value());
        w.text_element(QT_TARGET_ELEMENT, conf.qt.target.value());
        w.text_element(QT_VERSION_ELEMENT, conf.qt.version.value());
        w.text_element(QT_BUILD_MODE_ELEMENT, &conf.qt.build_mode.value().to_string());
        w.text_element(QT_SPEC_ELEMENT, conf.qt.qmake_spec.value());
        if !conf.qt.custom_defs.is_empty() {
            w.start(QT_DEFS_LIST_ELEMENT);
            for def in conf.qt.custom_defs.value() {
                w.text_element(LIST_ELEMENT, def);
            }
            w.end();
        }
        w.end();
    }

    for (path, folder) in &conf.folder_configurations {
        if folder.is_default() {
            continue;
        }
        w.start(FOLDER_ELEMENT);
        w.attribute(PATH_ATTR, path);
        if let Some(compiler) = &folder.c {
            encode_compiler_tool(w, C_COMPILER_TOOL_ELEMENT, compiler, &dictionary);
        }
        if let Some(compiler) = &folder.cpp {
            encode_compiler_tool(w, CPP_COMPILER_TOOL_ELEMENT, compiler, &dictionary);
        }
        w.end();
    }

    // Since the inverted serialization scheme, only included items are
    // written; an item missing from the stream is excluded.
    for path in descriptor.sorted_items() {
        let item = conf.item_configurations.get(&path);
        if item.map_or(false, |i| i.excluded.value()) {
            continue;
        }
        w.start(ITEM_ELEMENT);
        w.attribute(PATH_ATTR, &path);
        w.attribute(EXCLUDED_ATTR, FALSE_VALUE);
        let tool = item
            .and_then(|i| i.tool)
            .or_else(|| ItemTool::from_extension(&path))
            .unwrap_or(ItemTool::Custom);
        w.attribute(ITEM_TOOL_ATTR, &tool.ordinal().to_string());
        if let Some(item) = item {
            for (element, compiler) in [
                (C_COMPILER_TOOL_ELEMENT, &item.c),
                (CPP_COMPILER_TOOL_ELEMENT, &item.cpp),
                (FORTRAN_COMPILER_TOOL_ELEMENT, &item.fortran),
                (ASSEMBLER_TOOL_ELEMENT, &item.assembler),
            ] {
                if let Some(compiler) = compiler {
                    encode_compiler_tool(w, element, compiler, &dictionary);
                }
            }
            if let Some(custom) = &item.custom {
                if !custom.is_default() {
                    w.start(CUSTOM_TOOL_ELEMENT);
                    if custom.command_line.modified() {
                        w.text_element(
                            CUSTOM_TOOL_COMMAND_LINE_ELEMENT,
                            custom.command_line.value(),
                        );
                    }
                    if custom.description.modified() {
                        w.text_element(
                            CUSTOM_TOOL_DESCRIPTION_ELEMENT,
                            custom.description.value(),
                        );
                    }
                    if custom.output_files.modified() {
                        w.text_element(CUSTOM_TOOL_OUTPUTS_ELEMENT, custom.output_files.value());
                    }
                    if custom.additional_dependencies.modified() {
                        w.text_element(
                            CUSTOM_TOOL_ADDITIONAL_DEP_ELEMENT,
                            custom.additional_dependencies.value(),
                        );
                    }
                    w.end();
                }
            }
        }
        w.end();
    }

    if !dictionary.is_empty() {
        w.start(FLAGS_DICTIONARY_ELEMENT);
        let mut entries: Vec<(&i32, &String)> =
            dictionary.iter().map(|(flags, id)| (id, flags)).collect();
        entries.sort();
        for (id, flags) in entries {
            w.start(DICTIONARY_ELEMENT);
            w.attribute(FLAGS_ID_ATTR, &id.to_string());
            w.attribute(COMMON_FLAGS_ATTR, flags);
            w.end();
        }
        w.end();
    }

    if !conf.packaging.is_dummy() || !conf.packaging.files.is_empty() {
        w.start(PACKAGING_ELEMENT);
        w.text_element(
            PACK_TYPE_ELEMENT,
            &(conf.packaging.packaging_type.value() as i32).to_string(),
        );
        w.text_element(PACK_OUTPUT_ELEMENT, conf.packaging.output.value());
        w.text_element(PACK_TOOL_ELEMENT, conf.packaging.tool.value());
        w.text_element(PACK_OPTIONS_ELEMENT, conf.packaging.options.value());
        if conf.packaging.top_directory.modified() {
            w.text_element(PACK_TOP_DIR_ELEMENT, conf.packaging.top_directory.value());
        }
        if conf.packaging.verbose.modified() {
            w.bool_element(VERBOSE_ELEMENT, conf.packaging.verbose.value());
        }
        if !conf.packaging.files.is_empty() {
            w.start(PACK_FILE_LIST_ELEMENT);
            for file in &conf.packaging.files {
                w.start(PACK_FILE_LIST_ITEM_ELEMENT);
                w.attribute(PACK_FILE_TYPE_ATTR, &file.file_kind.to_string());
                w.attribute(PACK_FILE_TO_ATTR, &file.to);
                w.attribute(PACK_FILE_FROM_ATTR, &file.from);
                w.attribute(PACK_FILE_PERM_ATTR, &file.permission);
                w.attribute(PACK_FILE_OWNER_ATTR, &file.owner);
                w.attribute(PACK_FILE_GROUP_ATTR, &file.group);
                w.end();
            }
            w.end();
        }
        if !conf.packaging.additional_info.is_empty() {
            w.start(PACK_ADDITIONAL_INFO_ELEMENT);
            for info in conf.packaging.additional_info.value() {
                w.text_element(LIST_ELEMENT, info);
            }
            w.end();
        }
        w.end();
    }

    w.end();
}

fn encode_compiler_tool(
    w: &mut XmlWriter,
    element: &str,
    compiler: &CompilerConfiguration,
    dictionary: &BTreeMap<String, i32>,
) {
    if compiler.is_default() {
        return;
    }
    w.start(element);
    if compiler.important_flags.modified() {
        if let Some(id) = dictionary.get(compiler.important_flags.value()) {
            w.attribute(FLAGS_ATTR, &id.to_string());
        }
    }
    if compiler.development_mode.modified() {
        w.text_element(
            DEVELOPMENT_MODE_ELEMENT,
            &compiler.development_mode.value().to_string(),
        );
    }
    if compiler.warning_level.modified() {
        w.text_element(
            WARNING_LEVEL_ELEMENT,
            &compiler.warning_level.value().to_string(),
        );
    }
    if compiler.strip.modified() {
        w.bool_element(STRIP_ELEMENT, compiler.strip.value());
    }
    if compiler.standard.modified() {
        w.text_element(STANDARD_ELEMENT, &compiler.standard.value().to_string());
    }
    if compiler.include_directories.modified() {
        w.start(INCLUDE_DIRECTORIES_ELEMENT);
        for dir in compiler.include_directories.value() {
            w.text_element(DIRECTORY_PATH_ELEMENT, dir);
        }
        w.end();
    }
    if compiler.include_files.modified() {
        w.start(INCLUDE_FILES_ELEMENT);
        for file in compiler.include_files.value() {
            w.text_element(DIRECTORY_PATH_ELEMENT, file);
        }
        w.end();
    }
    if compiler.preprocessor_definitions.modified() {
        w.start(PREPROCESSOR_LIST_ELEMENT);
        for def in compiler.preprocessor_definitions.value() {
            w.text_element(LIST_ELEMENT, def);
        }
        w.end();
    }
    if compiler.command_line.modified() {
        w.text_element(COMMAND_LINE_ELEMENT, compiler.command_line.value());
    }
    if compiler.tool.modified() {
        w.text_element(TOOL_ELEMENT, compiler.tool.value());
    }
    w.end();
}

fn linker_is_default(linker: &LinkerConfiguration) -> bool {
    !(linker.output.modified()
        || linker.additional_lib_directories.modified()
        || linker.dynamic_search_paths.modified()
        || linker.strip_symbols.modified()
        || linker.pic_mode.modified()
        || linker.command_line.modified()
        || linker.tool.modified())
        && linker.libraries.is_empty()
}

fn encode_linker(w: &mut XmlWriter, linker: &LinkerConfiguration) {
    if linker_is_default(linker) {
        return;
    }
    w.start(LINKER_TOOL_ELEMENT);
    if linker.output.modified() {
        w.text_element(OUTPUT_ELEMENT, linker.output.value());
    }
    if linker.additional_lib_directories.modified() {
        w.start(LINKER_ADD_LIB_ELEMENT);
        for dir in linker.additional_lib_directories.value() {
            w.text_element(DIRECTORY_PATH_ELEMENT, dir);
        }
        w.end();
    }
    if linker.dynamic_search_paths.modified() {
        w.start(LINKER_DYN_SEARCH_ELEMENT);
        for dir in linker.dynamic_search_paths.value() {
            w.text_element(DIRECTORY_PATH_ELEMENT, dir);
        }
        w.end();
    }
    if linker.strip_symbols.modified() {
        w.bool_element(STRIP_ELEMENT, linker.strip_symbols.value());
    }
    if linker.pic_mode.modified() {
        w.bool_element(LINKER_PIC_ELEMENT, linker.pic_mode.value());
    }
    if !linker.libraries.is_empty() {
        w.start(LINKER_LIB_ITEMS_ELEMENT);
        for library in &linker.libraries {
            match library {
                LibraryItem::Project(artifact) => {
                    w.start(LINKER_LIB_PROJECT_ITEM_ELEMENT);
                    encode_artifact(w, artifact);
                    w.end();
                }
                LibraryItem::StdLib { name, option } => {
                    w.start(LINKER_LIB_STDLIB_ITEM_ELEMENT);
                    w.attribute(NAME_ATTR, name);
                    w.attribute(OPTION_ATTR, option);
                    w.end();
                }
                LibraryItem::Lib(name) => w.text_element(LINKER_LIB_LIB_ITEM_ELEMENT, name),
                LibraryItem::LibFile(path) => w.text_element(LINKER_LIB_FILE_ITEM_ELEMENT, path),
                LibraryItem::Option(option) => {
                    w.text_element(LINKER_OPTION_ITEM_ELEMENT, option)
                }
            }
        }
        w.end();
    }
    if linker.command_line.modified() {
        w.text_element(COMMAND_LINE_ELEMENT, linker.command_line.value());
    }
    if linker.tool.modified() {
        w.text_element(TOOL_ELEMENT, linker.tool.value());
    }
    w.end();
}

fn archiver_is_default(archiver: &ArchiverConfiguration) -> bool {
    !(archiver.output.modified()
        || archiver.run_ranlib.modified()
        || archiver.verbose.modified()
        || archiver.command_line.modified()
        || archiver.tool.modified())
}

fn encode_archiver(w: &mut XmlWriter, archiver: &ArchiverConfiguration) {
    if archiver_is_default(archiver) {
        return;
    }
    w.start(ARCHIVER_TOOL_ELEMENT);
    if archiver.output.modified() {
        w.text_element(OUTPUT_ELEMENT, archiver.output.value());
    }
    if archiver.run_ranlib.modified() {
        w.bool_element(ARCHIVER_RUN_RANLIB_ELEMENT, archiver.run_ranlib.value());
    }
    if archiver.verbose.modified() {
        w.bool_element(VERBOSE_ELEMENT, archiver.verbose.value());
    }
    if archiver.command_line.modified() {
        w.text_element(COMMAND_LINE_ELEMENT, archiver.command_line.value());
    }
    if archiver.tool.modified() {
        w.text_element(TOOL_ELEMENT, archiver.tool.value());
    }
    w.end();
}

fn encode_artifact(w: &mut XmlWriter, artifact: &MakeArtifact) {
    w.start(MAKE_ARTIFACT_ELEMENT);
    w.attribute(MAKE_ARTIFACT_PL_ATTR, &artifact.project_location);
    w.attribute(MAKE_ARTIFACT_CT_ATTR, &artifact.configuration_type.to_string());
    w.attribute(MAKE_ARTIFACT_CN_ATTR, &artifact.configuration_name);
    w.attribute(
        MAKE_ARTIFACT_AC_ATTR,
        if artifact.active { TRUE_VALUE } else { FALSE_VALUE },
    );
    w.attribute(
        MAKE_ARTIFACT_BL_ATTR,
        if artifact.build { TRUE_VALUE } else { FALSE_VALUE },
    );
    w.attribute(MAKE_ARTIFACT_WD_ATTR, &artifact.working_directory);
    w.attribute(MAKE_ARTIFACT_BC_ATTR, &artifact.build_command);
    w.attribute(MAKE_ARTIFACT_CC_ATTR, &artifact.clean_command);
    w.attribute(MAKE_ARTIFACT_OP_ATTR, &artifact.output);
    w.end();
}
