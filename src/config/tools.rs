//! Tool configurations: bags of typed settings attached to a configuration,
//! a folder or an item. Narrow scopes only serialize modified settings.

use serde::{Deserialize, Serialize};

use crate::config::artifacts::LibraryItem;
use crate::config::options::{
    BooleanConfiguration, EnumConfiguration, StringConfiguration, StringListConfiguration,
};

pub const DEVELOPMENT_MODES: &[&str] = &[
    "FastBuild",
    "Debug",
    "PerformanceDebug",
    "TestCoverage",
    "DiagnosableRelease",
    "Release",
    "PerformanceRelease",
];

pub const WARNING_LEVELS: &[&str] = &[
    "NoWarnings",
    "SomeWarnings",
    "Default",
    "MoreWarnings",
    "WarningsAsErrors",
];

pub const C_STANDARDS: &[&str] = &["Default", "C89", "C99", "C11"];
pub const CPP_STANDARDS: &[&str] = &["Default", "C++98", "C++11", "C++14"];
pub const FORTRAN_STANDARDS: &[&str] = &["Default", "F77", "F90", "F95"];

/// Which language family a compiler configuration belongs to. Selects the
/// XML element it is serialized under and the standard-name table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompilerKind {
    C,
    Cpp,
    Fortran,
    Assembler,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfiguration {
    pub kind: CompilerKind,
    pub development_mode: EnumConfiguration,
    pub warning_level: EnumConfiguration,
    pub strip: BooleanConfiguration,
    pub standard: EnumConfiguration,
    pub preprocessor_definitions: StringListConfiguration,
    pub include_directories: StringListConfiguration,
    pub include_files: StringListConfiguration,
    /// Flags shared by many item overrides; deduplicated through the
    /// per-configuration flags dictionary on encode.
    pub important_flags: StringConfiguration,
    pub command_line: StringConfiguration,
    pub tool: StringConfiguration,
}

impl CompilerConfiguration {
    pub fn new(kind: CompilerKind) -> Self {
        let standard_names = match kind {
            CompilerKind::C => C_STANDARDS,
            CompilerKind::Cpp => CPP_STANDARDS,
            CompilerKind::Fortran => FORTRAN_STANDARDS,
            CompilerKind::Assembler => C_STANDARDS,
        };
        Self {
            kind,
            development_mode: EnumConfiguration::new(DEVELOPMENT_MODES, 1),
            warning_level: EnumConfiguration::new(WARNING_LEVELS, 2),
            strip: BooleanConfiguration::new(false),
            standard: EnumConfiguration::new(standard_names, 0),
            preprocessor_definitions: StringListConfiguration::new(),
            include_directories: StringListConfiguration::new(),
            include_files: StringListConfiguration::new(),
            important_flags: StringConfiguration::new(""),
            command_line: StringConfiguration::new(""),
            tool: StringConfiguration::new(""),
        }
    }

    /// True when nothing in this bag deviates from the defaults, in which
    /// case a narrow scope does not serialize the tool element at all.
    pub fn is_default(&self) -> bool {
        !(self.development_mode.modified()
            || self.warning_level.modified()
            || self.strip.modified()
            || self.standard.modified()
            || self.preprocessor_definitions.modified()
            || self.include_directories.modified()
            || self.include_files.modified()
            || self.important_flags.modified()
            || self.command_line.modified()
            || self.tool.modified())
    }

    /// The `-D`/`-I` portion of the compile line, in declaration order.
    pub fn options_string(&self) -> String {
        let mut options = String::new();
        for dir in self.include_directories.value() {
            options.push_str(&format!("-I{} ", dir));
        }
        for file in self.include_files.value() {
            options.push_str(&format!("-include {} ", file));
        }
        for def in self.preprocessor_definitions.value() {
            options.push_str(&format!("-D{} ", def));
        }
        if self.important_flags.modified() {
            options.push_str(self.important_flags.value());
            options.push(' ');
        }
        if self.command_line.modified() {
            options.push_str(self.command_line.value());
            options.push(' ');
        }
        options.trim_end().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkerConfiguration {
    pub output: StringConfiguration,
    pub additional_lib_directories: StringListConfiguration,
    pub dynamic_search_paths: StringListConfiguration,
    pub strip_symbols: BooleanConfiguration,
    pub pic_mode: BooleanConfiguration,
    pub libraries: Vec<LibraryItem>,
    pub command_line: StringConfiguration,
    pub tool: StringConfiguration,
}

impl LinkerConfiguration {
    pub fn new() -> Self {
        Self {
            output: StringConfiguration::new(""),
            additional_lib_directories: StringListConfiguration::new(),
            dynamic_search_paths: StringListConfiguration::new(),
            strip_symbols: BooleanConfiguration::new(false),
            pic_mode: BooleanConfiguration::new(true),
            libraries: Vec::new(),
            command_line: StringConfiguration::new(""),
            tool: StringConfiguration::new(""),
        }
    }

    pub fn options_string(&self) -> String {
        let mut options = String::new();
        for dir in self.additional_lib_directories.value() {
            options.push_str(&format!("-L{} ", dir));
        }
        for dir in self.dynamic_search_paths.value() {
            options.push_str(&format!("-Wl,-rpath,'{}' ", dir));
        }
        for library in &self.libraries {
            options.push_str(&library.option_string());
            options.push(' ');
        }
        if self.command_line.modified() {
            options.push_str(self.command_line.value());
            options.push(' ');
        }
        options.trim_end().to_string()
    }
}

impl Default for LinkerConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiverConfiguration {
    pub output: StringConfiguration,
    pub run_ranlib: BooleanConfiguration,
    pub verbose: BooleanConfiguration,
    pub command_line: StringConfiguration,
    pub tool: StringConfiguration,
}

impl ArchiverConfiguration {
    pub fn new() -> Self {
        Self {
            output: StringConfiguration::new(""),
            run_ranlib: BooleanConfiguration::new(true),
            verbose: BooleanConfiguration::new(false),
            command_line: StringConfiguration::new(""),
            tool: StringConfiguration::new(""),
        }
    }
}

impl Default for ArchiverConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

pub const PACKAGING_TYPES: &[&str] = &["Tar", "Zip", "SVR4", "RPM", "Debian", "Dummy"];

pub const PACKAGING_TYPE_DUMMY: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingFile {
    /// 0 = file, 1 = directory, 2 = soft link.
    pub file_kind: i32,
    pub to: String,
    pub from: String,
    pub permission: String,
    pub owner: String,
    pub group: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingConfiguration {
    pub packaging_type: EnumConfiguration,
    pub output: StringConfiguration,
    pub tool: StringConfiguration,
    pub options: StringConfiguration,
    pub top_directory: StringConfiguration,
    pub verbose: BooleanConfiguration,
    pub files: Vec<PackagingFile>,
    pub additional_info: StringListConfiguration,
}

impl PackagingConfiguration {
    pub fn new() -> Self {
        Self {
            packaging_type: EnumConfiguration::new(PACKAGING_TYPES, PACKAGING_TYPE_DUMMY),
            output: StringConfiguration::new(""),
            tool: StringConfiguration::new("tar"),
            options: StringConfiguration::new(""),
            top_directory: StringConfiguration::new(""),
            verbose: BooleanConfiguration::new(true),
            files: Vec::new(),
            additional_info: StringListConfiguration::new(),
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.packaging_type.value() == PACKAGING_TYPE_DUMMY
    }
}

impl Default for PackagingConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomToolConfiguration {
    pub command_line: StringConfiguration,
    pub description: StringConfiguration,
    pub output_files: StringConfiguration,
    pub additional_dependencies: StringConfiguration,
}

impl CustomToolConfiguration {
    pub fn new() -> Self {
        Self {
            command_line: StringConfiguration::new(""),
            description: StringConfiguration::new("Performing Custom Build Step"),
            output_files: StringConfiguration::new(""),
            additional_dependencies: StringConfiguration::new(""),
        }
    }

    pub fn is_default(&self) -> bool {
        !(self.command_line.modified()
            || self.description.modified()
            || self.output_files.modified()
            || self.additional_dependencies.modified())
    }
}

impl Default for CustomToolConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for a makefile-driven configuration, where an external makefile
/// drives the build and this project only records how to invoke it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakefileConfiguration {
    pub working_directory: StringConfiguration,
    pub build_command: StringConfiguration,
    pub clean_command: StringConfiguration,
    pub executable_path: StringConfiguration,
}

impl MakefileConfiguration {
    pub fn new() -> Self {
        Self {
            working_directory: StringConfiguration::new("."),
            build_command: StringConfiguration::new("${MAKE} -f Makefile"),
            clean_command: StringConfiguration::new("${MAKE} -f Makefile clean"),
            executable_path: StringConfiguration::new(""),
        }
    }
}

impl Default for MakefileConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings for a Qt-flavored configuration; the generated makefile
/// delegates to a qmake-produced one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QtConfiguration {
    pub destdir: StringConfiguration,
    pub target: StringConfiguration,
    pub version: StringConfiguration,
    pub build_mode: EnumConfiguration,
    /// Explicit `-spec` value; empty means "pick a platform default".
    pub qmake_spec: StringConfiguration,
    pub custom_defs: StringListConfiguration,
}

pub const QT_BUILD_MODES: &[&str] = &["Debug", "Release"];

impl QtConfiguration {
    pub fn new() -> Self {
        Self {
            destdir: StringConfiguration::new(""),
            target: StringConfiguration::new(""),
            version: StringConfiguration::new(""),
            build_mode: EnumConfiguration::new(QT_BUILD_MODES, 0),
            qmake_spec: StringConfiguration::new(""),
            custom_defs: StringListConfiguration::new(),
        }
    }
}

impl Default for QtConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn fresh_compiler_configuration_is_default() {
        let c = CompilerConfiguration::new(CompilerKind::C);
        assert!(c.is_default());
    }

    #[test]
    fn options_string_orders_includes_before_defines() {
        let mut c = CompilerConfiguration::new(CompilerKind::Cpp);
        c.include_directories.add("src");
        c.include_directories.add("include");
        c.preprocessor_definitions.add("NDEBUG");
        assert_eq!(c.options_string(), "-Isrc -Iinclude -DNDEBUG");
        assert!(!c.is_default());
    }

    #[test]
    fn linker_options_preserve_library_order() {
        let mut l = LinkerConfiguration::new();
        l.libraries.push(LibraryItem::Lib("z".to_string()));
        l.libraries.push(LibraryItem::Option("-pthread".to_string()));
        l.libraries.push(LibraryItem::Lib("m".to_string()));
        assert_eq!(l.options_string(), "-lz -pthread -lm");
    }
}
