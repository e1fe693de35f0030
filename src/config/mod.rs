pub mod artifacts;
pub mod items;
pub mod options;
pub mod tools;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::artifacts::MakeArtifact;
use crate::config::items::{Folder, FolderConfiguration, FolderKind, ItemConfiguration};
use crate::config::options::{BooleanConfiguration, StringConfiguration};
use crate::config::tools::{
    ArchiverConfiguration, CompilerConfiguration, CompilerKind, LinkerConfiguration,
    MakefileConfiguration, PackagingConfiguration, QtConfiguration,
};

/// The build profile kind. Ordinals are the wire format and must not be
/// reordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigurationType {
    Makefile,
    Application,
    DynamicLibrary,
    StaticLibrary,
    QtApplication,
    QtDynamicLibrary,
    QtStaticLibrary,
    Custom,
}

impl ConfigurationType {
    pub fn ordinal(&self) -> i32 {
        match self {
            ConfigurationType::Makefile => 0,
            ConfigurationType::Application => 1,
            ConfigurationType::DynamicLibrary => 2,
            ConfigurationType::StaticLibrary => 3,
            ConfigurationType::QtApplication => 4,
            ConfigurationType::QtDynamicLibrary => 5,
            ConfigurationType::QtStaticLibrary => 6,
            ConfigurationType::Custom => 7,
        }
    }

    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(ConfigurationType::Makefile),
            1 => Some(ConfigurationType::Application),
            2 => Some(ConfigurationType::DynamicLibrary),
            3 => Some(ConfigurationType::StaticLibrary),
            4 => Some(ConfigurationType::QtApplication),
            5 => Some(ConfigurationType::QtDynamicLibrary),
            6 => Some(ConfigurationType::QtStaticLibrary),
            7 => Some(ConfigurationType::Custom),
            _ => None,
        }
    }

    pub fn is_qt(&self) -> bool {
        matches!(
            self,
            ConfigurationType::QtApplication
                | ConfigurationType::QtDynamicLibrary
                | ConfigurationType::QtStaticLibrary
        )
    }

    /// Whether this project compiles its own sources (as opposed to
    /// delegating to an external makefile or qmake).
    pub fn is_compile(&self) -> bool {
        matches!(
            self,
            ConfigurationType::Application
                | ConfigurationType::DynamicLibrary
                | ConfigurationType::StaticLibrary
        )
    }

    /// Whether an external makefile drives the build.
    pub fn is_makefile_driven(&self) -> bool {
        matches!(self, ConfigurationType::Makefile | ConfigurationType::Custom)
    }

    /// Static-library types archive; the other compiled types link.
    pub fn is_archive(&self) -> bool {
        matches!(
            self,
            ConfigurationType::StaticLibrary | ConfigurationType::QtStaticLibrary
        )
    }
}

/// One build profile of a project: a toolchain reference plus the nested
/// tool configurations and the per-folder/per-item overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct MakeConfiguration {
    pub name: String,
    pub configuration_type: ConfigurationType,
    /// "flavor|name" reference into the resolved toolchain registry, or
    /// "default".
    pub compiler_set: StringConfiguration,
    pub c_required: BooleanConfiguration,
    pub cpp_required: BooleanConfiguration,
    pub fortran_required: BooleanConfiguration,
    pub assembler_required: BooleanConfiguration,
    pub dependency_checking: BooleanConfiguration,
    pub rebuild_prop_changed: BooleanConfiguration,
    pub c_compiler: CompilerConfiguration,
    pub cpp_compiler: CompilerConfiguration,
    pub fortran_compiler: CompilerConfiguration,
    pub assembler: CompilerConfiguration,
    pub linker: LinkerConfiguration,
    pub archiver: ArchiverConfiguration,
    pub packaging: PackagingConfiguration,
    pub makefile: MakefileConfiguration,
    pub qt: QtConfiguration,
    pub required_projects: Vec<MakeArtifact>,
    pub item_configurations: BTreeMap<Rc<str>, ItemConfiguration>,
    pub folder_configurations: BTreeMap<String, FolderConfiguration>,
}

impl MakeConfiguration {
    pub fn new(name: &str, configuration_type: ConfigurationType) -> Self {
        Self {
            name: name.to_string(),
            configuration_type,
            compiler_set: StringConfiguration::new("default"),
            c_required: BooleanConfiguration::new(true),
            cpp_required: BooleanConfiguration::new(true),
            fortran_required: BooleanConfiguration::new(false),
            assembler_required: BooleanConfiguration::new(false),
            dependency_checking: BooleanConfiguration::new(true),
            rebuild_prop_changed: BooleanConfiguration::new(false),
            c_compiler: CompilerConfiguration::new(CompilerKind::C),
            cpp_compiler: CompilerConfiguration::new(CompilerKind::Cpp),
            fortran_compiler: CompilerConfiguration::new(CompilerKind::Fortran),
            assembler: CompilerConfiguration::new(CompilerKind::Assembler),
            linker: LinkerConfiguration::new(),
            archiver: ArchiverConfiguration::new(),
            packaging: PackagingConfiguration::new(),
            makefile: MakefileConfiguration::new(),
            qt: QtConfiguration::new(),
            required_projects: Vec::new(),
            item_configurations: BTreeMap::new(),
            folder_configurations: BTreeMap::new(),
        }
    }

    pub fn item_configuration_mut(&mut self, path: Rc<str>) -> &mut ItemConfiguration {
        self.item_configurations
            .entry(path)
            .or_insert_with(ItemConfiguration::new)
    }

    pub fn is_item_excluded(&self, path: &str) -> bool {
        self.item_configurations
            .get(path)
            .map(|i| i.excluded.value())
            .unwrap_or(false)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorState {
    Reading,
    Ok,
    Broken,
}

/// The whole persisted project model: all configurations, the folder trees
/// and the source/test roots, plus bookkeeping for the load lifecycle.
#[derive(Clone, Debug)]
pub struct ConfigurationDescriptor {
    pub base_dir: PathBuf,
    /// Version the descriptor was read with; encode always writes the
    /// current version.
    pub version: i32,
    pub confs: Vec<MakeConfiguration>,
    pub active: Option<usize>,
    pub logical_folders: Folder,
    /// Physical disk layout, read from and written to the private stream.
    pub disk_folders: Option<Folder>,
    pub source_roots: Vec<String>,
    pub test_roots: Vec<String>,
    pub project_makefile_name: String,
    pub state: DescriptorState,
    pub modified: bool,
}

impl ConfigurationDescriptor {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            version: crate::codec::CURRENT_VERSION,
            confs: Vec::new(),
            active: None,
            logical_folders: Folder::new("root", FolderKind::SourceLogicalFolder),
            disk_folders: None,
            source_roots: Vec::new(),
            test_roots: Vec::new(),
            project_makefile_name: "Makefile".to_string(),
            state: DescriptorState::Ok,
            modified: false,
        }
    }

    pub fn project_name(&self) -> String {
        self.base_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string())
    }

    pub fn active_configuration(&self) -> Option<&MakeConfiguration> {
        self.active.and_then(|i| self.confs.get(i))
    }

    pub fn find_configuration(&self, name: &str) -> Option<&MakeConfiguration> {
        self.confs.iter().find(|c| c.name == name)
    }

    pub fn find_configuration_mut(&mut self, name: &str) -> Option<&mut MakeConfiguration> {
        self.confs.iter_mut().find(|c| c.name == name)
    }

    /// All item paths of the project, sorted. Sorting here (not file-system
    /// order) is what makes generation idempotent.
    pub fn sorted_items(&self) -> Vec<Rc<str>> {
        let mut items = self.logical_folders.collect_items();
        items.sort();
        items.dedup();
        items
    }

    pub fn test_items(&self) -> Vec<Rc<str>> {
        let mut items = self
            .logical_folders
            .collect_items_of_kind(FolderKind::TestLogicalFolder);
        items.sort();
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn configuration_type_ordinals_round_trip() {
        for ordinal in 0..8 {
            let t = ConfigurationType::from_ordinal(ordinal).unwrap();
            assert_eq!(t.ordinal(), ordinal);
        }
        assert!(ConfigurationType::from_ordinal(8).is_none());
    }

    #[test]
    fn items_are_sorted_not_in_insertion_order() {
        let mut descriptor = ConfigurationDescriptor::new(Path::new("/tmp/p"));
        descriptor.logical_folders.add_item(Rc::from("z.c"));
        descriptor.logical_folders.add_item(Rc::from("a.c"));
        let items: Vec<String> = descriptor
            .sorted_items()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(items, vec!["a.c", "z.c"]);
    }

    #[test]
    fn absent_item_configuration_is_included_by_default() {
        let conf = MakeConfiguration::new("Debug", ConfigurationType::Application);
        assert!(!conf.is_item_excluded("main.c"));
    }
}
