//! Recursive descent decoder for the public and private configuration
//! streams. Unknown elements are skipped so newer files stay readable;
//! malformed leaf values are logged and skipped rather than failing the
//! whole load.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

use roxmltree::{Document, Node};

use crate::codec::elements::*;
use crate::codec::interner::PathInterner;
use crate::codec::{
    CURRENT_VERSION, OLDEST_SUPPORTED_VERSION, VERSION_WITH_FLAGS_DICTIONARY,
    VERSION_WITH_REQUIRED_TOOLS,
};
use crate::config::artifacts::{LibraryItem, MakeArtifact};
use crate::config::items::{Folder, FolderKind, ItemTool};
use crate::config::tools::{
    CompilerConfiguration, CompilerKind, CustomToolConfiguration, PackagingFile,
};
use crate::config::{ConfigurationDescriptor, ConfigurationType, MakeConfiguration};
use crate::errors::DecodeError;

/// Where the decoder currently is in the document. Each structural method
/// pushes its frame on entry and pops on exit, so diagnostics can always
/// name the exact scope of a skipped element.
#[derive(Debug)]
enum ScopeFrame {
    Project,
    Configuration(String),
    Folder(String),
    Item(Rc<str>),
    Tool(String),
}

#[derive(Debug, Default)]
struct ScopeStack {
    frames: Vec<ScopeFrame>,
}

impl ScopeStack {
    fn push(&mut self, frame: ScopeFrame) {
        self.frames.push(frame);
    }

    fn pop(&mut self) {
        self.frames.pop();
    }

    fn location(&self) -> String {
        let mut location = String::new();
        for frame in &self.frames {
            if !location.is_empty() {
                location.push('/');
            }
            match frame {
                ScopeFrame::Project => location.push_str("project"),
                ScopeFrame::Configuration(name) => location.push_str(name),
                ScopeFrame::Folder(path) => location.push_str(path),
                ScopeFrame::Item(path) => location.push_str(path),
                ScopeFrame::Tool(name) => location.push_str(name),
            }
        }
        location
    }
}

/// Facts about the decoded document that the post-parse migrations need but
/// the model does not keep.
#[derive(Debug)]
pub struct DecodeAux {
    pub stored_version: i32,
    /// Item paths that appeared explicitly in each configuration. Items of
    /// the project tree missing from a configuration get their exclusion
    /// state filled in afterwards, keyed on the stored version.
    pub touched_items: HashMap<String, HashSet<Rc<str>>>,
}

pub struct Decoder {
    version: i32,
    interner: PathInterner,
    relative_offset: Option<String>,
    scopes: ScopeStack,
    touched: HashMap<String, HashSet<Rc<str>>>,
}

impl Decoder {
    pub fn new(relative_offset: Option<&str>) -> Self {
        Self {
            version: CURRENT_VERSION,
            interner: PathInterner::new(),
            relative_offset: relative_offset.map(|o| o.to_string()),
            scopes: ScopeStack::default(),
            touched: HashMap::new(),
        }
    }

    /// Decodes the shared stream and, when present, overlays the private
    /// one. Post-parse migrations are the caller's business.
    pub fn decode(
        mut self,
        public_xml: &str,
        private_xml: Option<&str>,
        base_dir: &Path,
    ) -> Result<(ConfigurationDescriptor, DecodeAux), DecodeError> {
        let document = Document::parse(public_xml).map_err(DecodeError::MalformedXml)?;
        let root = document.root_element();
        if root.tag_name().name() != CONFIGURATION_DESCRIPTOR_ELEMENT {
            return Err(DecodeError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }
        let version_text = root.attribute(VERSION_ATTR).unwrap_or("");
        self.version = version_text
            .parse::<i32>()
            .map_err(|_| DecodeError::InvalidVersion(version_text.to_string()))?;
        if self.version < OLDEST_SUPPORTED_VERSION {
            return Err(DecodeError::UnsupportedVersion(
                self.version,
                OLDEST_SUPPORTED_VERSION,
            ));
        }
        if self.version > CURRENT_VERSION {
            log::warn!(
                "Configuration version {} is newer than {}; reading best effort",
                self.version,
                CURRENT_VERSION
            );
        }

        let mut descriptor = ConfigurationDescriptor::new(base_dir);
        descriptor.version = self.version;

        self.scopes.push(ScopeFrame::Project);
        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                LOGICAL_FOLDER_ELEMENT => {
                    descriptor.logical_folders = self.decode_folder_tree(child);
                }
                SOURCE_ROOT_LIST_ELEMENT => {
                    descriptor.source_roots = self.decode_path_list(child);
                }
                TEST_ROOT_LIST_ELEMENT => {
                    descriptor.test_roots = self.decode_path_list(child);
                }
                PROJECT_MAKEFILE_ELEMENT => {
                    descriptor.project_makefile_name = text(child).to_string();
                }
                CONFS_ELEMENT => {
                    for conf_node in elements_named(child, CONF_ELEMENT) {
                        descriptor.confs.push(self.decode_conf(conf_node));
                    }
                }
                other => self.skip(other),
            }
        }
        self.scopes.pop();

        if let Some(private_xml) = private_xml {
            self.decode_private(private_xml, &mut descriptor)?;
        }
        if descriptor.active.is_none() && !descriptor.confs.is_empty() {
            descriptor.active = Some(0);
        }

        let aux = DecodeAux {
            stored_version: self.version,
            touched_items: self.touched,
        };
        Ok((descriptor, aux))
    }

    fn decode_private(
        &mut self,
        private_xml: &str,
        descriptor: &mut ConfigurationDescriptor,
    ) -> Result<(), DecodeError> {
        let document = Document::parse(private_xml).map_err(DecodeError::MalformedXml)?;
        let root = document.root_element();
        if root.tag_name().name() != CONFIGURATION_DESCRIPTOR_ELEMENT {
            return Err(DecodeError::UnexpectedRoot(
                root.tag_name().name().to_string(),
            ));
        }
        for child in root.children().filter(Node::is_element) {
            match child.tag_name().name() {
                DEFAULT_CONF_ELEMENT => {
                    if let Some(index) = int_text(child) {
                        let index = index as usize;
                        if index < descriptor.confs.len() {
                            descriptor.active = Some(index);
                        } else {
                            log::warn!("defaultConf {} is out of range, ignoring", index);
                        }
                    }
                }
                DISK_FOLDER_ELEMENT => {
                    descriptor.disk_folders = Some(self.decode_disk_folder(child));
                }
                other => self.skip(other),
            }
        }
        Ok(())
    }

    fn decode_folder_tree(&mut self, node: Node) -> Folder {
        let name = node.attribute(NAME_ATTR).unwrap_or("root");
        let kind = match node.attribute(KIND_ATTR) {
            Some(FOLDER_KIND_TEST) => FolderKind::TestLogicalFolder,
            _ => FolderKind::SourceLogicalFolder,
        };
        let mut folder = Folder::new(name, kind);
        if let Some(display_name) = node.attribute(DISPLAY_NAME_ATTR) {
            folder.display_name = display_name.to_string();
        }
        if let Some(root) = node.attribute(ROOT_ATTR) {
            folder.root = Some(self.adjust_path(root));
        }
        self.scopes.push(ScopeFrame::Folder(folder.name.clone()));
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                LOGICAL_FOLDER_ELEMENT => {
                    let nested = self.decode_folder_tree(child);
                    folder.folders.push(nested);
                }
                ITEM_PATH_ELEMENT => {
                    let path = self.adjust_path(text(child));
                    folder.add_item(self.interner.intern(&path));
                }
                other => self.skip(other),
            }
        }
        self.scopes.pop();
        folder
    }

    fn decode_disk_folder(&mut self, node: Node) -> Folder {
        let name = node.attribute(NAME_ATTR).unwrap_or(".");
        let mut folder = Folder::new(name, FolderKind::SourceDiskFolder);
        if let Some(root) = node.attribute(ROOT_ATTR) {
            folder.root = Some(self.adjust_path(root));
        }
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                DISK_FOLDER_ELEMENT => {
                    let nested = self.decode_disk_folder(child);
                    folder.folders.push(nested);
                }
                DISK_FILE_ELEMENT => {
                    let path = text(child).to_string();
                    folder.add_item(self.interner.intern(&path));
                }
                other => self.skip(other),
            }
        }
        folder
    }

    fn decode_path_list(&mut self, node: Node) -> Vec<String> {
        elements_named(node, LIST_ELEMENT)
            .map(|e| self.adjust_path(text(e)))
            .collect()
    }

    fn decode_conf(&mut self, node: Node) -> MakeConfiguration {
        let name = node.attribute(NAME_ATTR).unwrap_or("Default");
        let configuration_type = node
            .attribute(TYPE_ATTR)
            .and_then(|t| t.parse::<i32>().ok())
            .and_then(ConfigurationType::from_ordinal)
            .unwrap_or(ConfigurationType::Application);
        let mut conf = MakeConfiguration::new(name, configuration_type);
        self.touched.insert(name.to_string(), HashSet::new());
        self.scopes.push(ScopeFrame::Configuration(name.to_string()));

        // The flags dictionary can follow the items that reference it, so it
        // is resolved before anything else in the configuration.
        let dictionary = if self.version >= VERSION_WITH_FLAGS_DICTIONARY {
            self.decode_flags_dictionary(node)
        } else {
            HashMap::new()
        };

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                TOOLS_SET_ELEMENT => self.decode_tools_set(child, &mut conf),
                COMPILE_TYPE_ELEMENT | MAKEFILE_TYPE_ELEMENT => {
                    self.decode_tool_container(child, &mut conf, &dictionary);
                }
                PACKAGING_ELEMENT => self.decode_packaging(child, &mut conf),
                QT_ELEMENT => self.decode_qt(child, &mut conf),
                ITEM_ELEMENT => self.decode_item(child, &mut conf, &dictionary),
                FOLDER_ELEMENT => self.decode_folder_override(child, &mut conf, &dictionary),
                FLAGS_DICTIONARY_ELEMENT => {}
                other => self.skip(other),
            }
        }
        self.scopes.pop();
        conf
    }

    fn decode_flags_dictionary(&mut self, conf_node: Node) -> HashMap<i32, String> {
        let mut dictionary = HashMap::new();
        for node in elements_named(conf_node, FLAGS_DICTIONARY_ELEMENT) {
            for entry in elements_named(node, DICTIONARY_ELEMENT) {
                let id = entry
                    .attribute(FLAGS_ID_ATTR)
                    .and_then(|i| i.parse::<i32>().ok());
                let flags = entry.attribute(COMMON_FLAGS_ATTR);
                match (id, flags) {
                    (Some(id), Some(flags)) => {
                        dictionary.insert(id, flags.to_string());
                    }
                    _ => log::warn!(
                        "Malformed flags dictionary entry in {}, skipping",
                        self.scopes.location()
                    ),
                }
            }
        }
        dictionary
    }

    fn decode_tools_set(&mut self, node: Node, conf: &mut MakeConfiguration) {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                COMPILER_SET_ELEMENT => conf.compiler_set.set_value(text(child)),
                DEPENDENCY_CHECKING_ELEMENT => {
                    conf.dependency_checking.set_value(bool_text(child));
                }
                REBUILD_PROP_CHANGED_ELEMENT => {
                    conf.rebuild_prop_changed.set_value(bool_text(child));
                }
                C_REQUIRED_ELEMENT | CPP_REQUIRED_ELEMENT | FORTRAN_REQUIRED_ELEMENT
                | ASSEMBLER_REQUIRED_ELEMENT
                    if self.version < VERSION_WITH_REQUIRED_TOOLS =>
                {
                    // The element predates its own format version; the
                    // defaults stand.
                }
                C_REQUIRED_ELEMENT => conf.c_required.set_value(bool_text(child)),
                CPP_REQUIRED_ELEMENT => conf.cpp_required.set_value(bool_text(child)),
                FORTRAN_REQUIRED_ELEMENT => conf.fortran_required.set_value(bool_text(child)),
                ASSEMBLER_REQUIRED_ELEMENT => conf.assembler_required.set_value(bool_text(child)),
                other => self.skip(other),
            }
        }
    }

    fn decode_tool_container(
        &mut self,
        node: Node,
        conf: &mut MakeConfiguration,
        dictionary: &HashMap<i32, String>,
    ) {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                C_COMPILER_TOOL_ELEMENT => {
                    self.decode_compiler_tool(child, &mut conf.c_compiler, dictionary);
                }
                CPP_COMPILER_TOOL_ELEMENT => {
                    self.decode_compiler_tool(child, &mut conf.cpp_compiler, dictionary);
                }
                FORTRAN_COMPILER_TOOL_ELEMENT => {
                    self.decode_compiler_tool(child, &mut conf.fortran_compiler, dictionary);
                }
                ASSEMBLER_TOOL_ELEMENT => {
                    self.decode_compiler_tool(child, &mut conf.assembler, dictionary);
                }
                LINKER_TOOL_ELEMENT => self.decode_linker(child, conf),
                ARCHIVER_TOOL_ELEMENT => self.decode_archiver(child, conf),
                REQUIRED_PROJECTS_ELEMENT => {
                    for artifact in elements_named(child, MAKE_ARTIFACT_ELEMENT) {
                        conf.required_projects.push(self.decode_artifact(artifact));
                    }
                }
                MAKETOOL_ELEMENT => self.decode_make_tool(child, conf),
                other => self.skip(other),
            }
        }
    }

    fn decode_make_tool(&mut self, node: Node, conf: &mut MakeConfiguration) {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                BUILD_COMMAND_WORKING_DIR_ELEMENT => {
                    conf.makefile.working_directory.set_value(text(child));
                }
                BUILD_COMMAND_ELEMENT => conf.makefile.build_command.set_value(text(child)),
                CLEAN_COMMAND_ELEMENT => conf.makefile.clean_command.set_value(text(child)),
                EXECUTABLE_PATH_ELEMENT => {
                    let path = self.adjust_path(text(child));
                    conf.makefile.executable_path.set_value(&path);
                }
                other => self.skip(other),
            }
        }
    }

    fn decode_compiler_tool(
        &mut self,
        node: Node,
        target: &mut CompilerConfiguration,
        dictionary: &HashMap<i32, String>,
    ) {
        self.scopes
            .push(ScopeFrame::Tool(node.tag_name().name().to_string()));
        if let Some(flags_id) = node.attribute(FLAGS_ATTR) {
            match flags_id
                .parse::<i32>()
                .ok()
                .and_then(|id| dictionary.get(&id))
            {
                Some(flags) => target.important_flags.set_value(flags),
                None => log::warn!(
                    "Dangling flags dictionary reference \"{}\" in {}, skipping",
                    flags_id,
                    self.scopes.location()
                ),
            }
        }
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                DEVELOPMENT_MODE_ELEMENT => {
                    if let Some(mode) = int_text(child) {
                        target.development_mode.set_value(mode as usize);
                    }
                }
                WARNING_LEVEL_ELEMENT => {
                    if let Some(level) = int_text(child) {
                        target.warning_level.set_value(level as usize);
                    }
                }
                STRIP_ELEMENT => target.strip.set_value(bool_text(child)),
                STANDARD_ELEMENT => {
                    if let Some(standard) = int_text(child) {
                        target.standard.set_value(standard as usize);
                    }
                }
                PREPROCESSOR_LIST_ELEMENT => {
                    let defs = elements_named(child, LIST_ELEMENT)
                        .map(|e| text(e).to_string())
                        .collect();
                    target.preprocessor_definitions.set_value(defs);
                }
                INCLUDE_DIRECTORIES_ELEMENT => {
                    let dirs = elements_named(child, DIRECTORY_PATH_ELEMENT)
                        .map(|e| self.adjust_path(text(e)))
                        .collect();
                    target.include_directories.set_value(dirs);
                }
                INCLUDE_FILES_ELEMENT => {
                    let files = elements_named(child, DIRECTORY_PATH_ELEMENT)
                        .map(|e| self.adjust_path(text(e)))
                        .collect();
                    target.include_files.set_value(files);
                }
                // Inline flags predate the dictionary.
                IMPORTANT_FLAGS_ELEMENT => target.important_flags.set_value(text(child)),
                COMMAND_LINE_ELEMENT => target.command_line.set_value(text(child)),
                TOOL_ELEMENT => target.tool.set_value(text(child)),
                other => self.skip(other),
            }
        }
        self.scopes.pop();
    }

    fn decode_linker(&mut self, node: Node, conf: &mut MakeConfiguration) {
        self.scopes
            .push(ScopeFrame::Tool(LINKER_TOOL_ELEMENT.to_string()));
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                OUTPUT_ELEMENT => conf.linker.output.set_value(text(child)),
                LINKER_ADD_LIB_ELEMENT => {
                    let dirs = elements_named(child, DIRECTORY_PATH_ELEMENT)
                        .map(|e| self.adjust_path(text(e)))
                        .collect();
                    conf.linker.additional_lib_directories.set_value(dirs);
                }
                LINKER_DYN_SEARCH_ELEMENT => {
                    let dirs = elements_named(child, DIRECTORY_PATH_ELEMENT)
                        .map(|e| self.adjust_path(text(e)))
                        .collect();
                    conf.linker.dynamic_search_paths.set_value(dirs);
                }
                STRIP_ELEMENT => conf.linker.strip_symbols.set_value(bool_text(child)),
                LINKER_PIC_ELEMENT => conf.linker.pic_mode.set_value(bool_text(child)),
                LINKER_LIB_ITEMS_ELEMENT => {
                    for item in child.children().filter(Node::is_element) {
                        if let Some(library) = self.decode_library_item(item) {
                            conf.linker.libraries.push(library);
                        }
                    }
                }
                COMMAND_LINE_ELEMENT => conf.linker.command_line.set_value(text(child)),
                TOOL_ELEMENT => conf.linker.tool.set_value(text(child)),
                other => self.skip(other),
            }
        }
        self.scopes.pop();
    }

    fn decode_library_item(&mut self, node: Node) -> Option<LibraryItem> {
        match node.tag_name().name() {
            LINKER_LIB_PROJECT_ITEM_ELEMENT => node
                .children()
                .filter(Node::is_element)
                .find(|n| n.tag_name().name() == MAKE_ARTIFACT_ELEMENT)
                .map(|artifact| LibraryItem::Project(self.decode_artifact(artifact))),
            LINKER_LIB_STDLIB_ITEM_ELEMENT => {
                let name = node.attribute(NAME_ATTR).unwrap_or_default().to_string();
                let option = node.attribute(OPTION_ATTR).unwrap_or_default().to_string();
                Some(LibraryItem::StdLib { name, option })
            }
            LINKER_LIB_LIB_ITEM_ELEMENT => Some(LibraryItem::Lib(text(node).to_string())),
            LINKER_LIB_FILE_ITEM_ELEMENT => {
                Some(LibraryItem::LibFile(self.adjust_path(text(node))))
            }
            LINKER_OPTION_ITEM_ELEMENT => Some(LibraryItem::Option(text(node).to_string())),
            other => {
                self.skip(other);
                None
            }
        }
    }

    fn decode_artifact(&mut self, node: Node) -> MakeArtifact {
        let attr = |name: &str| node.attribute(name).unwrap_or_default().to_string();
        MakeArtifact {
            project_location: self.adjust_path(&attr(MAKE_ARTIFACT_PL_ATTR)),
            configuration_type: node
                .attribute(MAKE_ARTIFACT_CT_ATTR)
                .and_then(|t| t.parse().ok())
                .unwrap_or(0),
            configuration_name: attr(MAKE_ARTIFACT_CN_ATTR),
            active: node.attribute(MAKE_ARTIFACT_AC_ATTR) == Some(TRUE_VALUE),
            build: node.attribute(MAKE_ARTIFACT_BL_ATTR) != Some(FALSE_VALUE),
            working_directory: self.adjust_path(&attr(MAKE_ARTIFACT_WD_ATTR)),
            build_command: attr(MAKE_ARTIFACT_BC_ATTR),
            clean_command: attr(MAKE_ARTIFACT_CC_ATTR),
            output: attr(MAKE_ARTIFACT_OP_ATTR),
        }
    }

    fn decode_archiver(&mut self, node: Node, conf: &mut MakeConfiguration) {
        self.scopes
            .push(ScopeFrame::Tool(ARCHIVER_TOOL_ELEMENT.to_string()));
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                OUTPUT_ELEMENT => conf.archiver.output.set_value(text(child)),
                ARCHIVER_RUN_RANLIB_ELEMENT => {
                    conf.archiver.run_ranlib.set_value(bool_text(child));
                }
                VERBOSE_ELEMENT => conf.archiver.verbose.set_value(bool_text(child)),
                COMMAND_LINE_ELEMENT => conf.archiver.command_line.set_value(text(child)),
                TOOL_ELEMENT => conf.archiver.tool.set_value(text(child)),
                other => self.skip(other),
            }
        }
        self.scopes.pop();
    }

    fn decode_packaging(&mut self, node: Node, conf: &mut MakeConfiguration) {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                PACK_TYPE_ELEMENT => {
                    if let Some(kind) = int_text(child) {
                        conf.packaging.packaging_type.set_value(kind as usize);
                    }
                }
                PACK_OUTPUT_ELEMENT => conf.packaging.output.set_value(text(child)),
                PACK_TOOL_ELEMENT => conf.packaging.tool.set_value(text(child)),
                PACK_OPTIONS_ELEMENT => conf.packaging.options.set_value(text(child)),
                PACK_TOP_DIR_ELEMENT => conf.packaging.top_directory.set_value(text(child)),
                VERBOSE_ELEMENT => conf.packaging.verbose.set_value(bool_text(child)),
                PACK_FILE_LIST_ELEMENT => {
                    for entry in elements_named(child, PACK_FILE_LIST_ITEM_ELEMENT) {
                        conf.packaging.files.push(PackagingFile {
                            file_kind: entry
                                .attribute(PACK_FILE_TYPE_ATTR)
                                .and_then(|t| t.parse().ok())
                                .unwrap_or(0),
                            to: entry
                                .attribute(PACK_FILE_TO_ATTR)
                                .unwrap_or_default()
                                .to_string(),
                            from: entry
                                .attribute(PACK_FILE_FROM_ATTR)
                                .unwrap_or_default()
                                .to_string(),
                            permission: entry
                                .attribute(PACK_FILE_PERM_ATTR)
                                .unwrap_or("644")
                                .to_string(),
                            owner: entry
                                .attribute(PACK_FILE_OWNER_ATTR)
                                .unwrap_or("root")
                                .to_string(),
                            group: entry
                                .attribute(PACK_FILE_GROUP_ATTR)
                                .unwrap_or("bin")
                                .to_string(),
                        });
                    }
                }
                PACK_ADDITIONAL_INFO_ELEMENT => {
                    let info = elements_named(child, LIST_ELEMENT)
                        .map(|e| text(e).to_string())
                        .collect();
                    conf.packaging.additional_info.set_value(info);
                }
                other => self.skip(other),
            }
        }
    }

    fn decode_qt(&mut self, node: Node, conf: &mut MakeConfiguration) {
        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                QT_DESTDIR_ELEMENT => conf.qt.destdir.set_value(text(child)),
                QT_TARGET_ELEMENT => conf.qt.target.set_value(text(child)),
                QT_VERSION_ELEMENT => conf.qt.version.set_value(text(child)),
                QT_BUILD_MODE_ELEMENT => {
                    if let Some(mode) = int_text(child) {
                        conf.qt.build_mode.set_value(mode as usize);
                    }
                }
                QT_SPEC_ELEMENT => conf.qt.qmake_spec.set_value(text(child)),
                QT_DEFS_LIST_ELEMENT => {
                    let defs = elements_named(child, LIST_ELEMENT)
                        .map(|e| text(e).to_string())
                        .collect();
                    conf.qt.custom_defs.set_value(defs);
                }
                other => self.skip(other),
            }
        }
    }

    fn decode_item(
        &mut self,
        node: Node,
        conf: &mut MakeConfiguration,
        dictionary: &HashMap<i32, String>,
    ) {
        let path = match node.attribute(PATH_ATTR) {
            Some(path) => self.interner.intern(&self.adjust_path(path)),
            None => {
                log::warn!("Item without a path in {}, skipping", self.scopes.location());
                return;
            }
        };
        if let Some(touched) = self.touched.get_mut(&conf.name) {
            touched.insert(Rc::clone(&path));
        }
        self.scopes.push(ScopeFrame::Item(Rc::clone(&path)));

        let excluded = node.attribute(EXCLUDED_ATTR) == Some(TRUE_VALUE);
        let tool = node
            .attribute(ITEM_TOOL_ATTR)
            .and_then(|t| t.parse::<i32>().ok())
            .and_then(ItemTool::from_ordinal);

        let item = conf.item_configuration_mut(Rc::clone(&path));
        item.excluded.set_value(excluded);
        if tool != ItemTool::from_extension(&path) {
            item.tool = tool;
        }

        for child in node.children().filter(Node::is_element) {
            let kind = match child.tag_name().name() {
                C_COMPILER_TOOL_ELEMENT => Some(CompilerKind::C),
                CPP_COMPILER_TOOL_ELEMENT => Some(CompilerKind::Cpp),
                FORTRAN_COMPILER_TOOL_ELEMENT => Some(CompilerKind::Fortran),
                ASSEMBLER_TOOL_ELEMENT => Some(CompilerKind::Assembler),
                CUSTOM_TOOL_ELEMENT => {
                    let custom = conf
                        .item_configuration_mut(Rc::clone(&path))
                        .custom
                        .get_or_insert_with(CustomToolConfiguration::new);
                    for grandchild in child.children().filter(Node::is_element) {
                        match grandchild.tag_name().name() {
                            CUSTOM_TOOL_COMMAND_LINE_ELEMENT => {
                                custom.command_line.set_value(text(grandchild));
                            }
                            CUSTOM_TOOL_DESCRIPTION_ELEMENT => {
                                custom.description.set_value(text(grandchild));
                            }
                            CUSTOM_TOOL_OUTPUTS_ELEMENT => {
                                custom.output_files.set_value(text(grandchild));
                            }
                            CUSTOM_TOOL_ADDITIONAL_DEP_ELEMENT => {
                                custom.additional_dependencies.set_value(text(grandchild));
                            }
                            other => self.skip(other),
                        }
                    }
                    None
                }
                other => {
                    self.skip(other);
                    None
                }
            };
            if let Some(kind) = kind {
                let mut compiler = conf
                    .item_configuration_mut(Rc::clone(&path))
                    .compiler_mut(kind)
                    .clone();
                self.decode_compiler_tool(child, &mut compiler, dictionary);
                *conf
                    .item_configuration_mut(Rc::clone(&path))
                    .compiler_mut(kind) = compiler;
            }
        }
        self.scopes.pop();
    }

    fn decode_folder_override(
        &mut self,
        node: Node,
        conf: &mut MakeConfiguration,
        dictionary: &HashMap<i32, String>,
    ) {
        let path = match node.attribute(PATH_ATTR) {
            Some(path) => path.to_string(),
            None => {
                log::warn!(
                    "Folder override without a path in {}, skipping",
                    self.scopes.location()
                );
                return;
            }
        };
        self.scopes.push(ScopeFrame::Folder(path.clone()));
        for child in node.children().filter(Node::is_element) {
            let kind = match child.tag_name().name() {
                C_COMPILER_TOOL_ELEMENT => Some(CompilerKind::C),
                CPP_COMPILER_TOOL_ELEMENT => Some(CompilerKind::Cpp),
                other => {
                    self.skip(other);
                    None
                }
            };
            if let Some(kind) = kind {
                let mut compiler = conf
                    .folder_configurations
                    .entry(path.clone())
                    .or_default()
                    .compiler_mut(kind)
                    .clone();
                self.decode_compiler_tool(child, &mut compiler, dictionary);
                *conf
                    .folder_configurations
                    .entry(path.clone())
                    .or_default()
                    .compiler_mut(kind) = compiler;
            }
        }
        self.scopes.pop();
    }

    /// Stored paths are relative to where the file was written. When the
    /// project was copied one level deeper or shallower, the offset realigns
    /// any path that escapes the project directory.
    fn adjust_path(&self, path: &str) -> String {
        match &self.relative_offset {
            Some(offset) if path.starts_with("..") => format!("{}{}", offset, path),
            _ => path.to_string(),
        }
    }

    fn skip(&self, element: &str) {
        log::debug!(
            "Ignoring unknown element <{}> in {}",
            element,
            self.scopes.location()
        );
    }
}

fn text<'a>(node: Node<'a, '_>) -> &'a str {
    node.text().unwrap_or("").trim()
}

fn bool_text(node: Node) -> bool {
    text(node) == TRUE_VALUE
}

fn int_text(node: Node) -> Option<i32> {
    let raw = text(node);
    match raw.parse::<i32>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Expected an integer in <{}>, got \"{}\"", node.tag_name().name(), raw);
            None
        }
    }
}

fn elements_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(Node::is_element)
        .filter(move |n| n.tag_name().name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(version: i32, body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <configurationDescriptor version=\"{}\">\n{}\n</configurationDescriptor>",
            version, body
        )
    }

    #[test]
    fn version_below_oldest_supported_is_rejected() {
        let xml = wrap(28, "<confs/>");
        let result = Decoder::new(None).decode(&xml, None, Path::new("/tmp/p"));
        assert!(matches!(
            result,
            Err(DecodeError::UnsupportedVersion(28, _))
        ));
    }

    #[test]
    fn unexpected_root_is_rejected() {
        let xml = "<project version=\"100\"/>";
        let result = Decoder::new(None).decode(xml, None, Path::new("/tmp/p"));
        assert!(matches!(result, Err(DecodeError::UnexpectedRoot(_))));
    }

    #[test]
    fn folder_tree_and_items_are_decoded() {
        let xml = wrap(
            100,
            "<logicalFolder name=\"root\" displayName=\"root\" projectFiles=\"true\">\n\
               <logicalFolder name=\"src\" displayName=\"Sources\" projectFiles=\"true\">\n\
                 <itemPath>main.c</itemPath>\n\
               </logicalFolder>\n\
             </logicalFolder>\n\
             <confs><conf name=\"Debug\" type=\"1\"/></confs>",
        );
        let (descriptor, _) = Decoder::new(None)
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        assert_eq!(descriptor.sorted_items().len(), 1);
        assert_eq!(descriptor.confs[0].name, "Debug");
        assert_eq!(
            descriptor.confs[0].configuration_type,
            ConfigurationType::Application
        );
    }

    #[test]
    fn flags_dictionary_reference_is_resolved() {
        let xml = wrap(
            100,
            "<logicalFolder name=\"root\" displayName=\"root\" projectFiles=\"true\">\n\
               <itemPath>a.c</itemPath>\n\
             </logicalFolder>\n\
             <confs>\n\
               <conf name=\"Debug\" type=\"1\">\n\
                 <item path=\"a.c\" ex=\"false\" tool=\"1\">\n\
                   <cTool flags=\"0\"/>\n\
                 </item>\n\
                 <flagsDictionary>\n\
                   <element flagsID=\"0\" commonFlags=\"-O2 -g\"/>\n\
                 </flagsDictionary>\n\
               </conf>\n\
             </confs>",
        );
        let (descriptor, _) = Decoder::new(None)
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        let item = descriptor.confs[0].item_configurations.get("a.c").unwrap();
        assert_eq!(
            item.compiler(CompilerKind::C).unwrap().important_flags.value(),
            "-O2 -g"
        );
    }

    #[test]
    fn pre_dictionary_versions_read_inline_flags() {
        let xml = wrap(
            80,
            "<confs>\n\
               <conf name=\"Debug\" type=\"1\">\n\
                 <item path=\"a.c\" ex=\"false\" tool=\"1\">\n\
                   <cTool><importantFlags>-fPIC</importantFlags></cTool>\n\
                 </item>\n\
               </conf>\n\
             </confs>",
        );
        let (descriptor, aux) = Decoder::new(None)
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        assert_eq!(aux.stored_version, 80);
        let item = descriptor.confs[0].item_configurations.get("a.c").unwrap();
        assert_eq!(
            item.compiler(CompilerKind::C).unwrap().important_flags.value(),
            "-fPIC"
        );
    }

    #[test]
    fn oldest_supported_version_decodes_fortran_settings() {
        let xml = wrap(
            29,
            "<confs>\n\
               <conf name=\"Debug\" type=\"1\">\n\
                 <compileType>\n\
                   <fortranCompilerTool>\n\
                     <developmentMode>5</developmentMode>\n\
                   </fortranCompilerTool>\n\
                 </compileType>\n\
               </conf>\n\
             </confs>",
        );
        let (descriptor, aux) = Decoder::new(None)
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        assert_eq!(aux.stored_version, 29);
        let fortran = &descriptor.confs[0].fortran_compiler;
        assert_eq!(fortran.development_mode.value(), 5);
        assert!(fortran.development_mode.modified());
    }

    #[test]
    fn relative_offset_realigns_escaping_paths() {
        let xml = wrap(
            100,
            "<logicalFolder name=\"root\" displayName=\"root\" projectFiles=\"true\">\n\
               <itemPath>../shared/util.c</itemPath>\n\
               <itemPath>local.c</itemPath>\n\
             </logicalFolder>\n\
             <confs/>",
        );
        let (descriptor, _) = Decoder::new(Some("sub/"))
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        let items: Vec<String> = descriptor
            .sorted_items()
            .iter()
            .map(|i| i.to_string())
            .collect();
        assert_eq!(items, vec!["local.c", "sub/../shared/util.c"]);
    }

    #[test]
    fn private_stream_sets_active_configuration_and_disk_tree() {
        let public = wrap(
            100,
            "<confs>\n\
               <conf name=\"Debug\" type=\"1\"/>\n\
               <conf name=\"Release\" type=\"1\"/>\n\
             </confs>",
        );
        let private = wrap(
            100,
            "<defaultConf>1</defaultConf>\n\
             <df root=\".\" name=\"project\">\n\
               <in>main.c</in>\n\
             </df>",
        );
        let (descriptor, _) = Decoder::new(None)
            .decode(&public, Some(&private), Path::new("/tmp/p"))
            .unwrap();
        assert_eq!(descriptor.active, Some(1));
        assert_eq!(descriptor.active_configuration().unwrap().name, "Release");
        let disk = descriptor.disk_folders.unwrap();
        assert_eq!(disk.items.len(), 1);
        assert_eq!(disk.kind, FolderKind::SourceDiskFolder);
    }

    #[test]
    fn touched_items_are_tracked_per_configuration() {
        let xml = wrap(
            100,
            "<logicalFolder name=\"root\" displayName=\"root\" projectFiles=\"true\">\n\
               <itemPath>a.c</itemPath>\n\
               <itemPath>b.c</itemPath>\n\
             </logicalFolder>\n\
             <confs>\n\
               <conf name=\"Debug\" type=\"1\">\n\
                 <item path=\"a.c\" ex=\"true\" tool=\"1\"/>\n\
               </conf>\n\
             </confs>",
        );
        let (_, aux) = Decoder::new(None)
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        let touched = aux.touched_items.get("Debug").unwrap();
        assert!(touched.contains("a.c"));
        assert!(!touched.contains("b.c"));
    }

    #[test]
    fn unknown_elements_are_ignored() {
        let xml = wrap(
            100,
            "<someFutureElement><x/></someFutureElement>\n\
             <confs><conf name=\"Debug\" type=\"0\">\n\
               <makefileType>\n\
                 <makeTool>\n\
                   <buildCommandWorkingDir>.</buildCommandWorkingDir>\n\
                   <buildCommand>${MAKE} -f Makefile</buildCommand>\n\
                   <newFangledSetting>7</newFangledSetting>\n\
                 </makeTool>\n\
               </makefileType>\n\
             </conf></confs>",
        );
        let (descriptor, _) = Decoder::new(None)
            .decode(&xml, None, Path::new("/tmp/p"))
            .unwrap();
        assert_eq!(
            descriptor.confs[0].configuration_type,
            ConfigurationType::Makefile
        );
        assert_eq!(
            descriptor.confs[0].makefile.build_command.value(),
            "${MAKE} -f Makefile"
        );
    }
}
