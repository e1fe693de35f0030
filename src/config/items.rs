//! The project's logical and on-disk file tree, and the per-configuration
//! override records attached to folders and items.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::options::BooleanConfiguration;
use crate::config::tools::{CompilerConfiguration, CompilerKind, CustomToolConfiguration};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderKind {
    /// Logical source folder, part of the shared project structure.
    SourceLogicalFolder,
    /// Logical folder holding test items; its items never enter the main
    /// object list and link against the `_nomain` harness objects.
    TestLogicalFolder,
    /// Physical disk folder, private to the local checkout.
    SourceDiskFolder,
}

/// One node of the folder tree. Item entries are project-relative paths,
/// interned during decode so thousands of items share path allocations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Folder {
    pub name: String,
    pub display_name: String,
    pub kind: FolderKind,
    /// Physical root directory, only set on disk folders.
    pub root: Option<String>,
    pub folders: Vec<Folder>,
    pub items: Vec<Rc<str>>,
}

impl Folder {
    pub fn new(name: &str, kind: FolderKind) -> Self {
        Self {
            name: name.to_string(),
            display_name: name.to_string(),
            kind,
            root: None,
            folders: Vec::new(),
            items: Vec::new(),
        }
    }

    pub fn add_item(&mut self, path: Rc<str>) {
        self.items.push(path);
    }

    pub fn find_folder_mut(&mut self, path: &str) -> Option<&mut Folder> {
        if path.is_empty() {
            return Some(self);
        }
        let (head, tail) = match path.split_once('/') {
            Some((head, tail)) => (head, tail),
            None => (path, ""),
        };
        self.folders
            .iter_mut()
            .find(|f| f.name == head)
            .and_then(|f| f.find_folder_mut(tail))
    }

    /// All item paths below this folder, depth first.
    pub fn collect_items(&self) -> Vec<Rc<str>> {
        let mut items = self.items.clone();
        for folder in &self.folders {
            items.extend(folder.collect_items());
        }
        items
    }

    /// Item paths below folders of the given kind.
    pub fn collect_items_of_kind(&self, kind: FolderKind) -> Vec<Rc<str>> {
        let mut items = Vec::new();
        if self.kind == kind {
            items.extend(self.collect_items());
        } else {
            for folder in &self.folders {
                items.extend(folder.collect_items_of_kind(kind));
            }
        }
        items
    }
}

/// Which tool builds an item when the extension-derived default is
/// overridden.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemTool {
    Compiler(CompilerKind),
    Custom,
}

impl ItemTool {
    pub fn ordinal(&self) -> i32 {
        match self {
            ItemTool::Compiler(CompilerKind::Assembler) => 0,
            ItemTool::Compiler(CompilerKind::C) => 1,
            ItemTool::Compiler(CompilerKind::Cpp) => 2,
            ItemTool::Compiler(CompilerKind::Fortran) => 3,
            ItemTool::Custom => 4,
        }
    }

    pub fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(ItemTool::Compiler(CompilerKind::Assembler)),
            1 => Some(ItemTool::Compiler(CompilerKind::C)),
            2 => Some(ItemTool::Compiler(CompilerKind::Cpp)),
            3 => Some(ItemTool::Compiler(CompilerKind::Fortran)),
            4 => Some(ItemTool::Custom),
            _ => None,
        }
    }

    /// Default tool derived from a file extension, the way the project tree
    /// classifies files.
    pub fn from_extension(path: &str) -> Option<Self> {
        let extension = std::path::Path::new(path)
            .extension()
            .and_then(|e| e.to_str())?;
        match extension {
            "c" => Some(ItemTool::Compiler(CompilerKind::C)),
            "cc" | "cpp" | "cxx" | "C" => Some(ItemTool::Compiler(CompilerKind::Cpp)),
            "f" | "f77" | "f90" | "f95" | "for" => Some(ItemTool::Compiler(CompilerKind::Fortran)),
            "s" | "S" | "asm" => Some(ItemTool::Compiler(CompilerKind::Assembler)),
            _ => None,
        }
    }
}

/// Per-configuration overrides for one item. Absent tool bags mean "inherit
/// everything from the folder, then the project".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemConfiguration {
    pub excluded: BooleanConfiguration,
    pub tool: Option<ItemTool>,
    pub c: Option<CompilerConfiguration>,
    pub cpp: Option<CompilerConfiguration>,
    pub fortran: Option<CompilerConfiguration>,
    pub assembler: Option<CompilerConfiguration>,
    pub custom: Option<CustomToolConfiguration>,
}

impl ItemConfiguration {
    pub fn new() -> Self {
        Self {
            excluded: BooleanConfiguration::new(false),
            tool: None,
            c: None,
            cpp: None,
            fortran: None,
            assembler: None,
            custom: None,
        }
    }

    pub fn compiler_mut(&mut self, kind: CompilerKind) -> &mut CompilerConfiguration {
        let slot = match kind {
            CompilerKind::C => &mut self.c,
            CompilerKind::Cpp => &mut self.cpp,
            CompilerKind::Fortran => &mut self.fortran,
            CompilerKind::Assembler => &mut self.assembler,
        };
        slot.get_or_insert_with(|| CompilerConfiguration::new(kind))
    }

    pub fn compiler(&self, kind: CompilerKind) -> Option<&CompilerConfiguration> {
        match kind {
            CompilerKind::C => self.c.as_ref(),
            CompilerKind::Cpp => self.cpp.as_ref(),
            CompilerKind::Fortran => self.fortran.as_ref(),
            CompilerKind::Assembler => self.assembler.as_ref(),
        }
    }

    /// A record with no overrides at all need not be serialized.
    pub fn is_default(&self) -> bool {
        !self.excluded.modified()
            && self.tool.is_none()
            && self.c.as_ref().map_or(true, |c| c.is_default())
            && self.cpp.as_ref().map_or(true, |c| c.is_default())
            && self.fortran.as_ref().map_or(true, |c| c.is_default())
            && self.assembler.as_ref().map_or(true, |c| c.is_default())
            && self.custom.as_ref().map_or(true, |c| c.is_default())
    }
}

impl Default for ItemConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-configuration overrides for a folder, inherited by the items below it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderConfiguration {
    pub c: Option<CompilerConfiguration>,
    pub cpp: Option<CompilerConfiguration>,
}

impl FolderConfiguration {
    pub fn new() -> Self {
        Self { c: None, cpp: None }
    }

    pub fn compiler_mut(&mut self, kind: CompilerKind) -> &mut CompilerConfiguration {
        let slot = match kind {
            CompilerKind::Cpp => &mut self.cpp,
            _ => &mut self.c,
        };
        slot.get_or_insert_with(|| CompilerConfiguration::new(kind))
    }

    pub fn is_default(&self) -> bool {
        self.c.as_ref().map_or(true, |c| c.is_default())
            && self.cpp.as_ref().map_or(true, |c| c.is_default())
    }
}

impl Default for FolderConfiguration {
    fn default() -> Self {
        Self::new()
    }
}
