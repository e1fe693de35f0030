//! Toolchain resolution: discovering compiler sets on a host, completing
//! them so every tool role is bound, electing a default and caching the
//! result per host.

pub mod descriptor;
pub mod discovery;
pub mod manager;
pub mod registry;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::toolchain::descriptor::ToolKind;

/// One resolved tool of a compiler set. An empty path means the role is
/// unbound; lookups still succeed and the generator can report a precise
/// "tool missing" message instead of panicking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub kind: ToolKind,
    pub name: String,
    pub path: PathBuf,
    pub version: Option<String>,
}

impl Tool {
    pub fn new(kind: ToolKind, name: &str, path: &Path) -> Self {
        Self {
            kind,
            name: name.to_string(),
            path: path.to_path_buf(),
            version: None,
        }
    }

    /// The unbound placeholder for a role no discovery source provided.
    pub fn empty(kind: ToolKind) -> Self {
        Self {
            kind,
            name: String::new(),
            path: PathBuf::new(),
            version: None,
        }
    }

    pub fn is_bound(&self) -> bool {
        !self.path.as_os_str().is_empty()
    }

    pub fn semantic_version(&self) -> Option<semver::Version> {
        let raw = self.version.as_deref()?;
        // Two-component versions are common; pad to parse.
        let padded = if raw.matches('.').count() == 1 {
            format!("{}.0", raw)
        } else {
            raw.to_string()
        };
        semver::Version::parse(&padded).ok()
    }
}

/// A coherent set of tools found in one directory, tagged with the flavor of
/// the toolchain family it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSet {
    pub name: String,
    pub flavor: String,
    pub directory: PathBuf,
    pub tools: Vec<Tool>,
    /// Tool key of the preferred link driver, from the descriptor. Wins
    /// over the source-scan heuristic when set.
    pub link_driver_hint: Option<String>,
    pub auto_detected: bool,
    pub default: bool,
}

impl CompilerSet {
    pub fn new(name: &str, flavor: &str, directory: &Path) -> Self {
        Self {
            name: name.to_string(),
            flavor: flavor.to_string(),
            directory: directory.to_path_buf(),
            tools: Vec::new(),
            link_driver_hint: None,
            auto_detected: false,
            default: false,
        }
    }

    /// Total over all kinds once the set has been completed.
    pub fn tool(&self, kind: ToolKind) -> Option<&Tool> {
        self.tools.iter().find(|t| t.kind == kind)
    }

    pub fn tool_mut(&mut self, kind: ToolKind) -> Option<&mut Tool> {
        self.tools.iter_mut().find(|t| t.kind == kind)
    }

    /// The reference stored in a configuration's compiler-set setting.
    pub fn reference(&self) -> String {
        format!("{}|{}", self.flavor, self.name)
    }

    /// Matches the stored reference forms: "flavor|name", plain name, or
    /// "default".
    pub fn matches_reference(&self, reference: &str) -> bool {
        if reference == "default" {
            return self.default;
        }
        match reference.split_once('|') {
            Some((flavor, name)) => self.flavor == flavor && self.name == name,
            None => self.name == reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_tool_is_unbound() {
        let tool = Tool::empty(ToolKind::Fortran);
        assert!(!tool.is_bound());
        assert_eq!(tool.kind, ToolKind::Fortran);
    }

    #[test]
    fn two_component_versions_parse_semantically() {
        let mut tool = Tool::new(ToolKind::C, "cc", Path::new("/opt/bin/cc"));
        tool.version = Some("5.15".to_string());
        assert_eq!(tool.semantic_version(), Some(semver::Version::new(5, 15, 0)));
        tool.version = Some("11.4.0".to_string());
        assert_eq!(
            tool.semantic_version(),
            Some(semver::Version::new(11, 4, 0))
        );
    }

    #[test]
    fn reference_forms_are_matched() {
        let mut set = CompilerSet::new("GNU", "GNU", Path::new("/usr/bin"));
        assert!(set.matches_reference("GNU|GNU"));
        assert!(set.matches_reference("GNU"));
        assert!(!set.matches_reference("LLVM|LLVM"));
        assert!(!set.matches_reference("default"));
        set.default = true;
        assert!(set.matches_reference("default"));
    }
}
