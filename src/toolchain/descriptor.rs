//! Toolchain descriptors: declarative knowledge about toolchain families,
//! parsed from an embedded TOML catalog. Discovery matches what it finds on
//! disk against these.

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::errors::ToolchainError;

/// Every tool role a compiler set can bind. The order is the completion
/// order: auto-completion walks this list and fills every missing role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, Deserialize)]
pub enum ToolKind {
    C,
    Cpp,
    Fortran,
    Assembler,
    Make,
    Debugger,
    QMake,
    CMake,
}

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::C,
        ToolKind::Cpp,
        ToolKind::Fortran,
        ToolKind::Assembler,
        ToolKind::Make,
        ToolKind::Debugger,
        ToolKind::QMake,
        ToolKind::CMake,
    ];

    /// The key used in catalog sections and remote records.
    pub fn key(&self) -> &'static str {
        match self {
            ToolKind::C => "c",
            ToolKind::Cpp => "cxx",
            ToolKind::Fortran => "fortran",
            ToolKind::Assembler => "assembler",
            ToolKind::Make => "make",
            ToolKind::Debugger => "debugger",
            ToolKind::QMake => "qmake",
            ToolKind::CMake => "cmake",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        ToolKind::ALL.iter().copied().find(|k| k.key() == key)
    }
}

/// How to recognize one tool of a toolchain: candidate executable names and
/// how to coax a version string out of it.
#[derive(Clone, Debug, Deserialize)]
pub struct ToolDescriptor {
    pub names: Vec<String>,
    pub version_flags: Option<String>,
    pub version_pattern: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ToolchainDescriptor {
    pub name: String,
    pub flavor: String,
    pub family: String,
    /// Operating systems this toolchain exists on; empty means all.
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Directories probed in addition to $PATH.
    #[serde(default)]
    pub default_locations: Vec<String>,
    /// Flavor this toolchain stands in for. When both are found in the same
    /// directory the substitute wins and the base set is dropped.
    pub substitute_for: Option<String>,
    /// Tool key of the link driver this family prefers, overriding the
    /// source-scan heuristic.
    pub preferred_language: Option<String>,
    pub c: Option<ToolDescriptor>,
    pub cxx: Option<ToolDescriptor>,
    pub fortran: Option<ToolDescriptor>,
    pub assembler: Option<ToolDescriptor>,
    pub make: Option<ToolDescriptor>,
    pub debugger: Option<ToolDescriptor>,
    pub qmake: Option<ToolDescriptor>,
    pub cmake: Option<ToolDescriptor>,
}

impl ToolchainDescriptor {
    pub fn supports_host(&self, os: &str) -> bool {
        self.platforms.is_empty() || self.platforms.iter().any(|p| p == os)
    }

    pub fn tool(&self, kind: ToolKind) -> Option<&ToolDescriptor> {
        match kind {
            ToolKind::C => self.c.as_ref(),
            ToolKind::Cpp => self.cxx.as_ref(),
            ToolKind::Fortran => self.fortran.as_ref(),
            ToolKind::Assembler => self.assembler.as_ref(),
            ToolKind::Make => self.make.as_ref(),
            ToolKind::Debugger => self.debugger.as_ref(),
            ToolKind::QMake => self.qmake.as_ref(),
            ToolKind::CMake => self.cmake.as_ref(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Catalog {
    #[serde(rename = "toolchain")]
    pub toolchains: Vec<ToolchainDescriptor>,
}

impl Catalog {
    pub fn find(&self, flavor: &str) -> Option<&ToolchainDescriptor> {
        self.toolchains.iter().find(|t| t.flavor == flavor)
    }
}

pub fn parse_catalog(toml_text: &str) -> Result<Catalog, ToolchainError> {
    toml::from_str(toml_text).map_err(ToolchainError::FailedToParseCatalog)
}

static BUILTIN: Lazy<Catalog> = Lazy::new(|| {
    parse_catalog(include_str!("descriptors.toml"))
        .expect("embedded toolchain catalog must parse")
});

/// The catalog compiled into the binary. Callers that want a custom catalog
/// pass their own through the registry instead.
pub fn builtin_catalog() -> &'static Catalog {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_catalog_parses_and_knows_the_major_families() {
        let catalog = builtin_catalog();
        assert!(catalog.find("GNU").is_some());
        assert!(catalog.find("LLVM").is_some());
        assert!(catalog.find("OracleSolarisStudio").is_some());
        assert!(catalog.find("MinGW").is_some());
    }

    #[test]
    fn llvm_substitutes_for_gnu() {
        let llvm = builtin_catalog().find("LLVM").unwrap();
        assert_eq!(llvm.substitute_for.as_deref(), Some("GNU"));
        assert_eq!(llvm.family, "GNU");
    }

    #[test]
    fn tool_kind_keys_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(ToolKind::from_key("linker"), None);
    }

    #[test]
    fn gnu_descriptor_exposes_its_c_tool() {
        let gnu = builtin_catalog().find("GNU").unwrap();
        let c = gnu.tool(ToolKind::C).unwrap();
        assert!(c.names.contains(&"gcc".to_string()));
        assert_eq!(c.version_flags.as_deref(), Some("--version"));
    }
}
