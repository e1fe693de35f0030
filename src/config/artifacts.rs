//! Link dependencies and references to other projects' buildable outputs.

use serde::{Deserialize, Serialize};

/// A reference to another project's buildable output. Used both for the
/// "required projects" list and for project-type library items. Rebuilt from
/// XML, never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeArtifact {
    pub project_location: String,
    pub configuration_type: i32,
    pub configuration_name: String,
    pub active: bool,
    pub build: bool,
    pub working_directory: String,
    pub build_command: String,
    pub clean_command: String,
    pub output: String,
}

impl MakeArtifact {
    pub fn new(project_location: &str, configuration_name: &str) -> Self {
        Self {
            project_location: project_location.to_string(),
            configuration_type: 0,
            configuration_name: configuration_name.to_string(),
            active: false,
            build: true,
            working_directory: project_location.to_string(),
            build_command: "${MAKE} -f Makefile CONF=".to_string() + configuration_name,
            clean_command: "${MAKE} -f Makefile CONF=".to_string()
                + configuration_name
                + " clean",
            output: String::new(),
        }
    }
}

/// A single link dependency. Serialized order is preserved because it is the
/// link order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LibraryItem {
    /// Another buildable project, linked via its make artifact output.
    Project(MakeArtifact),
    /// A well-known standard library, linked by its option string.
    StdLib { name: String, option: String },
    /// A named library resolved through the linker search path (`-lname`).
    Lib(String),
    /// An explicit library file path.
    LibFile(String),
    /// A raw linker flag passed through verbatim.
    Option(String),
}

impl LibraryItem {
    /// The fragment this item contributes to the link command.
    pub fn option_string(&self) -> String {
        match self {
            LibraryItem::Project(artifact) => artifact.output.clone(),
            LibraryItem::StdLib { option, .. } => option.clone(),
            LibraryItem::Lib(name) => format!("-l{}", name),
            LibraryItem::LibFile(path) => path.clone(),
            LibraryItem::Option(option) => option.clone(),
        }
    }

    /// Whether the encoder writes this item into the VCS-visible stream.
    /// Project references carry absolute local paths in their artifacts and
    /// stay shareable anyway; nothing in this sum type is private.
    pub fn shared(&self) -> bool {
        true
    }
}
