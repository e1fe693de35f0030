//! The versioned configuration codec. A project is persisted as two XML
//! streams under `nbproject/`: a shared one meant for version control and a
//! private one with local state. Decode accepts every version back to the
//! oldest supported one and lifts old documents to the current semantics
//! through the migration table; encode always writes the current version.

pub mod decoder;
pub mod elements;
pub mod encoder;
pub mod interner;
pub mod migrations;
pub mod writer;

use std::path::Path;

use crate::codec::decoder::Decoder;
use crate::config::{ConfigurationDescriptor, DescriptorState};
use crate::errors::{DecodeError, FsError};
use crate::utility;

pub const CURRENT_VERSION: i32 = 100;
pub const OLDEST_SUPPORTED_VERSION: i32 = 29;

/// First version where required-tool flags were serialized.
pub const VERSION_WITH_REQUIRED_TOOLS: i32 = 42;
/// First version where build commands go through the ${MAKE} macro.
pub const VERSION_WITH_MAKE_MACRO: i32 = 76;
/// First version with the per-configuration flags dictionary.
pub const VERSION_WITH_FLAGS_DICTIONARY: i32 = 82;
/// First version where an item absent from a configuration is excluded
/// rather than included.
pub const VERSION_WITH_INVERTED_SERIALIZATION: i32 = 88;
/// First version where header files live in the include-file list.
pub const VERSION_WITH_INCLUDE_FILE_KIND: i32 = 93;
/// Documents older than this are rewritten on the next save.
pub const VERSION_WITH_STABLE_ENCODING: i32 = 95;

pub const PROJECT_DIR: &str = "nbproject";
pub const CONFIGURATIONS_XML: &str = "nbproject/configurations.xml";
pub const PRIVATE_CONFIGURATIONS_XML: &str = "nbproject/private/configurations.xml";

/// Decodes a descriptor from in-memory streams and runs the migrations.
pub fn decode(
    public_xml: &str,
    private_xml: Option<&str>,
    base_dir: &Path,
    relative_offset: Option<&str>,
) -> Result<ConfigurationDescriptor, DecodeError> {
    let (mut descriptor, aux) =
        Decoder::new(relative_offset).decode(public_xml, private_xml, base_dir)?;
    migrations::run(&mut descriptor, &aux);
    descriptor.state = DescriptorState::Ok;
    Ok(descriptor)
}

/// Loads a project from `nbproject/` under the given directory. A missing
/// private stream is normal; a missing public stream is an error.
pub fn load(base_dir: &Path) -> Result<ConfigurationDescriptor, DecodeError> {
    let public_path = base_dir.join(CONFIGURATIONS_XML);
    if !public_path.exists() {
        return Err(DecodeError::Fs(FsError::FileDoesNotExist(public_path)));
    }
    let public_xml = utility::read_file(&public_path)?;
    let private_path = base_dir.join(PRIVATE_CONFIGURATIONS_XML);
    let private_xml = if private_path.exists() {
        Some(utility::read_file(&private_path)?)
    } else {
        None
    };
    decode(&public_xml, private_xml.as_deref(), base_dir, None)
}

/// Writes both streams under `nbproject/`, creating directories as needed.
pub fn save(descriptor: &ConfigurationDescriptor) -> Result<(), FsError> {
    let public_path = descriptor.base_dir.join(CONFIGURATIONS_XML);
    utility::write_file(&public_path, &encoder::encode_public(descriptor))?;
    let private_path = descriptor.base_dir.join(PRIVATE_CONFIGURATIONS_XML);
    utility::write_file(&private_path, &encoder::encode_private(descriptor))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use crate::config::ConfigurationType;

    #[test]
    fn save_then_load_preserves_the_model() {
        let dir = TempDir::new("codec").unwrap();
        let mut descriptor = ConfigurationDescriptor::new(dir.path());
        descriptor
            .logical_folders
            .add_item(std::rc::Rc::from("main.c"));
        let mut conf =
            crate::config::MakeConfiguration::new("Debug", ConfigurationType::Application);
        conf.c_compiler.preprocessor_definitions.add("DEBUG");
        descriptor.confs.push(conf);
        descriptor.active = Some(0);
        save(&descriptor).unwrap();

        let loaded = load(dir.path()).unwrap();
        assert_eq!(loaded.version, CURRENT_VERSION);
        assert_eq!(loaded.confs.len(), 1);
        assert_eq!(
            loaded.confs[0].c_compiler.preprocessor_definitions.value(),
            &["DEBUG"]
        );
        assert_eq!(loaded.active, Some(0));
        assert!(!loaded.modified);
    }

    #[test]
    fn loading_without_a_public_stream_fails() {
        let dir = TempDir::new("codec").unwrap();
        assert!(matches!(
            load(dir.path()),
            Err(DecodeError::Fs(FsError::FileDoesNotExist(_)))
        ));
    }
}
