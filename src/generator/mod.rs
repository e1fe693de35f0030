//! Makefile and packaging-script generation. Everything is derived from the
//! descriptor and the resolved compiler sets; running generation twice over
//! an unchanged project writes byte-identical files.

pub mod makefile;
pub mod packaging;

use std::path::PathBuf;

use crate::config::ConfigurationDescriptor;
use crate::errors::GeneratorError;
use crate::toolchain::manager::CompilerSetManager;

pub const BUILD_DIR: &str = "build";
pub const DIST_DIR: &str = "dist";

/// Generates the whole build harness for a project: the top-level makefile,
/// the implementation makefile, one makefile per configuration, the shared
/// variables file and the packaging scripts.
pub fn generate(
    descriptor: &ConfigurationDescriptor,
    manager: &CompilerSetManager,
) -> Result<Vec<PathBuf>, GeneratorError> {
    let mut written = Vec::new();
    let generator = makefile::MakefileGenerator::new(descriptor, manager);
    written.extend(generator.generate()?);
    for conf in &descriptor.confs {
        if let Some(path) = packaging::generate_script(descriptor, conf)? {
            written.push(path);
        }
    }
    log::info!(
        "Generated {} build files for {}",
        written.len(),
        descriptor.project_name()
    );
    Ok(written)
}
