use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "makeproject",
    version,
    about = "Generates GNU Make build harnesses and packaging scripts for \
             C/C++ projects from their versioned project configuration."
)]
pub struct CommandLine {
    #[command(subcommand)]
    pub subcommand: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate makefiles and packaging scripts for a project.
    Generate(GenerateOpts),
    /// Resolve and list the compiler sets available on a host.
    Toolchains(ToolchainsOpts),
    /// Load a project configuration and report problems without generating.
    Validate(ValidateOpts),
}

#[derive(Args, Debug)]
pub struct GenerateOpts {
    /// Project directory containing nbproject/configurations.xml.
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,
    /// Write the (possibly migrated) configuration back at the current
    /// format version after generating.
    #[arg(long)]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct ToolchainsOpts {
    /// Host whose compiler sets to resolve.
    #[arg(long, default_value = "localhost")]
    pub host: String,
    /// File with one compiler set record per line, used instead of running
    /// discovery on this machine. Requires --host.
    #[arg(long)]
    pub records: Option<PathBuf>,
    /// Discard cached compiler sets for the host and discover again.
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Args, Debug)]
pub struct ValidateOpts {
    /// Project directory containing nbproject/configurations.xml.
    #[arg(default_value = ".")]
    pub project_dir: PathBuf,
}
