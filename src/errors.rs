use std::path::PathBuf;

use log4rs::config::runtime::ConfigErrors;
use thiserror;

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("Error occured in creating directory {0:?}")]
    CreateDirectory(PathBuf, #[source] std::io::Error),
    #[error("Error occured in removing directory {0:?}")]
    RemoveDirectory(PathBuf, #[source] std::io::Error),
    #[error("Error occured in creating file {0:?}")]
    CreateFile(PathBuf, #[source] std::io::Error),
    #[error("Error occured reading from file {0:?}")]
    ReadFromFile(PathBuf, #[source] std::io::Error),
    #[error("The path {0:?} does not exist")]
    FileDoesNotExist(PathBuf),
    #[error("Failed to canonicalize path")]
    Canonicalize(#[source] std::io::Error),
    #[error("Failed to write to file")]
    WriteToFile(#[source] std::io::Error),
    #[error("Could not access directory")]
    AccessDirectory(#[source] std::io::Error),
    #[error("Failed to set permissions on {0:?}")]
    SetPermissions(PathBuf, #[source] std::io::Error),
    #[error("Environment variable ${0} is not set.")]
    EnvVariableNotSet(String, #[source] std::env::VarError),
    #[error("Failed to convert utf8 array to string")]
    FailedToCreateStringFromUtf8(#[source] std::string::FromUtf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Could not parse version attribute \"{0}\"")]
    InvalidVersion(String),
    #[error("Version {0} is older than the oldest supported version {1}")]
    UnsupportedVersion(i32, i32),
    #[error("Configuration XML is not well formed")]
    MalformedXml(#[source] roxmltree::Error),
    #[error("Root element {0:?} is not a configuration descriptor")]
    UnexpectedRoot(String),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    #[error("No toolchain descriptor named \"{0}\"")]
    UnknownDescriptor(String),
    #[error("Failed to parse toolchain descriptor catalog")]
    FailedToParseCatalog(#[source] toml::de::Error),
    #[error("Failed to persist compiler sets")]
    FailedToPersist(#[source] serde_json::Error),
    #[error("Could not determine a preferences directory")]
    NoPreferencesDirectory,
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Remote host {0} is offline")]
    HostOffline(String),
    #[error("Discovery was cancelled")]
    Cancelled,
    #[error("Malformed compiler set record \"{0}\"")]
    MalformedRecord(String),
    #[error("Remote provider failed: {0}")]
    Provider(String),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("Configuration \"{0}\" refers to toolchain \"{1}\" which is not resolved")]
    UnresolvedToolchain(String, String),
    #[error(transparent)]
    Packaging(#[from] PackagingError),
}

#[derive(Debug, thiserror::Error)]
pub enum PackagingError {
    #[error("No packager registered for package type \"{0}\"")]
    UnknownPackager(String),
    #[error(transparent)]
    Fs(#[from] FsError),
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("Failed to create file appender: {0}")]
    FailedToCreateFileAppender(#[source] std::io::Error),
    #[error("Failed to create logger configuration: {0}")]
    FailedToCreateConfig(#[source] ConfigErrors),
    #[error(transparent)]
    FailedToSetLogger(#[from] log::SetLoggerError),
}

#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum CommandLineError {
    #[error("{0:?} does not contain an nbproject/configurations.xml")]
    NotAProject(PathBuf),
    #[error("Project configuration is broken and cannot be loaded")]
    BrokenConfiguration(#[source] DecodeError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Fs(#[from] FsError),
}
