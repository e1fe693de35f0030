//! File logging. Every run truncates and rewrites one log file in the
//! directory the tool was invoked from, so a failed run always leaves a
//! fresh trace next to the project.

use std::path::{Path, PathBuf};

use crate::errors::LoggerError;

pub const LOG_FILE_NAME: &str = "makeproject.log";

const LOG_PATTERN: &str = r"[{d(%Y-%m-%d %H:%M:%S)}] [{l}] [\({t}\)]  - {m}{n}";

pub struct Logger {
    _handle: log4rs::Handle,
    path: PathBuf,
}

impl Logger {
    pub fn init(log_directory: &Path, log_level: log::LevelFilter) -> Result<Logger, LoggerError> {
        let path = log_directory.join(LOG_FILE_NAME);
        let appender = log4rs::append::file::FileAppender::builder()
            .encoder(Box::new(log4rs::encode::pattern::PatternEncoder::new(
                LOG_PATTERN,
            )))
            .append(false)
            .build(&path)
            .map_err(LoggerError::FailedToCreateFileAppender)?;

        let config = log4rs::Config::builder()
            .appender(log4rs::config::Appender::builder().build("logfile", Box::new(appender)))
            .build(
                log4rs::config::Root::builder()
                    .appender("logfile")
                    .build(log_level),
            )
            .map_err(LoggerError::FailedToCreateConfig)?;
        let _handle = log4rs::init_config(config)?;

        Ok(Self { _handle, path })
    }

    /// Where this run is logging to.
    pub fn path(&self) -> PathBuf {
        self.path.to_owned()
    }
}
