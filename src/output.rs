//! Terminal output with a consistent prefix and severity colors. Everything
//! printed here is mirrored into the log file.

use colored::Colorize;

const PREFIX: &str = "makeproject";

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn status(&self, message: &str) {
        log::info!("{}", message);
        println!("{}", format!("{}: {}", PREFIX, message).white());
    }

    pub fn warning(&self, message: &str) {
        log::warn!("{}", message);
        println!("{}", format!("{}: {}", PREFIX, message).yellow());
    }

    pub fn error(&self, message: &str) {
        log::error!("{}", message);
        eprintln!("{}", format!("{}: {}", PREFIX, message).red());
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
