use anyhow::Context;
use clap::Parser;

use makeproject::cli::command_line::CommandLine;
use makeproject::logger::Logger;
use makeproject::output::Output;

fn main() -> anyhow::Result<()> {
    let command_line = CommandLine::parse();
    let log_directory = std::env::current_dir().context("Could not locate current directory")?;
    let _logger =
        Logger::init(&log_directory, log::LevelFilter::Debug).context("Failed to set up logging")?;
    let output = Output::new();

    if let Err(err) = makeproject::cli::run(command_line, &output) {
        output.error(&err.to_string());
        std::process::exit(1);
    }
    Ok(())
}
