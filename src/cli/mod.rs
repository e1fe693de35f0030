//! Command implementations behind the clap surface.

pub mod command_line;

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cli::command_line::{Command, CommandLine, GenerateOpts, ToolchainsOpts, ValidateOpts};
use crate::codec;
use crate::errors::{CommandLineError, DiscoveryError};
use crate::executor::RequestProcessor;
use crate::output::Output;
use crate::toolchain::descriptor::{builtin_catalog, ToolKind};
use crate::toolchain::discovery::RemoteProvider;
use crate::toolchain::manager::CompilerSetManager;
use crate::toolchain::registry::ToolchainRegistry;
use crate::utility;

pub fn run(command_line: CommandLine, output: &Output) -> Result<(), CommandLineError> {
    match command_line.subcommand {
        Command::Generate(opts) => generate(&opts, output),
        Command::Toolchains(opts) => toolchains(&opts, output),
        Command::Validate(opts) => validate(&opts, output),
    }
}

fn project_dir(dir: &Path) -> Result<PathBuf, CommandLineError> {
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(crate::errors::FsError::Canonicalize)?
            .join(dir)
    };
    if !dir.join(codec::CONFIGURATIONS_XML).exists() {
        return Err(CommandLineError::NotAProject(dir));
    }
    Ok(dir)
}

fn generate(opts: &GenerateOpts, output: &Output) -> Result<(), CommandLineError> {
    let base_dir = project_dir(&opts.project_dir)?;

    // Toolchain discovery runs on the request processor while the
    // descriptor is decoded here; the descriptor itself is not Send.
    let processor = RequestProcessor::new();
    let registry = Arc::new(ToolchainRegistry::new(builtin_catalog().clone()));
    let cancel = Arc::new(AtomicBool::new(false));
    let discovery = {
        let registry = Arc::clone(&registry);
        let cancel = Arc::clone(&cancel);
        processor.submit(move || registry.local(&cancel))
    };

    let descriptor =
        codec::load(&base_dir).map_err(CommandLineError::BrokenConfiguration)?;
    let manager = discovery.wait()?;
    let manager = manager.lock().unwrap_or_else(|e| e.into_inner());

    let written = crate::generator::generate(&descriptor, &manager)?;
    for path in &written {
        let shown = path.strip_prefix(&base_dir).unwrap_or(path);
        output.status(&format!("wrote {}", shown.display()));
    }
    output.status(&format!(
        "generated {} build files for {}",
        written.len(),
        descriptor.project_name()
    ));

    if opts.save {
        codec::save(&descriptor)?;
        output.status("project configuration saved at the current version");
    } else if descriptor.modified {
        output.warning(
            "project configuration uses a deprecated format version; \
             run with --save to upgrade it",
        );
    }
    Ok(())
}

/// Remote provider fed from a file of compiler set records, one per line.
struct FileRecordProvider {
    host: String,
    path: PathBuf,
}

impl RemoteProvider for FileRecordProvider {
    fn host(&self) -> &str {
        &self.host
    }

    fn fetch(&mut self, _cancel: &AtomicBool) -> Result<Vec<String>, DiscoveryError> {
        let text = utility::read_file(&self.path)
            .map_err(|err| DiscoveryError::Provider(err.to_string()))?;
        Ok(text
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }
}

fn toolchains(opts: &ToolchainsOpts, output: &Output) -> Result<(), CommandLineError> {
    let registry = Arc::new(ToolchainRegistry::new(builtin_catalog().clone()));
    if opts.refresh {
        registry.invalidate(&opts.host);
        output.status(&format!("discarded cached compiler sets for {}", opts.host));
    }

    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message(format!("resolving compiler sets on {}", opts.host));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let processor = RequestProcessor::new();
    let manager = {
        let registry = Arc::clone(&registry);
        let cancel = Arc::new(AtomicBool::new(false));
        let records = opts.records.clone();
        let host = opts.host.clone();
        processor
            .submit(move || -> Result<Arc<Mutex<CompilerSetManager>>, DiscoveryError> {
                match records {
                    Some(path) => {
                        let mut provider = FileRecordProvider { host, path };
                        registry.remote(&mut provider, &cancel)
                    }
                    None => registry.local(&cancel),
                }
            })
            .wait()
    };
    spinner.finish_and_clear();

    let manager = manager?;
    let manager = manager.lock().unwrap_or_else(|e| e.into_inner());
    output.status(&format!(
        "{} compiler set(s) on {}",
        manager.sets().len(),
        manager.host()
    ));
    for set in manager.sets() {
        let marker = if set.default { " (default)" } else { "" };
        output.status(&format!(
            "{} [{}] in {}{}",
            set.name,
            set.flavor,
            set.directory.display(),
            marker
        ));
        for kind in ToolKind::ALL {
            if let Some(tool) = set.tool(kind).filter(|t| t.is_bound()) {
                let version = tool
                    .version
                    .as_deref()
                    .map(|v| format!(" ({})", v))
                    .unwrap_or_default();
                output.status(&format!(
                    "  {}: {}{}",
                    kind.key(),
                    tool.path.display(),
                    version
                ));
            }
        }
    }
    Ok(())
}

fn validate(opts: &ValidateOpts, output: &Output) -> Result<(), CommandLineError> {
    let base_dir = project_dir(&opts.project_dir)?;
    let descriptor =
        codec::load(&base_dir).map_err(CommandLineError::BrokenConfiguration)?;

    output.status(&format!(
        "{}: format version {}, {} configuration(s), {} item(s)",
        descriptor.project_name(),
        descriptor.version,
        descriptor.confs.len(),
        descriptor.sorted_items().len()
    ));
    for conf in &descriptor.confs {
        let active = match descriptor.active_configuration() {
            Some(a) if a.name == conf.name => " (active)",
            _ => "",
        };
        output.status(&format!(
            "  {} [{:?}] toolchain {}{}",
            conf.name,
            conf.configuration_type,
            conf.compiler_set.value(),
            active
        ));
    }
    if descriptor.modified {
        output.warning(
            "configuration was migrated from a deprecated format version; \
             generate with --save to upgrade it",
        );
    } else {
        output.status("configuration is up to date");
    }
    Ok(())
}
