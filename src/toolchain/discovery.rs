//! Compiler set discovery. Local discovery scans $PATH and the catalog's
//! default locations; remote discovery consumes the line-oriented records a
//! provider ships back from another host.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::errors::DiscoveryError;
use crate::toolchain::descriptor::{Catalog, ToolDescriptor, ToolKind, ToolchainDescriptor};
use crate::toolchain::{CompilerSet, Tool};

/// A source of compiler set records from another host. One record per line,
/// in the wire format `parse_record` understands.
pub trait RemoteProvider {
    fn host(&self) -> &str;
    fn fetch(&mut self, cancel: &AtomicBool) -> Result<Vec<String>, DiscoveryError>;
}

/// One tool binding of a remote record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolBinding {
    pub kind: ToolKind,
    pub name: String,
    /// The record said `name(PATH)`: the tool must be looked up on the
    /// search path instead of the record's directory.
    pub deferred_path_lookup: bool,
}

/// A parsed remote record: `flavor;directory;key=value;...`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilerSetRecord {
    pub flavor: String,
    pub directory: PathBuf,
    pub bindings: Vec<ToolBinding>,
    pub version: Option<String>,
}

/// Parses one record line. Unknown keys are skipped with a log message;
/// a line without flavor and directory is malformed.
pub fn parse_record(line: &str) -> Result<CompilerSetRecord, DiscoveryError> {
    let mut fields = line.split(';');
    let flavor = fields.next().unwrap_or("").trim();
    let directory = fields.next().unwrap_or("").trim();
    if flavor.is_empty() || directory.is_empty() {
        return Err(DiscoveryError::MalformedRecord(line.to_string()));
    }
    let mut record = CompilerSetRecord {
        flavor: flavor.to_string(),
        directory: PathBuf::from(directory),
        bindings: Vec::new(),
        version: None,
    };
    for field in fields {
        let field = field.trim();
        if field.is_empty() {
            continue;
        }
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| DiscoveryError::MalformedRecord(line.to_string()))?;
        if key == "version" {
            record.version = Some(value.to_string());
            continue;
        }
        // The marker may sit on either side: `cxx(PATH)=g++` or `cxx=g++(PATH)`.
        let (key, key_deferred) = match key.strip_suffix("(PATH)") {
            Some(key) => (key, true),
            None => (key, false),
        };
        match ToolKind::from_key(key) {
            Some(kind) => {
                let (name, deferred) = match value.strip_suffix("(PATH)") {
                    Some(name) => (name, true),
                    None => (value, false),
                };
                record.bindings.push(ToolBinding {
                    kind,
                    name: name.to_string(),
                    deferred_path_lookup: deferred || key_deferred,
                });
            }
            None => log::warn!("Unknown tool key \"{}\" in record \"{}\"", key, line),
        }
    }
    Ok(record)
}

/// Turns a parsed record into a compiler set. Deferred bindings are resolved
/// against `search_dirs`; an unresolvable one stays unbound by name.
pub fn resolve_record(
    record: &CompilerSetRecord,
    catalog: &Catalog,
    search_dirs: &[PathBuf],
) -> CompilerSet {
    let descriptor = catalog.find(&record.flavor);
    if descriptor.is_none() {
        log::warn!(
            "Record flavor \"{}\" is not in the catalog, keeping it as-is",
            record.flavor
        );
    }
    let name = descriptor
        .map(|d| d.name.clone())
        .unwrap_or_else(|| record.flavor.clone());
    let mut set = CompilerSet::new(&name, &record.flavor, &record.directory);
    set.auto_detected = true;
    set.link_driver_hint = descriptor.and_then(|d| d.preferred_language.clone());
    for binding in &record.bindings {
        let path = if binding.deferred_path_lookup {
            search_dirs
                .iter()
                .find_map(|dir| executable_in(dir, &binding.name))
                .unwrap_or_default()
        } else {
            record.directory.join(&binding.name)
        };
        let mut tool = Tool::new(binding.kind, &binding.name, &path);
        tool.version = record.version.clone();
        set.tools.push(tool);
    }
    set
}

/// Fetches and resolves every record a remote provider has to offer.
pub fn discover_remote(
    provider: &mut dyn RemoteProvider,
    catalog: &Catalog,
    cancel: &AtomicBool,
) -> Result<Vec<CompilerSet>, DiscoveryError> {
    let lines = provider.fetch(cancel)?;
    let mut sets = Vec::new();
    for line in &lines {
        if cancel.load(Ordering::Relaxed) {
            return Err(DiscoveryError::Cancelled);
        }
        match parse_record(line) {
            Ok(record) => sets.push(resolve_record(&record, catalog, &[])),
            Err(err) => log::warn!("Skipping record from {}: {}", provider.host(), err),
        }
    }
    Ok(sets)
}

/// Scans $PATH and the catalog's default locations for compiler sets. A set
/// is reported for every directory where a toolchain's C or C++ compiler is
/// present; redundant base sets shadowed by a substitute are dropped.
pub fn discover_local(
    catalog: &Catalog,
    cancel: &AtomicBool,
) -> Result<Vec<CompilerSet>, DiscoveryError> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    for toolchain in &catalog.toolchains {
        for location in &toolchain.default_locations {
            dirs.push(PathBuf::from(location));
        }
    }
    dirs.dedup();
    discover_in_directories(catalog, &dirs, cancel)
}

/// The scan itself, over an explicit directory list.
pub fn discover_in_directories(
    catalog: &Catalog,
    dirs: &[PathBuf],
    cancel: &AtomicBool,
) -> Result<Vec<CompilerSet>, DiscoveryError> {
    let mut sets: Vec<CompilerSet> = Vec::new();
    let mut seen: Vec<(String, PathBuf)> = Vec::new();
    for dir in dirs {
        if cancel.load(Ordering::Relaxed) {
            return Err(DiscoveryError::Cancelled);
        }
        if !dir.is_dir() {
            continue;
        }
        for toolchain in &catalog.toolchains {
            if !toolchain.supports_host(std::env::consts::OS) {
                continue;
            }
            if seen.contains(&(toolchain.flavor.clone(), dir.clone())) {
                continue;
            }
            if let Some(set) = probe_toolchain(toolchain, dir) {
                seen.push((toolchain.flavor.clone(), dir.clone()));
                sets.push(set);
            }
        }
    }
    remove_redundant_substitutions(catalog, &mut sets);
    disambiguate_names(&mut sets);
    Ok(sets)
}

/// Builds a set for one toolchain in one directory, if its C or C++
/// compiler is present there.
fn probe_toolchain(toolchain: &ToolchainDescriptor, dir: &Path) -> Option<CompilerSet> {
    let has_compiler = [ToolKind::C, ToolKind::Cpp].iter().any(|kind| {
        toolchain
            .tool(*kind)
            .map_or(false, |tool| find_tool(dir, tool).is_some())
    });
    if !has_compiler {
        return None;
    }
    let mut set = CompilerSet::new(&toolchain.name, &toolchain.flavor, dir);
    set.auto_detected = true;
    set.link_driver_hint = toolchain.preferred_language.clone();
    for kind in ToolKind::ALL {
        if let Some(descriptor) = toolchain.tool(kind) {
            if let Some((name, path)) = find_tool(dir, descriptor) {
                let mut tool = Tool::new(kind, &name, &path);
                tool.version = probe_version(&path, descriptor);
                set.tools.push(tool);
            }
        }
    }
    Some(set)
}

/// Finds the first candidate name present in the directory, trying the
/// plain name and the Windows `.exe` and `.exe.lnk` shapes.
fn find_tool(dir: &Path, descriptor: &ToolDescriptor) -> Option<(String, PathBuf)> {
    for name in &descriptor.names {
        for candidate in [
            name.clone(),
            format!("{}.exe", name),
            format!("{}.exe.lnk", name),
        ] {
            let path = dir.join(&candidate);
            if path.is_file() {
                return Some((name.clone(), path));
            }
        }
    }
    None
}

fn executable_in(dir: &Path, name: &str) -> Option<PathBuf> {
    let path = dir.join(name);
    if path.is_file() {
        return Some(path);
    }
    let exe = dir.join(format!("{}.exe", name));
    if exe.is_file() {
        return Some(exe);
    }
    None
}

/// Asks the tool for its version. Best effort: a tool that cannot be run or
/// prints nothing recognizable reports no version.
fn probe_version(path: &Path, descriptor: &ToolDescriptor) -> Option<String> {
    let flags = descriptor.version_flags.as_deref()?;
    let pattern = descriptor.version_pattern.as_deref()?;
    let output = Command::new(path).args(flags.split_whitespace()).output().ok()?;
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let regex = regex::Regex::new(pattern).ok()?;
    regex
        .captures(&text)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Drops a base set when a substitute for its flavor was found in the same
/// directory. Keeps the substitute.
fn remove_redundant_substitutions(catalog: &Catalog, sets: &mut Vec<CompilerSet>) {
    let shadowed: Vec<(String, PathBuf)> = sets
        .iter()
        .filter_map(|set| {
            catalog
                .find(&set.flavor)
                .and_then(|d| d.substitute_for.clone())
                .map(|base| (base, set.directory.clone()))
        })
        .collect();
    sets.retain(|set| {
        let drop = shadowed
            .iter()
            .any(|(base, dir)| *base == set.flavor && *dir == set.directory);
        if drop {
            log::debug!(
                "Dropping {} in {:?}: shadowed by a substitute",
                set.flavor,
                set.directory
            );
        }
        !drop
    });
}

/// Gives sets of the same flavor distinct names by numbering the later ones.
fn disambiguate_names(sets: &mut [CompilerSet]) {
    for index in 0..sets.len() {
        let duplicates = sets[..index]
            .iter()
            .filter(|other| other.name == sets[index].name)
            .count();
        if duplicates > 0 {
            sets[index].name = format!("{}_{}", sets[index].name, duplicates);
        }
    }
}
