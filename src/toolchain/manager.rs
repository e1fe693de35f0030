//! Per-host compiler set management: runs discovery once, completes every
//! set so tool lookups are total, and elects a default set.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use crate::errors::DiscoveryError;
use crate::toolchain::descriptor::{builtin_catalog, Catalog, ToolKind};
use crate::toolchain::discovery::{self, RemoteProvider};
use crate::toolchain::{CompilerSet, Tool};

/// Environment variable naming the default compiler set.
pub const DEFAULT_TOOLCHAIN_ENV: &str = "MAKEPROJECT_DEFAULT_TOOLCHAIN";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerState {
    Uninitialized,
    Pending,
    Complete,
}

pub struct CompilerSetManager {
    host: String,
    state: ManagerState,
    sets: Vec<CompilerSet>,
}

impl CompilerSetManager {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            state: ManagerState::Uninitialized,
            sets: Vec::new(),
        }
    }

    /// A manager whose sets are already known, e.g. restored from the
    /// preferences cache.
    pub fn from_sets(host: &str, sets: Vec<CompilerSet>) -> Self {
        let mut manager = Self::new(host);
        manager.sets = sets;
        // Cached sets already went through a search when they were first
        // discovered; only the borrowing passes run again.
        manager.finish(builtin_catalog(), &[]);
        manager
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn sets(&self) -> &[CompilerSet] {
        &self.sets
    }

    pub fn find(&self, reference: &str) -> Option<&CompilerSet> {
        self.sets.iter().find(|s| s.matches_reference(reference))
    }

    pub fn default_set(&self) -> Option<&CompilerSet> {
        self.sets.iter().find(|s| s.default)
    }

    /// Runs local discovery. The manager is Pending for the duration and
    /// ends up Complete or back at Uninitialized, never stuck in between.
    pub fn initialize_local(
        &mut self,
        catalog: &Catalog,
        cancel: &AtomicBool,
    ) -> Result<(), DiscoveryError> {
        self.initialize_with(catalog, || discovery::discover_local(catalog, cancel))
    }

    pub fn initialize_remote(
        &mut self,
        provider: &mut dyn RemoteProvider,
        catalog: &Catalog,
        cancel: &AtomicBool,
    ) -> Result<(), DiscoveryError> {
        self.initialize_with(catalog, || discovery::discover_remote(provider, catalog, cancel))
    }

    fn initialize_with<F>(&mut self, catalog: &Catalog, discover: F) -> Result<(), DiscoveryError>
    where
        F: FnOnce() -> Result<Vec<CompilerSet>, DiscoveryError>,
    {
        self.state = ManagerState::Pending;
        match discover() {
            Ok(sets) => {
                self.sets = sets;
                self.finish(catalog, &path_search_directories());
                Ok(())
            }
            Err(err) => {
                self.state = ManagerState::Uninitialized;
                self.sets.clear();
                Err(err)
            }
        }
    }

    fn finish(&mut self, catalog: &Catalog, search_dirs: &[PathBuf]) {
        self.complete_compiler_sets(catalog, search_dirs);
        self.elect_default();
        self.state = ManagerState::Complete;
    }

    /// Guarantees every set binds every tool kind and that at least one set
    /// exists. A missing tool is searched for on the search directories
    /// first, then borrowed from a set of the same family, then from a set
    /// of the same flavor, and only then left as an unbound placeholder.
    fn complete_compiler_sets(&mut self, catalog: &Catalog, search_dirs: &[PathBuf]) {
        if self.sets.is_empty() {
            log::warn!("No compiler sets found on {}", self.host);
            self.sets.push(CompilerSet::new(
                "no compilers found",
                "unknown",
                std::path::Path::new(""),
            ));
        }
        for index in 0..self.sets.len() {
            for kind in ToolKind::ALL {
                if self.sets[index].tool(kind).is_some() {
                    continue;
                }
                let tool = self
                    .search_tool(index, kind, catalog, search_dirs)
                    .or_else(|| self.borrow_tool(index, kind, catalog))
                    .unwrap_or_else(|| Tool::empty(kind));
                self.sets[index].tools.push(tool);
            }
        }
    }

    fn search_tool(
        &self,
        index: usize,
        kind: ToolKind,
        catalog: &Catalog,
        search_dirs: &[PathBuf],
    ) -> Option<Tool> {
        let descriptor = catalog.find(&self.sets[index].flavor)?.tool(kind)?;
        for dir in search_dirs {
            for name in &descriptor.names {
                let path = dir.join(name);
                if path.is_file() {
                    return Some(Tool::new(kind, name, &path));
                }
            }
        }
        None
    }

    fn borrow_tool(&self, index: usize, kind: ToolKind, catalog: &Catalog) -> Option<Tool> {
        let flavor = self.sets[index].flavor.clone();
        if let Some(family) = catalog.find(&flavor).map(|d| d.family.clone()) {
            for (i, other) in self.sets.iter().enumerate() {
                if i == index {
                    continue;
                }
                if catalog
                    .find(&other.flavor)
                    .map_or(false, |d| d.family == family)
                {
                    if let Some(tool) = other.tool(kind).filter(|t| t.is_bound()) {
                        return Some(tool.clone());
                    }
                }
            }
        }
        for (i, other) in self.sets.iter().enumerate() {
            if i == index || other.flavor != flavor {
                continue;
            }
            if let Some(tool) = other.tool(kind).filter(|t| t.is_bound()) {
                return Some(tool.clone());
            }
        }
        None
    }

    /// Election order: the environment override, then a studio set, then
    /// the first set found. Deterministic for a given set list.
    fn elect_default(&mut self) {
        for set in &mut self.sets {
            set.default = false;
        }
        let index = std::env::var(DEFAULT_TOOLCHAIN_ENV)
            .ok()
            .and_then(|wanted| {
                self.sets
                    .iter()
                    .position(|s| s.matches_reference(&wanted) || s.flavor == wanted)
            })
            .or_else(|| {
                self.sets
                    .iter()
                    .position(|s| s.flavor == "OracleSolarisStudio")
            })
            .unwrap_or(0);
        if let Some(set) = self.sets.get_mut(index) {
            set.default = true;
        }
    }
}

/// $PATH plus the MSYS bin directory when one is configured.
fn path_search_directories() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default();
    if let Some(msys) = std::env::var_os("MSYS") {
        dirs.push(PathBuf::from(msys).join("bin"));
    }
    dirs
}
