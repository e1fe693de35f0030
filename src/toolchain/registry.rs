//! Host-keyed registry of compiler set managers. The registry hands out one
//! shared manager per host and makes concurrent callers wait for a single
//! in-flight discovery instead of racing their own. Resolved sets are
//! persisted so later sessions skip discovery entirely.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use crate::errors::{DiscoveryError, ToolchainError};
use crate::toolchain::descriptor::Catalog;
use crate::toolchain::discovery::RemoteProvider;
use crate::toolchain::manager::{CompilerSetManager, ManagerState};
use crate::toolchain::CompilerSet;
use crate::utility;

pub const LOCALHOST: &str = "localhost";

pub struct ToolchainRegistry {
    catalog: Catalog,
    // Master lock guards the map; each entry has its own lock so one host's
    // discovery does not block lookups for another.
    entries: Mutex<HashMap<String, Arc<Mutex<CompilerSetManager>>>>,
    preferences_path: Option<PathBuf>,
}

impl ToolchainRegistry {
    pub fn new(catalog: Catalog) -> Self {
        let preferences_path = home::home_dir()
            .map(|home| home.join(".makeproject").join("toolchains.json"));
        Self::with_preferences_path(catalog, preferences_path)
    }

    pub fn with_preferences_path(catalog: Catalog, preferences_path: Option<PathBuf>) -> Self {
        Self {
            catalog,
            entries: Mutex::new(HashMap::new()),
            preferences_path,
        }
    }

    fn entry(&self, host: &str) -> Arc<Mutex<CompilerSetManager>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            entries
                .entry(host.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(CompilerSetManager::new(host)))),
        )
    }

    /// The local manager, discovered on first use. Persisted sets are
    /// preferred over a fresh scan.
    pub fn local(
        &self,
        cancel: &AtomicBool,
    ) -> Result<Arc<Mutex<CompilerSetManager>>, DiscoveryError> {
        let entry = self.entry(LOCALHOST);
        {
            let mut manager = entry.lock().unwrap_or_else(|e| e.into_inner());
            if manager.state() != ManagerState::Complete {
                if let Some(sets) = self.load_persisted(LOCALHOST) {
                    *manager = CompilerSetManager::from_sets(LOCALHOST, sets);
                } else {
                    manager.initialize_local(&self.catalog, cancel)?;
                    self.persist(LOCALHOST, manager.sets());
                }
            }
        }
        Ok(entry)
    }

    /// The manager for a remote host, populated through the provider on
    /// first use.
    pub fn remote(
        &self,
        provider: &mut dyn RemoteProvider,
        cancel: &AtomicBool,
    ) -> Result<Arc<Mutex<CompilerSetManager>>, DiscoveryError> {
        let entry = self.entry(provider.host());
        {
            let mut manager = entry.lock().unwrap_or_else(|e| e.into_inner());
            if manager.state() != ManagerState::Complete {
                let host = provider.host().to_string();
                if let Some(sets) = self.load_persisted(&host) {
                    *manager = CompilerSetManager::from_sets(&host, sets);
                } else {
                    manager.initialize_remote(provider, &self.catalog, cancel)?;
                    self.persist(&host, manager.sets());
                }
            }
        }
        Ok(entry)
    }

    /// Drops the cached manager and the persisted sets for a host, so the
    /// next request discovers from scratch.
    pub fn invalidate(&self, host: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(host);
        drop(entries);
        if let Ok(mut persisted) = self.read_preferences() {
            if persisted.remove(host).is_some() {
                if let Err(err) = self.write_preferences(&persisted) {
                    log::error!("Failed to update toolchain preferences: {}", err);
                }
            }
        }
    }

    fn load_persisted(&self, host: &str) -> Option<Vec<CompilerSet>> {
        match self.read_preferences() {
            Ok(mut persisted) => persisted.remove(host),
            Err(err) => {
                log::warn!("Ignoring unreadable toolchain preferences: {}", err);
                None
            }
        }
    }

    fn persist(&self, host: &str, sets: &[CompilerSet]) {
        let mut persisted = self.read_preferences().unwrap_or_default();
        persisted.insert(host.to_string(), sets.to_vec());
        if let Err(err) = self.write_preferences(&persisted) {
            log::error!("Failed to persist compiler sets for {}: {}", host, err);
        }
    }

    fn read_preferences(&self) -> Result<HashMap<String, Vec<CompilerSet>>, ToolchainError> {
        let path = match &self.preferences_path {
            Some(path) if path.exists() => path,
            _ => return Ok(HashMap::new()),
        };
        let text = utility::read_file(path)?;
        serde_json::from_str(&text).map_err(ToolchainError::FailedToPersist)
    }

    fn write_preferences(
        &self,
        persisted: &HashMap<String, Vec<CompilerSet>>,
    ) -> Result<(), ToolchainError> {
        let path = self
            .preferences_path
            .as_ref()
            .ok_or(ToolchainError::NoPreferencesDirectory)?;
        let text =
            serde_json::to_string_pretty(persisted).map_err(ToolchainError::FailedToPersist)?;
        utility::write_file(path, &text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use pretty_assertions::assert_eq;
    use tempdir::TempDir;

    use crate::tests::EnvLock;
    use crate::toolchain::descriptor::{builtin_catalog, ToolKind};
    use crate::toolchain::Tool;

    struct CountingProvider {
        host: String,
        fetches: usize,
    }

    impl RemoteProvider for CountingProvider {
        fn host(&self) -> &str {
            &self.host
        }
        fn fetch(&mut self, _cancel: &AtomicBool) -> Result<Vec<String>, DiscoveryError> {
            self.fetches += 1;
            Ok(vec!["GNU;/usr/bin;c=gcc;cxx=g++".to_string()])
        }
    }

    fn registry(dir: &TempDir) -> ToolchainRegistry {
        ToolchainRegistry::with_preferences_path(
            builtin_catalog().clone(),
            Some(dir.path().join("toolchains.json")),
        )
    }

    #[test]
    fn remote_discovery_runs_once_per_host() {
        let _lock = EnvLock::new();
        let dir = TempDir::new("registry").unwrap();
        let registry = registry(&dir);
        let mut provider = CountingProvider {
            host: "build-host".to_string(),
            fetches: 0,
        };
        let cancel = AtomicBool::new(false);
        registry.remote(&mut provider, &cancel).unwrap();
        registry.remote(&mut provider, &cancel).unwrap();
        assert_eq!(provider.fetches, 1);
    }

    #[test]
    fn invalidation_forces_a_new_discovery() {
        let _lock = EnvLock::new();
        let dir = TempDir::new("registry").unwrap();
        let registry = registry(&dir);
        let mut provider = CountingProvider {
            host: "build-host".to_string(),
            fetches: 0,
        };
        let cancel = AtomicBool::new(false);
        registry.remote(&mut provider, &cancel).unwrap();
        registry.invalidate("build-host");
        registry.remote(&mut provider, &cancel).unwrap();
        assert_eq!(provider.fetches, 2);
    }

    #[test]
    fn persisted_sets_survive_a_new_registry() {
        let _lock = EnvLock::new();
        let dir = TempDir::new("registry").unwrap();
        {
            let registry = registry(&dir);
            let mut provider = CountingProvider {
                host: "build-host".to_string(),
                fetches: 0,
            };
            registry.remote(&mut provider, &AtomicBool::new(false)).unwrap();
        }
        let registry = registry(&dir);
        let mut provider = CountingProvider {
            host: "build-host".to_string(),
            fetches: 0,
        };
        let entry = registry.remote(&mut provider, &AtomicBool::new(false)).unwrap();
        assert_eq!(provider.fetches, 0);
        let manager = entry.lock().unwrap();
        assert!(manager.find("GNU|GNU").is_some());
    }

    #[test]
    fn failed_remote_discovery_leaves_the_entry_retryable() {
        let _lock = EnvLock::new();
        struct OfflineProvider;
        impl RemoteProvider for OfflineProvider {
            fn host(&self) -> &str {
                "down-host"
            }
            fn fetch(&mut self, _cancel: &AtomicBool) -> Result<Vec<String>, DiscoveryError> {
                Err(DiscoveryError::HostOffline("down-host".to_string()))
            }
        }
        let dir = TempDir::new("registry").unwrap();
        let registry = registry(&dir);
        let cancel = AtomicBool::new(false);
        assert!(registry.remote(&mut OfflineProvider, &cancel).is_err());
        let entry = registry.entry("down-host");
        let manager = entry.lock().unwrap();
        assert_eq!(manager.state(), ManagerState::Uninitialized);
    }

    #[test]
    fn restored_sets_are_completed_and_have_a_default() {
        let _lock = EnvLock::new();
        let dir = TempDir::new("registry").unwrap();
        let mut set = CompilerSet::new("GNU", "GNU", Path::new("/usr/bin"));
        set.tools
            .push(Tool::new(ToolKind::C, "gcc", Path::new("/usr/bin/gcc")));
        let mut persisted = HashMap::new();
        persisted.insert("somehost".to_string(), vec![set]);
        let path = dir.path().join("toolchains.json");
        utility::write_file(&path, &serde_json::to_string(&persisted).unwrap()).unwrap();

        let registry = ToolchainRegistry::with_preferences_path(
            builtin_catalog().clone(),
            Some(path),
        );
        struct NeverProvider;
        impl RemoteProvider for NeverProvider {
            fn host(&self) -> &str {
                "somehost"
            }
            fn fetch(&mut self, _cancel: &AtomicBool) -> Result<Vec<String>, DiscoveryError> {
                panic!("persisted sets should have been used");
            }
        }
        let entry = registry
            .remote(&mut NeverProvider, &AtomicBool::new(false))
            .unwrap();
        let manager = entry.lock().unwrap();
        let gnu = manager.find("GNU|GNU").unwrap();
        for kind in ToolKind::ALL {
            assert!(gnu.tool(kind).is_some());
        }
        assert!(manager.default_set().is_some());
    }
}
