//! Persisted settings store implementations
//!
//! `FileParamStore` keeps one file per key inside a directory; writes go to a
//! temporary file first and are renamed into place so readers never see a
//! torn value. `MemoryParamStore` backs tests and runs without a store dir.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use contracts::{ContractError, ParamStore, ParamsConfig};
use tracing::{debug, info};

/// Directory-backed store
#[derive(Debug, Clone)]
pub struct FileParamStore {
    root: PathBuf,
}

impl FileParamStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, ContractError> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(ContractError::param_store(key, "invalid key"));
        }
        Ok(self.root.join(key))
    }
}

impl ParamStore for FileParamStore {
    fn get(&self, key: &str) -> Result<Option<String>, ContractError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ContractError::param_store(key, e.to_string())),
        }
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ContractError> {
        let path = self.key_path(key)?;
        let tmp = self.root.join(format!(".{key}.tmp"));
        fs::write(&tmp, value).map_err(|e| ContractError::param_store(key, e.to_string()))?;
        fs::rename(&tmp, &path).map_err(|e| ContractError::param_store(key, e.to_string()))?;
        debug!(key, "param written");
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryParamStore {
    values: HashMap<String, String>,
}

impl MemoryParamStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given key/value pairs
    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ParamStore for MemoryParamStore {
    fn get(&self, key: &str) -> Result<Option<String>, ContractError> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> Result<(), ContractError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Open the store described by the params section and apply its overrides
pub fn open_param_store(config: &ParamsConfig) -> Result<Box<dyn ParamStore>, ContractError> {
    let mut store: Box<dyn ParamStore> = match &config.store_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "opening file param store");
            Box::new(FileParamStore::open(dir)?)
        }
        None => {
            info!("no param store dir configured, using in-memory store");
            Box::new(MemoryParamStore::new())
        }
    };

    let mut keys: Vec<_> = config.overrides.keys().collect();
    keys.sort();
    for key in keys {
        store.put(key, &config.overrides[key])?;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_store_put_get() {
        let dir = tempdir().unwrap();
        let mut store = FileParamStore::open(dir.path()).unwrap();

        assert_eq!(store.get("IsMetric").unwrap(), None);
        store.put("IsMetric", "1").unwrap();
        assert_eq!(store.get("IsMetric").unwrap().as_deref(), Some("1"));
        assert!(store.get_bool("IsMetric").unwrap());

        store.put("IsMetric", "0").unwrap();
        assert!(!store.get_bool("IsMetric").unwrap());
        assert!(!dir.path().join(".IsMetric.tmp").exists());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = tempdir().unwrap();
        let mut store = FileParamStore::open(dir.path()).unwrap();
        assert!(store.put("../escape", "1").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_file_store_reads_external_writes() {
        let dir = tempdir().unwrap();
        let store = FileParamStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("UiBrightness"), "75\n").unwrap();
        assert_eq!(store.get_i32("UiBrightness").unwrap(), 75);
    }

    #[test]
    fn test_memory_store_seeded() {
        let store = MemoryParamStore::with_values([("IsRHD", "1")]);
        assert!(store.get_bool("IsRHD").unwrap());
        assert!(!store.get_bool("IsMetric").unwrap());
    }

    #[test]
    fn test_open_applies_overrides() {
        let dir = tempdir().unwrap();
        let config = ParamsConfig {
            store_dir: Some(dir.path().join("params")),
            overrides: HashMap::from([("IsDriverViewEnabled".to_string(), "1".to_string())]),
        };
        let store = open_param_store(&config).unwrap();
        assert!(store.get_bool("IsDriverViewEnabled").unwrap());
        assert!(dir.path().join("params").join("IsDriverViewEnabled").exists());
    }
}
