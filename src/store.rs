use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::types::Binding;

const BINDINGS_FILE: &str = "bindings.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent repository → channel binding store.
///
/// Bindings live in a single `bindings.json` under the data directory,
/// loaded on open and rewritten after every mutation. The map is keyed by
/// repository full name, so the uniqueness invariant (one destination per
/// repository, last write wins) holds by construction.
pub struct BindingStore {
    bindings: BTreeMap<String, String>,
    data_dir: PathBuf,
}

impl BindingStore {
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir).map_err(|source| StoreError::Io {
            path: data_dir.display().to_string(),
            source,
        })?;

        let mut store = Self {
            bindings: BTreeMap::new(),
            data_dir,
        };
        store.load()?;
        Ok(store)
    }

    fn bindings_path(&self) -> PathBuf {
        self.data_dir.join(BINDINGS_FILE)
    }

    fn load(&mut self) -> Result<(), StoreError> {
        let path = self.bindings_path();
        if !path.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(&path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let items: Vec<Binding> = serde_json::from_str(&content)?;
        for binding in items {
            self.bindings.insert(binding.repository, binding.channel_id);
        }
        Ok(())
    }

    fn save(&self) -> Result<(), StoreError> {
        let path = self.bindings_path();
        let items = self.list();
        let content = serde_json::to_string_pretty(&items)?;
        fs::write(&path, content).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Upsert a binding. Overwrites any prior destination for the repository.
    pub fn bind(&mut self, repository: &str, channel_id: &str) -> Result<(), StoreError> {
        self.bindings
            .insert(repository.to_string(), channel_id.to_string());
        self.save()
    }

    pub fn lookup(&self, repository: &str) -> Option<String> {
        self.bindings.get(repository).cloned()
    }

    /// Delete a binding. Deleting an absent repository is not an error.
    pub fn unbind(&mut self, repository: &str) -> Result<(), StoreError> {
        if self.bindings.remove(repository).is_none() {
            return Ok(());
        }
        self.save()
    }

    /// All bindings, ordered by repository full name.
    pub fn list(&self) -> Vec<Binding> {
        self.bindings
            .iter()
            .map(|(repository, channel_id)| Binding {
                repository: repository.clone(),
                channel_id: channel_id.clone(),
            })
            .collect()
    }
}
