//! # Cart Storage Port
//!
//! A durable key-value slot holding the serialized cart.
//!
//! ## Implementations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartStore (trait)                                                      │
//! │     │                                                                   │
//! │     ├── FileCartStore    <data_dir>/<key>.json                          │
//! │     │                    written to <key>.json.tmp, then renamed        │
//! │     │                                                                   │
//! │     └── MemoryCartStore  Arc<Mutex<HashMap>>, clones share one map      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// Durable storage for serialized carts.
pub trait CartStore: Send + Sync {
    /// Reads the slot. `None` when nothing was saved yet.
    fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Overwrites the slot.
    fn save(&self, key: &str, json: &str) -> StoreResult<()>;

    /// Deletes the slot. Removing a missing slot succeeds.
    fn remove(&self, key: &str) -> StoreResult<()>;
}

// =============================================================================
// File Store
// =============================================================================

/// Stores each slot as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    dir: PathBuf,
}

impl FileCartStore {
    /// Creates a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCartStore { dir: dir.into() }
    }

    /// Creates a store in the platform data directory.
    ///
    /// - Linux: `~/.local/share/kedai-pos/`
    /// - macOS: `~/Library/Application Support/id.kedai.pos/`
    pub fn in_data_dir() -> StoreResult<Self> {
        let dirs =
            directories::ProjectDirs::from("id", "kedai", "pos").ok_or(StoreError::NoDataDir)?;
        Ok(Self::new(dirs.data_dir()))
    }

    /// Directory holding the slot files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl CartStore for FileCartStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.slot_path(key)?;
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(json)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn save(&self, key: &str, json: &str) -> StoreResult<()> {
        let path = self.slot_path(key)?;
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;

        debug!(?path, bytes = json.len(), "Cart slot written");
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.slot_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-memory slots, for tests and demos.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw slot value, bypassing the cart encoding.
    pub fn put_raw(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn save(&self, key: &str, json: &str) -> StoreResult<()> {
        self.lock().insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.lock().remove(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
