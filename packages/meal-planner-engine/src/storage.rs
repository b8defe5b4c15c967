use crate::error::{PlannerError, PlannerResult};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::warn;

pub const SELECTED_IDS_KEY: &str = "food-planner-selected-ids";
pub const DISMISSED_IDS_KEY: &str = "food-planner-dismissed-ids";

/// String-keyed slots holding the planner's saved state.
///
/// Writes are last-writer-wins per key and there is no transaction spanning
/// several keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PlannerResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> PlannerResult<()>;
    fn remove(&self, key: &str) -> PlannerResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> PlannerResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> PlannerResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> PlannerResult<()> {
        (**self).remove(key)
    }
}

/// Reads a JSON-encoded id list. Missing, unreadable and malformed values all
/// come back as `None`.
pub fn read_ids<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<Vec<String>> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read {}: {}", key, e);
            return None;
        }
    };
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Vec<String>>(&raw) {
        Ok(ids) => Some(ids),
        Err(e) => {
            warn!("Discarding malformed value for {}: {}", key, e);
            None
        }
    }
}

pub fn write_ids<S: KeyValueStore + ?Sized>(
    store: &S,
    key: &str,
    ids: &[String],
) -> PlannerResult<()> {
    let json = serde_json::to_string(ids).map_err(|e| PlannerError::Storage(e.to_string()))?;
    store.set(key, &json)
}

/// Process-local store. Clones share the same slots.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PlannerResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.slots
            .lock()
            .map_err(|_| PlannerError::Storage("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> PlannerResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> PlannerResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> PlannerResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Keeps each key in its own `<key>.json` file under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file_name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> PlannerResult<Option<String>> {
        let path = self.slot_path(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PlannerError::Storage(format!("{}: {}", path.display(), e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> PlannerResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| PlannerError::Storage(format!("{}: {}", self.dir.display(), e)))?;
        let path = self.slot_path(key);
        fs::write(&path, value).map_err(|e| PlannerError::Storage(format!("{}: {}", path.display(), e)))
    }

    fn remove(&self, key: &str) -> PlannerResult<()> {
        let path = self.slot_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PlannerError::Storage(format!("{}: {}", path.display(), e))),
        }
    }
}
