use crate::constants::{LOCAL_ENTITIES_CAP, LOCAL_ENTITIES_KEY};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Stored value under '{key}' is corrupted: {reason}")]
    Corrupted { key: String, reason: String },
}

/// Minimal string key-value persistence. `get` on a missing key is `Ok(None)`.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileKvStore {
    dir: PathBuf,
}

impl FileKvStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl KvStore for FileKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Renders an entity id the way callers compare them: numbers and strings
/// both match their textual form.
pub fn entity_id(entity: &Value) -> Option<String> {
    match entity.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Newest-first list of local-only personas under a single key.
pub struct LocalEntityCache<S: KvStore> {
    store: S,
}

impl<S: KvStore> LocalEntityCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn entries(&self) -> Result<Vec<Value>, StoreError> {
        let Some(raw) = self.store.get(LOCAL_ENTITIES_KEY)? else {
            return Ok(Vec::new());
        };
        let corrupted = |reason: String| StoreError::Corrupted {
            key: LOCAL_ENTITIES_KEY.to_string(),
            reason,
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(other) => Err(corrupted(format!("expected an array, found {}", kind(&other)))),
            Err(e) => Err(corrupted(e.to_string())),
        }
    }

    /// Prepends `entity`, replacing any older entry with the same id, and
    /// keeps at most the newest hundred.
    pub fn remember(&self, entity: Value) -> Result<(), StoreError> {
        let mut entries = self.entries()?;
        if let Some(id) = entity_id(&entity) {
            entries.retain(|e| entity_id(e).as_deref() != Some(id.as_str()));
        }
        entries.insert(0, entity);
        entries.truncate(LOCAL_ENTITIES_CAP);
        let raw = serde_json::to_string(&entries)?;
        self.store.set(LOCAL_ENTITIES_KEY, &raw)
    }

    pub fn find(&self, id: &str) -> Result<Option<Value>, StoreError> {
        Ok(self
            .entries()?
            .into_iter()
            .find(|e| entity_id(e).as_deref() == Some(id)))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_key_is_empty() {
        let cache = LocalEntityCache::new(MemoryKvStore::default());
        assert!(cache.entries().unwrap().is_empty());
        assert!(cache.find("1").unwrap().is_none());
    }

    #[test]
    fn newest_first_and_capped() {
        let cache = LocalEntityCache::new(MemoryKvStore::default());
        for id in 0..(LOCAL_ENTITIES_CAP as u64 + 5) {
            cache.remember(json!({ "id": id })).unwrap();
        }
        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), LOCAL_ENTITIES_CAP);
        assert_eq!(entries[0]["id"], json!(LOCAL_ENTITIES_CAP as u64 + 4));
        assert!(cache.find("0").unwrap().is_none());
    }

    #[test]
    fn same_id_replaces_older_entry() {
        let cache = LocalEntityCache::new(MemoryKvStore::default());
        cache.remember(json!({ "id": 7, "name": "old" })).unwrap();
        cache.remember(json!({ "id": 8 })).unwrap();
        cache.remember(json!({ "id": 7, "name": "new" })).unwrap();
        let entries = cache.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "new");
    }

    #[test]
    fn ids_match_by_text() {
        let cache = LocalEntityCache::new(MemoryKvStore::default());
        cache.remember(json!({ "id": 1700000000000u64 })).unwrap();
        cache.remember(json!({ "id": "abc" })).unwrap();
        assert!(cache.find("1700000000000").unwrap().is_some());
        assert!(cache.find("abc").unwrap().is_some());
    }

    #[test]
    fn non_array_value_is_corrupted() {
        let store = MemoryKvStore::default();
        store.set(LOCAL_ENTITIES_KEY, "{\"id\":1}").unwrap();
        let cache = LocalEntityCache::new(store);
        assert!(matches!(cache.entries(), Err(StoreError::Corrupted { .. })));

        let store = MemoryKvStore::default();
        store.set(LOCAL_ENTITIES_KEY, "[{oops").unwrap();
        let cache = LocalEntityCache::new(store);
        assert!(matches!(cache.remember(json!({})), Err(StoreError::Corrupted { .. })));
    }
}
