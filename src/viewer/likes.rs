use std::{
    collections::{BTreeMap, HashMap},
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};

use log::{log, Level};
use serde_json::{Map, Value};

use crate::{schema::db::Quote, viewer::error::ViewerError};

/// Key under which the like override map is stored.
pub const LIKES_KEY: &str = "book_quotes_likes";

/// String key-value storage, shaped like a browser's local storage.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError>;
    fn set(&self, key: &str, value: &str) -> Result<(), ViewerError>;
}

#[derive(Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError> {
        Ok(self
            .items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ViewerError> {
        self.items
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Keeps every key in one JSON object file.
pub struct FileKeyValueStore {
    path: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, ViewerError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| ViewerError::Storage(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ViewerError::Storage(e.to_string())),
        }
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ViewerError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ViewerError> {
        // A corrupt file is replaced rather than blocking every write.
        let mut items = self.read_all().unwrap_or_default();
        items.insert(key.to_string(), value.to_string());
        let raw = serde_json::to_string_pretty(&items)
            .map_err(|e| ViewerError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| ViewerError::Storage(e.to_string()))
    }
}

/// Locally remembered like counts, keyed by quote id.
pub struct LikeOverrides {
    store: Box<dyn KeyValueStore>,
}

impl LikeOverrides {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Unreadable or malformed data reads as an empty map. Entries that are
    /// not non-negative integers are skipped.
    fn read_map(&self) -> BTreeMap<String, i32> {
        let raw = match self.store.get(LIKES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BTreeMap::new(),
            Err(e) => {
                log!(Level::Warn, "Could not read like overrides: {e}");
                return BTreeMap::new();
            }
        };
        match serde_json::from_str::<Map<String, Value>>(&raw) {
            Ok(map) => map
                .into_iter()
                .filter_map(|(k, v)| {
                    let likes = i32::try_from(v.as_i64()?).ok().filter(|n| *n >= 0)?;
                    Some((k, likes))
                })
                .collect(),
            Err(e) => {
                log!(Level::Warn, "Ignoring malformed like overrides: {e}");
                BTreeMap::new()
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, i32>) {
        let result = serde_json::to_string(map)
            .map_err(|e| ViewerError::Storage(e.to_string()))
            .and_then(|raw| self.store.set(LIKES_KEY, &raw));
        if let Err(e) = result {
            log!(Level::Warn, "Could not persist like overrides: {e}");
        }
    }

    pub fn get(&self, id: i32) -> Option<i32> {
        self.read_map().get(&id.to_string()).copied()
    }

    pub fn set(&self, id: i32, likes: i32) -> i32 {
        let mut map = self.read_map();
        map.insert(id.to_string(), likes);
        self.write_map(&map);
        likes
    }

    /// Adds one to the stored count, starting from `start` when nothing is stored.
    pub fn increment(&self, id: i32, start: i32) -> i32 {
        let next = self.get(id).unwrap_or(start).saturating_add(1);
        self.set(id, next)
    }

    /// Replaces each quote's count with its stored override, if any.
    pub fn apply(&self, quotes: &mut [Quote]) {
        let map = self.read_map();
        for quote in quotes {
            if let Some(likes) = map.get(&quote.id.to_string()) {
                quote.likes = *likes;
            }
        }
    }
}
