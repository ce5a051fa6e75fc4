//! Persisted key-value documents.
//!
//! Each logical store ("online-wallpaper", "auto-wallpaper", ...) is one JSON
//! object on disk. Values are only ever replaced whole; collections are
//! read, modified and written back through [`JsonStore::update`], which
//! keeps the lock for the full cycle so concurrent writers in this process
//! cannot lose each other's changes. Nothing protects against a second
//! process writing the same file.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{Result, SkyshiftError};
use crate::paths::SkyshiftPaths;

pub struct JsonStore {
    name: String,
    path: Option<PathBuf>,
    data: Mutex<Map<String, Value>>,
}

impl JsonStore {
    pub fn open(paths: &SkyshiftPaths, name: &str) -> Result<Self> {
        Self::open_at(name, paths.store_file(name))
    }

    pub fn open_at(name: &str, path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_document(&path)?
        } else {
            Map::new()
        };
        debug!(store = name, keys = data.len(), "store opened");
        Ok(Self {
            name: name.to_string(),
            path: Some(path),
            data: Mutex::new(data),
        })
    }

    /// Store that never touches disk.
    pub fn in_memory(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: None,
            data: Mutex::new(Map::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value under `key`, or `default` when missing or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        let data = self.lock();
        match data.get(key) {
            Some(value) => decode(&self.name, key, value.clone()).unwrap_or(default),
            None => default,
        }
    }

    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut data = self.lock();
        self.commit(&mut data, key, Some(value))
    }

    /// Read-modify-write of one key under a single lock. Returns the value
    /// that was written.
    pub fn update<T, F>(&self, key: &str, default: T, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T),
    {
        let mut data = self.lock();
        let mut current = match data.get(key) {
            Some(value) => decode(&self.name, key, value.clone()).unwrap_or(default),
            None => default,
        };
        f(&mut current);
        let value = serde_json::to_value(&current)?;
        self.commit(&mut data, key, Some(value))?;
        Ok(current)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        let mut data = self.lock();
        if !data.contains_key(key) {
            return Ok(());
        }
        self.commit(&mut data, key, None)
    }

    /// Apply one key change. The in-memory document only moves once the
    /// new document is on disk, so a failed write leaves both unchanged.
    fn commit(
        &self,
        data: &mut MutexGuard<'_, Map<String, Value>>,
        key: &str,
        value: Option<Value>,
    ) -> Result<()> {
        let mut next = (**data).clone();
        match value {
            Some(value) => next.insert(key.to_string(), value),
            None => next.remove(key),
        };
        self.persist(&next)?;
        **data = next;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Map<String, Value>> {
        self.data.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        // tab indentation, same as the documents written by the desktop app
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut ser)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &buf)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        _ => Err(SkyshiftError::Store(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}

fn decode<T: DeserializeOwned>(store: &str, key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(store, key, "stored value has unexpected shape: {e}");
            None
        }
    }
}
