//! Local key/value persistence for timetable snapshots.
//!
//! The layout mirrors browser local storage: one key pointing at the active teacher and
//! one JSON document per teacher, keyed by name.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::model::Snapshot;

pub const CURRENT_TEACHER_KEY: &str = "currentTeacher";
pub const SNAPSHOT_KEY_PREFIX: &str = "timetable_";
pub const STORAGE_FILE_NAME: &str = "local_storage.json";

pub fn snapshot_key(teacher: &str) -> String {
    format!("{SNAPSHOT_KEY_PREFIX}{teacher}")
}

/// String key/value storage.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

/// Volatile storage. Nothing outlives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// All keys in a single JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

pub fn storage_path(base: &Path) -> PathBuf {
    base.join("storage").join(STORAGE_FILE_NAME)
}

impl FileStorage {
    /// Opens the store at `path`. A missing or unreadable file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let items = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(items) => items,
                Err(e) => {
                    warn!(path = %path.display(), "ignoring corrupt storage file: {e}");
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                warn!(path = %path.display(), "could not read storage file: {e}");
                BTreeMap::new()
            }
        };
        Self { path, items }
    }

    pub fn open_in(base: &Path) -> Self {
        Self::open(storage_path(base))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.items)?;
        fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), keys = self.items.len(), "storage flushed");
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        if self.items.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// Typed access to snapshots and the active-teacher pointer.
#[derive(Debug)]
pub struct SnapshotRepository<S> {
    storage: S,
}

impl<S: Storage> SnapshotRepository<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The stored snapshot for `teacher`. Unreadable or corrupt entries count as absent.
    pub fn load(&self, teacher: &str) -> Option<Snapshot> {
        let key = snapshot_key(teacher);
        let raw = match self.storage.get_item(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(%key, "could not read snapshot: {e}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(%key, "ignoring corrupt snapshot: {e}");
                None
            }
        }
    }

    /// Writes `snapshot` under its teacher's key. Does nothing for an unnamed snapshot.
    pub fn save(&mut self, snapshot: &Snapshot) -> Result<()> {
        let teacher = snapshot.teacher();
        if teacher.is_empty() {
            return Ok(());
        }
        let json = serde_json::to_string(snapshot)?;
        self.storage.set_item(&snapshot_key(teacher), &json)
    }

    pub fn delete(&mut self, teacher: &str) -> Result<()> {
        self.storage.remove_item(&snapshot_key(teacher))
    }

    pub fn current_teacher(&self) -> Option<String> {
        match self.storage.get_item(CURRENT_TEACHER_KEY) {
            Ok(name) => name.filter(|n| !n.is_empty()),
            Err(e) => {
                warn!("could not read active teacher: {e}");
                None
            }
        }
    }

    pub fn set_current_teacher(&mut self, teacher: &str) -> Result<()> {
        self.storage.set_item(CURRENT_TEACHER_KEY, teacher)
    }

    pub fn clear_current_teacher(&mut self) -> Result<()> {
        self.storage.remove_item(CURRENT_TEACHER_KEY)
    }
}
