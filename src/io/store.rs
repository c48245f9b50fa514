use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::{fmt, fs, io};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

/// Keys of the key-value store. Collections hold JSON arrays; the
/// scalar keys hold a single JSON string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Projects,
    Tasks,
    Users,
    Notifications,
    Comments,
    CurrentUser,
    Theme,
    Language,
}

impl Key {
    pub const COLLECTIONS: [Key; 5] = [
        Key::Projects,
        Key::Tasks,
        Key::Users,
        Key::Notifications,
        Key::Comments,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Key::Projects => "projects",
            Key::Tasks => "tasks",
            Key::Users => "users",
            Key::Notifications => "notifications",
            Key::Comments => "comments",
            Key::CurrentUser => "current_user",
            Key::Theme => "theme",
            Key::Language => "language",
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for store and board I/O
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not a taskboard directory: no taskboard/ directory found")]
    NotABoard,
    #[error("taskboard/ already exists in {0} (use --force to reinitialize)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("stored {key} is not valid JSON: {source}")]
    Corrupt {
        key: Key,
        source: serde_json::Error,
    },
    #[error("could not encode {key}: {source}")]
    Encode {
        key: Key,
        source: serde_json::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit config.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}

/// Key-value persistence. Last write wins per key; there are no
/// transactions, so callers read a whole collection, modify it, and write
/// it back within one operation.
pub trait Store {
    /// Raw stored text for `key`, or `None` when nothing was ever written
    fn get_raw(&self, key: Key) -> Result<Option<String>, StoreError>;

    fn set_raw(&mut self, key: Key, value: String) -> Result<(), StoreError>;

    /// Load a collection; an absent key is an empty collection
    fn get<T: DeserializeOwned>(&self, key: Key) -> Result<Vec<T>, StoreError>
    where
        Self: Sized,
    {
        match self.get_raw(key)? {
            Some(text) if !text.trim().is_empty() => {
                serde_json::from_str(&text).map_err(|source| StoreError::Corrupt { key, source })
            }
            _ => Ok(Vec::new()),
        }
    }

    /// Replace a collection wholesale
    fn set<T: Serialize>(&mut self, key: Key, records: &[T]) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let text =
            serde_json::to_string(records).map_err(|source| StoreError::Encode { key, source })?;
        self.set_raw(key, text)
    }

    /// Load a scalar string value
    fn get_value(&self, key: Key) -> Result<Option<String>, StoreError>
    where
        Self: Sized,
    {
        match self.get_raw(key)? {
            Some(text) if !text.trim().is_empty() => serde_json::from_str::<Option<String>>(&text)
                .map_err(|source| StoreError::Corrupt { key, source }),
            _ => Ok(None),
        }
    }

    /// Store a scalar string value; `None` clears it
    fn set_value(&mut self, key: Key, value: Option<&str>) -> Result<(), StoreError>
    where
        Self: Sized,
    {
        let text =
            serde_json::to_string(&value).map_err(|source| StoreError::Encode { key, source })?;
        self.set_raw(key, text)
    }
}

// ---------------------------------------------------------------------------
// Directory-backed store
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key under a data directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    data_dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        JsonDirStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: Key) -> PathBuf {
        self.data_dir.join(format!("{}.json", key.as_str()))
    }
}

impl Store for JsonDirStore {
    fn get_raw(&self, key: Key) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::ReadError { path, source }),
        }
    }

    fn set_raw(&mut self, key: Key, value: String) -> Result<(), StoreError> {
        let path = self.path_for(key);
        atomic_write(&path, value.as_bytes())
            .map_err(|source| StoreError::WriteError {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(key = %key, bytes = value.len(), "store write");
        Ok(())
    }
}

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Store held entirely in memory; used by tests and embedders
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<Key, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get_raw(&self, key: Key) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(&key).cloned())
    }

    fn set_raw(&mut self, key: Key, value: String) -> Result<(), StoreError> {
        self.values.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, User};
    use tempfile::TempDir;

    #[test]
    fn absent_collection_is_empty() {
        let store = MemoryStore::new();
        let users: Vec<User> = store.get(Key::Users).unwrap();
        assert!(users.is_empty());
        assert_eq!(store.get_value(Key::CurrentUser).unwrap(), None);
    }

    #[test]
    fn dir_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonDirStore::new(tmp.path());
        let users = vec![
            User::new("Admin", "admin@example.com", Role::Admin),
            User::new("John Doe", "john@example.com", Role::User),
        ];
        store.set(Key::Users, &users).unwrap();
        store.set_value(Key::CurrentUser, Some(&users[0].id)).unwrap();

        let loaded: Vec<User> = store.get(Key::Users).unwrap();
        assert_eq!(loaded, users);
        assert_eq!(
            store.get_value(Key::CurrentUser).unwrap().as_deref(),
            Some(users[0].id.as_str())
        );
        assert!(tmp.path().join("users.json").exists());
    }

    #[test]
    fn last_write_wins() {
        let mut store = MemoryStore::new();
        store.set_value(Key::Theme, Some("dark")).unwrap();
        store.set_value(Key::Theme, Some("light")).unwrap();
        assert_eq!(store.get_value(Key::Theme).unwrap().as_deref(), Some("light"));
        store.set_value(Key::Theme, None).unwrap();
        assert_eq!(store.get_value(Key::Theme).unwrap(), None);
    }

    #[test]
    fn malformed_json_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("comments.json"), "not json {{{").unwrap();
        let store = JsonDirStore::new(tmp.path());
        let err = store.get::<User>(Key::Comments).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { key: Key::Comments, .. }));
    }

    #[test]
    fn blank_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("tasks.json"), "\n").unwrap();
        let store = JsonDirStore::new(tmp.path());
        assert!(store.get::<User>(Key::Tasks).unwrap().is_empty());
    }
}
