//! Storage backends for the progress save

use std::path::PathBuf;

use super::{PersistError, SaveRecord};

/// Durable storage port used by the progression state machine
pub trait SaveStore {
    /// Read the saved record. `Ok(None)` means nothing has been saved.
    fn load(&self) -> Result<Option<SaveRecord>, PersistError>;

    /// Replace the saved record
    fn save(&mut self, record: &SaveRecord) -> Result<(), PersistError>;

    /// Remove any saved record
    fn clear(&mut self) -> Result<(), PersistError>;
}

/// In-memory store holding the raw JSON text
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    raw: Option<String>,
    writes: usize,
    fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with raw text (which may be malformed)
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            ..Self::default()
        }
    }

    /// Store whose writes always fail
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Number of successful saves
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Result<Option<SaveRecord>, PersistError> {
        self.raw.as_deref().map(SaveRecord::from_json).transpose()
    }

    fn save(&mut self, record: &SaveRecord) -> Result<(), PersistError> {
        if self.fail_writes {
            return Err(PersistError::Unavailable("memory store is read-only".into()));
        }
        self.raw = Some(record.to_json()?);
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.raw = None;
        Ok(())
    }
}

/// JSON file on the local disk. Writes go to a temporary file first and are
/// renamed over the save so a failed write never truncates it.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Result<Option<SaveRecord>, PersistError> {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => SaveRecord::from_json(&json).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, record: &SaveRecord) -> Result<(), PersistError> {
        let json = record.to_json()?;
        let tmp = self.tmp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct LocalStorageStore {
    key: String,
}

#[cfg(target_arch = "wasm32")]
impl Default for LocalStorageStore {
    fn default() -> Self {
        Self {
            key: super::STORAGE_KEY.to_string(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage(&self) -> Result<web_sys::Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistError::Unavailable("LocalStorage is not available".into()))
    }
}

#[cfg(target_arch = "wasm32")]
impl SaveStore for LocalStorageStore {
    fn load(&self) -> Result<Option<SaveRecord>, PersistError> {
        let json = self
            .storage()?
            .get_item(&self.key)
            .map_err(|e| PersistError::Unavailable(format!("{:?}", e)))?;
        json.as_deref().map(SaveRecord::from_json).transpose()
    }

    fn save(&mut self, record: &SaveRecord) -> Result<(), PersistError> {
        let json = record.to_json()?;
        self.storage()?
            .set_item(&self.key, &json)
            .map_err(|e| PersistError::Unavailable(format!("{:?}", e)))
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.storage()?
            .remove_item(&self.key)
            .map_err(|e| PersistError::Unavailable(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SavedPlayer;

    fn record(coins: u32) -> SaveRecord {
        SaveRecord {
            version: 1,
            player: SavedPlayer {
                coins,
                ..SavedPlayer::default()
            },
            completed_boxes: Vec::new(),
            level: 1,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "treasure_trail_{}_{}.json",
            name,
            std::process::id()
        ))
    }

    #[test]
    fn test_memory_store_cycle() {
        let mut store = MemoryStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&record(10)).unwrap();
        assert_eq!(store.writes(), 1);
        assert_eq!(store.load().unwrap().unwrap().player.coins, 10);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store_malformed() {
        let store = MemoryStore::with_raw("][");
        assert!(matches!(store.load(), Err(PersistError::Malformed(_))));
    }

    #[test]
    fn test_failing_store() {
        let mut store = MemoryStore::failing();
        assert!(store.save(&record(1)).is_err());
        assert_eq!(store.writes(), 0);
        assert!(store.raw().is_none());
    }

    #[test]
    fn test_file_store_cycle() {
        let path = temp_path("cycle");
        let mut store = FileStore::new(&path);
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        store.save(&record(42)).unwrap();
        assert_eq!(store.load().unwrap().unwrap().player.coins, 42);
        assert!(!store.tmp_path().exists());

        store.save(&record(43)).unwrap();
        assert_eq!(store.load().unwrap().unwrap().player.coins, 43);

        store.clear().unwrap();
        assert!(!path.exists());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_malformed() {
        let path = temp_path("malformed");
        std::fs::write(&path, "garbage").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.load(), Err(PersistError::Malformed(_))));
        let _ = std::fs::remove_file(&path);
    }
}
