use crate::config::StorageConfig;
use crate::error::PersistenceError;
use crate::persistence::snapshot::Snapshot;
use crate::timer::TimerState;
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The two documents a case is saved as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    Data,
    Timer,
}

impl StorageKey {
    pub fn file_name(self) -> &'static str {
        match self {
            StorageKey::Data => "anesthesia_data.json",
            StorageKey::Timer => "anesthesia_timer.json",
        }
    }
}

/// Somewhere the session can keep its documents between runs.
///
/// Implementors only move strings around; the typed helpers are shared.
pub trait SnapshotStorage {
    /// `Ok(None)` when nothing was stored under `key`.
    fn read(&self, key: StorageKey) -> Result<Option<String>, PersistenceError>;
    /// Replaces whatever was stored under `key`.
    fn write(&mut self, key: StorageKey, contents: &str) -> Result<(), PersistenceError>;
    fn remove(&mut self, key: StorageKey) -> Result<(), PersistenceError>;

    fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), PersistenceError> {
        let json = snapshot.to_json()?;
        self.write(StorageKey::Data, &json)
    }

    fn load_snapshot(&self) -> Result<Option<Snapshot>, PersistenceError> {
        self.read(StorageKey::Data)?
            .map(|json| Snapshot::from_json(&json))
            .transpose()
    }

    fn save_timer(&mut self, state: &TimerState) -> Result<(), PersistenceError> {
        let json = serde_json::to_string(state)?;
        self.write(StorageKey::Timer, &json)
    }

    fn load_timer(&self) -> Result<Option<TimerState>, PersistenceError> {
        match self.read(StorageKey::Timer)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Forgets the snapshot and the timer.
    fn clear(&mut self) -> Result<(), PersistenceError> {
        self.remove(StorageKey::Data)?;
        self.remove(StorageKey::Timer)
    }
}

/// Keeps each document as a JSON file in one directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    /// Files under the configured `data_dir`.
    pub fn from_config(config: &StorageConfig) -> Self {
        FileStorage::new(config.data_dir.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: StorageKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

fn io_error(path: PathBuf) -> impl FnOnce(io::Error) -> PersistenceError {
    move |source| PersistenceError::Io { path, source }
}

impl SnapshotStorage for FileStorage {
    fn read(&self, key: StorageKey) -> Result<Option<String>, PersistenceError> {
        let path = self.path(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(path)(err)),
        }
    }

    fn write(&mut self, key: StorageKey, contents: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(io_error(self.dir.clone()))?;
        let path = self.path(key);
        fs::write(&path, contents).map_err(io_error(path.clone()))?;
        info!("saved {}", path.display());
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), PersistenceError> {
        let path = self.path(key);
        match fs::remove_file(&path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(io_error(path)(err)),
            _ => Ok(()),
        }
    }
}

/// Storage that lives as long as the value. Raw contents can be planted to
/// simulate damaged documents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryStorage {
    entries: BTreeMap<StorageKey, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage::default()
    }

    pub fn with_raw(mut self, key: StorageKey, contents: impl Into<String>) -> Self {
        self.entries.insert(key, contents.into());
        self
    }

    pub fn raw(&self, key: StorageKey) -> Option<&str> {
        self.entries.get(&key).map(String::as_str)
    }
}

impl SnapshotStorage for MemoryStorage {
    fn read(&self, key: StorageKey) -> Result<Option<String>, PersistenceError> {
        Ok(self.entries.get(&key).cloned())
    }

    fn write(&mut self, key: StorageKey, contents: &str) -> Result<(), PersistenceError> {
        self.entries.insert(key, contents.to_string());
        Ok(())
    }

    fn remove(&mut self, key: StorageKey) -> Result<(), PersistenceError> {
        self.entries.remove(&key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case_record::CaseRecord;
    use crate::timeseries::record::{TimeRecord, VitalField};
    use crate::timeseries::store::TimeSeriesStore;
    use tempfile::TempDir;

    fn snapshot() -> Snapshot {
        let store = TimeSeriesStore::from_records(vec![
            TimeRecord::new("11:30").with(VitalField::Pulse, 72.0),
        ]);
        Snapshot::capture(&CaseRecord::with_default_rows("11:00"), &store)
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path().join("case"));
        assert_eq!(storage.load_snapshot().unwrap(), None);

        storage.save_snapshot(&snapshot()).unwrap();
        assert!(dir.path().join("case/anesthesia_data.json").is_file());
        assert_eq!(storage.load_snapshot().unwrap(), Some(snapshot()));
    }

    #[test]
    fn file_storage_follows_configured_data_dir() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            data_dir: dir.path().join("ward-3"),
            ..StorageConfig::default()
        };
        let mut storage = FileStorage::from_config(&config);
        assert_eq!(storage.dir(), config.data_dir.as_path());

        storage.save_snapshot(&snapshot()).unwrap();
        assert!(dir.path().join("ward-3/anesthesia_data.json").is_file());
        assert_eq!(FileStorage::from_config(&config).load_snapshot().unwrap(), Some(snapshot()));
    }

    #[test]
    fn file_storage_timer_and_clear() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path());
        let state = TimerState {
            start_time: Some(1_000),
            elapsed_time: 0,
            is_running: true,
            last_updated: 1_000,
        };
        storage.save_timer(&state).unwrap();
        storage.save_snapshot(&snapshot()).unwrap();
        assert_eq!(storage.load_timer().unwrap(), Some(state));

        storage.clear().unwrap();
        assert_eq!(storage.load_timer().unwrap(), None);
        assert_eq!(storage.load_snapshot().unwrap(), None);
        // Clearing twice is fine.
        storage.clear().unwrap();
    }

    #[test]
    fn corrupted_file_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("anesthesia_data.json"), "{\"vitals\":").unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.load_snapshot(),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn memory_storage_overwrites() {
        let mut storage = MemoryStorage::new().with_raw(StorageKey::Data, "garbage");
        assert!(storage.load_snapshot().is_err());
        storage.save_snapshot(&snapshot()).unwrap();
        assert_eq!(storage.load_snapshot().unwrap(), Some(snapshot()));
        assert!(storage.raw(StorageKey::Data).unwrap().starts_with('{'));
    }
}
