//! Durable player storage.
//!
//! One pretty-printed JSON document holds every record, keyed by player id.
//! Commits go through a write-to-temp-then-rename so a crash never leaves a
//! half-written file, and a malformed existing file is surfaced as
//! [`StoreError::Corrupt`] instead of being silently reset.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::player::{PlayerId, PlayerRecord};

/// Typed storage failures. `Corrupt` and `Unreadable` are fatal at load;
/// `Write` is recovered by the scheduler through a next-cycle retry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("player save file {} is corrupt: {}", .path.display(), .reason)]
    Corrupt { path: PathBuf, reason: String },
    #[error("player save file {} is unreadable", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to commit player save file {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("player {0} is already registered")]
    AlreadyRegistered(PlayerId),
}

/// Lookup failure for an identity with no record; callers use it to prompt
/// registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("player {0} is not registered")]
pub struct NotRegistered(pub PlayerId);

/// Storage seam for player records. Production uses [`JsonPlayerStore`];
/// tests and ephemeral runs use [`MemoryPlayerStore`].
pub trait PlayerStore {
    /// Load every persisted record. Called once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store exists but cannot be read or
    /// parsed. An absent store is an empty map, never an error.
    fn load_all(&self) -> Result<BTreeMap<PlayerId, PlayerRecord>, StoreError>;

    /// Commit one record atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit does not reach durable storage; the
    /// previous contents remain intact.
    fn save(&mut self, record: &PlayerRecord) -> Result<(), StoreError>;

    /// Persist a record for a new identity. Registration is exactly-once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyRegistered`] if the id exists; the
    /// original record is untouched.
    fn create(&mut self, record: &PlayerRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct SaveFile {
    players: BTreeMap<String, PlayerRecord>,
}

/// File-backed store: `<data_dir>/players.json`.
#[derive(Debug)]
pub struct JsonPlayerStore {
    path: PathBuf,
    players: BTreeMap<PlayerId, PlayerRecord>,
}

impl JsonPlayerStore {
    /// Open the store under `data_dir`, creating the directory and an empty
    /// save file when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be created, or if an
    /// existing save file is unreadable or malformed.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = data_dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join("players.json");
        let players = if path.exists() {
            read_save_file(&path)?
        } else {
            BTreeMap::new()
        };
        let store = Self { path, players };
        if !store.path.exists() {
            store.persist()?;
        }
        Ok(store)
    }

    /// Location of the backing save file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let file = SaveFile {
            players: self
                .players
                .iter()
                .map(|(id, record)| (id.to_string(), record.clone()))
                .collect(),
        };
        let body = serde_json::to_string_pretty(&file).map_err(|err| StoreError::Write {
            path: self.path.clone(),
            source: io::Error::other(err),
        })?;
        write_atomic(&self.path, &body)
    }
}

impl PlayerStore for JsonPlayerStore {
    fn load_all(&self) -> Result<BTreeMap<PlayerId, PlayerRecord>, StoreError> {
        Ok(self.players.clone())
    }

    fn save(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        let previous = self.players.insert(record.id, record.clone());
        if let Err(err) = self.persist() {
            // Leave the cache matching the durable file.
            match previous {
                Some(old) => {
                    self.players.insert(record.id, old);
                }
                None => {
                    self.players.remove(&record.id);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    fn create(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        if self.players.contains_key(&record.id) {
            return Err(StoreError::AlreadyRegistered(record.id));
        }
        self.save(record)
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryPlayerStore {
    players: BTreeMap<PlayerId, PlayerRecord>,
}

impl MemoryPlayerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed snapshot of one record, if any.
    #[must_use]
    pub fn get(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.players.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn load_all(&self) -> Result<BTreeMap<PlayerId, PlayerRecord>, StoreError> {
        Ok(self.players.clone())
    }

    fn save(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        self.players.insert(record.id, record.clone());
        Ok(())
    }

    fn create(&mut self, record: &PlayerRecord) -> Result<(), StoreError> {
        if self.players.contains_key(&record.id) {
            return Err(StoreError::AlreadyRegistered(record.id));
        }
        self.players.insert(record.id, record.clone());
        Ok(())
    }
}

fn read_save_file(path: &Path) -> Result<BTreeMap<PlayerId, PlayerRecord>, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let file: SaveFile = serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    let mut players = BTreeMap::new();
    for (key, record) in file.players {
        let id: PlayerId = key.parse().map_err(|_| StoreError::Corrupt {
            path: path.to_path_buf(),
            reason: format!("invalid player id key {key:?}"),
        })?;
        players.insert(id, record);
    }
    Ok(players)
}

/// Write-to-temp-then-rename commit, shared with the calendar store.
pub(crate) fn write_atomic(path: &Path, body: &str) -> Result<(), StoreError> {
    let tmp = path.with_extension("tmp");
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    fs::write(&tmp, body).map_err(write_err)?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use tempfile::TempDir;

    fn record(id: u64, name: &str) -> PlayerRecord {
        PlayerRecord::new(PlayerId(id), name, 1_000, &GameConfig::default())
    }

    #[test]
    fn open_creates_an_empty_save_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonPlayerStore::open(dir.path().join("world")).unwrap();
        assert!(store.path().exists());
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn records_survive_a_reopen() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonPlayerStore::open(dir.path()).unwrap();
        store.create(&record(7, "Li Qing")).unwrap();

        let mut updated = record(7, "Li Qing");
        updated.stats.hours_cultivated = 2.5;
        store.save(&updated).unwrap();

        let reopened = JsonPlayerStore::open(dir.path()).unwrap();
        let players = reopened.load_all().unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[&PlayerId(7)].stats.hours_cultivated, 2.5);
    }

    #[test]
    fn duplicate_create_keeps_the_original() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonPlayerStore::open(dir.path()).unwrap();
        store.create(&record(7, "Li Qing")).unwrap();

        let err = store.create(&record(7, "Impostor")).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyRegistered(PlayerId(7))));

        let players = store.load_all().unwrap();
        assert_eq!(players[&PlayerId(7)].name, "Li Qing");
    }

    #[test]
    fn corrupt_file_is_surfaced_not_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("players.json");
        fs::write(&path, "{ not json").unwrap();

        let err = JsonPlayerStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        // the malformed file is still there for inspection
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn bad_id_key_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("players.json");
        fs::write(&path, r#"{ "players": { "not-a-number": null } }"#).unwrap();

        let err = JsonPlayerStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn commits_leave_no_temp_file_behind() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonPlayerStore::open(dir.path()).unwrap();
        store.create(&record(1, "Han")).unwrap();
        assert!(!dir.path().join("players.tmp").exists());
    }

    #[test]
    fn save_file_is_human_readable_json() {
        let dir = TempDir::new().unwrap();
        let mut store = JsonPlayerStore::open(dir.path()).unwrap();
        store.create(&record(42, "Elder Mo")).unwrap();

        let body = fs::read_to_string(store.path()).unwrap();
        assert!(body.contains("\"42\""));
        assert!(body.contains("Elder Mo"));
        assert!(body.contains("qi_condensation"));
        assert!(body.lines().count() > 5, "expected pretty-printed output");
    }

    #[test]
    fn memory_store_mirrors_the_contract() {
        let mut store = MemoryPlayerStore::new();
        store.create(&record(1, "Han")).unwrap();
        assert!(matches!(
            store.create(&record(1, "Han")).unwrap_err(),
            StoreError::AlreadyRegistered(PlayerId(1))
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
