//! Test stores: in-memory `SnapshotStore` and `RecordStore` implementations.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use truthdare_core::error::DomainError;
use truthdare_core::model::{Player, PlayerId};
use truthdare_core::repository::{RecordKey, RecordStore, SnapshotStore};

/// A snapshot store that keeps blobs in memory and counts every save.
#[derive(Debug, Default)]
pub struct RecordingSnapshotStore {
    blobs: Mutex<HashMap<String, String>>,
    saves: Mutex<usize>,
}

impl RecordingSnapshotStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `blob` under `key`.
    #[must_use]
    pub fn with_blob(key: &str, blob: &str) -> Self {
        let store = Self::default();
        store
            .blobs
            .lock()
            .unwrap()
            .insert(key.to_owned(), blob.to_owned());
        store
    }

    /// Returns the blob currently stored under `key`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn blob(&self, key: &str) -> Option<String> {
        self.blobs.lock().unwrap().get(key).cloned()
    }

    /// Returns how many times `save` was called.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl SnapshotStore for RecordingSnapshotStore {
    fn save(&self, key: &str, blob: &str) -> Result<(), DomainError> {
        *self.saves.lock().unwrap() += 1;
        self.blobs
            .lock()
            .unwrap()
            .insert(key.to_owned(), blob.to_owned());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, DomainError> {
        Ok(self.blobs.lock().unwrap().get(key).cloned())
    }

    fn clear(&self, key: &str) -> Result<(), DomainError> {
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A snapshot store that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingSnapshotStore;

impl SnapshotStore for FailingSnapshotStore {
    fn save(&self, _key: &str, _blob: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("quota exceeded".into()))
    }

    fn load(&self, _key: &str) -> Result<Option<String>, DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }

    fn clear(&self, _key: &str) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("storage unavailable".into()))
    }
}

/// A record store that keeps fields and player rows in memory and logs every
/// call as `"<operation>:<target>"` in arrival order.
#[derive(Debug, Default)]
pub struct RecordingRecordStore {
    fields: Mutex<HashMap<RecordKey, serde_json::Value>>,
    players: Mutex<HashMap<PlayerId, Player>>,
    operations: Mutex<Vec<String>>,
}

impl RecordingRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a field before the store is handed to the code under test.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_field(self, key: RecordKey, value: serde_json::Value) -> Self {
        self.fields.lock().unwrap().insert(key, value);
        self
    }

    /// Seed a player row before the store is handed to the code under test.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_player(self, player: Player) -> Self {
        self.players
            .lock()
            .unwrap()
            .insert(player.id.clone(), player);
        self
    }

    /// Returns the current value of a field.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn field(&self, key: RecordKey) -> Option<serde_json::Value> {
        self.fields.lock().unwrap().get(&key).cloned()
    }

    /// Returns the current row for a player.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn player(&self, id: &str) -> Option<Player> {
        self.players
            .lock()
            .unwrap()
            .get(&PlayerId::new(id))
            .cloned()
    }

    /// Returns a snapshot of every call made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    fn log(&self, entry: String) {
        self.operations.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl RecordStore for RecordingRecordStore {
    async fn save_field(
        &self,
        key: RecordKey,
        value: serde_json::Value,
    ) -> Result<(), DomainError> {
        self.log(format!("save_field:{}", key.as_str()));
        self.fields.lock().unwrap().insert(key, value);
        Ok(())
    }

    async fn load_field(&self, key: RecordKey) -> Result<Option<serde_json::Value>, DomainError> {
        Ok(self.fields.lock().unwrap().get(&key).cloned())
    }

    async fn upsert_player(&self, player: &Player) -> Result<(), DomainError> {
        self.log(format!("upsert_player:{}", player.id));
        self.players
            .lock()
            .unwrap()
            .insert(player.id.clone(), player.clone());
        Ok(())
    }

    async fn load_player(&self, id: &PlayerId) -> Result<Option<Player>, DomainError> {
        Ok(self.players.lock().unwrap().get(id).cloned())
    }

    async fn clear_all(&self) -> Result<(), DomainError> {
        self.log("clear_all".to_owned());
        self.fields.lock().unwrap().clear();
        self.players.lock().unwrap().clear();
        Ok(())
    }
}

/// A record store that always returns an infrastructure error.
#[derive(Debug)]
pub struct FailingRecordStore;

#[async_trait]
impl RecordStore for FailingRecordStore {
    async fn save_field(
        &self,
        _key: RecordKey,
        _value: serde_json::Value,
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_field(&self, _key: RecordKey) -> Result<Option<serde_json::Value>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn upsert_player(&self, _player: &Player) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn load_player(&self, _id: &PlayerId) -> Result<Option<Player>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn clear_all(&self) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}
