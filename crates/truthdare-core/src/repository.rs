//! Storage ports for session persistence.
//!
//! Two independent stores back a session: a synchronous snapshot store that
//! holds the whole session as one blob, and an asynchronous record store that
//! receives field-level writes and one row per player.

use async_trait::async_trait;

use crate::error::DomainError;
use crate::model::{Player, PlayerId};

/// Facets of session state written individually to the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKey {
    AgeGateDecision,
    CurrentPlayerId,
    CurrentLevel,
    GameStarted,
    GameCompleted,
    CompletedPromptIds,
}

impl RecordKey {
    /// Every record key, in storage order.
    pub const ALL: [Self; 6] = [
        Self::AgeGateDecision,
        Self::CurrentPlayerId,
        Self::CurrentLevel,
        Self::GameStarted,
        Self::GameCompleted,
        Self::CompletedPromptIds,
    ];

    /// The stable storage name for this key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgeGateDecision => "age_gate_decision",
            Self::CurrentPlayerId => "current_player_id",
            Self::CurrentLevel => "current_level",
            Self::GameStarted => "game_started",
            Self::GameCompleted => "game_completed",
            Self::CompletedPromptIds => "completed_prompt_ids",
        }
    }
}

/// Synchronous single-blob store used for full-state reload.
pub trait SnapshotStore: Send + Sync {
    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, blob: &str) -> Result<(), DomainError>;

    /// Read the blob stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Remove the blob stored under `key`. Removing a missing key succeeds.
    fn clear(&self, key: &str) -> Result<(), DomainError>;
}

/// Asynchronous field- and row-granular store used for incremental durability.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Durably write one facet of session state.
    async fn save_field(&self, key: RecordKey, value: serde_json::Value)
    -> Result<(), DomainError>;

    /// Read one facet of session state, if it was ever written.
    async fn load_field(&self, key: RecordKey) -> Result<Option<serde_json::Value>, DomainError>;

    /// Insert or replace the row for `player`.
    async fn upsert_player(&self, player: &Player) -> Result<(), DomainError>;

    /// Read the row for `id`, if present.
    async fn load_player(&self, id: &PlayerId) -> Result<Option<Player>, DomainError>;

    /// Wipe every field and every player row.
    async fn clear_all(&self) -> Result<(), DomainError>;
}
