//! State changes recorded by the session aggregate.
//!
//! Every mutation of [`GameSession`](super::aggregates::GameSession) records
//! one or more changes. The engine drains them after each operation and the
//! persistence gateway turns them into record-store writes.

use truthdare_core::model::{AgeGateDecision, Level, Player, PlayerId, PromptId};

/// Change type identifier for [`SessionChange::AgeGateDecided`].
pub const AGE_GATE_DECIDED_CHANGE_TYPE: &str = "session.age_gate_decided";

/// Change type identifier for [`SessionChange::PlayersRegistered`].
pub const PLAYERS_REGISTERED_CHANGE_TYPE: &str = "session.players_registered";

/// Change type identifier for [`SessionChange::GameStarted`].
pub const GAME_STARTED_CHANGE_TYPE: &str = "session.game_started";

/// Change type identifier for [`SessionChange::CurrentPlayerChanged`].
pub const CURRENT_PLAYER_CHANGED_CHANGE_TYPE: &str = "session.current_player_changed";

/// Change type identifier for [`SessionChange::PromptCompleted`].
pub const PROMPT_COMPLETED_CHANGE_TYPE: &str = "session.prompt_completed";

/// Change type identifier for [`SessionChange::LevelAdvanced`].
pub const LEVEL_ADVANCED_CHANGE_TYPE: &str = "session.level_advanced";

/// Change type identifier for [`SessionChange::GameCompleted`].
pub const GAME_COMPLETED_CHANGE_TYPE: &str = "session.game_completed";

/// Change type identifier for [`SessionChange::SessionReset`].
pub const SESSION_RESET_CHANGE_TYPE: &str = "session.reset";

/// A single facet of session state that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChange {
    /// The age gate moved out of `Undecided`.
    AgeGateDecided(AgeGateDecision),
    /// Both players were created.
    PlayersRegistered(Vec<Player>),
    /// Setup finished and play began.
    GameStarted,
    /// The turn moved (or was cleared).
    CurrentPlayerChanged(Option<PlayerId>),
    /// A prompt was completed by `player`, whose counters are already updated.
    PromptCompleted {
        /// The completed prompt.
        prompt_id: PromptId,
        /// The acting player after the increment.
        player: Player,
    },
    /// The session moved to `level` and both players' counters were zeroed.
    LevelAdvanced {
        /// The new level.
        level: Level,
        /// Both players after the reset.
        players: Vec<Player>,
    },
    /// The final level was cleared.
    GameCompleted,
    /// All state was discarded.
    SessionReset,
}

impl SessionChange {
    /// Returns the change type name (used for logging).
    #[must_use]
    pub fn change_type(&self) -> &'static str {
        match self {
            Self::AgeGateDecided(_) => AGE_GATE_DECIDED_CHANGE_TYPE,
            Self::PlayersRegistered(_) => PLAYERS_REGISTERED_CHANGE_TYPE,
            Self::GameStarted => GAME_STARTED_CHANGE_TYPE,
            Self::CurrentPlayerChanged(_) => CURRENT_PLAYER_CHANGED_CHANGE_TYPE,
            Self::PromptCompleted { .. } => PROMPT_COMPLETED_CHANGE_TYPE,
            Self::LevelAdvanced { .. } => LEVEL_ADVANCED_CHANGE_TYPE,
            Self::GameCompleted => GAME_COMPLETED_CHANGE_TYPE,
            Self::SessionReset => SESSION_RESET_CHANGE_TYPE,
        }
    }
}
