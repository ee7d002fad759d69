//! Storage form of a whole session.
//!
//! The completed-prompt set is held as a sorted list here and converted back
//! into a set when a session is rebuilt; the in-memory set is never written
//! directly.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use truthdare_core::error::DomainError;
use truthdare_core::model::{
    AgeGateDecision, Level, PROMPTS_PER_TYPE_PER_LEVEL, Player, PlayerId, PromptId,
};

use super::aggregates::GameSession;

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

fn default_version() -> u32 {
    SNAPSHOT_VERSION
}

/// Serializable copy of every externally relevant field of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default = "default_version")]
    pub version: u32,
    pub current_level: Level,
    pub current_player_id: Option<PlayerId>,
    pub age_gate_decision: AgeGateDecision,
    pub game_started: bool,
    pub players: Vec<Player>,
    pub completed_prompt_ids: Vec<PromptId>,
    pub game_completed: bool,
}

impl From<&GameSession> for SessionSnapshot {
    fn from(session: &GameSession) -> Self {
        let mut completed_prompt_ids: Vec<PromptId> =
            session.completed_prompt_ids.iter().cloned().collect();
        completed_prompt_ids.sort();
        Self {
            version: SNAPSHOT_VERSION,
            current_level: session.current_level,
            current_player_id: session.current_player_id.clone(),
            age_gate_decision: session.age_gate,
            game_started: session.game_started,
            players: session.players.clone(),
            completed_prompt_ids,
            game_completed: session.game_completed,
        }
    }
}

impl TryFrom<SessionSnapshot> for GameSession {
    type Error = DomainError;

    /// Rebuilds a session, re-checking the invariants a live session
    /// maintains.
    fn try_from(snapshot: SessionSnapshot) -> Result<Self, Self::Error> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(DomainError::Validation(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }
        match snapshot.players.as_slice() {
            [] => {}
            [first, second] if first.id != second.id => {}
            [_, _] => {
                return Err(DomainError::Validation(
                    "snapshot roster repeats a player id".to_owned(),
                ));
            }
            other => {
                return Err(DomainError::Validation(format!(
                    "snapshot roster has {} players",
                    other.len()
                )));
            }
        }
        if let Some(player) = snapshot.players.iter().find(|p| {
            p.truths_completed > PROMPTS_PER_TYPE_PER_LEVEL
                || p.dares_completed > PROMPTS_PER_TYPE_PER_LEVEL
        }) {
            return Err(DomainError::Validation(format!(
                "snapshot counters for {} exceed the per-level cap",
                player.id
            )));
        }
        if snapshot.game_started && snapshot.players.is_empty() {
            return Err(DomainError::Validation(
                "snapshot marks a game started without players".to_owned(),
            ));
        }
        if snapshot.game_completed && snapshot.current_level != Level::MAX {
            return Err(DomainError::Validation(format!(
                "snapshot marks the game completed at level {}",
                snapshot.current_level
            )));
        }
        if let Some(id) = &snapshot.current_player_id {
            if !snapshot.players.iter().any(|p| &p.id == id) {
                return Err(DomainError::Validation(format!(
                    "snapshot turn holder {id} is not on the roster"
                )));
            }
        }

        let completed_prompt_ids: HashSet<PromptId> =
            snapshot.completed_prompt_ids.into_iter().collect();

        let mut session = Self::new();
        session.current_level = snapshot.current_level;
        session.current_player_id = snapshot.current_player_id;
        session.game_started = snapshot.game_started;
        session.game_completed = snapshot.game_completed;
        session.age_gate = snapshot.age_gate_decision;
        session.players = snapshot.players;
        session.completed_prompt_ids = completed_prompt_ids;
        Ok(session)
    }
}
