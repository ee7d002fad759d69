//! Read-only views of a session for rendering.

use serde::Serialize;
use truthdare_core::model::{AgeGateDecision, Gender, LEVEL_PROMPT_TOTAL, PlayerId};

use crate::domain::aggregates::GameSession;

/// Read-only view of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub player_id: PlayerId,
    pub name: String,
    pub gender: Gender,
    pub truths_completed: u32,
    pub dares_completed: u32,
    /// Whether it is this player's turn.
    pub is_current: bool,
}

/// Read-only view of the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub current_level: u8,
    pub current_player_id: Option<PlayerId>,
    pub age_gate_decision: AgeGateDecision,
    pub game_started: bool,
    pub game_completed: bool,
    pub players: Vec<PlayerView>,
    /// Prompts completed by both players at the current level.
    pub level_progress: u32,
    /// Prompts needed by both players to clear a level.
    pub level_prompt_total: u32,
    pub level_complete: bool,
    /// Prompts completed since the game began, across all levels.
    pub completed_prompt_count: usize,
}

/// Builds the render view of `session`.
#[must_use]
pub fn session_view(session: &GameSession) -> SessionView {
    let current = session.current_player_id();
    let players: Vec<PlayerView> = session
        .players()
        .iter()
        .map(|player| PlayerView {
            player_id: player.id.clone(),
            name: player.name.clone(),
            gender: player.gender,
            truths_completed: player.truths_completed,
            dares_completed: player.dares_completed,
            is_current: current == Some(&player.id),
        })
        .collect();
    let level_progress = players
        .iter()
        .map(|p| p.truths_completed + p.dares_completed)
        .sum();

    SessionView {
        current_level: session.current_level().get(),
        current_player_id: current.cloned(),
        age_gate_decision: session.age_gate(),
        game_started: session.game_started(),
        game_completed: session.game_completed(),
        players,
        level_progress,
        level_prompt_total: LEVEL_PROMPT_TOTAL,
        level_complete: session.is_level_complete(),
        completed_prompt_count: session.completed_prompt_ids().len(),
    }
}
