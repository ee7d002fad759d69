//! Aggregate root for a two-player session.

use std::collections::HashSet;

use truthdare_core::error::DomainError;
use truthdare_core::model::{
    AgeGateDecision, Gender, Level, Player, PlayerId, Prompt, PromptId, PromptType,
};

use super::events::SessionChange;

/// Identifier given to the first registered player.
pub const FIRST_PLAYER_ID: &str = "player1";

/// Identifier given to the second registered player.
pub const SECOND_PLAYER_ID: &str = "player2";

/// Name and gender submitted for one player at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRegistration {
    pub name: String,
    pub gender: Gender,
}

impl PlayerRegistration {
    /// Creates a registration.
    #[must_use]
    pub fn new(name: impl Into<String>, gender: Gender) -> Self {
        Self {
            name: name.into(),
            gender,
        }
    }
}

/// Result of a successful level advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    /// Play continues at the contained level.
    Advanced(Level),
    /// The final level was cleared.
    GameCompleted,
}

/// The single mutable aggregate of a game.
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    pub(crate) current_level: Level,
    pub(crate) current_player_id: Option<PlayerId>,
    pub(crate) game_started: bool,
    pub(crate) game_completed: bool,
    pub(crate) age_gate: AgeGateDecision,
    /// Empty before setup, exactly two entries afterwards.
    pub(crate) players: Vec<Player>,
    /// Grows for the whole game; only `reset` empties it.
    pub(crate) completed_prompt_ids: HashSet<PromptId>,
    /// Changes pending persistence.
    uncommitted_changes: Vec<SessionChange>,
}

impl PartialEq for GameSession {
    fn eq(&self, other: &Self) -> bool {
        self.current_level == other.current_level
            && self.current_player_id == other.current_player_id
            && self.game_started == other.game_started
            && self.game_completed == other.game_completed
            && self.age_gate == other.age_gate
            && self.players == other.players
            && self.completed_prompt_ids == other.completed_prompt_ids
    }
}

impl Eq for GameSession {}

impl GameSession {
    /// Creates the empty initial session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current_level(&self) -> Level {
        self.current_level
    }

    #[must_use]
    pub fn current_player_id(&self) -> Option<&PlayerId> {
        self.current_player_id.as_ref()
    }

    #[must_use]
    pub fn game_started(&self) -> bool {
        self.game_started
    }

    #[must_use]
    pub fn game_completed(&self) -> bool {
        self.game_completed
    }

    #[must_use]
    pub fn age_gate(&self) -> AgeGateDecision {
        self.age_gate
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn completed_prompt_ids(&self) -> &HashSet<PromptId> {
        &self.completed_prompt_ids
    }

    /// Looks a roster member up by id.
    #[must_use]
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == id)
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_id.as_ref().and_then(|id| self.player(id))
    }

    /// Whether both players have been registered.
    #[must_use]
    pub fn has_full_roster(&self) -> bool {
        self.players.len() == 2
    }

    /// Whether `player_id` may still take a prompt of `prompt_type` this level.
    /// Unknown players can take nothing.
    #[must_use]
    pub fn can_choose_type(&self, player_id: &PlayerId, prompt_type: PromptType) -> bool {
        self.player(player_id)
            .is_some_and(|player| player.can_take(prompt_type))
    }

    /// True iff every player has completed five truths and five dares.
    #[must_use]
    pub fn is_level_complete(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(Player::is_capped)
    }

    /// Records the age-gate answer. Only the first answer counts; returns
    /// whether this call changed anything.
    pub fn decide_age_gate(&mut self, allowed: bool) -> bool {
        if self.age_gate != AgeGateDecision::Undecided {
            return false;
        }
        self.age_gate = if allowed {
            AgeGateDecision::Allowed
        } else {
            AgeGateDecision::Denied
        };
        self.uncommitted_changes
            .push(SessionChange::AgeGateDecided(self.age_gate));
        true
    }

    /// Creates both players with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if either trimmed name is empty and
    /// `DomainError::Precondition` if a roster already exists. The session is
    /// unchanged on error.
    pub fn register_players(
        &mut self,
        first: &PlayerRegistration,
        second: &PlayerRegistration,
    ) -> Result<(), DomainError> {
        if !self.players.is_empty() {
            return Err(DomainError::Precondition(
                "players are already registered".to_owned(),
            ));
        }
        let first_name = first.name.trim();
        let second_name = second.name.trim();
        if first_name.is_empty() || second_name.is_empty() {
            return Err(DomainError::Validation(
                "both players need a name".to_owned(),
            ));
        }

        self.players = vec![
            Player::new(PlayerId::new(FIRST_PLAYER_ID), first_name, first.gender),
            Player::new(PlayerId::new(SECOND_PLAYER_ID), second_name, second.gender),
        ];
        self.uncommitted_changes
            .push(SessionChange::PlayersRegistered(self.players.clone()));
        Ok(())
    }

    /// Marks setup as finished.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the roster is not full.
    pub fn start_game(&mut self) -> Result<(), DomainError> {
        if !self.has_full_roster() {
            return Err(DomainError::Precondition(
                "two players must be registered before the game starts".to_owned(),
            ));
        }
        if !self.game_started {
            self.game_started = true;
            self.uncommitted_changes.push(SessionChange::GameStarted);
        }
        Ok(())
    }

    /// Gives the turn to `player_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PlayerNotFound` if the id is not on the roster.
    pub fn seat_player(&mut self, player_id: &PlayerId) -> Result<(), DomainError> {
        if self.player(player_id).is_none() {
            return Err(DomainError::PlayerNotFound(player_id.clone()));
        }
        self.set_current_player(Some(player_id.clone()));
        Ok(())
    }

    /// Seats the first player when nobody holds the turn. Returns the player
    /// holding the turn afterwards, or `None` before setup.
    pub fn ensure_current_player(&mut self) -> Option<PlayerId> {
        if self.current_player_id.is_none() && self.has_full_roster() {
            let first = self.players[0].id.clone();
            self.set_current_player(Some(first));
        }
        self.current_player_id.clone()
    }

    /// Records `prompt` as completed by the current player and passes the turn.
    ///
    /// The turn passes by strict alternation, then one fix-up applies: if the
    /// next player has already capped both counters while the acting player
    /// has not, the acting player keeps the turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if nobody holds the turn, the
    /// prompt was already completed, the prompt's gender or level does not
    /// fit the acting player and current level, or the acting player already
    /// took five prompts of that type this level.
    pub fn complete_prompt(&mut self, prompt: &Prompt) -> Result<(), DomainError> {
        let acting_index = self.current_player_index().ok_or_else(|| {
            DomainError::Precondition("no player holds the turn".to_owned())
        })?;
        if self.completed_prompt_ids.contains(&prompt.id) {
            return Err(DomainError::Precondition(format!(
                "prompt {} was already completed",
                prompt.id
            )));
        }
        let acting = &self.players[acting_index];
        if prompt.gender != acting.gender || prompt.level != self.current_level {
            return Err(DomainError::Precondition(format!(
                "prompt {} is not eligible for {} at level {}",
                prompt.id, acting.id, self.current_level
            )));
        }
        if !acting.can_take(prompt.prompt_type) {
            return Err(DomainError::Precondition(format!(
                "{} already completed every {} this level",
                acting.id, prompt.prompt_type
            )));
        }

        self.completed_prompt_ids.insert(prompt.id.clone());
        let acting = &mut self.players[acting_index];
        match prompt.prompt_type {
            PromptType::Truth => acting.truths_completed += 1,
            PromptType::Dare => acting.dares_completed += 1,
        }
        self.uncommitted_changes.push(SessionChange::PromptCompleted {
            prompt_id: prompt.id.clone(),
            player: acting.clone(),
        });

        self.pass_turn(acting_index);
        Ok(())
    }

    /// Moves to the next level, or completes the game at the final level.
    ///
    /// The completed-prompt set is deliberately left intact: prompts shown at
    /// an earlier level stay excluded for the rest of the game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the level is not complete or
    /// the game is already completed.
    pub fn advance_level(&mut self) -> Result<LevelOutcome, DomainError> {
        if self.game_completed {
            return Err(DomainError::Precondition(
                "the game is already completed".to_owned(),
            ));
        }
        if !self.is_level_complete() {
            return Err(DomainError::Precondition(format!(
                "level {} is not complete",
                self.current_level
            )));
        }

        let Some(next) = self.current_level.next() else {
            self.game_completed = true;
            self.uncommitted_changes.push(SessionChange::GameCompleted);
            return Ok(LevelOutcome::GameCompleted);
        };

        self.current_level = next;
        for player in &mut self.players {
            player.truths_completed = 0;
            player.dares_completed = 0;
        }
        self.uncommitted_changes.push(SessionChange::LevelAdvanced {
            level: next,
            players: self.players.clone(),
        });
        self.set_current_player(None);
        Ok(LevelOutcome::Advanced(next))
    }

    /// Discards everything and returns to the initial state.
    pub fn reset(&mut self) {
        *self = Self::default();
        self.uncommitted_changes.push(SessionChange::SessionReset);
    }

    /// Restores the turn holder read back from durable storage. Ignored
    /// unless the roster is full and `player_id` is on it; returns whether
    /// the turn holder was set.
    pub fn restore_current_player(&mut self, player_id: PlayerId) -> bool {
        if !self.has_full_roster() || self.player(&player_id).is_none() {
            return false;
        }
        if self.current_player_id.as_ref() != Some(&player_id) {
            self.set_current_player(Some(player_id));
        }
        true
    }

    /// Returns changes pending persistence.
    #[must_use]
    pub fn uncommitted_changes(&self) -> &[SessionChange] {
        &self.uncommitted_changes
    }

    /// Removes and returns changes pending persistence.
    pub fn take_uncommitted_changes(&mut self) -> Vec<SessionChange> {
        std::mem::take(&mut self.uncommitted_changes)
    }

    fn current_player_index(&self) -> Option<usize> {
        let id = self.current_player_id.as_ref()?;
        self.players.iter().position(|p| &p.id == id)
    }

    fn pass_turn(&mut self, acting_index: usize) {
        let rotated = (acting_index + 1) % self.players.len();
        let next_index =
            if self.players[rotated].is_capped() && !self.players[acting_index].is_capped() {
                acting_index
            } else {
                rotated
            };
        let next_id = self.players[next_index].id.clone();
        self.set_current_player(Some(next_id));
    }

    fn set_current_player(&mut self, player_id: Option<PlayerId>) {
        self.current_player_id.clone_from(&player_id);
        self.uncommitted_changes
            .push(SessionChange::CurrentPlayerChanged(player_id));
    }
}
