//! Game progression engine.
//!
//! `GameEngine` owns one session and the collaborators it needs: a prompt
//! selector, an RNG and a persistence gateway, all injected at construction.
//! Operations run to completion synchronously; each one that changes state
//! commits its changes to the gateway before returning.

use tracing::{debug, info, instrument, warn};
use truthdare_catalog::{PromptQuery, PromptSelector};
use truthdare_core::error::DomainError;
use truthdare_core::model::{PlayerId, Prompt, PromptId, PromptType};
use truthdare_core::rng::DeterministicRng;

use crate::application::persistence::PersistenceGateway;
use crate::application::query_handlers::{SessionView, session_view};
use crate::domain::aggregates::{GameSession, LevelOutcome, PlayerRegistration};

/// Result of asking for a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChooseOutcome {
    /// An untried prompt for the acting player.
    Drawn(Prompt),
    /// Nothing untried matches; the player should pick the other type.
    Exhausted,
}

/// The session state machine and its collaborators.
pub struct GameEngine {
    session: GameSession,
    selector: PromptSelector,
    rng: Box<dyn DeterministicRng>,
    persistence: PersistenceGateway,
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("session", &self.session)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

impl GameEngine {
    /// Creates an engine over an empty session.
    #[must_use]
    pub fn new(
        selector: PromptSelector,
        rng: Box<dyn DeterministicRng>,
        persistence: PersistenceGateway,
    ) -> Self {
        Self {
            session: GameSession::new(),
            selector,
            rng,
            persistence,
        }
    }

    /// Creates an engine over whatever session durable storage holds, then
    /// rehydrates the turn holder from the record store.
    pub async fn restore(
        selector: PromptSelector,
        rng: Box<dyn DeterministicRng>,
        persistence: PersistenceGateway,
    ) -> Self {
        let session = persistence.load_session().await;
        let mut engine = Self {
            session,
            selector,
            rng,
            persistence,
        };
        engine.rehydrate().await;
        engine
    }

    /// The live session.
    #[must_use]
    pub fn state(&self) -> &GameSession {
        &self.session
    }

    /// A render view of the live session.
    #[must_use]
    pub fn view(&self) -> SessionView {
        session_view(&self.session)
    }

    /// The selector prompts are drawn from.
    #[must_use]
    pub fn selector(&self) -> &PromptSelector {
        &self.selector
    }

    /// Waits for queued record writes to land.
    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    /// Records the age-gate answer. Only the first answer counts.
    #[instrument(skip(self))]
    pub fn set_age_gate_decision(&mut self, allowed: bool) {
        if self.session.decide_age_gate(allowed) {
            info!(decision = ?self.session.age_gate(), "age gate decided");
            self.commit();
        } else {
            debug!("age gate already decided; ignoring");
        }
    }

    /// Creates both players.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank name and
    /// `DomainError::Precondition` if players already exist.
    pub fn register_players(
        &mut self,
        first: &PlayerRegistration,
        second: &PlayerRegistration,
    ) -> Result<(), DomainError> {
        self.session.register_players(first, second)?;
        info!(
            first = %self.session.players()[0].name,
            second = %self.session.players()[1].name,
            "players registered"
        );
        self.commit();
        Ok(())
    }

    /// Begins play.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if two players are not registered.
    pub fn start_game(&mut self) -> Result<(), DomainError> {
        self.session.start_game()?;
        info!("game started");
        self.commit();
        Ok(())
    }

    /// Seats the first player if nobody holds the turn; call at game start
    /// and after each level advancement.
    pub fn ensure_current_player(&mut self) -> Option<PlayerId> {
        let seated = self.session.ensure_current_player();
        self.commit();
        seated
    }

    /// Gives the turn to `player_id`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PlayerNotFound` for an id not on the roster.
    #[instrument(skip(self))]
    pub fn set_current_player(&mut self, player_id: &PlayerId) -> Result<(), DomainError> {
        self.session.seat_player(player_id)?;
        self.commit();
        Ok(())
    }

    /// Draws an untried prompt of `prompt_type` for the acting player.
    /// Changes no session state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if nobody holds the turn or the
    /// acting player already completed five prompts of that type.
    #[instrument(skip(self))]
    pub fn choose_type(&mut self, prompt_type: PromptType) -> Result<ChooseOutcome, DomainError> {
        let player = self.session.current_player().ok_or_else(|| {
            DomainError::Precondition("no player holds the turn".to_owned())
        })?;
        if !player.can_take(prompt_type) {
            return Err(DomainError::Precondition(format!(
                "{} already completed every {prompt_type} this level",
                player.id
            )));
        }
        let query = PromptQuery {
            prompt_type,
            gender: player.gender,
            level: self.session.current_level(),
        };

        match self.selector.select(
            &query,
            self.session.completed_prompt_ids(),
            self.rng.as_mut(),
        ) {
            Some(prompt) => Ok(ChooseOutcome::Drawn(prompt)),
            None => {
                info!(player_id = %player.id, "prompts exhausted for this type");
                Ok(ChooseOutcome::Exhausted)
            }
        }
    }

    /// Marks a drawn prompt as completed by the acting player and passes the
    /// turn.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PromptNotFound` for an id missing from the
    /// catalog and `DomainError::Precondition` when the prompt could not have
    /// been drawn for the acting player right now.
    #[instrument(skip(self))]
    pub fn complete_prompt(&mut self, prompt_id: &PromptId) -> Result<(), DomainError> {
        let prompt = self
            .selector
            .catalog()
            .get(prompt_id)
            .ok_or_else(|| DomainError::PromptNotFound(prompt_id.clone()))?;
        self.session.complete_prompt(prompt)?;
        debug!(
            next_player = ?self.session.current_player_id(),
            "prompt completed"
        );
        self.commit();
        Ok(())
    }

    /// Whether `player_id` may still take a prompt of `prompt_type`.
    #[must_use]
    pub fn can_choose_type(&self, player_id: &PlayerId, prompt_type: PromptType) -> bool {
        self.session.can_choose_type(player_id, prompt_type)
    }

    /// Whether both players cleared the current level.
    #[must_use]
    pub fn check_level_completion(&self) -> bool {
        self.session.is_level_complete()
    }

    /// Moves to the next level or completes the game.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` if the level is not complete or the
    /// game already ended.
    pub fn advance_level(&mut self) -> Result<LevelOutcome, DomainError> {
        let outcome = self.session.advance_level()?;
        match outcome {
            LevelOutcome::Advanced(level) => info!(%level, "level advanced"),
            LevelOutcome::GameCompleted => info!("game completed"),
        }
        self.commit();
        Ok(outcome)
    }

    /// Discards the session and purges both stores.
    pub fn reset_game(&mut self) {
        self.session.reset();
        info!("game reset");
        self.commit();
    }

    /// Restores the turn holder from the record store when the roster is
    /// full. Never fails; unreadable or stale values are ignored.
    pub async fn rehydrate(&mut self) {
        if !self.session.has_full_roster() {
            return;
        }
        let Some(player_id) = self.persistence.load_current_player_id().await else {
            return;
        };
        if self.session.restore_current_player(player_id.clone()) {
            info!(%player_id, "turn holder rehydrated");
            self.commit();
        } else {
            warn!(%player_id, "stored turn holder is not on the roster; ignored");
        }
    }

    fn commit(&mut self) {
        let changes = self.session.take_uncommitted_changes();
        self.persistence.commit(&self.session, &changes);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use truthdare_catalog::PromptCatalog;
    use truthdare_core::model::{Gender, Level};
    use truthdare_core::repository::RecordKey;
    use truthdare_test_support::{
        FailingRecordStore, FailingSnapshotStore, MockRng, RecordingRecordStore,
        RecordingSnapshotStore,
    };

    use super::*;
    use crate::application::persistence::SESSION_SNAPSHOT_KEY;
    use crate::domain::aggregates::{FIRST_PLAYER_ID, SECOND_PLAYER_ID};

    fn prompts_for(
        prompt_type: PromptType,
        gender: Gender,
        level: u8,
        count: usize,
    ) -> Vec<Prompt> {
        (1..=count)
            .map(|n| Prompt {
                id: PromptId::new(format!("{prompt_type}-{gender}-{level}-{n:02}")),
                text: format!("{prompt_type} {n} for {gender} at level {level}"),
                prompt_type,
                gender,
                level: Level::new(level).unwrap(),
            })
            .collect()
    }

    fn full_catalog() -> PromptCatalog {
        let mut prompts = Vec::new();
        for level in 1..=3 {
            for gender in [Gender::Male, Gender::Female] {
                for prompt_type in [PromptType::Truth, PromptType::Dare] {
                    prompts.extend(prompts_for(prompt_type, gender, level, 6));
                }
            }
        }
        PromptCatalog::from_prompts(prompts).unwrap()
    }

    struct Harness {
        engine: GameEngine,
        snapshots: Arc<RecordingSnapshotStore>,
        records: Arc<RecordingRecordStore>,
    }

    fn harness_with(
        catalog: PromptCatalog,
        snapshots: RecordingSnapshotStore,
        records: RecordingRecordStore,
    ) -> Harness {
        let snapshots = Arc::new(snapshots);
        let records = Arc::new(records);
        let persistence = PersistenceGateway::spawn(snapshots.clone(), records.clone());
        let engine = GameEngine::new(
            PromptSelector::new(Arc::new(catalog)),
            Box::new(MockRng),
            persistence,
        );
        Harness {
            engine,
            snapshots,
            records,
        }
    }

    fn harness() -> Harness {
        harness_with(
            full_catalog(),
            RecordingSnapshotStore::new(),
            RecordingRecordStore::new(),
        )
    }

    fn start(engine: &mut GameEngine) {
        engine.set_age_gate_decision(true);
        engine
            .register_players(
                &PlayerRegistration::new("Alex", Gender::Male),
                &PlayerRegistration::new("Sam", Gender::Female),
            )
            .unwrap();
        engine.start_game().unwrap();
        engine.ensure_current_player();
    }

    fn play_turn(engine: &mut GameEngine, prompt_type: PromptType) -> Prompt {
        let ChooseOutcome::Drawn(prompt) = engine.choose_type(prompt_type).unwrap() else {
            panic!("expected a {prompt_type} to be available");
        };
        engine.complete_prompt(&prompt.id).unwrap();
        prompt
    }

    fn counters(engine: &GameEngine, index: usize) -> (u32, u32) {
        let player = &engine.state().players()[index];
        (player.truths_completed, player.dares_completed)
    }

    #[tokio::test]
    async fn test_level_completion_waits_for_both_players_then_advances() {
        // Arrange
        let mut h = harness();
        start(&mut h.engine);
        let alex_turns = [[PromptType::Truth; 5], [PromptType::Dare; 5]].concat();
        let sam_turns = [vec![PromptType::Truth; 5], vec![PromptType::Dare; 4]].concat();

        // Act
        for i in 0..9 {
            play_turn(&mut h.engine, alex_turns[i]);
            assert_eq!(
                h.engine.state().current_player_id(),
                Some(&PlayerId::new(SECOND_PLAYER_ID))
            );
            play_turn(&mut h.engine, sam_turns[i]);
            assert_eq!(
                h.engine.state().current_player_id(),
                Some(&PlayerId::new(FIRST_PLAYER_ID))
            );
        }
        play_turn(&mut h.engine, alex_turns[9]);

        // Assert
        assert_eq!(counters(&h.engine, 0), (5, 5));
        assert_eq!(counters(&h.engine, 1), (5, 4));
        assert!(!h.engine.check_level_completion());
        assert!(matches!(
            h.engine.advance_level(),
            Err(DomainError::Precondition(_))
        ));

        play_turn(&mut h.engine, PromptType::Dare);
        assert!(h.engine.check_level_completion());

        let outcome = h.engine.advance_level().unwrap();
        assert_eq!(outcome, LevelOutcome::Advanced(Level::new(2).unwrap()));
        assert_eq!(h.engine.state().current_level().get(), 2);
        assert_eq!(counters(&h.engine, 0), (0, 0));
        assert_eq!(counters(&h.engine, 1), (0, 0));
        assert_eq!(h.engine.state().current_player_id(), None);
        assert_eq!(h.engine.state().completed_prompt_ids().len(), 20);
        assert_eq!(
            h.engine.ensure_current_player(),
            Some(PlayerId::new(FIRST_PLAYER_ID))
        );
    }

    #[tokio::test]
    async fn test_choose_type_reports_exhaustion_before_counter_cap() {
        // Arrange
        let mut prompts = prompts_for(PromptType::Truth, Gender::Male, 1, 3);
        prompts.extend(prompts_for(PromptType::Dare, Gender::Female, 1, 6));
        let mut h = harness_with(
            PromptCatalog::from_prompts(prompts).unwrap(),
            RecordingSnapshotStore::new(),
            RecordingRecordStore::new(),
        );
        start(&mut h.engine);
        for _ in 0..3 {
            play_turn(&mut h.engine, PromptType::Truth);
            play_turn(&mut h.engine, PromptType::Dare);
        }

        // Act
        let outcome = h.engine.choose_type(PromptType::Truth).unwrap();

        // Assert
        assert_eq!(outcome, ChooseOutcome::Exhausted);
        assert_eq!(counters(&h.engine, 0), (3, 0));
        assert!(h.engine.can_choose_type(&PlayerId::new(FIRST_PLAYER_ID), PromptType::Truth));
    }

    #[tokio::test]
    async fn test_choose_type_does_not_mutate_or_persist() {
        let mut h = harness();
        start(&mut h.engine);
        let saves_before = h.snapshots.save_count();
        let before = h.engine.state().clone();

        let first = h.engine.choose_type(PromptType::Dare).unwrap();
        let second = h.engine.choose_type(PromptType::Dare).unwrap();

        assert_eq!(first, second);
        assert_eq!(h.engine.state(), &before);
        assert_eq!(h.snapshots.save_count(), saves_before);
    }

    #[tokio::test]
    async fn test_choose_type_requires_turn_holder_and_open_type() {
        let mut h = harness();
        assert!(matches!(
            h.engine.choose_type(PromptType::Truth),
            Err(DomainError::Precondition(_))
        ));

        start(&mut h.engine);
        for _ in 0..5 {
            play_turn(&mut h.engine, PromptType::Truth);
            play_turn(&mut h.engine, PromptType::Dare);
        }

        assert!(matches!(
            h.engine.choose_type(PromptType::Truth),
            Err(DomainError::Precondition(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_prompt_rejects_unknown_id() {
        let mut h = harness();
        start(&mut h.engine);

        let result = h.engine.complete_prompt(&PromptId::new("nope"));

        match result.unwrap_err() {
            DomainError::PromptNotFound(id) => assert_eq!(id.as_str(), "nope"),
            other => panic!("expected PromptNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_prompt_persists_player_record_and_completed_set() {
        // Arrange
        let mut h = harness();
        start(&mut h.engine);

        // Act
        let prompt = play_turn(&mut h.engine, PromptType::Truth);
        h.engine.flush().await;

        // Assert
        let alex = h.records.player(FIRST_PLAYER_ID).unwrap();
        assert_eq!(alex.truths_completed, 1);
        assert_eq!(
            h.records.field(RecordKey::CompletedPromptIds),
            Some(json!([prompt.id.as_str()]))
        );
        assert_eq!(
            h.records.field(RecordKey::CurrentPlayerId),
            Some(json!(SECOND_PLAYER_ID))
        );
        let blob = h.snapshots.blob(SESSION_SNAPSHOT_KEY).unwrap();
        assert!(blob.contains(prompt.id.as_str()));
    }

    #[tokio::test]
    async fn test_advance_level_at_final_level_completes_game() {
        let mut h = harness();
        start(&mut h.engine);
        for level in 1..=3 {
            for _ in 0..5 {
                for prompt_type in [PromptType::Truth, PromptType::Dare] {
                    play_turn(&mut h.engine, prompt_type);
                    play_turn(&mut h.engine, prompt_type);
                }
            }
            assert!(h.engine.check_level_completion(), "level {level}");
            h.engine.advance_level().unwrap();
            h.engine.ensure_current_player();
        }
        h.engine.flush().await;

        assert!(h.engine.state().game_completed());
        assert_eq!(h.engine.state().current_level(), Level::MAX);
        assert_eq!(h.records.field(RecordKey::GameCompleted), Some(json!(true)));
        assert_eq!(h.records.field(RecordKey::CurrentLevel), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_reset_then_fresh_start_reproduces_initial_shape() {
        // Arrange
        let mut h = harness();
        start(&mut h.engine);
        play_turn(&mut h.engine, PromptType::Truth);
        play_turn(&mut h.engine, PromptType::Dare);

        // Act
        h.engine.reset_game();
        h.engine.flush().await;

        // Assert
        assert_eq!(h.engine.state(), &GameSession::new());
        let blob = h.snapshots.blob(SESSION_SNAPSHOT_KEY).unwrap();
        assert!(blob.contains(r#""players":[]"#));
        assert_eq!(h.records.operations().last().unwrap(), "clear_all");
        assert!(h.records.player(FIRST_PLAYER_ID).is_none());

        h.engine
            .register_players(
                &PlayerRegistration::new("Kim", Gender::Female),
                &PlayerRegistration::new("Lee", Gender::Male),
            )
            .unwrap();
        h.engine.start_game().unwrap();
        let state = h.engine.state();
        assert_eq!(state.current_level(), Level::FIRST);
        assert_eq!(state.current_player_id(), None);
        assert!(state.completed_prompt_ids().is_empty());
        assert!(
            state
                .players()
                .iter()
                .all(|p| p.truths_completed == 0 && p.dares_completed == 0)
        );
    }

    #[tokio::test]
    async fn test_restart_after_reset_ignores_records_not_yet_cleared() {
        // Arrange
        let mut h = harness();
        start(&mut h.engine);
        play_turn(&mut h.engine, PromptType::Truth);
        h.engine.flush().await;
        h.engine.reset_game();
        assert!(h.records.player(FIRST_PLAYER_ID).is_some());

        // Act
        let persistence = PersistenceGateway::spawn(h.snapshots.clone(), h.records.clone());
        let restored = GameEngine::restore(
            PromptSelector::new(Arc::new(full_catalog())),
            Box::new(MockRng),
            persistence,
        )
        .await;

        // Assert
        assert_eq!(restored.state(), &GameSession::new());
    }

    #[tokio::test]
    async fn test_register_players_validation_error_leaves_state_unchanged() {
        let mut h = harness();

        let result = h.engine.register_players(
            &PlayerRegistration::new("", Gender::Male),
            &PlayerRegistration::new("Sam", Gender::Female),
        );

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert!(h.engine.state().players().is_empty());
        assert_eq!(h.snapshots.save_count(), 0);
    }

    #[tokio::test]
    async fn test_operations_succeed_when_both_stores_fail() {
        let persistence = PersistenceGateway::spawn(
            Arc::new(FailingSnapshotStore),
            Arc::new(FailingRecordStore),
        );
        let mut engine = GameEngine::new(
            PromptSelector::new(Arc::new(full_catalog())),
            Box::new(MockRng),
            persistence,
        );

        start(&mut engine);
        play_turn(&mut engine, PromptType::Truth);
        engine.flush().await;
        engine.rehydrate().await;

        assert_eq!(counters(&engine, 0), (1, 0));
        assert_eq!(
            engine.state().current_player_id(),
            Some(&PlayerId::new(SECOND_PLAYER_ID))
        );
    }

    #[tokio::test]
    async fn test_restore_reloads_snapshot_and_rehydrates_turn_holder() {
        // Arrange
        let mut first = harness();
        start(&mut first.engine);
        play_turn(&mut first.engine, PromptType::Dare);
        first.engine.flush().await;
        let blob = first.snapshots.blob(SESSION_SNAPSHOT_KEY).unwrap();
        let records = RecordingRecordStore::new()
            .with_field(RecordKey::CurrentPlayerId, json!(FIRST_PLAYER_ID));
        let persistence = PersistenceGateway::spawn(
            Arc::new(RecordingSnapshotStore::with_blob(SESSION_SNAPSHOT_KEY, &blob)),
            Arc::new(records),
        );

        // Act
        let engine = GameEngine::restore(
            PromptSelector::new(Arc::new(full_catalog())),
            Box::new(MockRng),
            persistence,
        )
        .await;

        // Assert
        assert_eq!(counters(&engine, 0), (0, 1));
        assert_eq!(engine.state().completed_prompt_ids().len(), 1);
        assert_eq!(
            engine.state().current_player_id(),
            Some(&PlayerId::new(FIRST_PLAYER_ID))
        );
    }

    #[tokio::test]
    async fn test_rehydrate_ignores_turn_holder_not_on_roster() {
        let records = RecordingRecordStore::new()
            .with_field(RecordKey::CurrentPlayerId, json!("player9"));
        let mut h = harness_with(full_catalog(), RecordingSnapshotStore::new(), records);
        start(&mut h.engine);

        h.engine.rehydrate().await;

        assert_eq!(
            h.engine.state().current_player_id(),
            Some(&PlayerId::new(FIRST_PLAYER_ID))
        );
    }

    #[tokio::test]
    async fn test_rehydrate_before_setup_is_a_no_op() {
        let records = RecordingRecordStore::new()
            .with_field(RecordKey::CurrentPlayerId, json!(SECOND_PLAYER_ID));
        let mut h = harness_with(full_catalog(), RecordingSnapshotStore::new(), records);

        h.engine.rehydrate().await;

        assert_eq!(h.engine.state().current_player_id(), None);
        assert_eq!(h.snapshots.save_count(), 0);
    }

    #[tokio::test]
    async fn test_age_gate_is_persisted_once() {
        let mut h = harness();

        h.engine.set_age_gate_decision(false);
        h.engine.set_age_gate_decision(true);
        h.engine.flush().await;

        assert_eq!(h.snapshots.save_count(), 1);
        assert_eq!(
            h.records.field(RecordKey::AgeGateDecision),
            Some(json!("denied"))
        );
    }
}
