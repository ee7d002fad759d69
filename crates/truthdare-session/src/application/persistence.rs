//! Persistence gateway: snapshot writes, queued record writes, startup load.
//!
//! The snapshot store is authoritative. Every committed operation rewrites the
//! full snapshot synchronously. Record-store writes go through an ordered,
//! unbounded queue drained by one background task, so the engine never waits
//! on them and a `clear_all` can never be overtaken by an earlier write. The
//! record store is read back for the turn holder during rehydration and as a
//! fallback when the snapshot is missing or unreadable.
//!
//! No failure in here is returned to the engine; everything is logged and
//! dropped.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use truthdare_core::model::{AgeGateDecision, Level, Player, PlayerId, PromptId};
use truthdare_core::repository::{RecordKey, RecordStore, SnapshotStore};

use crate::domain::aggregates::{FIRST_PLAYER_ID, GameSession, SECOND_PLAYER_ID};
use crate::domain::events::SessionChange;
use crate::domain::snapshot::{SNAPSHOT_VERSION, SessionSnapshot};

/// Fixed key of the session snapshot.
pub const SESSION_SNAPSHOT_KEY: &str = "truthdare-session";

/// One queued record-store operation.
#[derive(Debug)]
enum RecordWrite {
    Field(RecordKey, serde_json::Value),
    Player(Player),
    ClearAll,
    Flush(oneshot::Sender<()>),
}

/// Owns both stores and the record-write queue.
pub struct PersistenceGateway {
    snapshots: Arc<dyn SnapshotStore>,
    records: Arc<dyn RecordStore>,
    writes: mpsc::UnboundedSender<RecordWrite>,
}

impl std::fmt::Debug for PersistenceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceGateway")
            .field("writer_running", &!self.writes.is_closed())
            .finish_non_exhaustive()
    }
}

impl PersistenceGateway {
    /// Creates the gateway and spawns its record writer task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(snapshots: Arc<dyn SnapshotStore>, records: Arc<dyn RecordStore>) -> Self {
        let (writes, queue) = mpsc::unbounded_channel();
        tokio::spawn(drain_record_writes(Arc::clone(&records), queue));
        Self {
            snapshots,
            records,
            writes,
        }
    }

    /// Persists the changes of one engine operation: rewrites the snapshot
    /// and queues the matching record writes.
    ///
    /// A reset overwrites the snapshot with the empty session rather than
    /// deleting it. A missing snapshot sends startup to the record store,
    /// whose queued `clear_all` may not have run yet.
    pub fn commit(&self, session: &GameSession, changes: &[SessionChange]) {
        if changes.is_empty() {
            return;
        }
        self.save_snapshot(session);
        for change in changes {
            debug!(change_type = change.change_type(), "queueing record writes");
            for write in record_writes(session, change) {
                self.enqueue(write);
            }
        }
    }

    /// Serializes `session` and replaces the stored snapshot.
    pub fn save_snapshot(&self, session: &GameSession) {
        let blob = match serde_json::to_string(&SessionSnapshot::from(session)) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "snapshot serialization failed");
                return;
            }
        };
        if let Err(e) = self.snapshots.save(SESSION_SNAPSHOT_KEY, &blob) {
            warn!(error = %e, "snapshot write failed; continuing in memory");
        }
    }

    /// Reads the stored snapshot back into a session. Missing, corrupt or
    /// invariant-violating snapshots yield `None`.
    #[must_use]
    pub fn load_snapshot(&self) -> Option<GameSession> {
        let blob = match self.snapshots.load(SESSION_SNAPSHOT_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "snapshot read failed");
                return None;
            }
        };
        let snapshot: SessionSnapshot = match serde_json::from_str(&blob) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "snapshot is not valid JSON for this version");
                return None;
            }
        };
        match GameSession::try_from(snapshot) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "snapshot rejected");
                None
            }
        }
    }

    /// Reads the turn holder from the record store.
    pub async fn load_current_player_id(&self) -> Option<PlayerId> {
        self.load_record::<Option<PlayerId>>(RecordKey::CurrentPlayerId)
            .await
            .flatten()
    }

    /// Rebuilds a session from record-store fields and player rows. Returns
    /// `None` when the store holds nothing or what it holds is inconsistent.
    pub async fn recover_from_records(&self) -> Option<GameSession> {
        let mut players = Vec::with_capacity(2);
        for id in [FIRST_PLAYER_ID, SECOND_PLAYER_ID] {
            match self.records.load_player(&PlayerId::new(id)).await {
                Ok(Some(player)) => players.push(player),
                Ok(None) => {}
                Err(e) => {
                    warn!(player_id = id, error = %e, "player record read failed");
                    return None;
                }
            }
        }
        let age_gate_decision = self
            .load_record::<AgeGateDecision>(RecordKey::AgeGateDecision)
            .await;
        if players.is_empty() && age_gate_decision.is_none() {
            return None;
        }

        let snapshot = SessionSnapshot {
            version: SNAPSHOT_VERSION,
            current_level: self
                .load_record::<Level>(RecordKey::CurrentLevel)
                .await
                .unwrap_or_default(),
            current_player_id: self.load_current_player_id().await,
            age_gate_decision: age_gate_decision.unwrap_or_default(),
            game_started: self
                .load_record::<bool>(RecordKey::GameStarted)
                .await
                .unwrap_or(false),
            players,
            completed_prompt_ids: self
                .load_record::<Vec<PromptId>>(RecordKey::CompletedPromptIds)
                .await
                .unwrap_or_default(),
            game_completed: self
                .load_record::<bool>(RecordKey::GameCompleted)
                .await
                .unwrap_or(false),
        };
        match GameSession::try_from(snapshot) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(error = %e, "record store holds an inconsistent session");
                None
            }
        }
    }

    /// Startup load: the snapshot if readable, else whatever the record store
    /// can rebuild (re-saved as the new snapshot), else an empty session.
    pub async fn load_session(&self) -> GameSession {
        if let Some(session) = self.load_snapshot() {
            return session;
        }
        match self.recover_from_records().await {
            Some(session) => {
                info!("session recovered from record store");
                self.save_snapshot(&session);
                session
            }
            None => GameSession::new(),
        }
    }

    /// Waits until every record write queued so far has been applied.
    pub async fn flush(&self) {
        let (done, applied) = oneshot::channel();
        if self.writes.send(RecordWrite::Flush(done)).is_ok() {
            let _ = applied.await;
        }
    }

    async fn load_record<T: DeserializeOwned>(&self, key: RecordKey) -> Option<T> {
        match self.records.load_field(key).await {
            Ok(Some(value)) => match serde_json::from_value(value) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    warn!(field = key.as_str(), error = %e, "record field has unexpected shape");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(field = key.as_str(), error = %e, "record field read failed");
                None
            }
        }
    }

    fn enqueue(&self, write: RecordWrite) {
        if self.writes.send(write).is_err() {
            warn!("record writer has stopped; write dropped");
        }
    }
}

/// Translates one change into the record writes that persist it.
fn record_writes(session: &GameSession, change: &SessionChange) -> Vec<RecordWrite> {
    match change {
        SessionChange::AgeGateDecided(decision) => {
            vec![field(RecordKey::AgeGateDecision, decision)]
        }
        SessionChange::PlayersRegistered(players) => {
            players.iter().cloned().map(RecordWrite::Player).collect()
        }
        SessionChange::GameStarted => vec![field(RecordKey::GameStarted, &true)],
        SessionChange::CurrentPlayerChanged(player_id) => {
            vec![field(RecordKey::CurrentPlayerId, player_id)]
        }
        SessionChange::PromptCompleted { player, .. } => vec![
            RecordWrite::Player(player.clone()),
            field(
                RecordKey::CompletedPromptIds,
                &SessionSnapshot::from(session).completed_prompt_ids,
            ),
        ],
        SessionChange::LevelAdvanced { level, players } => {
            let mut writes = vec![field(RecordKey::CurrentLevel, level)];
            writes.extend(players.iter().cloned().map(RecordWrite::Player));
            writes
        }
        SessionChange::GameCompleted => vec![field(RecordKey::GameCompleted, &true)],
        SessionChange::SessionReset => vec![RecordWrite::ClearAll],
    }
}

fn field<T: serde::Serialize + ?Sized>(key: RecordKey, value: &T) -> RecordWrite {
    // Only enums, bools, levels, ids and id lists reach here.
    let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
    RecordWrite::Field(key, value)
}

async fn drain_record_writes(
    records: Arc<dyn RecordStore>,
    mut queue: mpsc::UnboundedReceiver<RecordWrite>,
) {
    while let Some(write) = queue.recv().await {
        let (target, result) = match write {
            RecordWrite::Field(key, value) => {
                (key.as_str().to_owned(), records.save_field(key, value).await)
            }
            RecordWrite::Player(player) => {
                (format!("player {}", player.id), records.upsert_player(&player).await)
            }
            RecordWrite::ClearAll => ("all records".to_owned(), records.clear_all().await),
            RecordWrite::Flush(done) => {
                let _ = done.send(());
                continue;
            }
        };
        if let Err(e) = result {
            warn!(target = %target, error = %e, "record write failed; durable state lags memory");
        }
    }
    debug!("record writer stopped");
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use truthdare_core::model::Gender;
    use truthdare_test_support::{
        FailingRecordStore, FailingSnapshotStore, RecordingRecordStore, RecordingSnapshotStore,
    };

    use super::*;
    use crate::domain::aggregates::PlayerRegistration;

    fn registered_session() -> GameSession {
        let mut session = GameSession::new();
        session.decide_age_gate(true);
        session
            .register_players(
                &PlayerRegistration::new("Alex", Gender::Male),
                &PlayerRegistration::new("Sam", Gender::Female),
            )
            .unwrap();
        session.start_game().unwrap();
        session.ensure_current_player();
        session
    }

    #[tokio::test]
    async fn test_commit_writes_snapshot_and_record_fields() {
        // Arrange
        let snapshots = Arc::new(RecordingSnapshotStore::new());
        let records = Arc::new(RecordingRecordStore::new());
        let gateway = PersistenceGateway::spawn(snapshots.clone(), records.clone());
        let mut session = registered_session();
        let changes = session.take_uncommitted_changes();

        // Act
        gateway.commit(&session, &changes);
        gateway.flush().await;

        // Assert
        assert_eq!(snapshots.save_count(), 1);
        assert!(snapshots.blob(SESSION_SNAPSHOT_KEY).is_some());
        assert_eq!(records.field(RecordKey::AgeGateDecision), Some(json!("allowed")));
        assert_eq!(records.field(RecordKey::GameStarted), Some(json!(true)));
        assert_eq!(records.field(RecordKey::CurrentPlayerId), Some(json!("player1")));
        assert_eq!(records.player("player2").unwrap().name, "Sam");
    }

    #[tokio::test]
    async fn test_reset_empties_snapshot_and_clears_records_after_earlier_writes() {
        // Arrange
        let snapshots = Arc::new(RecordingSnapshotStore::new());
        let records = Arc::new(RecordingRecordStore::new());
        let gateway = PersistenceGateway::spawn(snapshots.clone(), records.clone());
        let mut session = registered_session();
        let changes = session.take_uncommitted_changes();
        gateway.commit(&session, &changes);

        // Act
        session.reset();
        let changes = session.take_uncommitted_changes();
        gateway.commit(&session, &changes);
        gateway.flush().await;

        // Assert
        assert_eq!(snapshots.save_count(), 2);
        assert_eq!(gateway.load_snapshot(), Some(GameSession::new()));
        assert_eq!(records.operations().last().unwrap(), "clear_all");
        assert!(records.field(RecordKey::GameStarted).is_none());
        assert!(records.player("player1").is_none());
    }

    #[tokio::test]
    async fn test_failing_stores_are_swallowed() {
        let gateway = PersistenceGateway::spawn(
            Arc::new(FailingSnapshotStore),
            Arc::new(FailingRecordStore),
        );
        let mut session = registered_session();
        let changes = session.take_uncommitted_changes();

        gateway.commit(&session, &changes);
        gateway.flush().await;

        assert!(gateway.load_snapshot().is_none());
        assert!(gateway.load_current_player_id().await.is_none());
        assert_eq!(gateway.load_session().await, GameSession::new());
    }

    #[tokio::test]
    async fn test_load_snapshot_round_trips_committed_session() {
        let snapshots = Arc::new(RecordingSnapshotStore::new());
        let gateway =
            PersistenceGateway::spawn(snapshots.clone(), Arc::new(RecordingRecordStore::new()));
        let mut session = registered_session();
        session
            .completed_prompt_ids
            .insert(PromptId::new("t-m-1-01"));
        let changes = session.take_uncommitted_changes();

        gateway.commit(&session, &changes);

        assert_eq!(gateway.load_snapshot(), Some(session));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_treated_as_absent() {
        let gateway = PersistenceGateway::spawn(
            Arc::new(RecordingSnapshotStore::with_blob(SESSION_SNAPSHOT_KEY, "{not json")),
            Arc::new(RecordingRecordStore::new()),
        );

        assert!(gateway.load_snapshot().is_none());
        assert_eq!(gateway.load_session().await, GameSession::new());
    }

    #[tokio::test]
    async fn test_load_session_falls_back_to_record_store() {
        // Arrange
        let mut alex = Player::new(PlayerId::new("player1"), "Alex", Gender::Male);
        alex.truths_completed = 2;
        let sam = Player::new(PlayerId::new("player2"), "Sam", Gender::Female);
        let records = RecordingRecordStore::new()
            .with_player(alex)
            .with_player(sam)
            .with_field(RecordKey::AgeGateDecision, json!("allowed"))
            .with_field(RecordKey::GameStarted, json!(true))
            .with_field(RecordKey::CurrentLevel, json!(2))
            .with_field(RecordKey::CurrentPlayerId, json!("player2"))
            .with_field(RecordKey::CompletedPromptIds, json!(["t-m-2-01", "t-m-2-02"]));
        let gateway =
            PersistenceGateway::spawn(Arc::new(RecordingSnapshotStore::new()), Arc::new(records));

        // Act
        let session = gateway.load_session().await;

        // Assert
        assert_eq!(session.current_level().get(), 2);
        assert_eq!(session.players()[0].truths_completed, 2);
        assert_eq!(session.current_player_id(), Some(&PlayerId::new("player2")));
        assert_eq!(session.completed_prompt_ids().len(), 2);
        assert!(session.game_started());
        assert_eq!(session.age_gate(), AgeGateDecision::Allowed);
    }

    #[tokio::test]
    async fn test_recover_from_records_rejects_half_roster() {
        let records = RecordingRecordStore::new().with_player(Player::new(
            PlayerId::new("player1"),
            "Alex",
            Gender::Male,
        ));
        let gateway =
            PersistenceGateway::spawn(Arc::new(RecordingSnapshotStore::new()), Arc::new(records));

        assert!(gateway.recover_from_records().await.is_none());
    }

    #[tokio::test]
    async fn test_load_current_player_id_treats_null_as_absent() {
        let records =
            RecordingRecordStore::new().with_field(RecordKey::CurrentPlayerId, json!(null));
        let gateway =
            PersistenceGateway::spawn(Arc::new(RecordingSnapshotStore::new()), Arc::new(records));

        assert!(gateway.load_current_player_id().await.is_none());
    }
}
