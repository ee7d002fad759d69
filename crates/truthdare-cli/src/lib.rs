//! Truth or Dare CLI: configuration, store wiring and the game shell.

pub mod command;
pub mod config;
pub mod error;
pub mod render;
pub mod shell;

use std::sync::Arc;

use tracing::{info, warn};
use truthdare_catalog::{PromptCatalog, PromptSelector};
use truthdare_core::repository::RecordStore;
use truthdare_core::rng::{DeterministicRng, SystemRng};
use truthdare_session::application::engine::GameEngine;
use truthdare_session::application::persistence::PersistenceGateway;
use truthdare_store::{JsonFileSnapshotStore, SqliteRecordStore};

use crate::config::AppConfig;
use crate::error::AppError;

/// Loads the catalog, opens both stores and restores the last session.
///
/// A record database that cannot be opened is replaced by an in-memory one
/// so play can continue; the snapshot directory must be usable.
///
/// # Errors
///
/// Returns `AppError::Catalog` if the catalog cannot be loaded and
/// `AppError::Storage` if no store can be opened.
pub async fn bootstrap(config: &AppConfig) -> Result<GameEngine, AppError> {
    let catalog = match &config.catalog_path {
        Some(path) => PromptCatalog::load(path),
        None => PromptCatalog::builtin(),
    }
    .map_err(AppError::Catalog)?;
    info!(prompts = catalog.len(), "catalog loaded");

    let snapshots = JsonFileSnapshotStore::new(&config.data_dir).map_err(AppError::Storage)?;
    let records: Arc<dyn RecordStore> =
        match SqliteRecordStore::connect(&config.records_path()).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                warn!(error = %e, "record database unavailable; records kept in memory");
                Arc::new(SqliteRecordStore::in_memory().await.map_err(AppError::Storage)?)
            }
        };

    let rng: Box<dyn DeterministicRng> = match config.seed {
        Some(seed) => Box::new(SystemRng::seeded(seed)),
        None => Box::new(SystemRng::from_entropy()),
    };
    let persistence = PersistenceGateway::spawn(Arc::new(snapshots), records);
    let engine = GameEngine::restore(PromptSelector::new(Arc::new(catalog)), rng, persistence).await;
    info!(
        level = engine.state().current_level().get(),
        started = engine.state().game_started(),
        "session restored"
    );
    Ok(engine)
}
