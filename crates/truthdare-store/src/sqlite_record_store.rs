//! `SQLite` implementation of the `RecordStore` trait.

use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use tracing::debug;
use truthdare_core::error::DomainError;
use truthdare_core::model::{Gender, Player, PlayerId};
use truthdare_core::repository::{RecordKey, RecordStore};

use crate::schema::SCHEMA;

/// SQLite-backed record store.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Wraps an existing pool. The schema must already exist.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if missing) the database file at `path` and ensures
    /// the schema exists.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the database cannot be opened
    /// or the schema cannot be created.
    pub async fn connect(path: &Path) -> Result<Self, DomainError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        let store = Self::new(pool);
        store.create_schema().await?;
        debug!(path = %path.display(), "record store opened");
        Ok(store)
    }

    /// Opens a private in-memory database with the schema applied.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Infrastructure` if the schema cannot be created.
    pub async fn in_memory() -> Result<Self, DomainError> {
        let options: SqliteConnectOptions = "sqlite::memory:".parse().map_err(storage_error)?;
        // One connection that never expires; each new connection would see a
        // fresh, empty database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        let store = Self::new(pool);
        store.create_schema().await?;
        Ok(store)
    }

    /// Returns a reference to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn create_schema(&self) -> Result<(), DomainError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn save_field(
        &self,
        key: RecordKey,
        value: serde_json::Value,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO game_state (key, value) VALUES (?, ?)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value
            ",
        )
        .bind(key.as_str())
        .bind(value.to_string())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn load_field(&self, key: RecordKey) -> Result<Option<serde_json::Value>, DomainError> {
        let row = sqlx::query("SELECT value FROM game_state WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let raw: String = row.try_get("value").map_err(storage_error)?;
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| DomainError::Infrastructure(format!("field {}: {e}", key.as_str())))
    }

    async fn upsert_player(&self, player: &Player) -> Result<(), DomainError> {
        sqlx::query(
            r"
            INSERT INTO players (id, name, gender, truths_completed, dares_completed)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                gender = excluded.gender,
                truths_completed = excluded.truths_completed,
                dares_completed = excluded.dares_completed
            ",
        )
        .bind(player.id.as_str())
        .bind(&player.name)
        .bind(player.gender.to_string())
        .bind(i64::from(player.truths_completed))
        .bind(i64::from(player.dares_completed))
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;
        Ok(())
    }

    async fn load_player(&self, id: &PlayerId) -> Result<Option<Player>, DomainError> {
        let row = sqlx::query(
            r"
            SELECT id, name, gender, truths_completed, dares_completed
            FROM players
            WHERE id = ?
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;
        let Some(row) = row else {
            return Ok(None);
        };

        let gender: String = row.try_get("gender").map_err(storage_error)?;
        let gender: Gender = serde_json::from_value(serde_json::Value::String(gender))
            .map_err(|e| DomainError::Infrastructure(format!("player {id} gender: {e}")))?;
        let mut player = Player::new(
            PlayerId::new(row.try_get::<String, _>("id").map_err(storage_error)?),
            row.try_get::<String, _>("name").map_err(storage_error)?,
            gender,
        );
        player.truths_completed = counter(&row, "truths_completed")?;
        player.dares_completed = counter(&row, "dares_completed")?;
        Ok(Some(player))
    }

    async fn clear_all(&self) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;
        sqlx::query("DELETE FROM game_state")
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        sqlx::query("DELETE FROM players")
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        tx.commit().await.map_err(storage_error)?;
        Ok(())
    }
}

fn counter(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<u32, DomainError> {
    let value: i64 = row.try_get(column).map_err(storage_error)?;
    u32::try_from(value)
        .map_err(|_| DomainError::Infrastructure(format!("{column} out of range: {value}")))
}

#[allow(clippy::needless_pass_by_value)]
fn storage_error(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}
