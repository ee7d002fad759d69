//! Record store database schema.

/// SQL to create the per-field session state table. Values are JSON text.
pub const CREATE_GAME_STATE_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS game_state (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

/// SQL to create the player table, one row per roster slot.
pub const CREATE_PLAYERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS players (
    id               TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    gender           TEXT NOT NULL,
    truths_completed INTEGER NOT NULL DEFAULT 0,
    dares_completed  INTEGER NOT NULL DEFAULT 0
);
";

/// Every schema statement, in execution order.
pub const SCHEMA: [&str; 2] = [CREATE_GAME_STATE_TABLE, CREATE_PLAYERS_TABLE];
