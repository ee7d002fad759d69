//! Concrete session stores.
//!
//! `JsonFileSnapshotStore` keeps one JSON blob per key on disk and
//! `SqliteRecordStore` keeps field rows and player rows in SQLite.

pub mod file_snapshot_store;
pub mod schema;
pub mod sqlite_record_store;

pub use file_snapshot_store::JsonFileSnapshotStore;
pub use sqlite_record_store::SqliteRecordStore;
