//! Shared test mocks and utilities for the truth-or-dare progression engine.

mod rng;
mod store;

pub use rng::{MockRng, SequenceRng};
pub use store::{
    FailingRecordStore, FailingSnapshotStore, RecordingRecordStore, RecordingSnapshotStore,
};
