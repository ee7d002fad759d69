//! Domain error types.

use thiserror::Error;

use crate::model::{PlayerId, PromptId};

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A validation error in domain logic (bad input from the caller).
    #[error("validation error: {0}")]
    Validation(String),

    /// An operation was invoked in a state that does not allow it.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// A player id is not part of the roster.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// A prompt id is not part of the catalog.
    #[error("prompt not found: {0}")]
    PromptNotFound(PromptId),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
