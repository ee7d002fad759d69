//! Truth or Dare CLI: startup error types.

use thiserror::Error;
use truthdare_core::error::DomainError;

/// Startup and runtime errors for the terminal front end.
#[derive(Debug, Error)]
pub enum AppError {
    /// An environment variable is present but invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The prompt catalog could not be loaded.
    #[error("catalog error: {0}")]
    Catalog(DomainError),

    /// A store could not be opened.
    #[error("storage error: {0}")]
    Storage(DomainError),

    /// Terminal I/O failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
