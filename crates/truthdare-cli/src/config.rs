//! Environment configuration.

use std::path::PathBuf;

use crate::error::AppError;

/// Data directory used when `TRUTHDARE_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = ".truthdare";

/// File name of the record database inside the data directory.
pub const RECORDS_DB_FILE: &str = "records.db";

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Holds the snapshot JSON and the record database.
    pub data_dir: PathBuf,
    /// YAML catalog to load instead of the built-in one.
    pub catalog_path: Option<PathBuf>,
    /// Fixed RNG seed for reproducible draws.
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `TRUTHDARE_SEED` is not a `u64`.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `TRUTHDARE_SEED` is not a `u64`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let data_dir = var("TRUTHDARE_DATA_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
        let catalog_path = var("TRUTHDARE_CATALOG").map(PathBuf::from);
        let seed = var("TRUTHDARE_SEED")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|e| AppError::Config(format!("TRUTHDARE_SEED must be a u64: {e}")))
            })
            .transpose()?;

        Ok(Self {
            data_dir,
            catalog_path,
            seed,
        })
    }

    /// Path of the record database.
    #[must_use]
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(RECORDS_DB_FILE)
    }
}
