//! Truth or Dare Core: shared domain vocabulary.
//!
//! This crate defines the identifiers, value types, error type and port
//! traits that the catalog, session and store crates depend on. It contains
//! no infrastructure code.

pub mod error;
pub mod model;
pub mod repository;
pub mod rng;
