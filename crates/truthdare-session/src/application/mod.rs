//! Application layer for the session context.

pub mod engine;
pub mod persistence;
pub mod query_handlers;
