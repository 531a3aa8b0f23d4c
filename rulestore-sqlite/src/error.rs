//! Adapter error types

use thiserror::Error;

/// Errors for policy rule persistence
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Failed to open database: {0}")]
    Open(#[source] rusqlite::Error),

    #[error("Schema creation failed: {0}")]
    Schema(#[source] rusqlite::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Starting transaction: {0}")]
    Begin(#[source] rusqlite::Error),

    /// A unit of work failed and rolling it back failed too
    #[error("{source}: rolling back transaction: {rollback}")]
    Rollback {
        source: Box<AdapterError>,
        rollback: rusqlite::Error,
    },

    #[error("Committing transaction: {0}")]
    Commit(#[source] rusqlite::Error),

    #[error("Invalid filter type: {0}")]
    InvalidFilter(&'static str),

    #[error("Mismatched update: {old} old rules, {new} new rules")]
    MismatchedUpdate { old: usize, new: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
