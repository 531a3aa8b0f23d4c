//! Error types for policy model loading

use thiserror::Error;

/// Errors raised while loading an external rule set into a [`crate::Model`]
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
