//! Error types for the chores ecosystem.

use thiserror::Error;

use crate::store::MutationKind;

/// Errors that can occur in chores operations.
#[derive(Error, Debug)]
pub enum ChoresError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Could not decode row: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for chores operations.
pub type ChoresResult<T> = Result<T, ChoresError>;

/// Failures surfaced by the store as its user-visible error message.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to load data: {0}")]
    Fetch(#[source] ChoresError),

    #[error("Failed to {kind}: {source}")]
    Mutation {
        kind: MutationKind,
        #[source]
        source: ChoresError,
    },
}
