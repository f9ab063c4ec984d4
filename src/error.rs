use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the task lifecycle engine and its collaborators.
///
/// None of these are fatal to the process: validation errors are shown to
/// the user, everything else is recovered from and logged.
#[derive(Debug, Error)]
pub enum SproutsError {
    /// A required field was empty or a user value could not be parsed.
    #[error("{0}")]
    Validation(String),

    /// An id did not resolve to any record.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    /// The durable slot exists but could not be read or decoded.
    #[error("failed to read slot '{slot}': {reason}")]
    StorageRead { slot: String, reason: String },

    /// The durable slot could not be written.
    #[error("failed to write slot '{slot}': {reason}")]
    StorageWrite { slot: String, reason: String },

    /// Species reference data could not be fetched for a plant.
    #[error("species lookup failed for '{name}': {reason}")]
    Enrichment { name: String, reason: String },

    /// Data reached a state the model does not allow.
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("invalid config file {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SproutsError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        SproutsError::NotFound { kind: "Task", id: id.into() }
    }

    pub fn plant_not_found(id: impl Into<String>) -> Self {
        SproutsError::NotFound { kind: "Plant", id: id.into() }
    }
}

pub type Result<T> = std::result::Result<T, SproutsError>;
