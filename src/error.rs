use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

/// Failure reported by the persistence collaborator.
///
/// These never abort a local mutation: the adapter keeps the optimistic
/// state and hands the error to the caller and the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("task {0} not found")]
    NotFound(Uuid),
    #[error("backend worker dropped before replying")]
    Cancelled,
}

/// Pointer interaction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("a drag session is already active for task {0}")]
    SessionActive(Uuid),
}

/// Detail editor validation failures. These block save and never reach the
/// timeline core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("end date must not be before start date")]
    EndBeforeStart,
}

/// Offline store failures.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed task file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
