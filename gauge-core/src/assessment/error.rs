//! Assessment error types

use thiserror::Error;

use crate::providers::ProviderError;

/// Errors for assessment operations
///
/// Nothing here is fatal to the process: each session is isolated and an
/// error affects only its own (user, scenario, mode) triple.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Unknown session id (404-equivalent)
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Unknown scenario id (404-equivalent)
    #[error("scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Operation not legal in the session's current state
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Malformed input, surfaced immediately without retry
    #[error("validation failed: {0}")]
    Validation(String),

    /// Question source or scorer failed or timed out. No partial state was
    /// committed; the caller may retry the identical request.
    #[error("upstream provider error: {0}")]
    Upstream(#[from] ProviderError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
