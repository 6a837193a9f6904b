//! Server error types

use thiserror::Error;

/// Errors that can occur in the gauge server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Error from the assessment engine or store
    #[error(transparent)]
    Core(#[from] gauge_core::AssessmentError),

    /// Error constructing the provider client
    #[error(transparent)]
    Provider(#[from] gauge_core::ProviderError),

    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
