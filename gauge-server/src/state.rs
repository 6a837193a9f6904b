//! Shared application state for the gauge server

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use gauge_core::{
    AssessmentEngine, HttpProvider, HttpProviderConfig, ScriptedProvider, SqliteSessionStore,
};

use crate::error::ServerError;

/// Shared application state accessible by all handlers
pub struct AppState {
    /// The assessment engine, sole writer of session state
    pub engine: AssessmentEngine<SqliteSessionStore>,
    /// Direct store handle for scenario and profile reads
    pub store: Arc<SqliteSessionStore>,
    /// When the server started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Open the database at `path` and wire up the engine.
    ///
    /// Without a generator service configured, the deterministic scripted
    /// provider is used instead.
    pub fn open(path: &Path, provider: Option<HttpProviderConfig>) -> Result<Self, ServerError> {
        let store = Arc::new(SqliteSessionStore::open(path)?);
        let engine = match provider {
            Some(config) => {
                tracing::info!(base_url = %config.base_url, "using HTTP generator service");
                let provider = Arc::new(HttpProvider::new(config)?);
                AssessmentEngine::new(
                    store.clone(),
                    provider.clone(),
                    provider.clone(),
                    provider,
                )
            }
            None => {
                tracing::warn!("no generator service configured, using scripted provider");
                let provider = Arc::new(ScriptedProvider::new());
                AssessmentEngine::new(
                    store.clone(),
                    provider.clone(),
                    provider.clone(),
                    provider,
                )
            }
        };

        Ok(Self {
            engine,
            store,
            started_at: Utc::now(),
        })
    }

    /// In-memory state with the scripted provider (for testing)
    pub fn in_memory() -> Result<Self, ServerError> {
        let store = Arc::new(SqliteSessionStore::open_in_memory()?);
        let provider = Arc::new(ScriptedProvider::new());
        let engine = AssessmentEngine::new(
            store.clone(),
            provider.clone(),
            provider.clone(),
            provider,
        );
        Ok(Self {
            engine,
            store,
            started_at: Utc::now(),
        })
    }

    /// Returns how long the server has been running
    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_state_starts_clean() {
        let state = AppState::in_memory().unwrap();
        assert!(state.uptime_seconds() >= 0);
        use gauge_core::SessionStore;
        assert!(state.store.list_scenarios().unwrap().is_empty());
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gauge.db");
        let _state = AppState::open(&path, None).unwrap();
        assert!(path.exists());
    }
}
