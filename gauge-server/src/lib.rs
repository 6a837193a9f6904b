//! gauge-server - HTTP surface for the gauge assessment engine
//!
//! This crate owns the engine, the SQLite store, and the axum router.
//! Clients (the training dashboard) talk JSON over the REST endpoints in
//! [`http`].

pub mod config;
mod error;
pub mod http;
mod state;

use std::sync::Arc;

use tokio::net::TcpListener;

pub use config::{ConfigLoader, GaugeConfig};
pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;

/// The main gauge server
pub struct GaugeServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl GaugeServer {
    pub fn new(config: ServerConfig, state: Arc<AppState>) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    /// Run the server, binding to the configured address
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::Bind {
                addr: addr.clone(),
                source: e,
            })?;

        tracing::info!("gauge server listening on {}", addr);

        let router = create_router(self.state);
        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))?;

        Ok(())
    }
}

/// Bind configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: config::DEFAULT_HOST.to_string(),
            port: config::DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Returns the socket address string (e.g., "0.0.0.0:9470")
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9470);
    }

    #[test]
    fn server_config_addr() {
        let config = ServerConfig::new("127.0.0.1", 8080);
        assert_eq!(config.addr(), "127.0.0.1:8080");
    }

    #[test]
    fn gauge_server_holds_state() {
        let state = Arc::new(AppState::in_memory().unwrap());
        let server = GaugeServer::new(ServerConfig::new("127.0.0.1", 9000), state);
        assert_eq!(server.config().port, 9000);
        assert!(server.state().uptime_seconds() >= 0);
    }
}
