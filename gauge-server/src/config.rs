//! Layered TOML configuration
//!
//! Two layers merge in order: the user config (platform config dir) and the
//! project config (`.gauge/config.toml`). Later layers win for values they
//! set explicitly; defaults apply last.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use directories::ProjectDirs;
use gauge_core::HttpProviderConfig;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9470;
pub const DEFAULT_PROVIDER_TIMEOUT_SECONDS: u64 = 30;

/// Config exactly as written in TOML, every value optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawGaugeConfig {
    pub server: RawServerSection,
    pub database: RawDatabaseSection,
    pub provider: RawProviderSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawDatabaseSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawProviderSection {
    /// Base URL of the generator service; absent means scripted provider
    pub base_url: Option<Url>,
    pub timeout_seconds: Option<u64>,
}

/// Merged configuration with defaults applied
#[derive(Debug, Clone)]
pub struct GaugeConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub provider_base_url: Option<Url>,
    pub provider_timeout: Duration,
}

impl GaugeConfig {
    /// Provider client config, when a generator service is configured
    pub fn provider(&self) -> Option<HttpProviderConfig> {
        self.provider_base_url.clone().map(|base_url| {
            let mut config = HttpProviderConfig::new(base_url);
            config.timeout = self.provider_timeout;
            config
        })
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<GaugeConfig> {
        let mut raw = RawGaugeConfig::default();

        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            let contents = std::fs::read_to_string(&user_path)?;
            let user_config: RawGaugeConfig = toml::from_str(&contents)?;
            raw = Self::merge_raw(raw, user_config);
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            let contents = std::fs::read_to_string(&project_path)?;
            let project_config: RawGaugeConfig = toml::from_str(&contents)?;
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gauge").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with GAUGE_PROJECT_CONFIG_DIR env var (useful for isolated tests)
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var("GAUGE_PROJECT_CONFIG_DIR") {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".gauge/config.toml")
        }
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawGaugeConfig, overlay: RawGaugeConfig) -> RawGaugeConfig {
        RawGaugeConfig {
            server: RawServerSection {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            database: RawDatabaseSection {
                path: overlay.database.path.or(base.database.path),
            },
            provider: RawProviderSection {
                base_url: overlay.provider.base_url.or(base.provider.base_url),
                timeout_seconds: overlay
                    .provider
                    .timeout_seconds
                    .or(base.provider.timeout_seconds),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawGaugeConfig) -> GaugeConfig {
        GaugeConfig {
            host: raw.server.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: raw.server.port.unwrap_or(DEFAULT_PORT),
            database_path: raw.database.path.unwrap_or_else(Self::default_database_path),
            provider_base_url: raw.provider.base_url,
            provider_timeout: Duration::from_secs(
                raw.provider
                    .timeout_seconds
                    .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_SECONDS),
            ),
        }
    }

    fn default_database_path() -> PathBuf {
        ProjectDirs::from("", "", "gauge")
            .map(|dirs| dirs.data_dir().join("gauge.db"))
            .unwrap_or_else(|| PathBuf::from("gauge.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_on_empty_config() {
        let config = ConfigLoader::finalize(RawGaugeConfig::default());
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.provider_base_url.is_none());
        assert!(config.provider().is_none());
    }

    #[test]
    fn overlay_wins_over_base() {
        let base: RawGaugeConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000
            "#,
        )
        .unwrap();
        let overlay: RawGaugeConfig = toml::from_str(
            r#"
            [server]
            port = 9100

            [provider]
            base_url = "http://localhost:9800/api/"
            timeout_seconds = 5
            "#,
        )
        .unwrap();

        let config = ConfigLoader::finalize(ConfigLoader::merge_raw(base, overlay));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9100);
        assert_eq!(config.provider_timeout, Duration::from_secs(5));

        let provider = config.provider().unwrap();
        assert_eq!(provider.base_url.as_str(), "http://localhost:9800/api/");
        assert_eq!(provider.timeout, Duration::from_secs(5));
    }

    #[test]
    fn unknown_sections_are_ignored() {
        let raw: RawGaugeConfig = toml::from_str(
            r#"
            [future_section]
            key = "value"
            "#,
        )
        .unwrap();
        let config = ConfigLoader::finalize(raw);
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
