//! Configuration module for the console core.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Console configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL; `None` switches the console into demonstration mode
    pub api_base_url: Option<String>,
    /// Path to the SQLite file holding the persisted credential and active unit
    pub state_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Per-request timeout applied by the gateway
    pub request_timeout: Duration,
    /// Quiescence window before a map viewport query is issued
    pub map_debounce: Duration,
    /// How long to wait for a device position fix
    pub geo_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("MAGVLYN_API_BASE_URL")
            .ok()
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let state_path = env::var("MAGVLYN_STATE_PATH")
            .unwrap_or_else(|_| "./data/console.sqlite".to_string())
            .into();

        let log_level = env::var("MAGVLYN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_base_url,
            state_path,
            log_level,
            request_timeout: Duration::from_secs(read_number("MAGVLYN_REQUEST_TIMEOUT_SECS", 30)),
            map_debounce: Duration::from_millis(read_number("MAGVLYN_MAP_DEBOUNCE_MS", 300)),
            geo_timeout: Duration::from_secs(read_number("MAGVLYN_GEO_TIMEOUT_SECS", 10)),
        }
    }

    /// Configuration for a console talking to `base_url`, with defaults elsewhere.
    pub fn for_backend(base_url: impl Into<String>, state_path: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: Some(base_url.into()),
            state_path: state_path.into(),
            ..Self::demo()
        }
    }

    /// Configuration with no backend.
    pub fn demo() -> Self {
        Self {
            api_base_url: None,
            state_path: "./data/console.sqlite".into(),
            log_level: "info".to_string(),
            request_timeout: Duration::from_secs(30),
            map_debounce: Duration::from_millis(300),
            geo_timeout: Duration::from_secs(10),
        }
    }

    /// Whether the console runs without a backend.
    pub fn is_demo(&self) -> bool {
        self.api_base_url.is_none()
    }
}

fn read_number(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("MAGVLYN_API_BASE_URL");
        env::remove_var("MAGVLYN_STATE_PATH");
        env::remove_var("MAGVLYN_LOG_LEVEL");
        env::remove_var("MAGVLYN_REQUEST_TIMEOUT_SECS");
        env::remove_var("MAGVLYN_MAP_DEBOUNCE_MS");
        env::remove_var("MAGVLYN_GEO_TIMEOUT_SECS");

        let config = Config::from_env();

        assert!(config.api_base_url.is_none());
        assert!(config.is_demo());
        assert_eq!(config.state_path, PathBuf::from("./data/console.sqlite"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.map_debounce, Duration::from_millis(300));
        assert_eq!(config.geo_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_for_backend_is_networked() {
        let config = Config::for_backend("http://localhost:8000/api", "/tmp/state.sqlite");
        assert!(!config.is_demo());
        assert_eq!(config.api_base_url.as_deref(), Some("http://localhost:8000/api"));
        assert_eq!(config.state_path, PathBuf::from("/tmp/state.sqlite"));
    }
}
