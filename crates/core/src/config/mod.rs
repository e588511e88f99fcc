//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHELTER_*)
//! 2. TOML config file (if SHELTER_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHELTER_*)
/// 2. TOML config file (if SHELTER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Origin the worker is registered for; relative paths resolve against it
    /// and only responses from it are cached.
    ///
    /// Set via SHELTER_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Version tag naming the current cache store. Changing it discards every
    /// other store on the next activation.
    ///
    /// Set via SHELTER_CACHE_NAME environment variable.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Paths fetched and stored at install time.
    ///
    /// Set via SHELTER_PRECACHE environment variable (comma-separated).
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Page served when neither the network nor the cache can answer.
    ///
    /// Set via SHELTER_OFFLINE_PATH environment variable.
    #[serde(default = "default_offline_path")]
    pub offline_path: String,

    /// Request headers that take part in cache keys.
    ///
    /// Set via SHELTER_VARY_HEADERS environment variable (comma-separated).
    #[serde(default)]
    pub vary_headers: Vec<String>,

    /// Path to SQLite cache database.
    ///
    /// Set via SHELTER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    ///
    /// Set via SHELTER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Optional network timeout in milliseconds; unset means no timeout.
    ///
    /// Set via SHELTER_TIMEOUT_MS environment variable.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

fn default_origin() -> String {
    "http://127.0.0.1:5000".into()
}

fn default_cache_name() -> String {
    "shelter-cache-v2".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/offline.html",
        "/static/css/custom.css",
        "/static/img/logo.png",
        "/static/img/favicon-32x32.png",
        "/static/img/favicon-192x192.png",
        "/static/img/favicon-512x512.png",
        "/static/img/favicon.ico",
        "/static/manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_offline_path() -> String {
    "/offline.html".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./shelter-cache.sqlite")
}

fn default_user_agent() -> String {
    "shelter/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: default_origin(),
            cache_name: default_cache_name(),
            precache: default_precache(),
            offline_path: default_offline_path(),
            vary_headers: Vec::new(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: None,
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHELTER_`
    /// 2. TOML file from `SHELTER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHELTER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHELTER_")
                .ignore(&["CONFIG_FILE", "PRECACHE", "VARY_HEADERS"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let mut config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        if let Ok(list) = std::env::var("SHELTER_PRECACHE") {
            config.precache = split_list(&list);
        }
        if let Ok(list) = std::env::var("SHELTER_VARY_HEADERS") {
            config.vary_headers = split_list(&list);
        }

        config.validate()?;

        Ok(config)
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.origin, "http://127.0.0.1:5000");
        assert_eq!(config.cache_name, "shelter-cache-v2");
        assert_eq!(config.offline_path, "/offline.html");
        assert_eq!(config.precache.len(), 9);
        assert_eq!(config.precache[0], "/");
        assert!(config.precache.contains(&config.offline_path));
        assert_eq!(config.db_path, PathBuf::from("./shelter-cache.sqlite"));
        assert_eq!(config.user_agent, "shelter/0.1");
        assert!(config.vary_headers.is_empty());
        assert!(config.timeout().is_none());
    }

    #[test]
    fn test_timeout_duration() {
        let config = AppConfig { timeout_ms: Some(20_000), ..Default::default() };
        assert_eq!(config.timeout(), Some(Duration::from_millis(20_000)));
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(" /, /offline.html ,,"), ["/", "/offline.html"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_load_from_env_and_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("shelter.toml", "cache_name = \"from-file\"\nuser_agent = \"file-agent\"")?;
            jail.set_env("SHELTER_CONFIG_FILE", "shelter.toml");
            jail.set_env("SHELTER_CACHE_NAME", "from-env");
            jail.set_env("SHELTER_PRECACHE", "/,/offline.html");
            jail.set_env("SHELTER_TIMEOUT_MS", "5000");

            let config = AppConfig::load().expect("config loads");
            assert_eq!(config.cache_name, "from-env");
            assert_eq!(config.user_agent, "file-agent");
            assert_eq!(config.precache, ["/", "/offline.html"]);
            assert_eq!(config.timeout_ms, Some(5000));
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("SHELTER_ORIGIN", "ftp://files.example.com");
            assert!(matches!(AppConfig::load(), Err(ConfigError::Invalid { .. })));
            Ok(())
        });
    }
}
