//! Configuration management for Trellis
//!
//! Settings are layered, lowest priority first:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables
//!
//! # Usage
//!
//! ```no_run
//! use trellis::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Server listening on: {}", config.server.bind_addr);
//! ```
//!
//! # Environment Variables
//!
//! Any key can be overridden with `TRELLIS__<section>__<key>`, for example
//! `TRELLIS__SERVER__BASE_URL=https://repo.example.org/` or
//! `TRELLIS__STORAGE__BACKEND=fjall`.
//!
//! # Configuration File
//!
//! Loaded from `config/trellis.toml` unless `TRELLIS_CONFIG` points elsewhere.

mod models;
mod sources;
mod validation;

pub use models::{
    AuthConfig, CacheConfig, Config, CorsConfig, EventsConfig, ServerConfig, StorageBackend,
    StorageConfig, TelemetryConfig,
};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the file is malformed or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server]\ninitialize_root = false\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert!(!config.server.initialize_root);
        assert_eq!(config.telemetry.log_filter, "info");
    }

    #[test]
    fn test_validation_catches_bad_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[server]\nbase_url = \"repo.example.org\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[server]
bind_addr = "0.0.0.0:8080"
base_url = "http://localhost:8080/"

[storage]
backend = "fjall"
path = "data/resources"
binary_path = "data/binaries"

[cache]
max_age = 600
must_revalidate = false

[cors]
enabled = true
allow_origin = ["*"]

[auth]
admin_users = ["admin"]
principal_header = "X-Forwarded-User"

[events]
enabled = false

[telemetry]
log_filter = "trellis=debug,tower_http=info"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Fjall);
        assert_eq!(
            config.storage.binary_path.as_deref(),
            Some(std::path::Path::new("data/binaries"))
        );
        assert_eq!(config.cache.max_age, 600);
        assert!(!config.cache.must_revalidate);
        assert_eq!(config.auth.principal_header.as_deref(), Some("X-Forwarded-User"));
        assert!(!config.events.enabled);
        assert_eq!(config.telemetry.log_filter, "trellis=debug,tower_http=info");
    }
}
