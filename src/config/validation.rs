use super::models::{Config, StorageBackend};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("base_url '{0}' must be an absolute http(s) URL ending in '/'")]
    InvalidBaseUrl(String),

    #[error("fjall storage backend requires a non-empty storage.path")]
    MissingStoragePath,

    #[error("CORS is enabled but cors.allow_origin is empty")]
    EmptyCorsOrigins,

    #[error("server.max_payload_bytes must be positive")]
    InvalidPayloadLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_storage(config)?;
    validate_cors(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if let Some(base_url) = &config.server.base_url {
        let scheme_ok = base_url.starts_with("http://") || base_url.starts_with("https://");
        if !scheme_ok || !base_url.ends_with('/') {
            return Err(ValidationError::InvalidBaseUrl(base_url.clone()));
        }
    }

    if config.server.max_payload_bytes == 0 {
        return Err(ValidationError::InvalidPayloadLimit);
    }

    Ok(())
}

fn validate_storage(config: &Config) -> Result<(), ValidationError> {
    if config.storage.backend == StorageBackend::Fjall
        && config.storage.path.as_os_str().is_empty()
    {
        return Err(ValidationError::MissingStoragePath);
    }
    Ok(())
}

fn validate_cors(config: &Config) -> Result<(), ValidationError> {
    if config.cors.enabled && config.cors.allow_origin.is_empty() {
        return Err(ValidationError::EmptyCorsOrigins);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_base_url_rules() {
        let mut config = Config::default();
        config.server.base_url = Some("https://example.org/".into());
        assert!(validate(&config).is_ok());

        config.server.base_url = Some("https://example.org".into());
        assert!(matches!(validate(&config), Err(ValidationError::InvalidBaseUrl(_))));

        config.server.base_url = Some("ftp://example.org/".into());
        assert!(matches!(validate(&config), Err(ValidationError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_fjall_requires_path() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Fjall;
        config.storage.path = PathBuf::new();
        assert!(matches!(validate(&config), Err(ValidationError::MissingStoragePath)));
    }

    #[test]
    fn test_cors_and_payload_limits() {
        let mut config = Config::default();
        config.cors.enabled = true;
        config.cors.allow_origin.clear();
        assert!(matches!(validate(&config), Err(ValidationError::EmptyCorsOrigins)));

        let mut config = Config::default();
        config.server.max_payload_bytes = 0;
        assert!(matches!(validate(&config), Err(ValidationError::InvalidPayloadLimit)));
    }
}
