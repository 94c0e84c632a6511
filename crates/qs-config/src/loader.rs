//! Configuration loader with layered sources.

use crate::{AppConfig, ConfigValidator};
use config::{Config, ConfigError, Environment, File};
use qs_core::QsError;
use std::path::Path;
use tracing::{debug, info};

/// Loads the application configuration once at startup.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a loader reading from `config_dir`.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `QS_` prefix
    pub fn new(config_dir: impl Into<String>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Loader for the default location (`./config`).
    #[must_use]
    pub fn from_default_location() -> Self {
        Self::new("./config")
    }

    /// Loads and validates the configuration.
    pub fn load(&self) -> Result<AppConfig, QsError> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment = std::env::var("QS_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", self.config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("QS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_qs_error)?;
        let app_config: AppConfig = config.try_deserialize().map_err(config_error_to_qs_error)?;

        ConfigValidator::validate(&app_config).map_err(|errors| {
            let message = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            QsError::Configuration(message)
        })?;

        Ok(app_config)
    }
}

fn config_error_to_qs_error(err: ConfigError) -> QsError {
    QsError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
            [cache]
            namespace = "staging"
            ttl_jitter_ratio = 0.2

            [redis]
            enabled = false
            "#,
        )
        .unwrap();

        let loader = ConfigLoader::new(dir.path().to_string_lossy().to_string());
        let config = loader.load().unwrap();
        assert_eq!(config.cache.namespace, "staging");
        assert!((config.cache.ttl_jitter_ratio - 0.2).abs() < f64::EPSILON);
        assert!(!config.redis.enabled);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("default.toml"),
            r#"
            [cache]
            ttl_jitter_ratio = 1.5
            "#,
        )
        .unwrap();

        let err = ConfigLoader::new(dir.path().to_string_lossy().to_string())
            .load()
            .unwrap_err();
        assert!(matches!(err, QsError::Configuration(msg) if msg.contains("jitter")));
    }

    #[test]
    fn test_missing_directory_yields_defaults() {
        let config = ConfigLoader::new("/nonexistent/qs-config").load().unwrap();
        assert_eq!(config.cache.scan_page_size, 100);
    }
}
