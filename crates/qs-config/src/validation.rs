//! Configuration validation module.
//!
//! Collects every violation in one pass so that a misconfigured deployment
//! fails at startup with the full list instead of one error at a time.

use crate::{AppConfig, CacheConfig, ObservabilityConfig, RedisConfig};
use std::fmt;
use std::net::SocketAddr;
use url::Url;

/// Configuration validation error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    /// Jitter ratio must be between 0.0 and 1.0.
    InvalidJitterRatio { value: f64 },
    /// A TTL or count must be positive.
    NonPositiveValue { name: String },
    /// Namespace contains characters that break glob patterns.
    InvalidNamespace { value: String },
    /// URL format is invalid.
    InvalidUrl { url_type: String, message: String },
    /// Pool size exceeds maximum allowed.
    PoolSizeTooLarge { value: u32, maximum: u32 },
    /// Log level is invalid.
    InvalidLogLevel { value: String },
    /// Log format is invalid.
    InvalidLogFormat { value: String },
    /// Metrics listen address is invalid.
    InvalidMetricsAddr { value: String },
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJitterRatio { value } => {
                write!(f, "Invalid TTL jitter ratio: {} (must be between 0.0 and 1.0)", value)
            }
            Self::NonPositiveValue { name } => write!(f, "'{}' must be positive", name),
            Self::InvalidNamespace { value } => {
                write!(f, "Invalid cache namespace '{}': whitespace and glob characters are not allowed", value)
            }
            Self::InvalidUrl { url_type, message } => write!(f, "Invalid {} URL: {}", url_type, message),
            Self::PoolSizeTooLarge { value, maximum } => {
                write!(f, "Pool size {} exceeds maximum allowed ({})", value, maximum)
            }
            Self::InvalidLogLevel { value } => {
                write!(f, "Invalid log level: '{}' (valid: trace, debug, info, warn, error)", value)
            }
            Self::InvalidLogFormat { value } => {
                write!(f, "Invalid log format: '{}' (valid: pretty, json)", value)
            }
            Self::InvalidMetricsAddr { value } => write!(f, "Invalid metrics address: '{}'", value),
        }
    }
}

impl std::error::Error for ConfigValidationError {}

/// Result of configuration validation containing all errors found.
#[derive(Debug, Default)]
pub struct ValidationResult {
    errors: Vec<ConfigValidationError>,
}

impl ValidationResult {
    fn add_error(&mut self, error: ConfigValidationError) {
        self.errors.push(error);
    }

    /// Returns true if validation passed (no errors).
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the validation errors.
    pub fn errors(&self) -> &[ConfigValidationError] {
        &self.errors
    }

    /// Converts to Result, returning Err with all errors if any exist.
    pub fn into_result(self) -> Result<(), Vec<ConfigValidationError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Maximum connection pool size.
    const MAX_POOL_SIZE: u32 = 1000;
    /// Valid log levels.
    const VALID_LOG_LEVELS: &'static [&'static str] = &["trace", "debug", "info", "warn", "error"];
    /// Valid log formats.
    const VALID_LOG_FORMATS: &'static [&'static str] = &["pretty", "json"];

    /// Validates the entire application configuration.
    ///
    /// Returns Ok(()) if valid, or Err with all validation errors found.
    pub fn validate(config: &AppConfig) -> Result<(), Vec<ConfigValidationError>> {
        let mut result = ValidationResult::default();

        Self::validate_redis(&config.redis, &mut result);
        Self::validate_cache(&config.cache, &mut result);
        Self::validate_observability(&config.observability, &mut result);

        result.into_result()
    }

    fn validate_redis(config: &RedisConfig, result: &mut ValidationResult) {
        if !config.enabled {
            return;
        }

        match Url::parse(&config.url) {
            Ok(url) if url.scheme() == "redis" || url.scheme() == "rediss" => {}
            Ok(_) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: "URL must start with redis:// or rediss://".to_string(),
            }),
            Err(e) => result.add_error(ConfigValidationError::InvalidUrl {
                url_type: "redis".to_string(),
                message: e.to_string(),
            }),
        }

        if config.pool_size == 0 {
            result.add_error(ConfigValidationError::NonPositiveValue {
                name: "redis.pool_size".to_string(),
            });
        }
        if config.pool_size > Self::MAX_POOL_SIZE {
            result.add_error(ConfigValidationError::PoolSizeTooLarge {
                value: config.pool_size,
                maximum: Self::MAX_POOL_SIZE,
            });
        }
    }

    fn validate_cache(config: &CacheConfig, result: &mut ValidationResult) {
        if !(0.0..=1.0).contains(&config.ttl_jitter_ratio) {
            result.add_error(ConfigValidationError::InvalidJitterRatio {
                value: config.ttl_jitter_ratio,
            });
        }

        if config
            .namespace
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '*' | '?' | '[' | ']'))
        {
            result.add_error(ConfigValidationError::InvalidNamespace {
                value: config.namespace.clone(),
            });
        }

        let counts = [
            ("cache.negative_ttl_secs", config.negative_ttl_secs),
            ("cache.scan_page_size", u64::from(config.scan_page_size)),
            ("cache.background_writers", config.background_writers as u64),
        ];
        for (name, value) in counts {
            if value == 0 {
                result.add_error(ConfigValidationError::NonPositiveValue { name: name.to_string() });
            }
        }

        for (name, policy) in config.entities.named() {
            if policy.ttl_secs == 0 {
                result.add_error(ConfigValidationError::NonPositiveValue {
                    name: format!("cache.entities.{name}.ttl_secs"),
                });
            }
        }
    }

    fn validate_observability(config: &ObservabilityConfig, result: &mut ValidationResult) {
        let level = config.log_level.to_lowercase();
        if !Self::VALID_LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogLevel {
                value: config.log_level.clone(),
            });
        }

        let format = config.log_format.to_lowercase();
        if !Self::VALID_LOG_FORMATS.contains(&format.as_str()) {
            result.add_error(ConfigValidationError::InvalidLogFormat {
                value: config.log_format.clone(),
            });
        }

        if config.metrics_enabled && config.metrics_addr.parse::<SocketAddr>().is_err() {
            result.add_error(ConfigValidationError::InvalidMetricsAddr {
                value: config.metrics_addr.clone(),
            });
        }
    }
}
