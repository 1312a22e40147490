//! Configuration validation logic
//!
//! This module provides validation methods for all configuration structures
//! to ensure configuration values are within acceptable ranges and formats.

use crate::config::error::ConfigError;
use crate::config::settings::{
    DatabaseConfig, DispatchConfig, FileSettings, LoggerSettings, NotifierBackend,
    NotifierConfig, Settings,
};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

/// Valid webhook methods
const VALID_WEBHOOK_METHODS: &[&str] = &["POST", "PUT"];

impl DatabaseConfig {
    /// Validate database configuration
    ///
    /// # Validation Rules
    /// - URL must not be empty and must be a postgres URL
    /// - Max/min connections must be greater than 0, min <= max
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::validation(
                "database.url",
                "Database URL is required. Please specify a valid database connection string.",
            ));
        }

        if !self.is_valid_database_url() {
            return Err(ConfigError::validation(
                "database.url",
                "Invalid database URL format. Expected format: postgres://[user:password@]host[:port]/database",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigError::validation(
                "database.max_connections",
                "Max connections must be greater than 0.",
            ));
        }

        if self.min_connections == 0 {
            return Err(ConfigError::validation(
                "database.min_connections",
                "Min connections must be greater than 0.",
            ));
        }

        if self.min_connections > self.max_connections {
            return Err(ConfigError::ValidationError {
                field: "database.min_connections".to_string(),
                message: format!(
                    "Min connections ({}) cannot exceed max connections ({}).",
                    self.min_connections, self.max_connections
                ),
            });
        }

        Ok(())
    }

    fn is_valid_database_url(&self) -> bool {
        ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme))
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// # Validation Rules
    /// - Log level must be one of: trace, debug, info, warn, error
    /// - If file logging is enabled, path must not be empty
    /// - Log format must be one of: full, compact, json
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        self.file.validate()?;

        Ok(())
    }
}

impl DispatchConfig {
    /// Validate dispatch configuration
    ///
    /// # Validation Rules
    /// - Page size, match cap, page concurrency and batch timeout must be positive
    /// - Cron expression must not be empty when the dispatcher is enabled
    /// - Base domain must not contain a scheme
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.cron.trim().is_empty() {
            return Err(ConfigError::validation(
                "dispatch.cron",
                "Cron expression is required when dispatch is enabled.",
            ));
        }

        if self.page_size == 0 {
            return Err(ConfigError::validation(
                "dispatch.page_size",
                "Page size must be greater than 0.",
            ));
        }

        if self.match_cap == 0 {
            return Err(ConfigError::validation(
                "dispatch.match_cap",
                "Match cap must be greater than 0.",
            ));
        }

        if self.page_concurrency == 0 {
            return Err(ConfigError::validation(
                "dispatch.page_concurrency",
                "Page concurrency must be greater than 0.",
            ));
        }

        if self.batch_timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "dispatch.batch_timeout_seconds",
                "Batch timeout must be greater than 0 seconds.",
            ));
        }

        if self.template_id.trim().is_empty() {
            return Err(ConfigError::validation(
                "dispatch.template_id",
                "Template id must not be empty.",
            ));
        }

        if self.base_domain.is_empty() || self.base_domain.contains("://") {
            return Err(ConfigError::validation(
                "dispatch.base_domain",
                "Base domain must be a bare host name such as 'teetimes.example.com'.",
            ));
        }

        Ok(())
    }
}

impl NotifierConfig {
    /// Validate notifier configuration
    ///
    /// The webhook section is only checked when it is the selected backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend != NotifierBackend::Webhook {
            return Ok(());
        }

        let webhook = &self.webhook;
        if !(webhook.url.starts_with("https://") || webhook.url.starts_with("http://")) {
            return Err(ConfigError::validation(
                "notifier.webhook.url",
                "Webhook URL must start with http:// or https://.",
            ));
        }

        if !VALID_WEBHOOK_METHODS.contains(&webhook.method.to_uppercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "notifier.webhook.method".to_string(),
                message: format!(
                    "Invalid webhook method '{}'. Valid methods are: {}",
                    webhook.method,
                    VALID_WEBHOOK_METHODS.join(", ")
                ),
            });
        }

        if webhook.timeout_seconds == 0 {
            return Err(ConfigError::validation(
                "notifier.webhook.timeout_seconds",
                "Webhook timeout must be greater than 0 seconds.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate all configuration settings
    ///
    /// Returns the first validation error encountered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.logger.validate()?;
        self.dispatch.validate()?;
        self.notifier.validate()?;
        Ok(())
    }
}
