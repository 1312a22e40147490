//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A setting that loaded but is out of range or malformed
    #[error("Invalid setting {field}: {message}")]
    ValidationError { field: String, message: String },

    /// `WAITLIST_APP_ENV` or `--env` named an unknown environment
    #[error("Unknown environment: {0}")]
    UnknownEnvironment(String),

    /// Conflicting configuration sources were selected
    #[error("Conflicting configuration sources: {0}")]
    MutualExclusivityError(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<String>) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity(message: impl Into<String>) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_names_field() {
        let err = ConfigError::validation("dispatch.page_size", "must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Invalid setting dispatch.page_size: must be greater than 0"
        );
        assert_eq!(
            ConfigError::file_not_found("x.toml").to_string(),
            "Configuration file not found: x.toml"
        );
    }
}
