//! Configuration settings structures for waitlist-rs
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "waitlist-rs".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/waitlist.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_dispatch_cron() -> String {
    // every five minutes, seconds field first
    "0 */5 * * * *".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_match_cap() -> u32 {
    5
}

fn default_page_concurrency() -> u32 {
    1
}

fn default_batch_timeout() -> u64 {
    240
}

fn default_template_id() -> String {
    "waitlist-match".to_string()
}

fn default_base_domain() -> String {
    "teetimes.example.com".to_string()
}

fn default_webhook_method() -> String {
    "POST".to_string()
}

fn default_webhook_timeout() -> u64 {
    10
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Database Configuration
// ============================================================================

/// Diesel database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[serde(default)]
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Whether to automatically run pending migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connection_timeout: default_connection_timeout(),
            auto_migrate: false,
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console_config = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file_config = self.file.into_file_config()?;

        LoggerConfig::new(console_config, file_config, self.level).map_err(|e| {
            ConfigError::ValidationError {
                field: "logger".to_string(),
                message: e.to_string(),
            }
        })
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        Ok(FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
        ))
    }
}

// ============================================================================
// Dispatch Configuration
// ============================================================================

/// Waitlist dispatch batch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Whether the cron-driven dispatcher runs in `serve`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cron expression (with seconds) for the dispatch tick
    #[serde(default = "default_dispatch_cron")]
    pub cron: String,

    /// Users fetched per batch invocation
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum matched dates referenced by a single notification
    #[serde(default = "default_match_cap")]
    pub match_cap: u32,

    /// Users dispatched concurrently within one page
    #[serde(default = "default_page_concurrency")]
    pub page_concurrency: u32,

    /// Upper bound for one course batch, in seconds
    #[serde(default = "default_batch_timeout")]
    pub batch_timeout_seconds: u64,

    /// Template identifier handed to the notification provider
    #[serde(default = "default_template_id")]
    pub template_id: String,

    /// Domain under which course subdomains are served (deep links)
    #[serde(default = "default_base_domain")]
    pub base_domain: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            cron: default_dispatch_cron(),
            page_size: default_page_size(),
            match_cap: default_match_cap(),
            page_concurrency: default_page_concurrency(),
            batch_timeout_seconds: default_batch_timeout(),
            template_id: default_template_id(),
            base_domain: default_base_domain(),
        }
    }
}

// ============================================================================
// Notifier Configuration
// ============================================================================

/// Notification provider backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotifierBackend {
    /// Only emits a tracing event per notification
    #[default]
    Log,
    /// Posts the notification as JSON to a webhook
    Webhook,
}

/// Webhook provider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Target URL
    #[serde(default)]
    pub url: String,

    /// HTTP method
    #[serde(default = "default_webhook_method")]
    pub method: String,

    /// Extra request headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request timeout in seconds
    #[serde(default = "default_webhook_timeout")]
    pub timeout_seconds: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: default_webhook_method(),
            headers: HashMap::new(),
            timeout_seconds: default_webhook_timeout(),
        }
    }
}

/// Notification delivery configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NotifierConfig {
    /// Which provider to use
    #[serde(default)]
    pub backend: NotifierBackend,

    /// Webhook settings, used when `backend = "webhook"`
    #[serde(default)]
    pub webhook: WebhookConfig,
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,

    /// Waitlist dispatch configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Notification provider configuration
    #[serde(default)]
    pub notifier: NotifierConfig,
}
