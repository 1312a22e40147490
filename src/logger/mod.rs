//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with support for:
//! - Console output with color control
//! - File output with multiple formats (Full, Compact, JSON)

pub mod config;

pub use config::*;

use std::fs::{self, File, OpenOptions};
use std::io::IsTerminal;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the global subscriber with the given configuration
pub fn init_logger(config: LoggerConfig) -> anyhow::Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    // File layer must be added BEFORE the console layer, otherwise ANSI codes
    // from span field formatting leak into the file.
    // See: https://github.com/tokio-rs/tracing/issues/1817
    let file_layer = if config.file.enabled {
        let writer = Mutex::new(open_log_file(&config.file)?);
        let layer = match config.file.format {
            LogFormat::Full => fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer)
                .boxed(),
            LogFormat::Compact => fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .compact()
                .with_writer(writer)
                .boxed(),
            LogFormat::Json => fmt::layer()
                .with_ansi(false)
                .json()
                .with_current_span(true)
                .with_writer(writer)
                .boxed(),
        };
        Some(layer)
    } else {
        None
    };

    let console_layer = config.console.enabled.then(|| {
        let use_ansi = config.console.colored && std::io::stdout().is_terminal();
        fmt::layer()
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("Failed to install global tracing subscriber")?;

    Ok(())
}

fn open_log_file(config: &FileConfig) -> anyhow::Result<File> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .write(true)
        .append(config.append)
        .truncate(!config.append)
        .open(&config.path)
        .with_context(|| format!("Failed to open log file {}", config.path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_open_log_file_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let config = FileConfig::new(
            true,
            dir.path().join("nested/deeper/waitlist.log"),
            true,
            LogFormat::Json,
        );

        let mut file = open_log_file(&config).unwrap();
        writeln!(file, "hello").unwrap();
        assert!(config.path.exists());
    }

    #[test]
    fn test_open_log_file_truncates_without_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("waitlist.log");
        fs::write(&path, "previous run\n").unwrap();

        let config = FileConfig::new(true, path.clone(), false, LogFormat::Full);
        drop(open_log_file(&config).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        fs::write(&path, "previous run\n").unwrap();
        let config = FileConfig::new(true, path.clone(), true, LogFormat::Full);
        drop(open_log_file(&config).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous run\n");
    }

    #[test]
    fn test_init_logger_rejects_invalid_config() {
        let config = LoggerConfig {
            console: ConsoleConfig::new(false, false),
            ..LoggerConfig::default()
        };
        assert!(init_logger(config).is_err());
    }
}
