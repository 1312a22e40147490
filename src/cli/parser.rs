//! CLI argument parsing with clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tee-time waitlist notifier
#[derive(Parser, Debug)]
#[command(name = "waitlist-rs")]
#[command(about = "Notifies golfers when a tee time opens inside one of their waitlist windows")]
#[command(long_about = "
waitlist-rs keeps golfers' waitlist windows merged and, on a schedule, checks
each course's tee sheet for open slots and notifies the matching golfers.
Progress through a course's users is checkpointed per day, so every batch
picks up where the previous one stopped.

EXAMPLES:
    # Run the dispatch scheduler until Ctrl-C
    waitlist-rs serve

    # Check configuration without starting anything
    waitlist-rs serve --dry-run

    # Process one page of users for a course
    waitlist-rs run-batch --course pebble

    # Process every remaining user for a course today
    waitlist-rs run-batch --course pebble --until-exhausted

    # Use a specific configuration file in production mode
    waitlist-rs --config /etc/waitlist/production.toml --env prod serve

    # Apply, preview or roll back database migrations
    waitlist-rs migrate
    waitlist-rs migrate --dry-run
    waitlist-rs migrate --rollback 1
")]
#[command(version = crate::clap_long_version())]
pub struct Cli {
    /// Subcommand to execute (defaults to `serve`)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Load this single TOML file instead of the layered `config/` directory.
    /// `WAITLIST_*` environment variables still apply on top.
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Selects which `{environment}.toml` overlay is loaded.
    /// Available values: development (dev), test, staging (stage), production (prod)
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the cron-driven dispatcher (default)
    ///
    /// Starts the dispatch schedule from `dispatch.cron` and runs one batch
    /// per active course on every tick until interrupted with Ctrl-C.
    Serve {
        /// Log level override for this process
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Run dispatch batches for one course now
    ///
    /// Processes the next page of the course's users for today, resuming
    /// from the stored checkpoint.
    RunBatch {
        /// Course identifier
        #[arg(long, value_name = "ID", value_parser = super::validation::validate_course_id)]
        course: String,

        /// Keep running batches until every user was processed today
        #[arg(long)]
        until_exhausted: bool,
    },
    /// Database migration operations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of most recent migrations to revert (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "test")]
    Test,
    #[value(name = "staging", alias = "stage")]
    Staging,
    #[value(name = "production", alias = "prod")]
    Production,
}

/// Log level options
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl Cli {
    /// Argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }
        if let Some(Commands::Migrate {
            dry_run: true,
            rollback: Some(_),
        }) = self.command
        {
            return Err("Cannot use --dry-run and --rollback together".to_string());
        }
        Ok(())
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Test => crate::config::Environment::Test,
            Environment::Staging => crate::config::Environment::Staging,
            Environment::Production => crate::config::Environment::Production,
        }
    }
}
