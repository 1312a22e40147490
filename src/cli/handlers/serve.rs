//! Serve command handler
//!
//! Runs the cron-driven dispatcher until Ctrl-C, or validates configuration
//! with `--dry-run`.

use std::sync::Arc;

use super::migrate::MigrateCommandHandler;
use crate::config::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::{AppError, AppResult};
use crate::jobs::DispatchCron;
use crate::state::AppState;

pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, dry_run: bool) -> AppResult<()> {
        if dry_run {
            self.validate_only()
        } else {
            self.run().await
        }
    }

    /// Validate configuration without touching the database
    pub fn validate_only(&self) -> AppResult<()> {
        self.config.validate()?;

        let dispatch = &self.config.dispatch;
        println!("✓ Configuration is valid");
        println!(
            "✓ {} {}",
            self.config.application.name, self.config.application.version
        );
        if dispatch.enabled {
            println!("✓ Dispatch schedule: {}", dispatch.cron);
        } else {
            println!("! Dispatch is disabled (dispatch.enabled = false)");
        }
        println!(
            "✓ Page size {}, match cap {}, concurrency {}",
            dispatch.page_size, dispatch.match_cap, dispatch.page_concurrency
        );
        println!("✓ Notifier backend: {:?}", self.config.notifier.backend);
        println!("Dry run completed successfully - configuration is ready for deployment");
        Ok(())
    }

    async fn run(&self) -> AppResult<()> {
        self.config.validate()?;

        if !self.config.dispatch.enabled {
            tracing::warn!("Dispatch is disabled; nothing to serve");
            return Ok(());
        }

        if self.config.database.auto_migrate {
            MigrateCommandHandler::new(self.config.database.clone())
                .run_migrations()
                .await?;
        }

        let pool = establish_async_connection_pool(&self.config.database).await?;
        let state = AppState::new(pool, &self.config)?;
        let cron = DispatchCron::new(Arc::clone(&state.executor), &self.config.dispatch.cron).await?;
        cron.start().await?;

        tracing::info!(
            app = %self.config.application.name,
            version = %self.config.application.version,
            "Waitlist dispatcher running; press Ctrl-C to stop"
        );
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        tracing::info!("Shutdown signal received");
        cron.stop().await
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
