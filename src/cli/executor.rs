//! Dispatches a parsed command to its handler

use super::handlers::{MigrateCommandHandler, RunBatchCommandHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::Settings;
use crate::error::{AppError, AppResult};

/// Runs the selected command; no subcommand means `serve`.
pub async fn execute_command(cli: &Cli, settings: Settings) -> AppResult<()> {
    validate_command_args(cli)?;

    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::RunBatch {
            course,
            until_exhausted,
        }) => {
            RunBatchCommandHandler::new(settings)
                .execute(course, *until_exhausted)
                .await
        }
        Some(Commands::Migrate { dry_run, rollback }) => {
            MigrateCommandHandler::new(settings.database)
                .execute(*dry_run, *rollback)
                .await
        }
    }
}

fn validate_command_args(cli: &Cli) -> AppResult<()> {
    cli.validate().map_err(|reason| AppError::Validation {
        field: "cli_arguments".to_string(),
        reason,
    })?;

    if let Some(Commands::Migrate {
        rollback: Some(steps),
        ..
    }) = cli.command
        && steps > 10
    {
        tracing::warn!(steps, "Rolling back many migrations at once");
    }
    Ok(())
}
