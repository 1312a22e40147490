//! Migrate command handler

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;

use crate::config::DatabaseConfig;
use crate::db::MIGRATIONS;
use crate::error::{AppError, AppResult};

pub struct MigrateCommandHandler {
    database: DatabaseConfig,
}

impl MigrateCommandHandler {
    pub fn new(database: DatabaseConfig) -> Self {
        Self { database }
    }

    /// Applies pending migrations, lists them (`dry_run`) or reverts the
    /// last `rollback` of them.
    pub async fn execute(&self, dry_run: bool, rollback: Option<u32>) -> AppResult<()> {
        self.database.validate()?;

        if dry_run {
            let pending = self.pending_migrations().await?;
            if pending.is_empty() {
                println!("✓ No pending migrations - database is up to date");
            } else {
                println!("Found {} pending migration(s):", pending.len());
                for name in &pending {
                    println!("  - {}", name);
                }
                println!("\nRun without --dry-run to apply them");
            }
            return Ok(());
        }

        match rollback {
            Some(steps) => {
                let reverted = self.rollback_migrations(steps).await?;
                println!("✓ Rolled back {} migration(s):", reverted.len());
                for name in &reverted {
                    println!("  - {}", name);
                }
            }
            None => {
                let applied = self.run_migrations().await?;
                if applied.is_empty() {
                    println!("✓ No migrations to apply - database is up to date");
                } else {
                    println!("✓ Applied {} migration(s):", applied.len());
                    for name in &applied {
                        println!("  - {}", name);
                    }
                }
            }
        }
        Ok(())
    }

    pub async fn pending_migrations(&self) -> AppResult<Vec<String>> {
        self.with_connection("check pending migrations", |conn| {
            let pending = conn.pending_migrations(MIGRATIONS)?;
            Ok(pending.iter().map(|m| m.name().to_string()).collect())
        })
        .await
    }

    /// Names of the migrations that were applied
    pub async fn run_migrations(&self) -> AppResult<Vec<String>> {
        let applied: Vec<String> = self
            .with_connection("run pending migrations", |conn| {
                let applied = conn.run_pending_migrations(MIGRATIONS)?;
                Ok(applied.iter().map(|v| v.to_string()).collect())
            })
            .await?;
        tracing::info!(count = applied.len(), "Database migrations applied");
        Ok(applied)
    }

    pub async fn rollback_migrations(&self, steps: u32) -> AppResult<Vec<String>> {
        if steps == 0 {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: "Number of rollback steps must be greater than 0".to_string(),
            });
        }

        let available = self
            .with_connection("list applied migrations", |conn| {
                Ok(conn.applied_migrations()?.len())
            })
            .await?;
        if available < steps as usize {
            return Err(AppError::Validation {
                field: "rollback_steps".to_string(),
                reason: format!(
                    "Cannot roll back {} migrations - only {} applied",
                    steps, available
                ),
            });
        }

        self.with_connection("revert migrations", move |conn| {
            let mut reverted = Vec::with_capacity(steps as usize);
            for _ in 0..steps {
                reverted.push(conn.revert_last_migration(MIGRATIONS)?.to_string());
            }
            Ok(reverted)
        })
        .await
    }

    /// Runs `f` on a blocking sync connection; migration errors are reported
    /// under `operation`.
    async fn with_connection<T, F>(&self, operation: &'static str, f: F) -> AppResult<T>
    where
        T: Send + 'static,
        F: FnOnce(
                &mut PgConnection,
            ) -> Result<T, Box<dyn std::error::Error + Send + Sync>>
            + Send
            + 'static,
    {
        let database_url = self.database.url.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = PgConnection::establish(&database_url).map_err(|e| AppError::Database {
                operation: format!("establish connection to {}", operation),
                source: anyhow::Error::from(e),
            })?;
            f(&mut conn).map_err(|e| AppError::Database {
                operation: operation.to_string(),
                source: anyhow::anyhow!("Migration error: {}", e),
            })
        })
        .await
        .map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_database_url_is_rejected_before_connecting() {
        let handler = MigrateCommandHandler::new(DatabaseConfig {
            url: "mysql://localhost/waitlist".to_string(),
            ..DatabaseConfig::default()
        });
        let result = handler.execute(true, None).await;
        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_zero_rollback_steps_rejected() {
        let handler = MigrateCommandHandler::new(DatabaseConfig {
            url: "postgres://localhost/waitlist".to_string(),
            ..DatabaseConfig::default()
        });
        let result = handler.rollback_migrations(0).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_run_migrations_reports_unreachable_database() {
        let handler = MigrateCommandHandler::new(DatabaseConfig {
            url: "postgres://127.0.0.1:1/waitlist".to_string(),
            ..DatabaseConfig::default()
        });
        let result: AppResult<Vec<String>> = handler.run_migrations().await;
        match result {
            Err(AppError::Database { operation, .. }) => {
                assert_eq!(operation, "establish connection to run pending migrations");
            }
            other => panic!("Expected database error, got {:?}", other),
        }
    }
}
