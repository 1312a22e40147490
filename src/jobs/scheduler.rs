use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler as TokioCronScheduler};

use crate::error::{AppError, AppResult};
use crate::jobs::executor::DispatchExecutor;

/// Fires a dispatch tick on a cron schedule
pub struct DispatchCron {
    scheduler: Arc<Mutex<TokioCronScheduler>>,
    executor: Arc<DispatchExecutor>,
    cron_expression: String,
}

impl DispatchCron {
    pub async fn new(executor: Arc<DispatchExecutor>, cron_expression: &str) -> AppResult<Self> {
        let scheduler = TokioCronScheduler::new()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            executor,
            cron_expression: cron_expression.to_string(),
        })
    }

    /// Registers the dispatch job and starts ticking
    pub async fn start(&self) -> AppResult<()> {
        let job = self.dispatch_job()?;
        let scheduler = self.scheduler.lock().await;
        scheduler.add(job).await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;
        scheduler.start().await.map_err(|e| AppError::Internal {
            source: anyhow::Error::from(e),
        })?;

        tracing::info!(cron = %self.cron_expression, "Dispatch scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&self) -> AppResult<()> {
        self.scheduler
            .lock()
            .await
            .shutdown()
            .await
            .map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
        tracing::info!("Dispatch scheduler stopped");
        Ok(())
    }

    fn dispatch_job(&self) -> AppResult<Job> {
        let executor = Arc::clone(&self.executor);

        Job::new_async(self.cron_expression.as_str(), move |_uuid, _lock| {
            let executor = Arc::clone(&executor);

            Box::pin(async move {
                match executor.tick().await {
                    Ok(summary) => {
                        tracing::info!(
                            courses = summary.courses,
                            exhausted = summary.exhausted,
                            failed = summary.failed,
                            users = summary.users_processed,
                            "Dispatch tick complete"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Dispatch tick failed");
                    }
                }
            })
        })
        .map_err(|e| AppError::BadRequest {
            message: format!("Invalid cron expression: {}", e),
        })
    }
}
