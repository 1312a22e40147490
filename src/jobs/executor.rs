use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use serde::Serialize;
use tokio::time::Instant;

use crate::error::{AppError, AppResult};
use crate::services::{BatchReport, DispatchScheduler};

/// Courses with a batch currently running in this process
#[derive(Clone, Default)]
pub struct InFlightCourses {
    running: Arc<DashSet<String>>,
}

impl InFlightCourses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `course_id` as running until the returned guard is dropped.
    /// `None` if it already was.
    pub fn try_acquire(&self, course_id: &str) -> Option<InFlightGuard> {
        self.running
            .insert(course_id.to_string())
            .then(|| InFlightGuard {
                courses: self.clone(),
                course_id: course_id.to_string(),
            })
    }

    pub fn is_running(&self, course_id: &str) -> bool {
        self.running.contains(course_id)
    }
}

/// Holds a course in [`InFlightCourses`]; released on drop, including when
/// the owning future is cancelled.
pub struct InFlightGuard {
    courses: InFlightCourses,
    course_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.courses.running.remove(&self.course_id);
    }
}

/// Totals for one cron tick across all active courses
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub courses: usize,
    pub exhausted: usize,
    pub failed: usize,
    pub users_processed: i64,
}

/// Runs dispatch batches with single-flight per course and a time limit
pub struct DispatchExecutor {
    scheduler: Arc<DispatchScheduler>,
    in_flight: InFlightCourses,
    batch_timeout: Duration,
}

impl DispatchExecutor {
    pub fn new(scheduler: Arc<DispatchScheduler>, batch_timeout: Duration) -> Self {
        Self {
            scheduler,
            in_flight: InFlightCourses::new(),
            batch_timeout,
        }
    }

    pub fn in_flight(&self) -> &InFlightCourses {
        &self.in_flight
    }

    /// Runs one batch for `course_id`.
    ///
    /// Rejected with `Conflict` while another batch for the same course is
    /// running here. A batch cut off by the timeout has not advanced its
    /// checkpoint, so its page is dispatched again by the next call.
    pub async fn execute(&self, course_id: &str) -> AppResult<BatchReport> {
        let Some(_guard) = self.in_flight.try_acquire(course_id) else {
            return Err(AppError::Conflict {
                message: format!("a dispatch batch for course {} is already running", course_id),
            });
        };

        let start_time = Instant::now();
        let result = tokio::time::timeout(self.batch_timeout, self.scheduler.run_batch(course_id)).await;

        match result {
            Ok(report) => {
                if let Ok(report) = &report {
                    tracing::debug!(
                        course_id,
                        processed = report.users_processed,
                        total = report.total_users,
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "Dispatch batch finished"
                    );
                }
                report
            }
            Err(_) => Err(AppError::Internal {
                source: anyhow::anyhow!(
                    "Dispatch batch for course {} timed out after {}s",
                    course_id,
                    self.batch_timeout.as_secs()
                ),
            }),
        }
    }

    /// Repeats [`Self::execute`] until the course is exhausted for today.
    pub async fn run_until_exhausted(&self, course_id: &str) -> AppResult<Vec<BatchReport>> {
        let mut reports = Vec::new();
        loop {
            let report = self.execute(course_id).await?;
            let exhausted = report.exhausted;
            reports.push(report);
            if exhausted {
                return Ok(reports);
            }
        }
    }

    /// One batch per active course, one course at a time.
    ///
    /// A failing course is logged and counted; it does not stop the others.
    pub async fn tick(&self) -> AppResult<TickSummary> {
        let course_ids = self.scheduler.active_course_ids().await?;
        let mut summary = TickSummary {
            courses: course_ids.len(),
            ..TickSummary::default()
        };

        for course_id in &course_ids {
            match self.execute(course_id).await {
                Ok(report) => {
                    summary.users_processed += report.processed_this_run;
                    if report.exhausted {
                        summary.exhausted += 1;
                    }
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(course_id = %course_id, error = %e, "Dispatch batch failed");
                }
            }
        }
        Ok(summary)
    }
}
