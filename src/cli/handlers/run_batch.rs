//! Run-batch command handler

use crate::config::Settings;
use crate::db::establish_async_connection_pool;
use crate::error::AppResult;
use crate::jobs::DispatchExecutor;
use crate::services::BatchReport;
use crate::state::AppState;

pub struct RunBatchCommandHandler {
    config: Settings,
}

impl RunBatchCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub async fn execute(&self, course_id: &str, until_exhausted: bool) -> AppResult<()> {
        let pool = establish_async_connection_pool(&self.config.database).await?;
        let state = AppState::new(pool, &self.config)?;
        let reports = run(&state.executor, course_id, until_exhausted).await?;

        for report in &reports {
            println!("{}", describe(report));
        }
        Ok(())
    }
}

async fn run(
    executor: &DispatchExecutor,
    course_id: &str,
    until_exhausted: bool,
) -> AppResult<Vec<BatchReport>> {
    if until_exhausted {
        executor.run_until_exhausted(course_id).await
    } else {
        Ok(vec![executor.execute(course_id).await?])
    }
}

fn describe(report: &BatchReport) -> String {
    let status = if report.exhausted { "done for today" } else { "more pending" };
    format!(
        "{} {}: processed {} this run, {}/{} users ({})",
        report.course_id,
        report.run_date,
        report.processed_this_run,
        report.users_processed,
        report.total_users,
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_describe_report() {
        let report = BatchReport {
            course_id: "pebble".to_string(),
            run_date: date(2026, 10, 18),
            processed_this_run: 50,
            exhausted: false,
            users_processed: 100,
            total_users: 120,
        };
        assert_eq!(
            describe(&report),
            "pebble 2026-10-18: processed 50 this run, 100/120 users (more pending)"
        );
    }
}
