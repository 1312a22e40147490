//! Checkpointed batch driver for waitlist notifications.
//!
//! Each call to [`DispatchScheduler::run_batch`] processes one page of a
//! course's eligible users and persists how far it got in the course's
//! checkpoint for the day. Once the cursor reaches the user count taken at
//! the first run of the day, further calls that day are no-ops.
//!
//! Delivery is at-least-once: if the process dies after a page was
//! dispatched but before the checkpoint advanced, the next call dispatches
//! the same page again.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use jiff::Timestamp;
use jiff::civil::Date;
use jiff::tz::TimeZone;
use serde::Serialize;
use tracing::Instrument;

use crate::config::DispatchConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Checkpoint, Course};
use crate::repositories::{CheckpointStore, CourseCatalog, UserDirectory};
use crate::services::availability_matcher::AvailabilityMatcher;

/// Outcome of one [`DispatchScheduler::run_batch`] call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub course_id: String,
    pub run_date: Date,
    pub processed_this_run: i64,
    pub exhausted: bool,
    pub users_processed: i64,
    pub total_users: i64,
}

impl BatchReport {
    fn from_checkpoint(checkpoint: &Checkpoint, processed_this_run: i64) -> Self {
        Self {
            course_id: checkpoint.course_id.clone(),
            run_date: checkpoint.run_date,
            processed_this_run,
            exhausted: checkpoint.is_exhausted(),
            users_processed: checkpoint.users_processed,
            total_users: checkpoint.total_users,
        }
    }
}

pub struct DispatchScheduler {
    courses: Arc<dyn CourseCatalog>,
    users: Arc<dyn UserDirectory>,
    checkpoints: Arc<dyn CheckpointStore>,
    matcher: Arc<AvailabilityMatcher>,
    page_size: i64,
    page_concurrency: usize,
}

impl DispatchScheduler {
    pub fn new(
        courses: Arc<dyn CourseCatalog>,
        users: Arc<dyn UserDirectory>,
        checkpoints: Arc<dyn CheckpointStore>,
        matcher: Arc<AvailabilityMatcher>,
        config: &DispatchConfig,
    ) -> Self {
        Self {
            courses,
            users,
            checkpoints,
            matcher,
            page_size: i64::from(config.page_size.max(1)),
            page_concurrency: config.page_concurrency.max(1) as usize,
        }
    }

    /// Ids of the courses the cron tick should process.
    pub async fn active_course_ids(&self) -> AppResult<Vec<String>> {
        self.courses.active_course_ids().await
    }

    /// Runs one batch for `course_id` on the course's current calendar day.
    pub async fn run_batch(&self, course_id: &str) -> AppResult<BatchReport> {
        let course = self
            .courses
            .find_course(course_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "course".to_string(),
                field: "id".to_string(),
                value: course_id.to_string(),
            })?;
        let today = course_today(&course, Timestamp::now())?;
        self.run_batch_on(&course, today).await
    }

    /// Runs one batch for `course` treating `today` as the run date.
    pub async fn run_batch_on(&self, course: &Course, today: Date) -> AppResult<BatchReport> {
        let span = tracing::info_span!("run_batch", course_id = %course.id, run_date = %today);
        self.process_page(course, today).instrument(span).await
    }

    async fn process_page(&self, course: &Course, today: Date) -> AppResult<BatchReport> {
        let eligible_from = today.tomorrow().map_err(anyhow::Error::from)?;
        let checkpoint = self.load_or_create(course, today, eligible_from).await?;
        if checkpoint.is_exhausted() {
            tracing::debug!(
                processed = checkpoint.users_processed,
                total = checkpoint.total_users,
                "Batch already exhausted for today"
            );
            return Ok(BatchReport::from_checkpoint(&checkpoint, 0));
        }

        let limit = self.page_size.min(checkpoint.remaining());
        let user_ids = self
            .users
            .page(&course.id, eligible_from, checkpoint.users_processed, limit)
            .await?;
        let fetched = user_ids.len() as i64;

        let matcher = &self.matcher;
        stream::iter(user_ids)
            .for_each_concurrent(self.page_concurrency, |user_id| {
                let span = tracing::info_span!(
                    "dispatch_user",
                    course_id = %course.id,
                    user_id = %user_id
                );
                async move {
                    matcher.match_and_notify(&user_id, course, today).await;
                }
                .instrument(span)
            })
            .await;

        // A short page means the eligible set shrank since the snapshot;
        // nobody is left past it today.
        let target = if fetched < limit {
            checkpoint.total_users
        } else {
            checkpoint.users_processed + fetched
        };
        let advanced = self
            .checkpoints
            .advance(checkpoint.id, checkpoint.version, target)
            .await?
            .ok_or_else(|| AppError::Conflict {
                message: format!(
                    "checkpoint for course {} on {} was advanced by another run",
                    course.id, today
                ),
            })?;

        tracing::info!(
            processed = advanced.users_processed,
            total = advanced.total_users,
            fetched,
            "Dispatch page completed"
        );
        Ok(BatchReport::from_checkpoint(&advanced, fetched))
    }

    async fn load_or_create(
        &self,
        course: &Course,
        today: Date,
        eligible_from: Date,
    ) -> AppResult<Checkpoint> {
        if let Some(checkpoint) = self.checkpoints.find(&course.id, today).await? {
            return Ok(checkpoint);
        }
        let total = self.users.count_eligible(&course.id, eligible_from).await?;
        let checkpoint = self.checkpoints.create(&course.id, today, total).await?;
        tracing::info!(total = checkpoint.total_users, "Created dispatch checkpoint");
        Ok(checkpoint)
    }
}

/// The course's current calendar day in its own timezone.
pub fn course_today(course: &Course, now: Timestamp) -> AppResult<Date> {
    let tz = TimeZone::get(&course.timezone).map_err(|e| AppError::Validation {
        field: "timezone".to_string(),
        reason: format!("Unknown timezone '{}' for course {}: {}", course.timezone, course.id, e),
    })?;
    Ok(now.to_zoned(tz).date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchOutcome, NewWindow, WindowKey};
    use crate::repositories::WindowStore;
    use crate::repositories::memory::{
        InMemoryCheckpointStore, InMemoryCourseCatalog, InMemoryDispatchLog, InMemoryWindowStore,
    };
    use crate::services::auditor::NotificationAuditor;
    use crate::services::availability_matcher::MatcherSettings;
    use crate::test_support::{RecordingProvider, ScriptedDirectory, test_course};
    use jiff::civil::date;

    const TODAY: Date = date(2026, 10, 18);
    const TOMORROW: Date = date(2026, 10, 19);

    struct Fixture {
        windows: Arc<InMemoryWindowStore>,
        checkpoints: Arc<InMemoryCheckpointStore>,
        directory: Arc<ScriptedDirectory>,
        provider: Arc<RecordingProvider>,
        log: Arc<InMemoryDispatchLog>,
        scheduler: DispatchScheduler,
    }

    fn fixture(config: DispatchConfig) -> Fixture {
        let windows = Arc::new(InMemoryWindowStore::new());
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let directory = Arc::new(ScriptedDirectory::new());
        let provider = Arc::new(RecordingProvider::new());
        let log = Arc::new(InMemoryDispatchLog::new());
        let courses = Arc::new(InMemoryCourseCatalog::new());
        courses.insert(test_course(), true);

        let matcher = Arc::new(AvailabilityMatcher::new(
            windows.clone(),
            directory.clone(),
            provider.clone(),
            NotificationAuditor::new(log.clone()),
            MatcherSettings::from(&config),
        ));
        let scheduler = DispatchScheduler::new(
            courses,
            windows.clone(),
            checkpoints.clone(),
            matcher,
            &config,
        );
        Fixture {
            windows,
            checkpoints,
            directory,
            provider,
            log,
            scheduler,
        }
    }

    async fn add_users(store: &InMemoryWindowStore, count: usize, day: Date) {
        let windows = (0..count)
            .map(|n| {
                let key = WindowKey {
                    user_id: format!("user-{:04}", n),
                    course_id: "pebble".to_string(),
                    party_size: 2,
                    date: day,
                };
                NewWindow::new(&key, 900, 1100)
            })
            .collect();
        store.insert_many(windows).await.unwrap();
    }

    #[tokio::test]
    async fn test_checkpoint_advances_to_total_then_exhausts() {
        let f = fixture(DispatchConfig::default());
        add_users(&f.windows, 120, TOMORROW).await;
        let course = test_course();

        let mut seen = Vec::new();
        loop {
            let report = f.scheduler.run_batch_on(&course, TODAY).await.unwrap();
            seen.push((report.processed_this_run, report.users_processed));
            if report.exhausted {
                break;
            }
        }
        assert_eq!(seen, vec![(50, 50), (50, 100), (20, 120)]);

        // nothing matched, so nothing was sent
        assert!(f.provider.sent().is_empty());
        assert_eq!(f.directory.calls().len(), 120);

        let after = f.scheduler.run_batch_on(&course, TODAY).await.unwrap();
        assert_eq!(after.processed_this_run, 0);
        assert!(after.exhausted);
        assert_eq!(f.directory.calls().len(), 120);
    }

    #[tokio::test]
    async fn test_exhausted_run_skips_user_and_directory_calls() {
        let f = fixture(DispatchConfig::default());
        add_users(&f.windows, 3, TOMORROW).await;
        f.directory.open(TOMORROW, 900, 4);
        let course = test_course();

        let first = f.scheduler.run_batch_on(&course, TODAY).await.unwrap();
        assert!(first.exhausted);
        assert_eq!(f.provider.sent().len(), 3);

        // more users show up after the snapshot
        add_users(&f.windows, 10, TOMORROW).await;
        let second = f.scheduler.run_batch_on(&course, TODAY).await.unwrap();
        assert_eq!(second.processed_this_run, 0);
        assert_eq!(second.total_users, 3);
        assert_eq!(f.provider.sent().len(), 3);
        assert_eq!(f.directory.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_failing_user_does_not_abort_page() {
        let f = fixture(DispatchConfig::default());
        let bad_day = date(2026, 10, 25);
        let keys = [("alice", TOMORROW), ("bob", bad_day), ("carol", TOMORROW)];
        let windows = keys
            .iter()
            .map(|(user, day)| {
                NewWindow::new(
                    &WindowKey {
                        user_id: user.to_string(),
                        course_id: "pebble".to_string(),
                        party_size: 2,
                        date: *day,
                    },
                    900,
                    1100,
                )
            })
            .collect();
        f.windows.insert_many(windows).await.unwrap();
        f.directory.open(TOMORROW, 1000, 2);
        f.directory.fail_on(bad_day);

        let report = f
            .scheduler
            .run_batch_on(&test_course(), TODAY)
            .await
            .unwrap();
        assert_eq!(report.processed_this_run, 3);
        assert!(report.exhausted);

        let mut outcomes: Vec<(String, DispatchOutcome)> = f
            .log
            .entries()
            .await
            .into_iter()
            .map(|e| (e.user_id, e.outcome))
            .collect();
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            outcomes,
            vec![
                ("alice".to_string(), DispatchOutcome::Success),
                ("bob".to_string(), DispatchOutcome::Error),
                ("carol".to_string(), DispatchOutcome::Success),
            ]
        );
    }

    #[tokio::test]
    async fn test_concurrent_page_processing_covers_everyone() {
        let config = DispatchConfig {
            page_size: 10,
            page_concurrency: 4,
            ..DispatchConfig::default()
        };
        let f = fixture(config);
        add_users(&f.windows, 25, TOMORROW).await;
        f.directory.open(TOMORROW, 900, 8);

        let mut runs = 0;
        while !f
            .scheduler
            .run_batch_on(&test_course(), TODAY)
            .await
            .unwrap()
            .exhausted
        {
            runs += 1;
        }
        assert_eq!(runs, 2);

        let mut users: Vec<String> = f.provider.sent().into_iter().map(|m| m.user_id).collect();
        users.sort();
        users.dedup();
        assert_eq!(users.len(), 25);
    }

    #[tokio::test]
    async fn test_new_day_gets_fresh_checkpoint() {
        let f = fixture(DispatchConfig::default());
        add_users(&f.windows, 2, date(2026, 10, 22)).await;
        let course = test_course();

        assert!(f.scheduler.run_batch_on(&course, TODAY).await.unwrap().exhausted);
        let next = f
            .scheduler
            .run_batch_on(&course, TOMORROW)
            .await
            .unwrap();
        assert_eq!(next.run_date, TOMORROW);
        assert_eq!(next.processed_this_run, 2);
        assert!(f.checkpoints.find("pebble", TODAY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_short_page_closes_the_day() {
        let f = fixture(DispatchConfig::default());
        add_users(&f.windows, 5, TOMORROW).await;
        let course = test_course();

        // snapshot of 5, then two users retire their windows
        f.checkpoints.create("pebble", TODAY, 5).await.unwrap();
        let retired: Vec<uuid::Uuid> = f.windows.all().await.iter().take(2).map(|w| w.id).collect();
        f.windows.soft_delete_many(&retired).await.unwrap();

        let report = f.scheduler.run_batch_on(&course, TODAY).await.unwrap();
        assert_eq!(report.processed_this_run, 3);
        assert_eq!(report.users_processed, 5);
        assert!(report.exhausted);
    }

    #[tokio::test]
    async fn test_stale_checkpoint_version_is_a_conflict() {
        let f = fixture(DispatchConfig::default());
        add_users(&f.windows, 60, TOMORROW).await;
        let course = test_course();

        let checkpoint = f.checkpoints.create("pebble", TODAY, 60).await.unwrap();
        // another run moves the cursor while ours is still holding version 0
        f.checkpoints
            .advance(checkpoint.id, checkpoint.version, 10)
            .await
            .unwrap();

        let ours = f
            .checkpoints
            .advance(checkpoint.id, checkpoint.version, 50)
            .await
            .unwrap();
        assert!(ours.is_none());

        // the scheduler itself reads the fresh version and proceeds
        let report = f.scheduler.run_batch_on(&course, TODAY).await.unwrap();
        assert_eq!(report.users_processed, 60);
    }

    /// Lets a phantom concurrent run advance first on every call.
    struct RacingCheckpoints(InMemoryCheckpointStore);

    #[async_trait::async_trait]
    impl CheckpointStore for RacingCheckpoints {
        async fn find(&self, course_id: &str, run_date: Date) -> AppResult<Option<Checkpoint>> {
            self.0.find(course_id, run_date).await
        }

        async fn create(
            &self,
            course_id: &str,
            run_date: Date,
            total_users: i64,
        ) -> AppResult<Checkpoint> {
            self.0.create(course_id, run_date, total_users).await
        }

        async fn advance(
            &self,
            id: uuid::Uuid,
            expected_version: i32,
            users_processed: i64,
        ) -> AppResult<Option<Checkpoint>> {
            self.0.advance(id, expected_version, users_processed).await?;
            self.0.advance(id, expected_version, users_processed).await
        }
    }

    #[tokio::test]
    async fn test_lost_race_surfaces_conflict() {
        let config = DispatchConfig::default();
        let windows = Arc::new(InMemoryWindowStore::new());
        add_users(&windows, 3, TOMORROW).await;
        let courses = Arc::new(InMemoryCourseCatalog::new());
        courses.insert(test_course(), true);
        let matcher = Arc::new(AvailabilityMatcher::new(
            windows.clone(),
            Arc::new(ScriptedDirectory::new()),
            Arc::new(RecordingProvider::new()),
            NotificationAuditor::new(Arc::new(InMemoryDispatchLog::new())),
            MatcherSettings::from(&config),
        ));
        let scheduler = DispatchScheduler::new(
            courses,
            windows,
            Arc::new(RacingCheckpoints(InMemoryCheckpointStore::new())),
            matcher,
            &config,
        );

        let result = scheduler.run_batch_on(&test_course(), TODAY).await;
        assert!(matches!(result, Err(AppError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_run_batch_unknown_course() {
        let f = fixture(DispatchConfig::default());
        let result = f.scheduler.run_batch("nowhere").await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }

    #[test]
    fn test_course_today_uses_course_timezone() {
        // 2026-10-19 03:00 UTC is still the 18th in Los Angeles
        let now: Timestamp = "2026-10-19T03:00:00Z".parse().unwrap();
        assert_eq!(course_today(&test_course(), now).unwrap(), TODAY);

        let mut utc = test_course();
        utc.timezone = "UTC".to_string();
        assert_eq!(course_today(&utc, now).unwrap(), TOMORROW);

        let mut bogus = test_course();
        bogus.timezone = "Mars/Olympus".to_string();
        assert!(course_today(&bogus, now).is_err());
    }
}
