//! Application wiring.
//!
//! Builds the write-side service and the dispatch pipeline from settings and
//! a set of stores. Every CLI command that touches data goes through here.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::db::AsyncDbPool;
use crate::error::AppResult;
use crate::external::{Directory, TeeTimeDirectory};
use crate::jobs::DispatchExecutor;
use crate::repositories::{
    CheckpointStore, CourseCatalog, DispatchLogStore, Repositories, UserDirectory, WindowStore,
};
use crate::services::notifications::build_provider;
use crate::services::{
    AvailabilityMatcher, DispatchScheduler, MatcherSettings, NotificationAuditor, WindowService,
};

/// The stores and adapters the services run against
#[derive(Clone)]
pub struct Stores {
    pub windows: Arc<dyn WindowStore>,
    pub users: Arc<dyn UserDirectory>,
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub dispatch_logs: Arc<dyn DispatchLogStore>,
    pub courses: Arc<dyn CourseCatalog>,
    pub directory: Arc<dyn Directory>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool
    pub fn postgres(pool: AsyncDbPool) -> Self {
        let repos = Repositories::new(pool.clone());
        let windows = Arc::new(repos.windows);
        Self {
            windows: windows.clone(),
            users: windows,
            checkpoints: Arc::new(repos.checkpoints),
            dispatch_logs: Arc::new(repos.dispatch_logs),
            courses: Arc::new(repos.courses),
            directory: Arc::new(TeeTimeDirectory::new(pool)),
        }
    }
}

/// Shared services. Cloning is cheap; everything sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub windows: Arc<WindowService>,
    pub scheduler: Arc<DispatchScheduler>,
    pub executor: Arc<DispatchExecutor>,
    pub dispatch_logs: Arc<dyn DispatchLogStore>,
}

impl AppState {
    pub fn new(pool: AsyncDbPool, settings: &Settings) -> AppResult<Self> {
        Self::from_stores(Stores::postgres(pool), settings)
    }

    /// Wires the services over arbitrary stores.
    ///
    /// # Errors
    ///
    /// Fails when the configured notifier cannot be built.
    pub fn from_stores(stores: Stores, settings: &Settings) -> AppResult<Self> {
        let dispatch = &settings.dispatch;
        let provider = build_provider(&settings.notifier)?;

        let matcher = Arc::new(AvailabilityMatcher::new(
            stores.windows.clone(),
            stores.directory,
            provider,
            NotificationAuditor::new(stores.dispatch_logs.clone()),
            MatcherSettings::from(dispatch),
        ));
        let scheduler = Arc::new(DispatchScheduler::new(
            stores.courses,
            stores.users,
            stores.checkpoints,
            matcher,
            dispatch,
        ));
        let executor = Arc::new(DispatchExecutor::new(
            scheduler.clone(),
            Duration::from_secs(dispatch.batch_timeout_seconds),
        ));

        Ok(Self {
            windows: Arc::new(WindowService::new(stores.windows)),
            scheduler,
            executor,
            dispatch_logs: stores.dispatch_logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::Timestamp;

    use crate::config::{NotifierBackend, WebhookConfig};
    use crate::error::AppError;
    use crate::models::{CreateWindowsRequest, DispatchOutcome};
    use crate::repositories::memory::{
        InMemoryCheckpointStore, InMemoryCourseCatalog, InMemoryDispatchLog, InMemoryWindowStore,
    };
    use crate::services::course_today;
    use crate::test_support::{ScriptedDirectory, test_course};

    fn memory_stores(
        directory: Arc<ScriptedDirectory>,
        log: Arc<InMemoryDispatchLog>,
    ) -> Stores {
        let windows = Arc::new(InMemoryWindowStore::new());
        let courses = Arc::new(InMemoryCourseCatalog::new());
        courses.insert(test_course(), true);
        Stores {
            windows: windows.clone(),
            users: windows,
            checkpoints: Arc::new(InMemoryCheckpointStore::new()),
            dispatch_logs: log,
            courses,
            directory,
        }
    }

    #[tokio::test]
    async fn test_write_then_dispatch_end_to_end() {
        let directory = Arc::new(ScriptedDirectory::new());
        let log = Arc::new(InMemoryDispatchLog::new());
        let state = AppState::from_stores(
            memory_stores(directory.clone(), log.clone()),
            &Settings::default(),
        )
        .unwrap();

        let today = course_today(&test_course(), Timestamp::now()).unwrap();
        let day = today.checked_add(jiff::Span::new().days(2)).unwrap();
        let request = CreateWindowsRequest {
            user_id: "golfer-1".to_string(),
            course_id: "pebble".to_string(),
            party_size: 2,
            start_time: 900,
            end_time: 1100,
            dates: vec![day],
        };
        state.windows.create_windows(request).await.unwrap();
        directory.open(day, 1000, 4);

        let report = state.executor.execute("pebble").await.unwrap();
        assert_eq!(report.processed_this_run, 1);
        assert!(report.exhausted);

        let history = state
            .dispatch_logs
            .list_for_user("golfer-1", "pebble")
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, DispatchOutcome::Success);
    }

    #[test]
    fn test_invalid_webhook_method_fails_wiring() {
        let mut settings = Settings::default();
        settings.notifier.backend = NotifierBackend::Webhook;
        settings.notifier.webhook = WebhookConfig {
            url: "https://hooks.example.com/waitlist".to_string(),
            method: "NOT A METHOD".to_string(),
            ..WebhookConfig::default()
        };

        let result = AppState::from_stores(
            memory_stores(
                Arc::new(ScriptedDirectory::new()),
                Arc::new(InMemoryDispatchLog::new()),
            ),
            &settings,
        );
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}
