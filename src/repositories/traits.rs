//! Store traits consumed by the merge engine and the dispatch pipeline.

use async_trait::async_trait;
use jiff::civil::Date;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{
    Checkpoint, Course, DispatchLogEntry, NewDispatchLogEntry, NewWindow, Window, WindowKey,
};

/// Selects active windows. Unset fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowFilter {
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub party_size: Option<i32>,
    pub date: Option<Date>,
    /// Inclusive lower bound on `date`
    pub date_from: Option<Date>,
}

impl WindowFilter {
    /// Every active window sharing a merge key.
    pub fn for_key(key: &WindowKey) -> Self {
        Self {
            user_id: Some(key.user_id.clone()),
            course_id: Some(key.course_id.clone()),
            party_size: Some(key.party_size),
            date: Some(key.date),
            date_from: None,
        }
    }

    /// A user's windows for one course dated on or after `from`.
    pub fn upcoming(user_id: &str, course_id: &str, from: Date) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            course_id: Some(course_id.to_string()),
            date_from: Some(from),
            ..Self::default()
        }
    }

    pub fn matches(&self, window: &Window) -> bool {
        !window.is_deleted
            && self.user_id.as_ref().is_none_or(|u| *u == window.user_id)
            && self.course_id.as_ref().is_none_or(|c| *c == window.course_id)
            && self.party_size.is_none_or(|p| p == window.party_size)
            && self.date.is_none_or(|d| d == window.date)
            && self.date_from.is_none_or(|d| window.date >= d)
    }
}

/// Sort order for [`WindowStore::list_active`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOrder {
    /// `start_time` ascending; used when merging within one key
    StartTime,
    /// `date`, then `party_size`, then `start_time`, all ascending
    DatePartyStart,
}

impl WindowOrder {
    pub fn sort(&self, windows: &mut [Window]) {
        match self {
            WindowOrder::StartTime => windows.sort_by_key(|w| (w.start_time, w.id)),
            WindowOrder::DatePartyStart => {
                windows.sort_by_key(|w| (w.date, w.party_size, w.start_time, w.id))
            }
        }
    }
}

/// Persistence boundary for [`Window`] records.
#[async_trait]
pub trait WindowStore: Send + Sync {
    async fn list_active(&self, filter: &WindowFilter, order: WindowOrder)
    -> AppResult<Vec<Window>>;

    async fn insert_many(&self, windows: Vec<NewWindow>) -> AppResult<Vec<Window>>;

    /// Retires windows; returns how many rows changed.
    async fn soft_delete_many(&self, ids: &[Uuid]) -> AppResult<usize>;
}

/// Enumerates users that have something to be notified about.
///
/// A user is eligible for a course when they hold at least one active window
/// dated on or after `from`. Pages are ordered by user id so that the same
/// offset yields the same users across calls.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn count_eligible(&self, course_id: &str, from: Date) -> AppResult<i64>;

    async fn page(
        &self,
        course_id: &str,
        from: Date,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<String>>;
}

/// Storage for per-(course, day) dispatch cursors.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn find(&self, course_id: &str, run_date: Date) -> AppResult<Option<Checkpoint>>;

    /// Creates the checkpoint for `(course_id, run_date)` unless one exists,
    /// and returns whichever row is stored.
    async fn create(&self, course_id: &str, run_date: Date, total_users: i64)
    -> AppResult<Checkpoint>;

    /// Moves the cursor to `users_processed` if the stored version still
    /// equals `expected_version`. Returns `None` when it does not.
    async fn advance(
        &self,
        id: Uuid,
        expected_version: i32,
        users_processed: i64,
    ) -> AppResult<Option<Checkpoint>>;
}

/// Append-only audit log of dispatch attempts.
#[async_trait]
pub trait DispatchLogStore: Send + Sync {
    async fn append(&self, entry: NewDispatchLogEntry) -> AppResult<()>;

    /// Newest first.
    async fn list_for_user(&self, user_id: &str, course_id: &str)
    -> AppResult<Vec<DispatchLogEntry>>;
}

/// Read-only course lookup for branding, timezone and scheduling.
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn find_course(&self, course_id: &str) -> AppResult<Option<Course>>;

    async fn active_course_ids(&self) -> AppResult<Vec<String>>;
}
