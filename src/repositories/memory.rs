//! In-memory store implementations.
//!
//! Same contracts as the diesel repositories, without a database. Used by the
//! test suite and by embedders that keep waitlist state elsewhere.

use std::collections::BTreeSet;

use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use jiff::civil::Date;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Checkpoint, Course, DispatchLogEntry, NewDispatchLogEntry, NewWindow, Window};
use crate::repositories::traits::{
    CheckpointStore, CourseCatalog, DispatchLogStore, UserDirectory, WindowFilter, WindowOrder,
    WindowStore,
};

// ============================================================================
// Windows / eligible users
// ============================================================================

#[derive(Default)]
pub struct InMemoryWindowStore {
    windows: RwLock<Vec<Window>>,
}

impl InMemoryWindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored window, including retired ones.
    pub async fn all(&self) -> Vec<Window> {
        self.windows.read().await.clone()
    }

    async fn eligible_users(&self, course_id: &str, from: Date) -> BTreeSet<String> {
        self.windows
            .read()
            .await
            .iter()
            .filter(|w| !w.is_deleted && w.course_id == course_id && w.date >= from)
            .map(|w| w.user_id.clone())
            .collect()
    }
}

#[async_trait]
impl WindowStore for InMemoryWindowStore {
    async fn list_active(
        &self,
        filter: &WindowFilter,
        order: WindowOrder,
    ) -> AppResult<Vec<Window>> {
        let mut matched: Vec<Window> = self
            .windows
            .read()
            .await
            .iter()
            .filter(|w| filter.matches(w))
            .cloned()
            .collect();
        order.sort(&mut matched);
        Ok(matched)
    }

    async fn insert_many(&self, windows: Vec<NewWindow>) -> AppResult<Vec<Window>> {
        let now = Timestamp::now();
        let inserted: Vec<Window> = windows
            .into_iter()
            .map(|w| Window {
                id: w.id,
                user_id: w.user_id,
                course_id: w.course_id,
                date: w.date,
                start_time: w.start_time,
                end_time: w.end_time,
                party_size: w.party_size,
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .collect();
        self.windows.write().await.extend(inserted.iter().cloned());
        Ok(inserted)
    }

    async fn soft_delete_many(&self, ids: &[Uuid]) -> AppResult<usize> {
        let now = Timestamp::now();
        let mut windows = self.windows.write().await;
        let mut changed = 0;
        for window in windows
            .iter_mut()
            .filter(|w| !w.is_deleted && ids.contains(&w.id))
        {
            window.is_deleted = true;
            window.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl UserDirectory for InMemoryWindowStore {
    async fn count_eligible(&self, course_id: &str, from: Date) -> AppResult<i64> {
        Ok(self.eligible_users(course_id, from).await.len() as i64)
    }

    async fn page(
        &self,
        course_id: &str,
        from: Date,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<String>> {
        Ok(self
            .eligible_users(course_id, from)
            .await
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

// ============================================================================
// Checkpoints
// ============================================================================

#[derive(Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: DashMap<(String, Date), Checkpoint>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn find(&self, course_id: &str, run_date: Date) -> AppResult<Option<Checkpoint>> {
        Ok(self
            .checkpoints
            .get(&(course_id.to_string(), run_date))
            .map(|c| c.value().clone()))
    }

    async fn create(
        &self,
        course_id: &str,
        run_date: Date,
        total_users: i64,
    ) -> AppResult<Checkpoint> {
        if total_users < 0 {
            return Err(AppError::Validation {
                field: "total_users".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        let now = Timestamp::now();
        let entry = self
            .checkpoints
            .entry((course_id.to_string(), run_date))
            .or_insert_with(|| Checkpoint {
                id: Uuid::new_v4(),
                course_id: course_id.to_string(),
                run_date,
                total_users,
                users_processed: 0,
                version: 0,
                created_at: now,
                updated_at: now,
            });
        Ok(entry.value().clone())
    }

    async fn advance(
        &self,
        id: Uuid,
        expected_version: i32,
        users_processed: i64,
    ) -> AppResult<Option<Checkpoint>> {
        let Some(mut entry) = self.checkpoints.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        let checkpoint = entry.value_mut();
        if checkpoint.version != expected_version {
            return Ok(None);
        }
        if users_processed < 0 || users_processed > checkpoint.total_users {
            return Err(AppError::Validation {
                field: "users_processed".to_string(),
                reason: format!(
                    "{} is outside 0..={}",
                    users_processed, checkpoint.total_users
                ),
            });
        }
        checkpoint.users_processed = users_processed;
        checkpoint.version += 1;
        checkpoint.updated_at = Timestamp::now();
        Ok(Some(checkpoint.clone()))
    }
}

// ============================================================================
// Dispatch log
// ============================================================================

#[derive(Default)]
pub struct InMemoryDispatchLog {
    entries: RwLock<Vec<DispatchLogEntry>>,
}

impl InMemoryDispatchLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order.
    pub async fn entries(&self) -> Vec<DispatchLogEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl DispatchLogStore for InMemoryDispatchLog {
    async fn append(&self, entry: NewDispatchLogEntry) -> AppResult<()> {
        self.entries.write().await.push(DispatchLogEntry {
            id: entry.id,
            user_id: entry.user_id,
            course_id: entry.course_id,
            outcome: entry.outcome,
            payload: entry.payload,
            created_at: Timestamp::now(),
        });
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Vec<DispatchLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id && e.course_id == course_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Courses
// ============================================================================

#[derive(Default)]
pub struct InMemoryCourseCatalog {
    courses: DashMap<String, (Course, bool)>,
}

impl InMemoryCourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, course: Course, is_active: bool) {
        self.courses.insert(course.id.clone(), (course, is_active));
    }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
    async fn find_course(&self, course_id: &str) -> AppResult<Option<Course>> {
        Ok(self.courses.get(course_id).map(|c| c.value().0.clone()))
    }

    async fn active_course_ids(&self) -> AppResult<Vec<String>> {
        let mut ids: Vec<String> = self
            .courses
            .iter()
            .filter(|c| c.value().1)
            .map(|c| c.key().clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DispatchOutcome, WindowKey};
    use jiff::civil::date;
    use serde_json::json;

    fn key(user: &str, day: Date) -> WindowKey {
        WindowKey {
            user_id: user.to_string(),
            course_id: "pebble".to_string(),
            party_size: 2,
            date: day,
        }
    }

    #[tokio::test]
    async fn test_soft_delete_hides_windows() {
        let store = InMemoryWindowStore::new();
        let k = key("u1", date(2026, 10, 19));
        let inserted = store
            .insert_many(vec![NewWindow::new(&k, 900, 1000), NewWindow::new(&k, 1200, 1300)])
            .await
            .unwrap();

        let changed = store.soft_delete_many(&[inserted[0].id]).await.unwrap();
        assert_eq!(changed, 1);
        // already retired
        assert_eq!(store.soft_delete_many(&[inserted[0].id]).await.unwrap(), 0);

        let active = store
            .list_active(&WindowFilter::for_key(&k), WindowOrder::StartTime)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].start_time, 1200);
        assert_eq!(store.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_user_pages_are_stable_and_distinct() {
        let store = InMemoryWindowStore::new();
        let mut windows = Vec::new();
        for user in ["carol", "alice", "bob", "alice"] {
            windows.push(NewWindow::new(&key(user, date(2026, 10, 19)), 900, 1000));
        }
        // past windows do not make a user eligible
        windows.push(NewWindow::new(&key("dave", date(2026, 10, 1)), 900, 1000));
        store.insert_many(windows).await.unwrap();

        let from = date(2026, 10, 19);
        assert_eq!(store.count_eligible("pebble", from).await.unwrap(), 3);
        assert_eq!(
            store.page("pebble", from, 0, 2).await.unwrap(),
            vec!["alice".to_string(), "bob".to_string()]
        );
        assert_eq!(
            store.page("pebble", from, 2, 2).await.unwrap(),
            vec!["carol".to_string()]
        );
        assert!(store.page("pebble", from, 3, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkpoint_create_is_idempotent() {
        let store = InMemoryCheckpointStore::new();
        let day = date(2026, 10, 18);
        let first = store.create("pebble", day, 10).await.unwrap();
        let second = store.create("pebble", day, 99).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.total_users, 10);
    }

    #[tokio::test]
    async fn test_checkpoint_advance_requires_current_version() {
        let store = InMemoryCheckpointStore::new();
        let cp = store.create("pebble", date(2026, 10, 18), 10).await.unwrap();

        let advanced = store.advance(cp.id, cp.version, 5).await.unwrap().unwrap();
        assert_eq!(advanced.users_processed, 5);
        assert_eq!(advanced.version, cp.version + 1);

        // second writer still holds the old version
        assert!(store.advance(cp.id, cp.version, 5).await.unwrap().is_none());
        assert!(store.advance(cp.id, advanced.version, 11).await.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_log_lists_newest_first() {
        let log = InMemoryDispatchLog::new();
        for n in 0..3 {
            log.append(NewDispatchLogEntry::new(
                "u1",
                "pebble",
                DispatchOutcome::Success,
                json!({ "n": n }),
            ))
            .await
            .unwrap();
        }
        log.append(NewDispatchLogEntry::new(
            "u2",
            "pebble",
            DispatchOutcome::Error,
            json!({}),
        ))
        .await
        .unwrap();

        let entries = log.list_for_user("u1", "pebble").await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].payload, json!({ "n": 2 }));
    }

    #[tokio::test]
    async fn test_course_catalog_active_ids() {
        let catalog = InMemoryCourseCatalog::new();
        for (id, active) in [("b", true), ("a", true), ("c", false)] {
            catalog.insert(
                Course {
                    id: id.to_string(),
                    name: id.to_uppercase(),
                    subdomain: id.to_string(),
                    logo_url: None,
                    timezone: "UTC".to_string(),
                },
                active,
            );
        }
        assert_eq!(catalog.active_course_ids().await.unwrap(), vec!["a", "b"]);
        assert!(catalog.find_course("c").await.unwrap().is_some());
        assert!(catalog.find_course("z").await.unwrap().is_none());
    }
}
