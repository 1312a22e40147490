//! Fakes shared by the unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use jiff::civil::Date;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{Directory, OpenSlot};
use crate::models::{Course, DispatchLogEntry, NewDispatchLogEntry, NewWindow, Window};
use crate::repositories::memory::InMemoryWindowStore;
use crate::repositories::{DispatchLogStore, WindowFilter, WindowOrder, WindowStore};
use crate::services::notifications::{
    NotificationMessage, NotificationProvider, NotificationResult,
};

pub fn test_course() -> Course {
    Course {
        id: "pebble".to_string(),
        name: "Pebble Creek".to_string(),
        subdomain: "pebble".to_string(),
        logo_url: Some("https://cdn.example.com/pebble.png".to_string()),
        timezone: "America/Los_Angeles".to_string(),
    }
}

/// Directory answering from a fixed list of `(date, time, spots)` slots.
#[derive(Default)]
pub struct ScriptedDirectory {
    slots: Mutex<Vec<(Date, i32, i32)>>,
    failing_dates: Mutex<HashSet<Date>>,
    calls: Mutex<Vec<(Date, i32, i32, i32)>>,
}

impl ScriptedDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self, date: Date, time: i32, spots: i32) {
        self.slots.lock().unwrap().push((date, time, spots));
    }

    pub fn fail_on(&self, date: Date) {
        self.failing_dates.lock().unwrap().insert(date);
    }

    /// `(date, start, end, min_capacity)` per lookup
    pub fn calls(&self) -> Vec<(Date, i32, i32, i32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Directory for ScriptedDirectory {
    async fn find_open_slot(
        &self,
        course_id: &str,
        date: Date,
        start: i32,
        end: i32,
        min_capacity: i32,
    ) -> AppResult<Option<OpenSlot>> {
        self.calls
            .lock()
            .unwrap()
            .push((date, start, end, min_capacity));
        if self.failing_dates.lock().unwrap().contains(&date) {
            return Err(AppError::Directory {
                course_id: course_id.to_string(),
                source: anyhow::anyhow!("scripted outage"),
            });
        }
        Ok(self
            .slots
            .lock()
            .unwrap()
            .iter()
            .filter(|(d, t, spots)| *d == date && (start..=end).contains(t) && *spots >= min_capacity)
            .min_by_key(|(_, t, _)| *t)
            .map(|(_, t, spots)| OpenSlot {
                tee_time_id: Uuid::nil(),
                time: *t,
                available_spots: *spots,
            }))
    }
}

/// Provider that records every message.
#[derive(Default)]
pub struct RecordingProvider {
    sent: Mutex<Vec<NotificationMessage>>,
    rejection: Mutex<Option<String>>,
}

impl RecordingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<NotificationMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Report every later send as undelivered with `response`.
    pub fn reject_with(&self, response: &str) {
        *self.rejection.lock().unwrap() = Some(response.to_string());
    }
}

#[async_trait]
impl NotificationProvider for RecordingProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        if let Some(response) = self.rejection.lock().unwrap().clone() {
            return Ok(NotificationResult {
                success: false,
                status_code: Some(503),
                response: Some(response),
                duration_ms: 0,
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(NotificationResult::delivered(0))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Window store whose reads for one date fail.
pub struct FailingWindowStore {
    pub inner: InMemoryWindowStore,
    failing_date: Date,
}

impl FailingWindowStore {
    pub fn failing_on(failing_date: Date) -> Self {
        Self {
            inner: InMemoryWindowStore::new(),
            failing_date,
        }
    }
}

#[async_trait]
impl WindowStore for FailingWindowStore {
    async fn list_active(
        &self,
        filter: &WindowFilter,
        order: WindowOrder,
    ) -> AppResult<Vec<Window>> {
        if filter.date == Some(self.failing_date) {
            return Err(AppError::Database {
                operation: "list active windows".to_string(),
                source: anyhow::anyhow!("connection reset"),
            });
        }
        self.inner.list_active(filter, order).await
    }

    async fn insert_many(&self, windows: Vec<NewWindow>) -> AppResult<Vec<Window>> {
        self.inner.insert_many(windows).await
    }

    async fn soft_delete_many(&self, ids: &[Uuid]) -> AppResult<usize> {
        self.inner.soft_delete_many(ids).await
    }
}

/// Dispatch log that rejects every write.
pub struct FailingDispatchLog;

#[async_trait]
impl DispatchLogStore for FailingDispatchLog {
    async fn append(&self, _entry: NewDispatchLogEntry) -> AppResult<()> {
        Err(AppError::Database {
            operation: "append dispatch log".to_string(),
            source: anyhow::anyhow!("disk full"),
        })
    }

    async fn list_for_user(
        &self,
        _user_id: &str,
        _course_id: &str,
    ) -> AppResult<Vec<DispatchLogEntry>> {
        Ok(Vec::new())
    }
}
