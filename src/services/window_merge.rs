//! Window merge engine.
//!
//! Keeps the active windows of each [`WindowKey`] pairwise disjoint and
//! non-touching. A new request either is already covered by an existing
//! window (no-op) or becomes a single window spanning itself and every
//! window it overlaps or touches; those windows are soft-deleted.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{CreateWindowsRequest, NewWindow, Window, WindowKey};
use crate::repositories::{WindowFilter, WindowOrder, WindowStore};

/// Writes needed to fold one requested range into a key's active windows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    pub to_insert: Vec<NewWindow>,
    pub to_soft_delete: Vec<Uuid>,
}

impl MergePlan {
    pub fn is_noop(&self) -> bool {
        self.to_insert.is_empty() && self.to_soft_delete.is_empty()
    }
}

/// Plans the merge of `[start, end]` into `existing`.
///
/// `existing` must be the key's active windows sorted by `start_time`.
/// Bounds are inclusive, so a window ending exactly where the request starts
/// is absorbed.
pub fn plan_merge(existing: &[Window], key: &WindowKey, start: i32, end: i32) -> MergePlan {
    let (mut acc_start, mut acc_end) = (start, end);
    let mut to_soft_delete = Vec::new();

    for window in existing {
        if window.start_time <= acc_start && window.end_time >= acc_end {
            return MergePlan::default();
        }
        if window.start_time > acc_end {
            break;
        }

        let acc = acc_start..=acc_end;
        let end_inside = acc.contains(&window.end_time);
        let start_inside = acc.contains(&window.start_time);
        let enclosed = window.start_time >= acc_start && window.end_time <= acc_end;
        if end_inside || enclosed || start_inside {
            acc_start = acc_start.min(window.start_time);
            acc_end = acc_end.max(window.end_time);
            to_soft_delete.push(window.id);
        }
    }

    MergePlan {
        to_insert: vec![NewWindow::new(key, acc_start, acc_end)],
        to_soft_delete,
    }
}

/// Write-side API over the merge engine.
#[derive(Clone)]
pub struct WindowService {
    store: Arc<dyn WindowStore>,
}

impl WindowService {
    pub fn new(store: Arc<dyn WindowStore>) -> Self {
        Self { store }
    }

    /// Applies one time range to every date of the request.
    ///
    /// Dates are reconciled one at a time in ascending order. A failing date
    /// does not stop the remaining ones; the first error is returned once
    /// all dates were attempted.
    pub async fn create_windows(&self, request: CreateWindowsRequest) -> AppResult<Vec<MergePlan>> {
        request.validate()?;

        let mut plans = Vec::new();
        let mut first_error: Option<AppError> = None;
        for key in request.keys() {
            match self
                .reconcile(&key, request.start_time, request.end_time)
                .await
            {
                Ok(plan) => plans.push(plan),
                Err(e) => {
                    tracing::warn!(
                        user_id = %key.user_id,
                        course_id = %key.course_id,
                        date = %key.date,
                        error = %e,
                        "Window reconciliation failed"
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(plans),
        }
    }

    /// Folds `[start, end]` into the active windows of `key`.
    ///
    /// The insert and the soft-delete are separate store calls; a failure
    /// between them leaves the new window next to the ones it supersedes
    /// until the key is reconciled again.
    pub async fn reconcile(&self, key: &WindowKey, start: i32, end: i32) -> AppResult<MergePlan> {
        let existing = self
            .store
            .list_active(&WindowFilter::for_key(key), WindowOrder::StartTime)
            .await?;
        let plan = plan_merge(&existing, key, start, end);

        if plan.is_noop() {
            tracing::debug!(
                user_id = %key.user_id,
                date = %key.date,
                start,
                end,
                "Requested window already covered"
            );
            return Ok(plan);
        }

        self.store.insert_many(plan.to_insert.clone()).await?;
        self.store.soft_delete_many(&plan.to_soft_delete).await?;

        tracing::debug!(
            user_id = %key.user_id,
            date = %key.date,
            superseded = plan.to_soft_delete.len(),
            "Window merged"
        );
        Ok(plan)
    }

    /// Retires windows by id; returns how many were active.
    pub async fn delete_windows(&self, ids: &[Uuid]) -> AppResult<usize> {
        self.store.soft_delete_many(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::InMemoryWindowStore;
    use crate::test_support::FailingWindowStore;
    use jiff::civil::{Date, date};
    use proptest::prelude::*;

    const DAY: Date = date(2026, 10, 20);

    fn key() -> WindowKey {
        WindowKey {
            user_id: "u1".to_string(),
            course_id: "pebble".to_string(),
            party_size: 2,
            date: DAY,
        }
    }

    fn request(start: i32, end: i32, dates: Vec<Date>) -> CreateWindowsRequest {
        CreateWindowsRequest {
            user_id: "u1".to_string(),
            course_id: "pebble".to_string(),
            party_size: 2,
            start_time: start,
            end_time: end,
            dates,
        }
    }

    async fn active(store: &InMemoryWindowStore) -> Vec<(i32, i32)> {
        store
            .list_active(&WindowFilter::for_key(&key()), WindowOrder::StartTime)
            .await
            .unwrap()
            .into_iter()
            .map(|w| (w.start_time, w.end_time))
            .collect()
    }

    fn service() -> (Arc<InMemoryWindowStore>, WindowService) {
        let store = Arc::new(InMemoryWindowStore::new());
        (store.clone(), WindowService::new(store))
    }

    #[tokio::test]
    async fn test_same_window_twice_is_noop() {
        let (store, service) = service();
        service.reconcile(&key(), 900, 1100).await.unwrap();
        let plan = service.reconcile(&key(), 900, 1100).await.unwrap();

        assert!(plan.is_noop());
        assert_eq!(active(&store).await, vec![(900, 1100)]);
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_contained_request_is_noop() {
        let (store, service) = service();
        service.reconcile(&key(), 800, 1200).await.unwrap();
        assert!(service.reconcile(&key(), 900, 1000).await.unwrap().is_noop());
        assert_eq!(active(&store).await, vec![(800, 1200)]);
    }

    #[tokio::test]
    async fn test_touching_windows_merge() {
        let (store, service) = service();
        service.reconcile(&key(), 900, 1000).await.unwrap();
        let plan = service.reconcile(&key(), 1000, 1100).await.unwrap();

        assert_eq!(plan.to_soft_delete.len(), 1);
        assert_eq!(active(&store).await, vec![(900, 1100)]);
    }

    #[tokio::test]
    async fn test_disjoint_windows_stay_separate() {
        let (store, service) = service();
        service.reconcile(&key(), 900, 1000).await.unwrap();
        service.reconcile(&key(), 1200, 1300).await.unwrap();
        assert_eq!(active(&store).await, vec![(900, 1000), (1200, 1300)]);
    }

    #[tokio::test]
    async fn test_bridging_request_absorbs_both_neighbours() {
        let (store, service) = service();
        service.reconcile(&key(), 700, 800).await.unwrap();
        service.reconcile(&key(), 900, 1000).await.unwrap();
        service.reconcile(&key(), 1200, 1300).await.unwrap();

        let plan = service.reconcile(&key(), 750, 950).await.unwrap();
        assert_eq!(plan.to_soft_delete.len(), 2);
        assert_eq!(active(&store).await, vec![(700, 1000), (1200, 1300)]);
        // retired rows are kept
        let rows = store.all().await;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows.iter().filter(|w| w.is_deleted).count(), 2);
    }

    #[tokio::test]
    async fn test_other_party_size_is_independent() {
        let (store, service) = service();
        service.reconcile(&key(), 900, 1000).await.unwrap();
        let mut other = key();
        other.party_size = 4;
        let plan = service.reconcile(&other, 900, 1000).await.unwrap();

        assert!(plan.to_soft_delete.is_empty());
        assert_eq!(plan.to_insert.len(), 1);
        assert_eq!(store.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_create_windows_applies_every_date_once() {
        let (store, service) = service();
        let next = date(2026, 10, 21);
        let plans = service
            .create_windows(request(900, 1100, vec![next, DAY, next]))
            .await
            .unwrap();

        assert_eq!(plans.len(), 2);
        let dates: Vec<Date> = store.all().await.iter().map(|w| w.date).collect();
        assert_eq!(dates, vec![DAY, next]);
    }

    #[tokio::test]
    async fn test_create_windows_rejects_invalid_request() {
        let (store, service) = service();
        let result = service.create_windows(request(1100, 900, vec![DAY])).await;

        assert!(matches!(result, Err(AppError::ValidationErrors { .. })));
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_windows_attempts_all_dates_and_returns_first_error() {
        let failing_day = date(2026, 10, 21);
        let store = Arc::new(FailingWindowStore::failing_on(failing_day));
        let service = WindowService::new(store.clone());

        let result = service
            .create_windows(request(900, 1000, vec![DAY, failing_day, date(2026, 10, 22)]))
            .await;

        assert!(matches!(result, Err(AppError::Database { .. })));
        let stored: Vec<Date> = store.inner.all().await.iter().map(|w| w.date).collect();
        assert_eq!(stored, vec![DAY, date(2026, 10, 22)]);
    }

    #[tokio::test]
    async fn test_delete_windows() {
        let (store, service) = service();
        let plan = service.reconcile(&key(), 900, 1000).await.unwrap();
        let id = plan.to_insert[0].id;

        assert_eq!(service.delete_windows(&[id]).await.unwrap(), 1);
        assert!(active(&store).await.is_empty());
    }

    fn window(start: i32, end: i32) -> Window {
        Window {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            course_id: "pebble".to_string(),
            date: DAY,
            start_time: start,
            end_time: end,
            party_size: 2,
            is_deleted: false,
            created_at: jiff::Timestamp::UNIX_EPOCH,
            updated_at: jiff::Timestamp::UNIX_EPOCH,
        }
    }

    /// Reference union over closed intervals; touching intervals coalesce.
    fn union(mut intervals: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
        intervals.sort();
        let mut merged: Vec<(i32, i32)> = Vec::new();
        for (s, e) in intervals {
            match merged.last_mut() {
                Some(last) if s <= last.1 => last.1 = last.1.max(e),
                _ => merged.push((s, e)),
            }
        }
        merged
    }

    fn arb_interval() -> impl Strategy<Value = (i32, i32)> {
        (0i32..2400, 0i32..400).prop_map(|(s, len)| (s, (s + len).min(2399)))
    }

    proptest! {
        #[test]
        fn prop_merge_keeps_union_and_disjointness(
            inserts in prop::collection::vec(arb_interval(), 1..25)
        ) {
            let key = key();
            let mut active: Vec<Window> = Vec::new();

            for &(s, e) in &inserts {
                active.sort_by_key(|w| w.start_time);
                let plan = plan_merge(&active, &key, s, e);
                active.retain(|w| !plan.to_soft_delete.contains(&w.id));
                active.extend(plan.to_insert.iter().map(|n| window(n.start_time, n.end_time)));
            }

            active.sort_by_key(|w| w.start_time);
            let bounds: Vec<(i32, i32)> = active.iter().map(|w| (w.start_time, w.end_time)).collect();
            for pair in bounds.windows(2) {
                prop_assert!(pair[1].0 > pair[0].1, "windows touch or overlap: {:?}", pair);
            }
            prop_assert_eq!(bounds, union(inserts));
        }

        #[test]
        fn prop_reinserting_any_active_window_is_noop(
            inserts in prop::collection::vec(arb_interval(), 1..10)
        ) {
            let key = key();
            let mut active: Vec<Window> = Vec::new();
            for &(s, e) in &inserts {
                active.sort_by_key(|w| w.start_time);
                let plan = plan_merge(&active, &key, s, e);
                active.retain(|w| !plan.to_soft_delete.contains(&w.id));
                active.extend(plan.to_insert.iter().map(|n| window(n.start_time, n.end_time)));
            }
            active.sort_by_key(|w| w.start_time);
            for w in &active {
                prop_assert!(plan_merge(&active, &key, w.start_time, w.end_time).is_noop());
            }
        }
    }
}
