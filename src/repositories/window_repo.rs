//! Window repository for async database operations.
//!
//! Backs both [`WindowStore`] and [`UserDirectory`]: eligible users are
//! derived from the active windows table.

use async_trait::async_trait;
use diesel::dsl::{count, now};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use jiff::civil::Date;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{NewWindow, NewWindowRow, Window, WindowRow};
use crate::repositories::traits::{UserDirectory, WindowFilter, WindowOrder, WindowStore};
use crate::schema::waitlist_windows::BoxedQuery;
use crate::schema::waitlist_windows::dsl as w;

/// Window repository holding an async connection pool.
///
/// Since `AsyncDbPool` (bb8::Pool) internally uses `Arc`, cloning is cheap.
#[derive(Clone)]
pub struct WindowRepository {
    pool: AsyncDbPool,
}

impl WindowRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Distinct users with an active window on or after `from`
    fn eligible_count_query(course_id: &str, from: Date) -> BoxedQuery<'_, Pg, BigInt> {
        w::waitlist_windows
            .filter(w::course_id.eq(course_id))
            .filter(w::is_deleted.eq(false))
            .filter(w::date.ge(jiff_diesel::Date::from(from)))
            .select(count(w::user_id).aggregate_distinct())
            .into_boxed()
    }
}

#[async_trait]
impl WindowStore for WindowRepository {
    async fn list_active(
        &self,
        filter: &WindowFilter,
        order: WindowOrder,
    ) -> AppResult<Vec<Window>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        let mut query = w::waitlist_windows
            .filter(w::is_deleted.eq(false))
            .into_boxed();
        if let Some(user) = &filter.user_id {
            query = query.filter(w::user_id.eq(user));
        }
        if let Some(course) = &filter.course_id {
            query = query.filter(w::course_id.eq(course));
        }
        if let Some(party) = filter.party_size {
            query = query.filter(w::party_size.eq(party));
        }
        if let Some(day) = filter.date {
            query = query.filter(w::date.eq(jiff_diesel::Date::from(day)));
        }
        if let Some(from) = filter.date_from {
            query = query.filter(w::date.ge(jiff_diesel::Date::from(from)));
        }
        query = match order {
            WindowOrder::StartTime => query.order(w::start_time.asc()).then_order_by(w::id.asc()),
            WindowOrder::DatePartyStart => query
                .order(w::date.asc())
                .then_order_by(w::party_size.asc())
                .then_order_by(w::start_time.asc())
                .then_order_by(w::id.asc()),
        };

        let rows = query
            .select(WindowRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list active windows"))?;
        Ok(rows.into_iter().map(Window::from).collect())
    }

    async fn insert_many(&self, windows: Vec<NewWindow>) -> AppResult<Vec<Window>> {
        if windows.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;
        let rows: Vec<NewWindowRow> = windows.into_iter().map(NewWindowRow::from).collect();

        let inserted = diesel::insert_into(w::waitlist_windows)
            .values(&rows)
            .returning(WindowRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "insert windows"))?;
        Ok(inserted.into_iter().map(Window::from).collect())
    }

    async fn soft_delete_many(&self, ids: &[Uuid]) -> AppResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        diesel::update(
            w::waitlist_windows
                .filter(w::id.eq_any(ids))
                .filter(w::is_deleted.eq(false)),
        )
        .set((w::is_deleted.eq(true), w::updated_at.eq(now)))
        .execute(&mut conn)
        .await
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "soft delete windows"))
    }
}

#[async_trait]
impl UserDirectory for WindowRepository {
    async fn count_eligible(&self, course_id: &str, from: Date) -> AppResult<i64> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        Self::eligible_count_query(course_id, from)
            .get_result(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "count eligible users"))
    }

    async fn page(
        &self,
        course_id: &str,
        from: Date,
        offset: i64,
        limit: i64,
    ) -> AppResult<Vec<String>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        w::waitlist_windows
            .filter(w::course_id.eq(course_id))
            .filter(w::is_deleted.eq(false))
            .filter(w::date.ge(jiff_diesel::Date::from(from)))
            .select(w::user_id)
            .distinct()
            .order(w::user_id.asc())
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "page eligible users"))
    }
}
