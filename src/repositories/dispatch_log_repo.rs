//! Dispatch log repository for async database operations.
//!
//! Entries are only ever inserted; there is no update or delete path.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{DispatchLogEntry, DispatchLogRow, NewDispatchLogEntry};
use crate::repositories::traits::DispatchLogStore;
use crate::schema::dispatch_logs::dsl as dl;

#[derive(Clone)]
pub struct DispatchLogRepository {
    pool: AsyncDbPool,
}

impl DispatchLogRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DispatchLogStore for DispatchLogRepository {
    async fn append(&self, entry: NewDispatchLogEntry) -> AppResult<()> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        diesel::insert_into(dl::dispatch_logs)
            .values(&entry)
            .execute(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "append dispatch log"))?;
        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        course_id: &str,
    ) -> AppResult<Vec<DispatchLogEntry>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        let rows = dl::dispatch_logs
            .filter(dl::user_id.eq(user_id))
            .filter(dl::course_id.eq(course_id))
            .order(dl::created_at.desc())
            .select(DispatchLogRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list dispatch logs"))?;
        Ok(rows.into_iter().map(DispatchLogEntry::from).collect())
    }
}
