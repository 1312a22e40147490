//! Checkpoint repository for async database operations.

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::civil::Date;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::{Checkpoint, CheckpointRow, NewCheckpointRow};
use crate::repositories::traits::CheckpointStore;
use crate::schema::dispatch_checkpoints::dsl as dc;

#[derive(Clone)]
pub struct CheckpointRepository {
    pool: AsyncDbPool,
}

impl CheckpointRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CheckpointStore for CheckpointRepository {
    async fn find(&self, course_id: &str, run_date: Date) -> AppResult<Option<Checkpoint>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        let row = dc::dispatch_checkpoints
            .filter(dc::course_id.eq(course_id))
            .filter(dc::run_date.eq(jiff_diesel::Date::from(run_date)))
            .select(CheckpointRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find checkpoint"))?;
        Ok(row.map(Checkpoint::from))
    }

    async fn create(
        &self,
        course_id: &str,
        run_date: Date,
        total_users: i64,
    ) -> AppResult<Checkpoint> {
        {
            let mut conn = self.pool.get().await.map_err(AppError::pool)?;
            // A concurrent first run may have inserted the row already; keep theirs.
            diesel::insert_into(dc::dispatch_checkpoints)
                .values(&NewCheckpointRow::new(course_id, run_date, total_users))
                .on_conflict((dc::course_id, dc::run_date))
                .do_nothing()
                .execute(&mut conn)
                .await
                .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "create checkpoint"))?;
        }

        self.find(course_id, run_date)
            .await?
            .ok_or_else(|| AppError::NotFound {
                entity: "checkpoint".to_string(),
                field: "course_id".to_string(),
                value: course_id.to_string(),
            })
    }

    async fn advance(
        &self,
        id: Uuid,
        expected_version: i32,
        users_processed: i64,
    ) -> AppResult<Option<Checkpoint>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        let row = diesel::update(
            dc::dispatch_checkpoints
                .filter(dc::id.eq(id))
                .filter(dc::version.eq(expected_version)),
        )
        .set((
            dc::users_processed.eq(users_processed),
            dc::version.eq(dc::version + 1),
            dc::updated_at.eq(now),
        ))
        .returning(CheckpointRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "advance checkpoint"))?;
        Ok(row.map(Checkpoint::from))
    }
}
