//! Course lookup over the shared `courses` table.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult, DatabaseErrorConverter};
use crate::models::Course;
use crate::repositories::traits::CourseCatalog;
use crate::schema::courses::dsl as c;

#[derive(Clone)]
pub struct CourseRepository {
    pool: AsyncDbPool,
}

impl CourseRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseCatalog for CourseRepository {
    async fn find_course(&self, course_id: &str) -> AppResult<Option<Course>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        c::courses
            .filter(c::id.eq(course_id))
            .select(Course::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "find course"))
    }

    async fn active_course_ids(&self) -> AppResult<Vec<String>> {
        let mut conn = self.pool.get().await.map_err(AppError::pool)?;

        c::courses
            .filter(c::is_active.eq(true))
            .select(c::id)
            .order(c::id.asc())
            .load(&mut conn)
            .await
            .map_err(|e| DatabaseErrorConverter::convert_diesel_error(e, "list active courses"))
    }
}
