//! Tee-time availability lookup.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use jiff::civil::Date;
use serde::Serialize;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::schema::tee_times::dsl as tt;

/// The earliest bookable slot that satisfied a lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenSlot {
    pub tee_time_id: Uuid,
    /// `HHmm`
    pub time: i32,
    pub available_spots: i32,
}

/// Read-only source of truth for open tee-time capacity.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Earliest slot on `date` with `start <= time <= end` and at least
    /// `min_capacity` open spots.
    async fn find_open_slot(
        &self,
        course_id: &str,
        date: Date,
        start: i32,
        end: i32,
        min_capacity: i32,
    ) -> AppResult<Option<OpenSlot>>;
}

/// [`Directory`] over the booking side's `tee_times` table.
#[derive(Clone)]
pub struct TeeTimeDirectory {
    pool: AsyncDbPool,
}

impl TeeTimeDirectory {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for TeeTimeDirectory {
    async fn find_open_slot(
        &self,
        course_id: &str,
        date: Date,
        start: i32,
        end: i32,
        min_capacity: i32,
    ) -> AppResult<Option<OpenSlot>> {
        let directory_error = |source: anyhow::Error| AppError::Directory {
            course_id: course_id.to_string(),
            source,
        };
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| directory_error(anyhow::Error::from(e)))?;

        let row: Option<(Uuid, i32, i32)> = tt::tee_times
            .filter(tt::course_id.eq(course_id))
            .filter(tt::date.eq(jiff_diesel::Date::from(date)))
            .filter(tt::time.between(start, end))
            .filter(tt::available_spots.ge(min_capacity))
            .order(tt::time.asc())
            .select((tt::id, tt::time, tt::available_spots))
            .first(&mut conn)
            .await
            .optional()
            .map_err(|e| directory_error(anyhow::Error::from(e)))?;

        Ok(row.map(|(tee_time_id, time, available_spots)| OpenSlot {
            tee_time_id,
            time,
            available_spots,
        }))
    }
}
