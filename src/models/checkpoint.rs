//! Per-(course, day) dispatch cursor.

use diesel::prelude::*;
use jiff::Timestamp;
use jiff::civil::Date;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::dispatch_checkpoints;

/// Resumable cursor for one course's batch run on one calendar day.
///
/// `users_processed` only moves forward and never exceeds `total_users`.
/// `version` is bumped on every advance so that two concurrent runs cannot
/// both apply an update computed from the same starting point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub course_id: String,
    pub run_date: Date,
    pub total_users: i64,
    pub users_processed: i64,
    pub version: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Checkpoint {
    pub fn is_exhausted(&self) -> bool {
        self.users_processed >= self.total_users
    }

    pub fn remaining(&self) -> i64 {
        (self.total_users - self.users_processed).max(0)
    }
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = dispatch_checkpoints)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CheckpointRow {
    pub id: Uuid,
    pub course_id: String,
    pub run_date: jiff_diesel::Date,
    pub total_users: i64,
    pub users_processed: i64,
    pub version: i32,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

impl From<CheckpointRow> for Checkpoint {
    fn from(row: CheckpointRow) -> Self {
        Self {
            id: row.id,
            course_id: row.course_id,
            run_date: row.run_date.to_jiff(),
            total_users: row.total_users,
            users_processed: row.users_processed,
            version: row.version,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = dispatch_checkpoints)]
pub struct NewCheckpointRow {
    pub id: Uuid,
    pub course_id: String,
    pub run_date: jiff_diesel::Date,
    pub total_users: i64,
}

impl NewCheckpointRow {
    pub fn new(course_id: &str, run_date: Date, total_users: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: course_id.to_string(),
            run_date: run_date.into(),
            total_users,
        }
    }
}
