//! Waitlist window models.
//!
//! A window is a user's standing "notify me" request for one course, one
//! calendar day, a party size and an inclusive `HHmm` time range.

use diesel::prelude::*;
use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::time_of_day::is_valid_hhmm;
use crate::schema::waitlist_windows;

// ============================================================================
// Domain types
// ============================================================================

/// A persisted waitlist window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Window {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub date: Date,
    pub start_time: i32,
    pub end_time: i32,
    pub party_size: i32,
    pub is_deleted: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Window {
    pub fn key(&self) -> WindowKey {
        WindowKey {
            user_id: self.user_id.clone(),
            course_id: self.course_id.clone(),
            party_size: self.party_size,
            date: self.date,
        }
    }
}

/// A window about to be inserted; timestamps are assigned by the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWindow {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub date: Date,
    pub start_time: i32,
    pub end_time: i32,
    pub party_size: i32,
}

impl NewWindow {
    pub fn new(key: &WindowKey, start_time: i32, end_time: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: key.user_id.clone(),
            course_id: key.course_id.clone(),
            date: key.date,
            start_time,
            end_time,
            party_size: key.party_size,
        }
    }
}

/// The grouping under which active windows must stay disjoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub user_id: String,
    pub course_id: String,
    pub party_size: i32,
    pub date: Date,
}

/// Write-side request: one time range applied to a set of dates
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_time_bounds"))]
pub struct CreateWindowsRequest {
    #[validate(length(min = 1, max = 64, message = "User id must be 1-64 characters"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 64, message = "Course id must be 1-64 characters"))]
    pub course_id: String,
    #[validate(range(min = 1, max = 8, message = "Party size must be between 1 and 8"))]
    pub party_size: i32,
    pub start_time: i32,
    pub end_time: i32,
    #[validate(length(min = 1, message = "At least one date is required"))]
    pub dates: Vec<Date>,
}

impl CreateWindowsRequest {
    /// Merge keys for each distinct date, in ascending date order.
    pub fn keys(&self) -> Vec<WindowKey> {
        let mut dates = self.dates.clone();
        dates.sort();
        dates.dedup();
        dates
            .into_iter()
            .map(|date| WindowKey {
                user_id: self.user_id.clone(),
                course_id: self.course_id.clone(),
                party_size: self.party_size,
                date,
            })
            .collect()
    }
}

fn validate_time_bounds(request: &CreateWindowsRequest) -> Result<(), ValidationError> {
    if !is_valid_hhmm(request.start_time) || !is_valid_hhmm(request.end_time) {
        return Err(ValidationError::new("invalid_time")
            .with_message("Times must be HHmm values between 0000 and 2359".into()));
    }
    if request.start_time > request.end_time {
        return Err(ValidationError::new("time_range")
            .with_message("Start time must not be after end time".into()));
    }
    Ok(())
}

// ============================================================================
// Diesel rows
// ============================================================================

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = waitlist_windows)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WindowRow {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub date: jiff_diesel::Date,
    pub start_time: i32,
    pub end_time: i32,
    pub party_size: i32,
    pub is_deleted: bool,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

impl From<WindowRow> for Window {
    fn from(row: WindowRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            date: row.date.to_jiff(),
            start_time: row.start_time,
            end_time: row.end_time,
            party_size: row.party_size,
            is_deleted: row.is_deleted,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
        }
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = waitlist_windows)]
pub struct NewWindowRow {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub date: jiff_diesel::Date,
    pub start_time: i32,
    pub end_time: i32,
    pub party_size: i32,
}

impl From<NewWindow> for NewWindowRow {
    fn from(window: NewWindow) -> Self {
        Self {
            id: window.id,
            user_id: window.user_id,
            course_id: window.course_id,
            date: window.date.into(),
            start_time: window.start_time,
            end_time: window.end_time,
            party_size: window.party_size,
        }
    }
}
