//! Append-only audit records for per-user dispatch attempts.

use std::io::Write;

use diesel::AsExpression;
use diesel::FromSqlRow;
use diesel::deserialize::{self, FromSql};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::schema::dispatch_logs;

/// Result of one dispatch attempt
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Success,
    Error,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Success => "success",
            DispatchOutcome::Error => "error",
        }
    }
}

impl diesel::query_builder::QueryId for DispatchOutcome {
    type QueryId = DispatchOutcome;
    const HAS_STATIC_QUERY_ID: bool = false;
}

impl ToSql<Text, Pg> for DispatchOutcome {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(serialize::IsNull::No)
    }
}

impl FromSql<Text, Pg> for DispatchOutcome {
    fn from_sql(
        bytes: <Pg as diesel::backend::Backend>::RawValue<'_>,
    ) -> deserialize::Result<Self> {
        let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
        match s.as_str() {
            "success" => Ok(DispatchOutcome::Success),
            "error" => Ok(DispatchOutcome::Error),
            _ => Err(format!("Unrecognized dispatch outcome: {}", s).into()),
        }
    }
}

/// A stored audit record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub outcome: DispatchOutcome,
    pub payload: JsonValue,
    pub created_at: Timestamp,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = dispatch_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DispatchLogRow {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub outcome: DispatchOutcome,
    pub payload: JsonValue,
    pub created_at: jiff_diesel::Timestamp,
}

impl From<DispatchLogRow> for DispatchLogEntry {
    fn from(row: DispatchLogRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            course_id: row.course_id,
            outcome: row.outcome,
            payload: row.payload,
            created_at: row.created_at.to_jiff(),
        }
    }
}

/// Audit record to append
#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = dispatch_logs)]
pub struct NewDispatchLogEntry {
    pub id: Uuid,
    pub user_id: String,
    pub course_id: String,
    pub outcome: DispatchOutcome,
    pub payload: JsonValue,
}

impl NewDispatchLogEntry {
    pub fn new(user_id: &str, course_id: &str, outcome: DispatchOutcome, payload: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            course_id: course_id.to_string(),
            outcome,
            payload,
        }
    }
}
