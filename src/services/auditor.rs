//! Audit trail for per-user dispatch attempts.

use std::error::Error as _;
use std::sync::Arc;

use serde_json::json;

use crate::error::AppError;
use crate::models::{DispatchOutcome, NewDispatchLogEntry};
use crate::repositories::DispatchLogStore;
use crate::services::availability_matcher::MatchedWindow;

/// Appends one immutable log entry per dispatch attempt.
///
/// Never fails from the caller's point of view: a store error is reported
/// through `tracing` and dropped.
#[derive(Clone)]
pub struct NotificationAuditor {
    logs: Arc<dyn DispatchLogStore>,
}

impl NotificationAuditor {
    pub fn new(logs: Arc<dyn DispatchLogStore>) -> Self {
        Self { logs }
    }

    pub async fn log_success(&self, user_id: &str, course_id: &str, matches: &[MatchedWindow]) {
        let payload = serde_json::to_value(matches)
            .unwrap_or_else(|e| json!({ "serialization_error": e.to_string() }));
        self.append(NewDispatchLogEntry::new(
            user_id,
            course_id,
            DispatchOutcome::Success,
            payload,
        ))
        .await;
    }

    pub async fn log_failure(&self, user_id: &str, course_id: &str, error: &AppError) {
        self.append(NewDispatchLogEntry::new(
            user_id,
            course_id,
            DispatchOutcome::Error,
            json!({ "error": error_chain(error) }),
        ))
        .await;
    }

    async fn append(&self, entry: NewDispatchLogEntry) {
        let user_id = entry.user_id.clone();
        let course_id = entry.course_id.clone();
        let outcome = entry.outcome;
        if let Err(e) = self.logs.append(entry).await {
            tracing::error!(
                user_id = %user_id,
                course_id = %course_id,
                outcome = outcome.as_str(),
                error = %e,
                "Failed to write dispatch log entry"
            );
        }
    }
}

/// `outer: inner: root` rendering of an error and its sources.
pub fn error_chain(error: &AppError) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}
