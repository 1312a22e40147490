//! Provider that only records notifications in the application log.

use std::time::Instant;

use async_trait::async_trait;

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::error::AppResult;

/// Emits one tracing event per message and reports success.
#[derive(Debug, Default, Clone)]
pub struct LogProvider;

impl LogProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationProvider for LogProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();
        tracing::info!(
            user_id = %message.user_id,
            template_id = %message.template_id,
            course = %message.branding.course_name,
            payload = %message.payload,
            "Waitlist notification"
        );
        Ok(NotificationResult::delivered(start.elapsed().as_millis() as u64))
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
