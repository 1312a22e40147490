//! Core notification provider trait and types.
//!
//! Providers deliver a rendered-elsewhere template: the waitlist engine only
//! hands over a template id, a JSON payload and the course branding.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::AppResult;
use crate::models::Branding;

/// Message to be sent via notification provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationMessage {
    pub user_id: String,
    pub template_id: String,
    pub payload: JsonValue,
    pub branding: Branding,
}

/// Result of a notification send attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationResult {
    /// Whether send was successful
    pub success: bool,
    /// HTTP status code or provider-specific status
    pub status_code: Option<u16>,
    /// Response body or error message
    pub response: Option<String>,
    /// Time taken for the operation in milliseconds
    pub duration_ms: u64,
}

impl NotificationResult {
    pub fn delivered(duration_ms: u64) -> Self {
        Self {
            success: true,
            status_code: None,
            response: None,
            duration_ms,
        }
    }
}

/// Trait for notification providers.
///
/// Delivery is at-least-once from the dispatcher's point of view: a crash
/// between sending and advancing the checkpoint re-sends the same page, so
/// implementations must tolerate duplicate messages.
#[async_trait]
pub trait NotificationProvider: Send + Sync {
    /// Sends a notification message.
    ///
    /// Transport failures are reported through an unsuccessful
    /// [`NotificationResult`]; `Err` is reserved for misconfiguration.
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}
