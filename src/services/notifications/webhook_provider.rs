//! Webhook notification provider implementation.
//!
//! Sends HTTP requests to the configured webhook URL using the global HTTP_CLIENT.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use super::provider::{NotificationMessage, NotificationProvider, NotificationResult};
use crate::config::WebhookConfig;
use crate::error::{AppError, AppResult};
use crate::external::client::HTTP_CLIENT;

/// Webhook notification provider
///
/// Uses the global `HTTP_CLIENT` for connection pooling.
pub struct WebhookProvider {
    config: WebhookConfig,
    method: Method,
}

impl WebhookProvider {
    /// Creates a provider, rejecting an unparseable HTTP method up front.
    pub fn new(config: WebhookConfig) -> AppResult<Self> {
        let method = config
            .method
            .to_uppercase()
            .parse()
            .map_err(|_| AppError::Validation {
                field: "notifier.webhook.method".to_string(),
                reason: format!("Invalid HTTP method: {}", config.method),
            })?;
        Ok(Self { config, method })
    }
}

#[async_trait]
impl NotificationProvider for WebhookProvider {
    async fn send(&self, message: &NotificationMessage) -> AppResult<NotificationResult> {
        let start = Instant::now();

        let mut request = HTTP_CLIENT
            .request(self.method.clone(), &self.config.url)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .json(&json!({
                "user_id": message.user_id,
                "template_id": message.template_id,
                "payload": message.payload,
                "branding": message.branding,
            }));

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.send().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match response {
            Ok(resp) => {
                let status_code = resp.status().as_u16();
                let success = resp.status().is_success();
                let response_text = resp.text().await.ok();

                Ok(NotificationResult {
                    success,
                    status_code: Some(status_code),
                    response: response_text,
                    duration_ms,
                })
            }
            Err(e) => Ok(NotificationResult {
                success: false,
                status_code: None,
                response: Some(e.to_string()),
                duration_ms,
            }),
        }
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
