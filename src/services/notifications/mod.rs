//! Notification delivery with pluggable providers.
//!
//! `NotificationProvider` is the seam to the transport; `payload` builds the
//! template data for a waitlist match.

mod log_provider;
pub mod payload;
mod provider;
mod webhook_provider;

pub use log_provider::LogProvider;
pub use provider::{NotificationMessage, NotificationProvider, NotificationResult};
pub use webhook_provider::WebhookProvider;

use std::sync::Arc;

use crate::config::{NotifierBackend, NotifierConfig};
use crate::error::AppResult;

/// Builds the provider selected by `notifier.backend`.
pub fn build_provider(config: &NotifierConfig) -> AppResult<Arc<dyn NotificationProvider>> {
    Ok(match config.backend {
        NotifierBackend::Log => Arc::new(LogProvider::new()),
        NotifierBackend::Webhook => Arc::new(WebhookProvider::new(config.webhook.clone())?),
    })
}
