//! Per-user availability matching and notification.

use std::sync::Arc;
use std::time::Duration;

use jiff::civil::Date;
use serde::Serialize;
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::error::{AppError, AppResult};
use crate::external::Directory;
use crate::models::{Branding, Course};
use crate::repositories::{WindowFilter, WindowOrder, WindowStore};
use crate::services::auditor::NotificationAuditor;
use crate::services::notifications::payload::build_payload;
use crate::services::notifications::{NotificationMessage, NotificationProvider};

/// A window whose date had an open slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedWindow {
    pub window_id: Uuid,
    pub date: Date,
    pub start_time: i32,
    pub end_time: i32,
    pub party_size: i32,
    /// `HHmm` of the earliest open slot the directory returned
    pub slot_time: i32,
}

/// Knobs taken from the `dispatch` config section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherSettings {
    pub match_cap: usize,
    pub template_id: String,
    pub base_domain: String,
}

impl From<&DispatchConfig> for MatcherSettings {
    fn from(config: &DispatchConfig) -> Self {
        Self {
            match_cap: config.match_cap as usize,
            template_id: config.template_id.clone(),
            base_domain: config.base_domain.clone(),
        }
    }
}

pub struct AvailabilityMatcher {
    windows: Arc<dyn WindowStore>,
    directory: Arc<dyn Directory>,
    provider: Arc<dyn NotificationProvider>,
    auditor: NotificationAuditor,
    settings: MatcherSettings,
}

impl AvailabilityMatcher {
    pub fn new(
        windows: Arc<dyn WindowStore>,
        directory: Arc<dyn Directory>,
        provider: Arc<dyn NotificationProvider>,
        auditor: NotificationAuditor,
        settings: MatcherSettings,
    ) -> Self {
        Self {
            windows,
            directory,
            provider,
            auditor,
            settings,
        }
    }

    /// Matches one user's upcoming windows and notifies them.
    ///
    /// Never fails: errors become an `error` audit entry. A successful send
    /// becomes a `success` entry. When nothing matched no notification is
    /// sent and nothing is audited.
    pub async fn match_and_notify(&self, user_id: &str, course: &Course, today: Date) {
        match self.notify_matches(user_id, course, today).await {
            Ok(matches) if matches.is_empty() => {
                tracing::debug!("No open slots for any waitlist window");
            }
            Ok(matches) => {
                tracing::info!(matched_dates = matches.len(), "Waitlist notification sent");
                self.auditor.log_success(user_id, &course.id, &matches).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Waitlist dispatch failed");
                self.auditor.log_failure(user_id, &course.id, &e).await;
            }
        }
    }

    async fn notify_matches(
        &self,
        user_id: &str,
        course: &Course,
        today: Date,
    ) -> AppResult<Vec<MatchedWindow>> {
        let tomorrow = today.tomorrow().map_err(anyhow::Error::from)?;
        let matches = self.find_matches(user_id, &course.id, tomorrow).await?;
        if matches.is_empty() {
            return Ok(matches);
        }

        let message = NotificationMessage {
            user_id: user_id.to_string(),
            template_id: self.settings.template_id.clone(),
            payload: build_payload(course, &self.settings.base_domain, &matches),
            branding: Branding::from(course),
        };
        let result = self.provider.send(&message).await?;
        if !result.success {
            return Err(AppError::Provider {
                provider: self.provider.name().to_string(),
                message: result
                    .response
                    .or_else(|| result.status_code.map(|s| format!("status {}", s)))
                    .unwrap_or_else(|| "delivery failed".to_string()),
            });
        }
        tracing::debug!(
            provider = self.provider.name(),
            duration = ?Duration::from_millis(result.duration_ms),
            "Provider accepted notification"
        );
        Ok(matches)
    }

    /// Earliest-date-first matches for windows dated on or after `from`, at
    /// most one per date and at most `match_cap` in total.
    pub async fn find_matches(
        &self,
        user_id: &str,
        course_id: &str,
        from: Date,
    ) -> AppResult<Vec<MatchedWindow>> {
        let windows = self
            .windows
            .list_active(
                &WindowFilter::upcoming(user_id, course_id, from),
                WindowOrder::DatePartyStart,
            )
            .await?;

        let mut matches = Vec::new();
        for same_date in windows.chunk_by(|a, b| a.date == b.date) {
            if matches.len() >= self.settings.match_cap {
                break;
            }
            for window in same_date {
                let slot = self
                    .directory
                    .find_open_slot(
                        course_id,
                        window.date,
                        window.start_time,
                        window.end_time,
                        window.party_size,
                    )
                    .await?;
                if let Some(slot) = slot {
                    matches.push(MatchedWindow {
                        window_id: window.id,
                        date: window.date,
                        start_time: window.start_time,
                        end_time: window.end_time,
                        party_size: window.party_size,
                        slot_time: slot.time,
                    });
                    break;
                }
            }
        }
        Ok(matches)
    }
}
