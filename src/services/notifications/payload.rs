//! Template payload for a waitlist match notification.

use jiff::civil::Date;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::models::Course;
use crate::models::time_of_day::format_range;
use crate::services::availability_matcher::MatchedWindow;

/// One matched date as the template sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchEntry {
    pub date_label: String,
    pub window_time_label: String,
    pub tee_time_label: String,
    pub book_url: String,
    pub stop_url: String,
}

/// `Saturday, October 18`
pub fn date_label(date: Date) -> String {
    date.strftime("%A, %B %-d").to_string()
}

fn course_origin(course: &Course, base_domain: &str) -> String {
    format!("https://{}.{}", course.subdomain, base_domain)
}

pub fn book_url(course: &Course, base_domain: &str, matched: &MatchedWindow) -> String {
    format!(
        "{}/results?date={}&startTime={:04}&endTime={:04}&players={}",
        course_origin(course, base_domain),
        matched.date,
        matched.start_time,
        matched.end_time,
        matched.party_size
    )
}

pub fn stop_url(course: &Course, base_domain: &str, matched: &MatchedWindow) -> String {
    format!(
        "{}/waitlist/unsubscribe?id={}",
        course_origin(course, base_domain),
        matched.window_id
    )
}

/// Builds the provider payload. Both time labels use the window bounds; the
/// booking page re-runs the search, so the exact slot time is not promised.
pub fn build_payload(course: &Course, base_domain: &str, matches: &[MatchedWindow]) -> JsonValue {
    let entries: Vec<MatchEntry> = matches
        .iter()
        .map(|m| {
            let range = format_range(m.start_time, m.end_time);
            MatchEntry {
                date_label: date_label(m.date),
                window_time_label: range.clone(),
                tee_time_label: range,
                book_url: book_url(course, base_domain, m),
                stop_url: stop_url(course, base_domain, m),
            }
        })
        .collect();

    serde_json::json!({
        "course_name": course.name,
        "matches": entries,
    })
}
