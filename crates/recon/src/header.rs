//! Report timestamp from page-one text.
//!
//! The documents print their own report date next to a "Today" label, either
//! as `June 12, 2025` (full or abbreviated month) or as `12/06/2025`. That date
//! orders snapshots; when it is missing the processing time stands in.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

fn month_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Today\s+([A-Za-z]+\.?\s+\d{1,2},?\s+\d{4})")
            .expect("month-name report date pattern")
    })
}

fn numeric_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Today\s+(\d{2}/\d{2}/\d{4})").expect("numeric report date pattern")
    })
}

/// Find the report date in page-one text.
pub fn extract_report_date(text: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = month_name_pattern().captures(text) {
        let cleaned = caps[1].replace([',', '.'], " ");
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        for fmt in ["%B %d %Y", "%b %d %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&cleaned, fmt) {
                return date.and_hms_opt(0, 0, 0);
            }
        }
    }

    let caps = numeric_pattern().captures(text)?;
    NaiveDate::parse_from_str(&caps[1], "%d/%m/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The snapshot's ordering timestamp, falling back to `processed_at`.
pub fn report_timestamp(header_text: Option<&str>, processed_at: NaiveDateTime) -> NaiveDateTime {
    match header_text.and_then(extract_report_date) {
        Some(ts) => ts,
        None => {
            log::warn!("no report date in header, using processing time {processed_at}");
            processed_at
        }
    }
}
