use chrono::Utc;
use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
const WEEK: u64 = 7 * DAY;
const YEAR: u64 = 365 * DAY;

/// "1 month ago" is shown from 28 days onwards
const FIRST_MONTH: u64 = 28 * DAY;
/// 30.4 days, an average calendar month
const EXTRA_MONTH: u64 = 2_626_560;
const MONTH_ACCURACY: u64 = 31 * DAY - 1;

static POST_DATE_RE: OnceLock<Regex> = OnceLock::new();

fn post_date_regex() -> &'static Regex {
    POST_DATE_RE.get_or_init(|| {
        Regex::new(
            r"\b(?P<magnitude>[0-9]{1,2}) (?P<unit>second|minute|hour|day|week|month|year)s? ago(?P<edited> \(edited\))?$",
        )
        .expect("post date regex is valid")
    })
}

/// Approximate age of a post derived from its relative publish string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeEstimate {
    /// Seconds between the publish time and now, at the near edge of the window.
    pub delta_secs: u64,
    /// Width of the window the real publish time falls in.
    pub accuracy_secs: u64,
    pub edited: bool,
}

/// Parse strings like `"3 days ago"` or `"5 minutes ago (edited)"`.
///
/// Months have no fixed length: the first counts as 28 days and every further
/// one as 30.4 days, with a 31 day accuracy window. Returns `None` and logs
/// when the string doesn't fit the grammar.
pub fn estimate_time_diff(published: &str) -> Option<TimeEstimate> {
    let Some(caps) = post_date_regex().captures(published.trim()) else {
        warn!(
            "[community post:date] could not parse '{}', no estimate available",
            published
        );
        return None;
    };

    let magnitude: u64 = caps["magnitude"].parse().ok()?;
    let edited = caps.name("edited").is_some();

    let (delta_secs, accuracy_secs) = if &caps["unit"] == "month" {
        (
            FIRST_MONTH + magnitude.saturating_sub(1) * EXTRA_MONTH,
            MONTH_ACCURACY,
        )
    } else {
        let unit_secs = unit_length(&caps["unit"])?;
        (magnitude * unit_secs, unit_secs - 1)
    };

    Some(TimeEstimate {
        delta_secs,
        accuracy_secs,
        edited,
    })
}

fn unit_length(unit: &str) -> Option<u64> {
    match unit {
        "second" => Some(1),
        "minute" => Some(MINUTE),
        "hour" => Some(HOUR),
        "day" => Some(DAY),
        "week" => Some(WEEK),
        "year" => Some(YEAR),
        _ => None,
    }
}

/// Publish metadata written under `_published` when date tracking is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimestampEstimate {
    #[serde(rename = "lastUpdatedTimestamp")]
    pub captured_at: i64,
    #[serde(rename = "lastPublishedString")]
    pub published_string: String,
}

impl TimestampEstimate {
    pub fn at(captured_at: i64, published_string: &str) -> Self {
        if let Some(estimate) = estimate_time_diff(published_string) {
            debug!(
                "'{}' is {}s old (accuracy {}s, edited: {})",
                published_string, estimate.delta_secs, estimate.accuracy_secs, estimate.edited
            );
        }

        Self {
            captured_at,
            published_string: published_string.to_string(),
        }
    }
}

/// Current UTC time as unix seconds
pub fn current_unix_timestamp() -> i64 {
    Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_ago() {
        let est = estimate_time_diff("3 days ago").unwrap();
        assert_eq!(est.delta_secs, 259_200);
        assert_eq!(est.accuracy_secs, 86_399);
        assert!(!est.edited);
    }

    #[test]
    fn test_one_month_ago() {
        let est = estimate_time_diff("1 month ago").unwrap();
        assert_eq!(est.delta_secs, 2_419_200);
        assert_eq!(est.accuracy_secs, 2_678_399);
    }

    #[test]
    fn test_two_months_ago() {
        let est = estimate_time_diff("2 months ago").unwrap();
        assert_eq!(est.delta_secs, 2_419_200 + 2_626_560);
        assert_eq!(est.delta_secs, 5_045_760);
        assert_eq!(est.accuracy_secs, 2_678_399);
    }

    #[test]
    fn test_edited_minutes() {
        let est = estimate_time_diff("5 minutes ago (edited)").unwrap();
        assert_eq!(est.delta_secs, 300);
        assert_eq!(est.accuracy_secs, 59);
        assert!(est.edited);
    }

    #[test]
    fn test_other_units() {
        assert_eq!(estimate_time_diff("1 second ago").unwrap().accuracy_secs, 0);
        assert_eq!(estimate_time_diff("2 hours ago").unwrap().delta_secs, 7_200);
        assert_eq!(estimate_time_diff("1 week ago").unwrap().delta_secs, 604_800);
        let year = estimate_time_diff("2 years ago").unwrap();
        assert_eq!(year.delta_secs, 2 * 31_536_000);
        assert_eq!(year.accuracy_secs, 31_535_999);
    }

    #[test]
    fn test_garbled_text() {
        assert_eq!(estimate_time_diff("garbled text"), None);
        assert_eq!(estimate_time_diff(""), None);
        assert_eq!(estimate_time_diff("3 fortnights ago"), None);
        assert_eq!(estimate_time_diff("100 days ago"), None);
    }

    #[test]
    fn test_timestamp_estimate_serializes_with_published_keys() {
        let est = TimestampEstimate::at(1_700_000_000, "3 days ago");
        let json = serde_json::to_value(&est).unwrap();
        assert_eq!(json["lastUpdatedTimestamp"], 1_700_000_000);
        assert_eq!(json["lastPublishedString"], "3 days ago");
    }

    #[test]
    fn test_timestamp_estimate_keeps_unparseable_string() {
        let est = TimestampEstimate::at(5, "Premiered yesterday");
        assert_eq!(est.published_string, "Premiered yesterday");
        assert_eq!(est.captured_at, 5);
    }
}
