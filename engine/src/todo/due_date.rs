//! Due-date extraction from free-text snippets. Relative phrases are
//! resolved against the current local date.

use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

static EXPLICIT_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:by|due|deadline|before)\s+(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});
static RELATIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bby\s+(today|tomorrow|this week|next week)\b").unwrap());
static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:by|due|before)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b")
        .unwrap()
});
// Catch-all for written-out dates like "by March 3, 2026".
static GENERIC_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:by|due|deadline|before)\s+([a-z]{3,9}\.?\s+\d{1,2},?\s+\d{4})").unwrap()
});

/// Scan a snippet for a due-date phrase and resolve it to a calendar
/// date. Returns `None` when nothing parseable is present.
pub fn extract_due_date(text: &str) -> Option<NaiveDate> {
    resolve(text, Local::now().date_naive())
}

fn resolve(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(cap) = EXPLICIT_DATE_RE.captures(text) {
        let month: u32 = cap[1].parse().ok()?;
        let day: u32 = cap[2].parse().ok()?;
        let year: i32 = cap[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(cap) = RELATIVE_RE.captures(text) {
        return Some(resolve_relative(&cap[1].to_lowercase(), today));
    }

    if let Some(cap) = WEEKDAY_RE.captures(text) {
        let target = parse_weekday(&cap[1].to_lowercase())?;
        return Some(next_weekday(today, target));
    }

    if let Some(cap) = GENERIC_DATE_RE.captures(text) {
        let raw = cap[1].replace('.', "");
        for format in ["%B %d, %Y", "%B %d %Y", "%b %d, %Y", "%b %d %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&raw, format) {
                return Some(date);
            }
        }
    }

    None
}

fn resolve_relative(phrase: &str, today: NaiveDate) -> NaiveDate {
    match phrase {
        "today" => today,
        "tomorrow" => today + Duration::days(1),
        // End of the current week, Saturday being the last day.
        "this week" => {
            let remaining = 6 - today.weekday().num_days_from_sunday() as i64;
            today + Duration::days(remaining)
        }
        // "next week"
        _ => today + Duration::days(7),
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of the target weekday strictly after today; a
/// same-day mention advances a full week.
fn next_weekday(today: NaiveDate, target: Weekday) -> NaiveDate {
    let mut delta =
        target.number_from_monday() as i64 - today.weekday().number_from_monday() as i64;
    if delta <= 0 {
        delta += 7;
    }
    today + Duration::days(delta)
}
