//! Pure text classifiers, one per axis.
//!
//! Every function takes and returns plain values so each heuristic can be
//! tested on its own. Keyword tables live in [`crate::keywords`].

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::keywords::{BULLET_GLYPHS, HIGH_PRIORITY, LOW_PRIORITY, OVERRIDE_TAG_PREFIX};
use crate::models::Priority;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4}-\d{2}-\d{2})\b").expect("valid ISO date pattern"));

static RELATIVE_DAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(today|tonight|tomorrow|tmrw|next week)\b")
        .expect("valid relative day pattern")
});

// Bare "sat"/"sun" are left out, they collide with ordinary words.
static WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thur|thu|friday|fri|saturday|sunday)\b",
    )
    .expect("valid weekday pattern")
});

static OVERRIDE_TAG: Lazy<Regex> = Lazy::new(|| {
    let pattern = format!(
        r"(?i){}\s*([a-z0-9][a-z0-9_.\-]*)",
        regex::escape(OVERRIDE_TAG_PREFIX)
    );
    Regex::new(&pattern).expect("valid override tag pattern")
});

/// Case-fold and trim.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Heading match rule shared by every section lookup: the normalized
/// heading contains the normalized target phrase.
pub fn heading_matches(heading: &str, target: &str) -> bool {
    let target = normalize(target);
    !target.is_empty() && normalize(heading).contains(&target)
}

/// True if `text` (case-folded) contains any of the lowercase `terms`.
pub fn contains_any(text: &str, terms: &[&str]) -> bool {
    let lower = text.to_lowercase();
    terms.iter().any(|t| lower.contains(t))
}

/// True if the trimmed text starts with a dash or bullet glyph.
pub fn starts_with_bullet(text: &str) -> bool {
    text.trim_start().starts_with(BULLET_GLYPHS)
}

/// Strip leading bullet glyphs and surrounding whitespace.
pub fn strip_bullet(text: &str) -> &str {
    text.trim_start()
        .trim_start_matches(|c: char| BULLET_GLYPHS.contains(&c) || c.is_whitespace())
        .trim_end()
}

/// Priority from keyword phrases; high wins over low, default medium.
pub fn priority_from_text(text: &str) -> Priority {
    if contains_any(text, HIGH_PRIORITY) {
        Priority::High
    } else if contains_any(text, LOW_PRIORITY) {
        Priority::Low
    } else {
        Priority::Medium
    }
}

/// Resolve a due date mentioned in free text relative to `today`.
///
/// ISO dates win, then today/tomorrow/next week, then weekday names. A
/// weekday means its next occurrence strictly after `today`.
pub fn resolve_due(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(cap) = ISO_DATE.captures(text) {
        if let Ok(date) = NaiveDate::parse_from_str(&cap[1], "%Y-%m-%d") {
            return Some(date);
        }
    }

    if let Some(cap) = RELATIVE_DAY.captures(text) {
        let offset = match cap[1].to_lowercase().as_str() {
            "today" | "tonight" => 0,
            "tomorrow" | "tmrw" => 1,
            _ => 7,
        };
        return Some(today + Duration::days(offset));
    }

    let cap = WEEKDAY.captures(text)?;
    let weekday = parse_weekday(&cap[1])?;
    Some(upcoming(today, weekday))
}

/// Next occurrence of `weekday` strictly after `today`.
pub fn upcoming(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = today.weekday().num_days_from_monday() as i64;
    let target = weekday.num_days_from_monday() as i64;
    let mut diff = (target - current).rem_euclid(7);
    if diff == 0 {
        diff = 7;
    }
    today + Duration::days(diff)
}

fn parse_weekday(word: &str) -> Option<Weekday> {
    match word.to_lowercase().as_str() {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tues" | "tue" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thurs" | "thur" | "thu" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

/// The lowercase token of the first `#proj:<token>` tag in `text`.
pub fn extract_override_token(text: &str) -> Option<String> {
    OVERRIDE_TAG
        .captures(text)
        .map(|cap| cap[1].trim_end_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
}
