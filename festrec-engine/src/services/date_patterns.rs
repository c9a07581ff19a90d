//! Free-text Date Patterns
//!
//! The fixed date formats recognized in page text, tried most specific first:
//! 1. Cross-month range: "March 28 – April 2, 2026", "Dec 30, 2026 - Jan 2, 2027"
//! 2. Same-month range: "October 3–5, 2026", "Oct 3 to 5 2026"
//! 3. Single date: "October 5, 2026", "Oct. 5th 2026"
//!
//! Month names may be full or abbreviated ("Sept" included). Range
//! separators: `-`, `–`, `—`, `to`, `through`, `thru`. Anything else is
//! "no candidate"; there is no natural-language date understanding here.

use crate::types::ExtractionMethod;
use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?";
const DAY: &str = r"(\d{1,2})(?:st|nd|rd|th)?";
const SEP: &str = r"\s*(?:-|–|—|to|through|thru)\s*";
const YEAR_SEP: &str = r"(?:,\s*|\s+)";

/// Groups: month1, day1, year1?, month2, day2, year2
static CROSS_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH}\s+{DAY}(?:{YEAR_SEP}(\d{{4}}))?{SEP}{MONTH}\s+{DAY}{YEAR_SEP}(\d{{4}})\b"
    ))
    .expect("cross-month pattern compiles")
});

/// Groups: month, day1, day2, year
static SAME_MONTH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)\b{MONTH}\s+{DAY}{SEP}{DAY}{YEAR_SEP}(\d{{4}})\b"
    ))
    .expect("same-month pattern compiles")
});

/// Groups: month, day, year
static SINGLE_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)\b{MONTH}\s+{DAY}{YEAR_SEP}(\d{{4}})\b"))
        .expect("single-date pattern compiles")
});

/// Dates recovered from free text, tagged with the pattern that matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateCandidate {
    pub start: NaiveDate,
    /// `None` for single-date matches
    pub end: Option<NaiveDate>,
    pub method: ExtractionMethod,
}

/// Extract the most specific recognizable date or date range from free text
///
/// Patterns are tried most specific first, each across the whole text. The
/// first calendar-valid match wins. A calendar-invalid match ("February 30,
/// 2026") is skipped whole: no less specific pattern may match inside its
/// span, so "Feb 30 – Mar 2, 2026" yields nothing rather than March 2.
pub fn extract_date_candidate(text: &str) -> Option<DateCandidate> {
    let patterns: [(&Regex, fn(&Captures) -> Option<DateCandidate>); 3] = [
        (&*CROSS_MONTH_RE, cross_month),
        (&*SAME_MONTH_RE, same_month),
        (&*SINGLE_DATE_RE, single_date),
    ];
    let mut rejected: Vec<Range<usize>> = Vec::new();

    for (pattern, build) in patterns {
        for caps in pattern.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            if rejected
                .iter()
                .any(|span| whole.start() < span.end && span.start < whole.end())
            {
                continue;
            }
            match build(&caps) {
                Some(candidate) => return Some(candidate),
                None => rejected.push(whole.range()),
            }
        }
    }
    None
}

/// Parse an ISO calendar date, tolerating a trailing time component
///
/// Accepts `2026-10-03`, `2026-10-03T19:00:00-05:00` and `2026-10-03 19:00`.
/// Returns `None` for anything that is not a real calendar date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = match value.char_indices().nth(10) {
        Some((idx, 'T')) | Some((idx, 't')) | Some((idx, ' ')) => &value[..idx],
        Some(_) => return None,
        None => value,
    };
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// Parse a date string as ISO first, then as free text
pub fn parse_date_text(value: &str) -> Option<DateCandidate> {
    if let Some(start) = parse_iso_date(value) {
        return Some(DateCandidate {
            start,
            end: None,
            method: ExtractionMethod::Unknown,
        });
    }
    extract_date_candidate(value)
}

fn cross_month(caps: &Captures) -> Option<DateCandidate> {
    let start_month = month_number(&caps[1])?;
    let start_day: u32 = caps[2].parse().ok()?;
    let end_month = month_number(&caps[4])?;
    let end_day: u32 = caps[5].parse().ok()?;
    let end_year: i32 = caps[6].parse().ok()?;

    // "Dec 30 – Jan 2, 2027": the start belongs to the previous year
    let start_year = match caps.get(3) {
        Some(year) => year.as_str().parse().ok()?,
        None if start_month > end_month => end_year - 1,
        None => end_year,
    };

    let start = NaiveDate::from_ymd_opt(start_year, start_month, start_day)?;
    let end = NaiveDate::from_ymd_opt(end_year, end_month, end_day)?;

    // "October 3 – October 5" is written like a cross-month range but is not one
    let method = if start.month() == end.month() && start.year() == end.year() {
        ExtractionMethod::SameMonthRange
    } else {
        ExtractionMethod::CrossMonthRange
    };

    Some(DateCandidate {
        start,
        end: Some(end),
        method,
    })
}

fn same_month(caps: &Captures) -> Option<DateCandidate> {
    let month = month_number(&caps[1])?;
    let start_day: u32 = caps[2].parse().ok()?;
    let end_day: u32 = caps[3].parse().ok()?;
    let year: i32 = caps[4].parse().ok()?;

    Some(DateCandidate {
        start: NaiveDate::from_ymd_opt(year, month, start_day)?,
        end: Some(NaiveDate::from_ymd_opt(year, month, end_day)?),
        method: ExtractionMethod::SameMonthRange,
    })
}

fn single_date(caps: &Captures) -> Option<DateCandidate> {
    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;

    Some(DateCandidate {
        start: NaiveDate::from_ymd_opt(year, month, day)?,
        end: None,
        method: ExtractionMethod::SingleDate,
    })
}

/// Month number from a (possibly abbreviated) English month name
fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect::<String>().to_ascii_lowercase();
    let month = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
