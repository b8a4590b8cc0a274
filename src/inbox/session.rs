//! Section headers of a monthly log.
//!
//! A log is split into sections, each opened by a `## [YYYY-MM-DD HH:MM]`
//! header. A new section starts when the file has no header yet, when the
//! calendar date changed, or when more than the session gap has elapsed since
//! the last header.

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const HEADER_FORMAT: &str = "%Y-%m-%d %H:%M";

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^##\s*\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2})\]").unwrap());

/// Header line (without surrounding newlines) for a section opened at `at`.
/// Seconds are dropped; headers are stored at minute precision.
pub fn header_line(at: &NaiveDateTime) -> String {
    format!("## [{}]", at.format(HEADER_FORMAT))
}

/// Timestamp of the last header in `content`.
///
/// Only the last matching line counts: if its timestamp is not a valid
/// date/time there is no usable header, and earlier headers are not consulted.
pub fn parse_last_header(content: &str) -> Option<NaiveDateTime> {
    for line in content.lines().rev() {
        let Some(caps) = HEADER_RE.captures(line.trim()) else {
            continue;
        };
        return NaiveDateTime::parse_from_str(&caps[1], HEADER_FORMAT).ok();
    }
    None
}

/// Last header of the log at `path`. Missing or unreadable files have none.
pub fn find_last_header(path: &Path) -> Option<NaiveDateTime> {
    let content = fs::read_to_string(path).ok()?;
    parse_last_header(&content)
}

pub fn should_start_new_section(
    now: &NaiveDateTime,
    last_header: Option<&NaiveDateTime>,
    gap_hours: i64,
) -> bool {
    let Some(last) = last_header else {
        return true;
    };
    if now.date() != last.date() {
        return true;
    }
    // An out-of-range gap can never be exceeded.
    Duration::try_hours(gap_hours).is_some_and(|gap| *now - *last > gap)
}
