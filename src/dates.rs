//! Capture-date resolution.
//!
//! Every ingested file gets exactly one capture timestamp, picked by a cascade
//! evaluated first-hit-wins: the metadata capture date, then a date embedded in
//! the filename, then the filesystem modification time.

use chrono::{DateTime, Local, NaiveDateTime};
use std::time::SystemTime;

/// Filename-embedded date convention, e.g. `2023-08-15_143000`.
const FILENAME_DATE_FORMAT: &str = "%Y-%m-%d_%H%M%S";
const FILENAME_DATE_LEN: usize = 17;

/// Resolve the authoritative capture date for a file.
pub fn resolve(
    metadata_date: Option<NaiveDateTime>,
    clean_name: &str,
    modified: SystemTime,
) -> NaiveDateTime {
    metadata_date
        .or_else(|| from_filename(clean_name))
        .unwrap_or_else(|| from_system_time(modified))
}

/// Find a `YYYY-MM-DD_HHMMSS` substring anywhere in the name and parse it as a
/// real calendar date. Impossible dates (February 30th) are rejected by the
/// parser and fall through to the next candidate.
pub fn from_filename(name: &str) -> Option<NaiveDateTime> {
    let bytes = name.as_bytes();
    if bytes.len() < FILENAME_DATE_LEN {
        return None;
    }
    for start in 0..=bytes.len() - FILENAME_DATE_LEN {
        let window = &bytes[start..start + FILENAME_DATE_LEN];
        let Ok(text) = std::str::from_utf8(window) else {
            continue;
        };
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, FILENAME_DATE_FORMAT) {
            return Some(parsed);
        }
    }
    None
}

fn from_system_time(time: SystemTime) -> NaiveDateTime {
    DateTime::<Local>::from(time).naive_local()
}
