//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, NaiveDate, Utc};
use crate::utils::errors::{RunRaceError, Result};

/// Date formats accepted from admins, tried in order
const INPUT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format an event date for display, e.g. "Sun, 12 Oct 2025"
pub fn format_event_date(date: NaiveDate) -> String {
    date.format("%a, %d %b %Y").to_string()
}

/// Parse an event date typed by an admin
pub fn parse_event_date(input: &str) -> Result<NaiveDate> {
    let input = input.trim();
    INPUT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
        .ok_or_else(|| RunRaceError::InvalidInput(format!("Unrecognized date: {}", input)))
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Escape text for Telegram MarkdownV2
pub fn escape_markdown(text: &str) -> String {
    const SPECIAL: &[char] = &[
        '\\', '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
    ];

    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Trim a required text field, rejecting blanks
pub fn required_text(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RunRaceError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Blank means no URL; anything else must parse
pub fn optional_url(value: Option<String>) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(raw) => {
            url::Url::parse(&raw)?;
            Ok(Some(raw))
        }
        None => Ok(None),
    }
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
