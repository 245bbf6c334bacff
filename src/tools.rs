//! # Small helpers: wire timestamps and log truncation.
//!
//! Two fixed textual timestamp formats exist on the wire. The outer
//! envelope `Date` header uses the IMAP internal-date style
//! (`21-Feb-2019 07:43:24 +0100`), the CPIM inner `DateTime` header uses
//! RFC 3339 (`2019-02-21T07:43:24+01:00`). Both are round-trip sensitive
//! to whitespace and timezone offset formatting, so parsing and
//! serialization go through this module only.

use chrono::{DateTime, FixedOffset};

use crate::error::ParseError;

const IMAP_DATE_FORMAT: &str = "%d-%b-%Y %H:%M:%S %z";
const CPIM_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Parses an outer-envelope `Date` value.
pub fn parse_imap_date(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_str(value.trim(), IMAP_DATE_FORMAT)
        .map_err(|err| ParseError::MalformedEnvelope(format!("bad date {value:?}: {err}")))
}

/// Formats an outer-envelope `Date` value, e.g. `21-Feb-2019 07:43:24 +0100`.
pub fn format_imap_date(date: &DateTime<FixedOffset>) -> String {
    date.format(IMAP_DATE_FORMAT).to_string()
}

/// Parses a CPIM `DateTime` value (RFC 3339).
pub fn parse_cpim_date(value: &str) -> Result<DateTime<FixedOffset>, ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map_err(|err| ParseError::MalformedBody(format!("bad datetime {value:?}: {err}")))
}

/// Formats a CPIM `DateTime` value, e.g. `2019-02-21T07:43:24+01:00`.
pub fn format_cpim_date(date: &DateTime<FixedOffset>) -> String {
    date.format(CPIM_DATE_FORMAT).to_string()
}

/// Shortens `text` to at most `max` characters for diagnostics.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max).collect();
    format!("{cut}[...]")
}
