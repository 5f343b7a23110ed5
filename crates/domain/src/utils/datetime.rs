//! Fixed, locale-independent timestamp formats.
//!
//! All instants are handled in UTC. The remote API sends and expects naive
//! timestamps which are interpreted as UTC on the way in.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::constants::{FILTER_DATETIME_FORMAT, STORAGE_DATETIME_FORMAT, WIRE_DATETIME_FORMAT};
use crate::{AlyanteError, Result};

/// Parse a remote payload timestamp (`YYYY-MM-DDThh:mm:ssZ`).
pub fn parse_wire(value: &str) -> Result<DateTime<Utc>> {
    parse_with(value, WIRE_DATETIME_FORMAT)
}

/// Render an instant in the remote payload format.
pub fn format_wire(instant: &DateTime<Utc>) -> String {
    instant.format(WIRE_DATETIME_FORMAT).to_string()
}

/// Render an instant as the `lastchange` query filter (`YYYYMMDDhhmmss`).
pub fn format_filter(instant: &DateTime<Utc>) -> String {
    instant.format(FILTER_DATETIME_FORMAT).to_string()
}

/// Parse a value persisted by the credential store (`YYYY-MM-DD hh:mm:ss`).
pub fn parse_storage(value: &str) -> Result<DateTime<Utc>> {
    parse_with(value, STORAGE_DATETIME_FORMAT)
}

/// Render an instant in the persisted format.
pub fn format_storage(instant: &DateTime<Utc>) -> String {
    instant.format(STORAGE_DATETIME_FORMAT).to_string()
}

fn parse_with(value: &str, format: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), format).map(|naive| naive.and_utc()).map_err(|e| {
        AlyanteError::InvalidInput(format!(
            "Invalid datetime '{value}' for format '{format}': {e}"
        ))
    })
}
