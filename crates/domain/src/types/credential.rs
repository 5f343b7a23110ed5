//! Credential store records and the token state derived from them

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    ACCESS_TOKEN_KEY, EXPIRATION_TOKEN_KEY, FALLBACK_EXPIRES_IN_SECS, REFRESH_TOKEN_KEY,
};
use crate::{AlyanteError, Result};

/// One keyed value in the credential store.
///
/// At most one record exists per key; values are always strings, so
/// timestamps and tokens are serialized before being stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// Create a fresh record stamped with the current time.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        let now = Utc::now();
        Self { key: key.into(), value: value.into(), created_at: now, updated_at: now }
    }

    /// Overwrite the value, keeping the creation timestamp.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self.updated_at = Utc::now();
        self
    }
}

/// Access/refresh token pair with its absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    /// Build the token state from a login or refresh response body.
    ///
    /// `access_token`, `refresh_token` and `expires_in` must all be present.
    /// An `expires_in` that is not a non-negative integer (number or numeric
    /// string), or that lands past the representable range, falls back to
    /// five minutes.
    pub fn from_response(response: &Value, now: DateTime<Utc>) -> Result<Self> {
        let access_token = required_string(response, ACCESS_TOKEN_KEY)?;
        let refresh_token = required_string(response, REFRESH_TOKEN_KEY)?;
        let expires_in = response.get("expires_in").ok_or_else(|| missing("expires_in", response))?;

        let expires_at = parse_expires_in(expires_in)
            .and_then(Duration::try_seconds)
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or_else(|| now + Duration::seconds(FALLBACK_EXPIRES_IN_SECS));

        Ok(Self { access_token, refresh_token, expires_at })
    }

    /// Whether the token must be renewed, applying the safety `margin`.
    pub fn is_expired_at(expires_at: DateTime<Utc>, now: DateTime<Utc>, margin: Duration) -> bool {
        now - margin > expires_at
    }

    /// Serialized `(key, value)` triple as persisted in the credential store.
    pub fn to_records(&self) -> [(&'static str, String); 3] {
        [
            (ACCESS_TOKEN_KEY, self.access_token.clone()),
            (REFRESH_TOKEN_KEY, self.refresh_token.clone()),
            (EXPIRATION_TOKEN_KEY, self.expires_at.timestamp().to_string()),
        ]
    }
}

/// Parse the persisted `expiration_token` value (unix seconds).
pub fn parse_expiration(value: &str) -> Option<DateTime<Utc>> {
    value.trim().parse::<i64>().ok().and_then(|secs| DateTime::from_timestamp(secs, 0))
}

fn parse_expires_in(value: &Value) -> Option<i64> {
    let seconds = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (seconds >= 0).then_some(seconds)
}

fn required_string(response: &Value, field: &str) -> Result<String> {
    match response.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(missing(field, response)),
        Some(other) => Ok(other.to_string()),
    }
}

fn missing(field: &str, response: &Value) -> AlyanteError {
    AlyanteError::Auth(format!(
        "Missing {field} param from webservice response ~ response:{response}"
    ))
}
