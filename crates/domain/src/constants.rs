//! Connector constants
//!
//! Credential store keys, vendor endpoints, wire formats and timing margins
//! shared by every crate in the workspace.

// Credential store keys
pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const EXPIRATION_TOKEN_KEY: &str = "expiration_token";
pub const LAST_CHANGE_KEY_PREFIX: &str = "last_change";

// Vendor endpoints (relative to the webservice base URL)
pub const LOGIN_ENDPOINT: &str = "/api/login";
pub const REFRESH_ENDPOINT: &str = "/oauth/access_token";
pub const VALIDATE_ENDPOINT: &str = "/api/validate";

// Date formats
/// Timestamp format used by the remote API payloads (`lastChange` etc.).
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Format of the `lastchange` query filter.
pub const FILTER_DATETIME_FORMAT: &str = "%Y%m%d%H%M%S";
/// Format used for values persisted in the credential store and for
/// reformatted dates written back into entities.
pub const STORAGE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// Token lifecycle
/// Tokens expiring within this margin are treated as already expired.
pub const TOKEN_EXPIRY_MARGIN_SECS: i64 = 120;
/// Lifetime assumed when the server's `expires_in` cannot be parsed.
pub const FALLBACK_EXPIRES_IN_SECS: i64 = 300;
/// Timeout applied to login/refresh/validate calls.
pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 30;
/// Timeout applied to bulk resource calls unless configured.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

// Entity extras written by the uploader
pub const EXPORTED_EXTRA_KEY: &str = "transporter_exported";
pub const RESPONSE_EXTRA_KEY: &str = "response";
/// Activity extra holding the externally supplied identifier for point
/// lookups.
pub const LOOKUP_IDENTIFIER_EXTRA_KEY: &str = "data";
pub const DEFAULT_LOOKUP_PARAM: &str = "codArt";

/// Record field carrying the per-record change timestamp.
pub const LAST_CHANGE_FIELD: &str = "lastChange";

/// Build the credential store key holding the watermark of an activity type.
pub fn last_change_key(activity_type: &str) -> String {
    format!("{LAST_CHANGE_KEY_PREFIX}_{activity_type}")
}
