//! Configuration management

use std::collections::HashMap;

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_AUTH_TIMEOUT_SECS, DEFAULT_CALL_TIMEOUT_SECS};
use crate::utils::datetime::parse_storage;

/// Connector configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub webservice: WebserviceConfig,
    #[serde(default)]
    pub call: CallConfig,
}

/// Local store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "alyante.db".to_string(), pool_size: default_pool_size() }
    }
}

/// Remote webservice configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebserviceConfig {
    pub url: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Ask the server for gzip-compressed responses.
    #[serde(default)]
    pub response_compressed: bool,
    /// Accept self-signed or otherwise invalid TLS certificates.
    #[serde(default)]
    pub insecure_certificate: bool,
    /// Watermark seed (`YYYY-MM-DD hh:mm:ss`) used when none is stored.
    #[serde(default)]
    pub fallback_last_change: Option<String>,
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_seconds: u64,
}

impl WebserviceConfig {
    /// Base URL without trailing slashes; empty when not configured.
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Configured fallback watermark, or one month before `now` when the
    /// value is absent or unparsable.
    pub fn fallback_last_change_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        resolve_fallback_last_change(self.fallback_last_change.as_deref(), now)
    }
}

/// Parse a configured watermark seed, defaulting to one month before `now`.
pub fn resolve_fallback_last_change(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    raw.and_then(|raw| parse_storage(raw).ok())
        .unwrap_or_else(|| now.checked_sub_months(Months::new(1)).unwrap_or(now))
}

/// Per-run call configuration (bulk downloads and uploads)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    /// Page size sent as `max`; zero omits the parameter.
    #[serde(default)]
    pub bunch_size: u32,
    #[serde(default = "default_call_timeout")]
    pub timeout_seconds: u64,
    /// Count and skip per-record failures instead of aborting the run.
    #[serde(default)]
    pub continue_on_error: bool,
    /// Sort settings keyed by resource name.
    #[serde(default)]
    pub sort: HashMap<String, SortConfig>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            bunch_size: 0,
            timeout_seconds: default_call_timeout(),
            continue_on_error: false,
            sort: HashMap::new(),
        }
    }
}

impl CallConfig {
    pub fn sort_field(&self, resource_name: &str) -> &str {
        self.sort.get(resource_name).map_or("", |s| s.field.as_str())
    }

    pub fn sort_order(&self, resource_name: &str) -> &str {
        self.sort.get(resource_name).map_or("", |s| s.order.as_str())
    }
}

/// Sort field/order for one resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortConfig {
    pub field: String,
    #[serde(default)]
    pub order: String,
}

const fn default_pool_size() -> u32 {
    4
}

const fn default_auth_timeout() -> u64 {
    DEFAULT_AUTH_TIMEOUT_SECS
}

const fn default_call_timeout() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}
