//! Sync run types: resource addressing, query parameters, run modes and
//! per-run counters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOOKUP_PARAM;
use crate::impl_wire_value_conversions;
use crate::utils::datetime::format_filter;
use crate::{AlyanteError, Result};

/* -------------------------------------------------------------------------- */
/* Resource addressing */
/* -------------------------------------------------------------------------- */

/// HTTP verbs accepted for bulk resource calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl_wire_value_conversions!(HttpMethod {
    Get => "GET",
    Post => "POST",
});

/// Remote resource plus the verb used to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceParams {
    resource_name: String,
    method: HttpMethod,
}

impl ResourceParams {
    /// Validate a resource name and method taken from configuration.
    ///
    /// Fails with [`AlyanteError::Config`] when either value is blank or the
    /// method is not `GET`/`POST`.
    pub fn new(resource_name: &str, method: &str) -> Result<Self> {
        let resource_name = resource_name.trim().trim_matches('/');
        if resource_name.is_empty() {
            return Err(AlyanteError::Config("Missing resource name".into()));
        }
        if method.trim().is_empty() {
            return Err(AlyanteError::Config("Missing method".into()));
        }
        let method = method
            .parse::<HttpMethod>()
            .map_err(|_| AlyanteError::Config(format!("Invalid method: {}", method.trim())))?;

        Ok(Self { resource_name: resource_name.to_string(), method })
    }

    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// `base/resource` followed by the rendered query string.
    pub fn url(&self, base_url: &str, query: &QueryParams) -> String {
        format!("{}/{}{}", base_url.trim_end_matches('/'), self.resource_name, query.render())
    }
}

/// Ordered query string parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Standard bulk-call parameters, in `max`, `sort`, `order`, `lastchange`
    /// order. Zero or blank values are omitted.
    pub fn bulk(
        bunch_size: u32,
        sort_field: &str,
        sort_order: &str,
        last_change: Option<DateTime<Utc>>,
    ) -> Self {
        let mut params = Self::default();
        if bunch_size > 0 {
            params.push("max", bunch_size.to_string());
        }
        if !sort_field.is_empty() {
            params.push("sort", sort_field);
        }
        if !sort_order.is_empty() {
            params.push("order", sort_order);
        }
        if let Some(at) = last_change {
            params.push("lastchange", format_filter(&at));
        }
        params
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// `?k=v&k2=v2`, or an empty string when there are no parameters.
    pub fn render(&self) -> String {
        if self.pairs.is_empty() {
            return String::new();
        }
        let joined: Vec<String> = self.pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("?{}", joined.join("&"))
    }
}

/* -------------------------------------------------------------------------- */
/* Run modes */
/* -------------------------------------------------------------------------- */

/// How a downloader selects records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SyncMode {
    /// Everything changed since the stored watermark.
    #[default]
    Incremental,
    /// A single record whose identifier comes from the activity extras,
    /// sent as `lookup_param`. No watermark filter is applied.
    PointLookup { lookup_param: String },
}

impl SyncMode {
    pub fn point_lookup() -> Self {
        Self::PointLookup { lookup_param: DEFAULT_LOOKUP_PARAM.to_string() }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Incremental => "incremental",
            Self::PointLookup { .. } => "point_lookup",
        }
    }
}

/// When an advanced watermark reaches the credential store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkCommit {
    /// Write straight to the credential store at the end of the run.
    #[default]
    Immediate,
    /// Stage on the activity extras; a later step commits it.
    Deferred,
}

/* -------------------------------------------------------------------------- */
/* Run outcome */
/* -------------------------------------------------------------------------- */

/// Per-run success/failure counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub ok_count: usize,
    pub ko_count: usize,
}

impl SyncSummary {
    pub fn record_ok(&mut self) {
        self.ok_count += 1;
    }

    pub fn record_ko(&mut self) {
        self.ko_count += 1;
    }

    pub fn total(&self) -> usize {
        self.ok_count + self.ko_count
    }

    /// At least one success and no failures.
    pub fn is_clean(&self) -> bool {
        self.ok_count > 0 && self.ko_count == 0
    }
}

/// Component kinds that appear in run error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Downloader,
    Uploader,
    Manipulator,
}

impl_wire_value_conversions!(OperationKind {
    Downloader => "Downloader",
    Uploader => "Uploader",
    Manipulator => "Manipulator",
});

/// Render a run failure as
/// `activityId:<id> ~ <Kind> ~ <kind>Type:<subtype> ~ ERROR ~ error:<message>`.
pub fn run_error_message(
    activity_id: i64,
    kind: OperationKind,
    subtype: &str,
    message: &str,
) -> String {
    let type_label = match kind {
        OperationKind::Downloader => "downloaderType",
        OperationKind::Uploader => "uploaderType",
        OperationKind::Manipulator => "manipulatorType",
    };
    format!("activityId:{activity_id} ~ {kind} ~ {type_label}:{subtype} ~ ERROR ~ error:{message}")
}
