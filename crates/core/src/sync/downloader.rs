//! Resource collection downloader
//!
//! One `execute` call performs one remote request, stores every returned
//! record as an entity and, for incremental runs that finished without a
//! single record failure, advances the watermark of the activity type.

use std::sync::Arc;
use std::time::Instant;

use alyante_domain::constants::{last_change_key, LAST_CHANGE_FIELD, LOOKUP_IDENTIFIER_EXTRA_KEY};
use alyante_domain::utils::datetime::{format_wire, parse_wire};
use alyante_domain::utils::dot_path::{resolve_scalar, PathError};
use alyante_domain::{
    run_error_message, Activity, AlyanteError, CallConfig, Entity, OperationKind, QueryParams,
    ResourceParams, Result, SyncMode, SyncSummary, WatermarkCommit,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{error, info, instrument};

use super::ports::{ActivityRepository, EntityRepository};
use super::session::SyncSession;
use super::watermark::WatermarkTracker;

const HTTP_OK: u16 = 200;

/// Static settings of one downloader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloaderSettings {
    pub resource_name: String,
    pub method: String,
    /// Dotted paths concatenated, in order, into the entity identifier.
    pub identifiers: Vec<String>,
    pub mode: SyncMode,
    /// Skip both the `lastchange` filter and the watermark update.
    pub ignore_last_change: bool,
    pub watermark_commit: WatermarkCommit,
}

impl DownloaderSettings {
    pub fn incremental(
        resource_name: impl Into<String>,
        method: impl Into<String>,
        identifiers: Vec<String>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            method: method.into(),
            identifiers,
            mode: SyncMode::Incremental,
            ignore_last_change: false,
            watermark_commit: WatermarkCommit::Immediate,
        }
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn ignoring_last_change(mut self) -> Self {
        self.ignore_last_change = true;
        self
    }

    pub fn with_watermark_commit(mut self, commit: WatermarkCommit) -> Self {
        self.watermark_commit = commit;
        self
    }

    fn tracks_watermark(&self) -> bool {
        matches!(self.mode, SyncMode::Incremental) && !self.ignore_last_change
    }
}

/// Downloads a resource collection into entities
pub struct Downloader {
    settings: DownloaderSettings,
    call: CallConfig,
    entities: Arc<dyn EntityRepository>,
    activities: Arc<dyn ActivityRepository>,
    watermarks: Arc<WatermarkTracker>,
}

impl Downloader {
    pub fn new(
        settings: DownloaderSettings,
        call: CallConfig,
        entities: Arc<dyn EntityRepository>,
        activities: Arc<dyn ActivityRepository>,
        watermarks: Arc<WatermarkTracker>,
    ) -> Self {
        Self { settings, call, entities, activities, watermarks }
    }

    /// Run the download for `activity_id`; stored entities get
    /// `downloader_type` as their type.
    ///
    /// # Errors
    /// Configuration problems, non-200 answers, transport failures and, unless
    /// `continue_on_error` is set, the first record failure abort the run.
    /// The message carries activity id, downloader type and root cause.
    #[instrument(skip(self, session), fields(mode = self.settings.mode.label()))]
    pub async fn execute(
        &self,
        session: &mut SyncSession,
        activity_id: i64,
        downloader_type: &str,
    ) -> Result<SyncSummary> {
        self.run(session, activity_id, downloader_type).await.map_err(|err| {
            let err = err.map_message(|cause| {
                run_error_message(activity_id, OperationKind::Downloader, downloader_type, cause)
            });
            error!(activity_id, downloader_type, error = %err, "Download failed");
            err
        })
    }

    async fn run(
        &self,
        session: &mut SyncSession,
        activity_id: i64,
        downloader_type: &str,
    ) -> Result<SyncSummary> {
        let mut activity = self.activities.get_by_id(activity_id).await?;

        if session.base_url().is_empty() {
            return Err(AlyanteError::Config("Missing webservice_url".into()));
        }
        let resource = ResourceParams::new(&self.settings.resource_name, &self.settings.method)?;
        if self.settings.identifiers.iter().all(|path| path.trim().is_empty()) {
            return Err(AlyanteError::Config("Missing identifier paths".into()));
        }
        let query = self.query_params(&activity, resource.resource_name()).await?;
        let url = resource.url(session.base_url(), &query);

        info!(activity_id, downloader_type, method = %resource.method(), %url, "Calling webservice");
        let started = Instant::now();
        let response = session.call(resource.method(), &url, None).await?;
        info!(
            activity_id,
            downloader_type,
            elapsed_secs = started.elapsed().as_secs(),
            "Webservice call finished"
        );

        if response.status != HTTP_OK {
            return Err(AlyanteError::Download(format!(
                "HTTP {} ~ httpBody:{}",
                response.status, response.body
            )));
        }
        let rows = parse_rows(&response.body)?;

        let mut summary = SyncSummary::default();
        let mut newest: Option<DateTime<Utc>> = None;

        for row in &rows {
            match self.store_record(row, activity_id, downloader_type, &mut newest).await {
                Ok(()) => summary.record_ok(),
                Err(err) if self.call.continue_on_error => {
                    error!(
                        activity_id,
                        downloader_type,
                        error = %err,
                        "KO ~ record skipped"
                    );
                    summary.record_ko();
                }
                Err(err) => return Err(err),
            }
        }

        if self.settings.tracks_watermark() && summary.is_clean() {
            if let Some(newest) = newest {
                self.commit_watermark(&mut activity, newest).await?;
            }
        }

        info!(
            activity_id,
            downloader_type,
            ok_count = summary.ok_count,
            ko_count = summary.ko_count,
            "Download completed"
        );
        Ok(summary)
    }

    async fn query_params(&self, activity: &Activity, resource_name: &str) -> Result<QueryParams> {
        let sort_field = self.call.sort_field(resource_name);
        let sort_order = self.call.sort_order(resource_name);

        let query = match &self.settings.mode {
            SyncMode::Incremental => {
                let last_change = if self.settings.ignore_last_change {
                    None
                } else {
                    Some(self.watermarks.get_last_change(&activity.activity_type).await?)
                };
                QueryParams::bulk(self.call.bunch_size, sort_field, sort_order, last_change)
            }
            SyncMode::PointLookup { lookup_param } => {
                let identifier = activity
                    .extra_str(LOOKUP_IDENTIFIER_EXTRA_KEY)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| AlyanteError::Config("Missing lookup identifier".into()))?;
                let mut query = QueryParams::bulk(self.call.bunch_size, sort_field, sort_order, None);
                query.push(lookup_param.as_str(), identifier);
                query
            }
        };

        if query.is_empty() {
            return Err(AlyanteError::Config("Missing url params".into()));
        }
        Ok(query)
    }

    async fn store_record(
        &self,
        row: &Value,
        activity_id: i64,
        downloader_type: &str,
        newest: &mut Option<DateTime<Utc>>,
    ) -> Result<()> {
        let data_original = row.to_string();

        let last_change = match row.get(LAST_CHANGE_FIELD) {
            Some(Value::String(raw)) => parse_wire(raw).map_err(|err| {
                AlyanteError::Download(format!(
                    "Invalid lastChange value: {} ~ dataOriginal: {data_original}",
                    err.message()
                ))
            })?,
            Some(Value::Null) | None => {
                return Err(AlyanteError::Download(format!(
                    "Missing lastChange value ~ dataOriginal: {data_original}"
                )))
            }
            Some(other) => {
                return Err(AlyanteError::Download(format!(
                    "Invalid lastChange value: {other} ~ dataOriginal: {data_original}"
                )))
            }
        };
        if newest.map_or(true, |current| last_change > current) {
            *newest = Some(last_change);
        }

        let identifier = self.identifier_of(row).map_err(|err| {
            AlyanteError::Download(format!(
                "Invalid identifier path: {err} ~ dataOriginal: {data_original}"
            ))
        })?;

        let mut entity = self
            .entities
            .find_by_activity_identifier_type(activity_id, &identifier, downloader_type)
            .await?
            .unwrap_or_else(|| Entity::new(activity_id, identifier, downloader_type));
        entity.data_original = Some(data_original);

        self.entities.save(&entity).await?;
        Ok(())
    }

    fn identifier_of(&self, row: &Value) -> std::result::Result<String, PathError> {
        let mut identifier = String::new();
        for path in self.settings.identifiers.iter().filter(|p| !p.trim().is_empty()) {
            identifier.push_str(&resolve_scalar(row, path.trim())?);
        }
        Ok(identifier)
    }

    async fn commit_watermark(&self, activity: &mut Activity, newest: DateTime<Utc>) -> Result<()> {
        match self.settings.watermark_commit {
            WatermarkCommit::Immediate => {
                self.watermarks.set_last_change(&activity.activity_type, newest).await?;
            }
            WatermarkCommit::Deferred => {
                let key = last_change_key(&activity.activity_type);
                activity.add_extra([(key, Value::String(format_wire(&newest)))]);
                self.activities.save(activity).await?;
                info!(activity_id = activity.id, staged = %newest, "Watermark staged on activity");
            }
        }
        Ok(())
    }
}

/// Records of a response body: array items, or the values of a top-level
/// object.
fn parse_rows(body: &str) -> Result<Vec<Value>> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|err| AlyanteError::Download(format!("Invalid JSON response: {err}")))?;

    match payload {
        Value::Array(rows) => Ok(rows),
        Value::Object(map) => Ok(map.into_iter().map(|(_, row)| row).collect()),
        other => Err(AlyanteError::Download(format!("Unexpected response payload: {other}"))),
    }
}
