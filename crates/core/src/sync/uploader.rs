//! Entity group uploader
//!
//! Every identifier group of an activity becomes one request whose body is
//! the value found at the `source` dotted path over the group's manipulated
//! data. Only `201 Created` counts as success. Other statuses are counted
//! (or abort the run in strict mode); transport failures always abort.

use std::sync::Arc;
use std::time::Instant;

use alyante_domain::constants::{EXPORTED_EXTRA_KEY, RESPONSE_EXTRA_KEY};
use alyante_domain::utils::dot_path::{first_segment, resolve};
use alyante_domain::{
    run_error_message, AlyanteError, CallConfig, Entity, EntityGroup, OperationKind,
    ResourceParams, Result, SyncSummary,
};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use super::ports::EntityRepository;
use super::session::SyncSession;

const HTTP_CREATED: u16 = 201;

/// Static settings of one uploader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploaderSettings {
    pub resource_name: String,
    pub method: String,
    /// Dotted path over the group view; its first segment names the entity
    /// type that receives the outcome extras.
    pub source: String,
}

impl UploaderSettings {
    pub fn new(
        resource_name: impl Into<String>,
        method: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self { resource_name: resource_name.into(), method: method.into(), source: source.into() }
    }
}

/// Pushes locally prepared entities to the webservice
pub struct Uploader {
    settings: UploaderSettings,
    call: CallConfig,
    entities: Arc<dyn EntityRepository>,
}

impl Uploader {
    pub fn new(
        settings: UploaderSettings,
        call: CallConfig,
        entities: Arc<dyn EntityRepository>,
    ) -> Self {
        Self { settings, call, entities }
    }

    /// Upload every identifier group of `activity_id`.
    #[instrument(skip(self, session))]
    pub async fn execute(
        &self,
        session: &mut SyncSession,
        activity_id: i64,
        uploader_type: &str,
    ) -> Result<SyncSummary> {
        self.run(session, activity_id, uploader_type).await.map_err(|err| {
            let err = err.map_message(|cause| {
                run_error_message(activity_id, OperationKind::Uploader, uploader_type, cause)
            });
            error!(activity_id, uploader_type, error = %err, "Upload failed");
            err
        })
    }

    async fn run(
        &self,
        session: &mut SyncSession,
        activity_id: i64,
        uploader_type: &str,
    ) -> Result<SyncSummary> {
        let resource = ResourceParams::new(&self.settings.resource_name, &self.settings.method)?;
        if session.base_url().is_empty() {
            return Err(AlyanteError::Config("Missing webservice_url".into()));
        }
        if self.settings.source.trim().is_empty() {
            return Err(AlyanteError::Config("Missing source path".into()));
        }
        let url = format!("{}/{}", session.base_url(), resource.resource_name());
        let destination_type = first_segment(self.settings.source.trim());

        let groups = self.entities.find_grouped_by_identifier(activity_id).await?;
        let mut summary = SyncSummary::default();

        for group in groups {
            let body = self.body_for(&group)?;
            let mut target = group
                .by_type(destination_type)
                .cloned()
                .unwrap_or_else(|| Entity::new(activity_id, group.identifier.clone(), destination_type));

            info!(activity_id, uploader_type, identifier = %group.identifier, "Uploading entity");
            let started = Instant::now();
            let response = session.call(resource.method(), &url, Some(body)).await?;
            info!(
                activity_id,
                uploader_type,
                status = response.status,
                elapsed_secs = started.elapsed().as_secs(),
                "Upload call finished"
            );

            let created = response.status == HTTP_CREATED;
            target.add_extra([
                (EXPORTED_EXTRA_KEY.to_string(), json!(u8::from(created))),
                (RESPONSE_EXTRA_KEY.to_string(), Value::String(response.body.clone())),
            ]);
            self.entities.save(&target).await?;

            if !created && !self.call.continue_on_error {
                return Err(AlyanteError::Upload(format!(
                    "HTTP {} ~ httpBody:{}",
                    response.status, response.body
                )));
            }

            if created {
                summary.record_ok();
            } else {
                error!(
                    activity_id,
                    uploader_type,
                    status = response.status,
                    http_body = %response.body,
                    "KO ~ entity not accepted"
                );
                summary.record_ko();
            }
        }

        info!(
            activity_id,
            uploader_type,
            ok_count = summary.ok_count,
            ko_count = summary.ko_count,
            "Upload completed"
        );
        Ok(summary)
    }

    fn body_for(&self, group: &EntityGroup) -> Result<String> {
        let view = group.manipulated_view()?;
        let value = resolve(&view, self.settings.source.trim()).map_err(|err| {
            AlyanteError::Upload(format!("identifier {}: {err}", group.identifier))
        })?;
        Ok(value.to_string())
    }
}
