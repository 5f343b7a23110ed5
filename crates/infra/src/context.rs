//! Wiring of the connector's adapters and services
//!
//! [`ConnectorContext`] builds every port implementation from a [`Config`]
//! and hands out the run-scoped services (sessions, downloaders, uploaders).

use std::sync::Arc;
use std::time::Duration;

use alyante_core::{
    ActivityRepository, AuthApi, CredentialStore, DateFormatManipulator, Downloader,
    DownloaderSettings, EntityRepository, LastChangeCommitter, SyncSession, SyncTransport,
    TokenProvider, Uploader, UploaderSettings, WatermarkTracker,
};
use alyante_domain::{Activity, Config, OperationKind, Result};
use tracing::info;

use crate::database::{
    DbManager, SqliteActivityRepository, SqliteCredentialStore, SqliteEntityRepository,
};
use crate::integrations::teamsystem::{HttpAuthApi, ReqwestTransport};

/// Long-lived services shared by every run.
pub struct ConnectorContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub credentials: Arc<dyn CredentialStore>,
    pub entities: Arc<dyn EntityRepository>,
    pub activities: Arc<SqliteActivityRepository>,
    pub tokens: Arc<TokenProvider>,
    pub watermarks: Arc<WatermarkTracker>,
    transport: Arc<dyn SyncTransport>,
}

impl ConnectorContext {
    /// Open the local store, apply the schema and build the HTTP adapters.
    ///
    /// # Errors
    /// Database failures, or `AlyanteError::Config` when the webservice URL
    /// is missing or invalid.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);

        let credentials: Arc<dyn CredentialStore> =
            Arc::new(SqliteCredentialStore::new(Arc::clone(&db)));
        let entities: Arc<dyn EntityRepository> =
            Arc::new(SqliteEntityRepository::new(Arc::clone(&db)));
        let activities = Arc::new(SqliteActivityRepository::new(Arc::clone(&db)));

        let api: Arc<dyn AuthApi> = Arc::new(HttpAuthApi::new(&config.webservice)?);
        let transport: Arc<dyn SyncTransport> = Arc::new(ReqwestTransport::new(&config.webservice)?);

        let tokens =
            Arc::new(TokenProvider::from_config(api, Arc::clone(&credentials), &config.webservice));
        let watermarks =
            Arc::new(WatermarkTracker::from_config(Arc::clone(&credentials), &config.webservice));

        info!(
            db_path = %db.path().display(),
            webservice_url = config.webservice.base_url(),
            "Connector context initialised"
        );

        Ok(Self { config, db, credentials, entities, activities, tokens, watermarks, transport })
    }

    /// Register a new activity of `activity_type`.
    pub async fn create_activity(&self, activity_type: &str) -> Result<Activity> {
        self.activities.create(activity_type).await
    }

    /// Fresh authenticated session for one run.
    pub fn session(&self) -> SyncSession {
        SyncSession::new(
            Arc::clone(&self.tokens),
            Arc::clone(&self.transport),
            &self.config.webservice,
            Duration::from_secs(self.config.call.timeout_seconds),
        )
    }

    pub fn downloader(&self, settings: DownloaderSettings) -> Downloader {
        Downloader::new(
            settings,
            self.config.call.clone(),
            Arc::clone(&self.entities),
            self.activity_port(),
            Arc::clone(&self.watermarks),
        )
    }

    pub fn uploader(&self, settings: UploaderSettings) -> Uploader {
        Uploader::new(settings, self.config.call.clone(), Arc::clone(&self.entities))
    }

    /// Step committing a watermark staged by a deferred download.
    pub fn last_change_committer(&self, kind: OperationKind) -> LastChangeCommitter {
        LastChangeCommitter::new(
            self.activity_port(),
            Arc::clone(&self.watermarks),
            self.config.call.continue_on_error,
            kind,
        )
    }

    pub fn date_format_manipulator(
        &self,
        source: impl Into<String>,
        destination: impl Into<String>,
    ) -> DateFormatManipulator {
        DateFormatManipulator::new(source, destination)
            .with_continue_on_error(self.config.call.continue_on_error)
    }

    fn activity_port(&self) -> Arc<dyn ActivityRepository> {
        Arc::clone(&self.activities) as Arc<dyn ActivityRepository>
    }
}
