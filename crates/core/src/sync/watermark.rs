//! Per activity-type "last change" watermark
//!
//! The watermark is the instant after the newest record confirmed by a fully
//! successful download. It is stored as `last_change_<activityType>` in the
//! credential store using the `YYYY-MM-DD hh:mm:ss` format.

use std::sync::Arc;

use alyante_domain::config::resolve_fallback_last_change;
use alyante_domain::constants::last_change_key;
use alyante_domain::utils::datetime::{format_storage, parse_storage};
use alyante_domain::{Result, WebserviceConfig};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument, warn};

use crate::auth::ports::CredentialStore;
use crate::clock::{Clock, SystemClock};

/// Reads and advances incremental-sync watermarks
pub struct WatermarkTracker {
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    fallback: Option<String>,
}

impl WatermarkTracker {
    /// `fallback` seeds the watermark when none is stored
    /// (`YYYY-MM-DD hh:mm:ss`); absent or unparsable means one month ago.
    pub fn new(store: Arc<dyn CredentialStore>, fallback: Option<String>) -> Self {
        Self { store, clock: Arc::new(SystemClock), fallback }
    }

    pub fn from_config(store: Arc<dyn CredentialStore>, config: &WebserviceConfig) -> Self {
        Self::new(store, config.fallback_last_change.clone())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Current watermark for `activity_type`, or the fallback instant.
    #[instrument(skip(self))]
    pub async fn get_last_change(&self, activity_type: &str) -> Result<DateTime<Utc>> {
        let key = last_change_key(activity_type);

        if let Some(record) = self.store.load(&key).await? {
            match parse_storage(&record.value) {
                Ok(at) => return Ok(at),
                Err(err) => warn!(error = %err, "Stored watermark unreadable, using fallback"),
            }
        }

        let fallback = resolve_fallback_last_change(self.fallback.as_deref(), self.clock.now());
        debug!(%fallback, "No watermark stored, using fallback");
        Ok(fallback)
    }

    /// Advance the watermark to `instant + 1s`.
    ///
    /// The stored value never moves backwards: when it is already ahead, it
    /// is kept and returned unchanged.
    #[instrument(skip(self))]
    pub async fn set_last_change(
        &self,
        activity_type: &str,
        instant: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let key = last_change_key(activity_type);
        let candidate = instant + Duration::seconds(1);

        let current = self.store.load(&key).await?.and_then(|r| parse_storage(&r.value).ok());
        if let Some(current) = current.filter(|current| *current > candidate) {
            warn!(%current, %candidate, "Refusing to move watermark backwards");
            return Ok(current);
        }

        self.store.save(&key, &format_storage(&candidate)).await?;
        info!(watermark = %candidate, "Watermark advanced");
        Ok(candidate)
    }
}
