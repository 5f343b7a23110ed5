//! Second phase of a deferred watermark update
//!
//! A downloader configured with `WatermarkCommit::Deferred` stages the newest
//! `lastChange` on the activity extras. This step, run later in the same
//! pipeline, moves the staged value into the credential store.

use std::sync::Arc;

use alyante_domain::constants::last_change_key;
use alyante_domain::utils::datetime::parse_wire;
use alyante_domain::{run_error_message, AlyanteError, OperationKind, Result};
use tracing::{error, info, instrument};

use super::ports::ActivityRepository;
use super::watermark::WatermarkTracker;

/// Commits a staged watermark for an activity
pub struct LastChangeCommitter {
    activities: Arc<dyn ActivityRepository>,
    watermarks: Arc<WatermarkTracker>,
    continue_on_error: bool,
    kind: OperationKind,
}

impl LastChangeCommitter {
    /// `kind` only affects log and error wording (download or upload
    /// pipeline).
    pub fn new(
        activities: Arc<dyn ActivityRepository>,
        watermarks: Arc<WatermarkTracker>,
        continue_on_error: bool,
        kind: OperationKind,
    ) -> Self {
        Self { activities, watermarks, continue_on_error, kind }
    }

    /// Commit the staged watermark, if any.
    ///
    /// Returns whether a watermark was written. Failures are logged; they
    /// abort only when `continue_on_error` is off.
    #[instrument(skip(self))]
    pub async fn execute(&self, activity_id: i64, step_type: &str) -> Result<bool> {
        info!(activity_id, step_type, kind = %self.kind, "START");

        let outcome = self.commit(activity_id).await;
        let committed = match outcome {
            Ok(committed) => committed,
            Err(err) => {
                let message = run_error_message(activity_id, self.kind, step_type, err.message());
                error!(activity_id, step_type, error = %message, "Watermark commit failed");
                if !self.continue_on_error {
                    return Err(err.map_message(|_| message));
                }
                false
            }
        };

        info!(activity_id, step_type, committed, "END");
        Ok(committed)
    }

    async fn commit(&self, activity_id: i64) -> Result<bool> {
        let activity = self.activities.get_by_id(activity_id).await?;
        let key = last_change_key(&activity.activity_type);

        let Some(staged) = activity.extra_str(&key).filter(|v| !v.is_empty()) else {
            return Ok(false);
        };
        let newest = parse_wire(staged).map_err(|err| {
            AlyanteError::InvalidInput(format!("Staged {key} unreadable: {}", err.message()))
        })?;

        self.watermarks.set_last_change(&activity.activity_type, newest).await?;
        Ok(true)
    }
}
