//! Reformat a remote timestamp into the storage format
//!
//! `source` and `destination` are dotted paths whose first segment names an
//! entity type inside an identifier group, e.g. `order.header.date`. The
//! value at the source (`YYYY-MM-DDThh:mm:ssZ`) is rewritten as
//! `YYYY-MM-DD hh:mm:ss` under the destination's field path, inside the
//! source entity's data. The destination type only has to be present in the
//! group.

use std::sync::Arc;

use alyante_domain::utils::datetime::{format_storage, parse_wire};
use alyante_domain::utils::dot_path::{first_segment, resolve_scalar, rest_segments, set};
use alyante_domain::{
    run_error_message, AlyanteError, Entity, EntityGroup, OperationKind, Result, SyncSummary,
};
use serde_json::{Map, Value};
use tracing::{error, info, instrument};

use crate::sync::ports::EntityRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormatManipulator {
    source: String,
    destination: String,
    continue_on_error: bool,
}

impl DateFormatManipulator {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { source: source.into(), destination: destination.into(), continue_on_error: false }
    }

    pub fn with_continue_on_error(mut self, enabled: bool) -> Self {
        self.continue_on_error = enabled;
        self
    }

    /// Rewrite the source entity of one group in place.
    pub fn apply(&self, group: &mut EntityGroup) -> Result<()> {
        let (source_type, source_path) = split(&self.source, "source")?;
        let (destination_type, destination_path) = split(&self.destination, "destination")?;

        let source = group.by_type(source_type).ok_or_else(|| {
            AlyanteError::InvalidInput(format!("Invalid source entity type '{source_type}'"))
        })?;
        if group.by_type(destination_type).is_none() {
            return Err(AlyanteError::InvalidInput(format!(
                "Invalid destination entity type '{destination_type}'"
            )));
        }

        let mut data = manipulated_data(source)?;
        let raw = resolve_scalar(&data, source_path)?;
        let formatted = format_storage(&parse_wire(&raw)?);
        set(&mut data, destination_path, Value::String(formatted))?;

        let source = group.by_type_mut(source_type).ok_or_else(|| {
            AlyanteError::Internal(format!("Entity type '{source_type}' vanished"))
        })?;
        source.data_manipulated = Some(data.to_string());
        Ok(())
    }

    /// Apply to every identifier group of `activity_id` and save the
    /// rewritten entities.
    #[instrument(skip(self, entities))]
    pub async fn execute(
        &self,
        entities: &Arc<dyn EntityRepository>,
        activity_id: i64,
        manipulator_type: &str,
    ) -> Result<SyncSummary> {
        let source_type = first_segment(self.source.trim());
        let mut summary = SyncSummary::default();

        for mut group in entities.find_grouped_by_identifier(activity_id).await? {
            let outcome = match self.apply(&mut group) {
                Ok(()) => match group.by_type(source_type) {
                    Some(entity) => entities.save(entity).await.map(|_| ()),
                    None => Ok(()),
                },
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => summary.record_ok(),
                Err(err) => {
                    let message = run_error_message(
                        activity_id,
                        OperationKind::Manipulator,
                        manipulator_type,
                        &format!("identifier {}: {}", group.identifier, err.message()),
                    );
                    error!(activity_id, manipulator_type, error = %message, "Manipulation failed");
                    if !self.continue_on_error {
                        return Err(err.map_message(|_| message));
                    }
                    summary.record_ko();
                }
            }
        }

        info!(
            activity_id,
            manipulator_type,
            ok_count = summary.ok_count,
            ko_count = summary.ko_count,
            "Manipulation completed"
        );
        Ok(summary)
    }
}

fn split<'a>(path: &'a str, role: &str) -> Result<(&'a str, &'a str)> {
    let path = path.trim();
    let entity_type = first_segment(path);
    match rest_segments(path) {
        Some(rest) if !entity_type.is_empty() => Ok((entity_type, rest)),
        _ => Err(AlyanteError::InvalidInput(format!("Invalid {role} path '{path}'"))),
    }
}

fn manipulated_data(entity: &Entity) -> Result<Value> {
    match entity.data_manipulated.as_deref() {
        Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw).map_err(|e| {
            AlyanteError::InvalidInput(format!(
                "Invalid manipulated data for {} '{}': {e}",
                entity.entity_type, entity.identifier
            ))
        }),
        _ => Ok(Value::Object(Map::new())),
    }
}
