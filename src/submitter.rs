use tracing::{debug, error, info};

use crate::client::TrackerClient;
use crate::errors::ImportError;
use crate::types::{PreparedRelationship, SubmitResult};

/// Submits prepared relationships one at a time, in input order.
///
/// Each entry succeeds or fails on its own; no failure halts the batch.
/// Self-relationships are dropped without being counted as failures, and a
/// duplicate reported by the service is treated as already satisfied.
pub fn submit_all<C: TrackerClient>(
    client: &C,
    prepared: &[PreparedRelationship],
) -> SubmitResult {
    let mut result = SubmitResult::default();

    for rel in prepared {
        if rel.from_item == rel.to_item {
            debug!(
                "row {}: relationship from item {} to itself, skipping",
                rel.row_number, rel.from_item
            );
            result.skipped_self += 1;
            continue;
        }

        match client.create_relationship(rel.from_item, rel.to_item, rel.relationship_type) {
            Ok(id) => {
                info!(
                    "row {}: created relationship {} ({} -> {}, type {})",
                    rel.row_number, id, rel.from_item, rel.to_item, rel.relationship_type
                );
                result.posted += 1;
            }
            Err(ImportError::Duplicate { from_item, to_item }) => {
                info!(
                    "row {}: relationship {} -> {} already exists, skipping",
                    rel.row_number, from_item, to_item
                );
                result.skipped_duplicate += 1;
            }
            Err(e) => {
                error!(
                    "row {}: failed to create relationship {} -> {} (type {}): {}",
                    rel.row_number, rel.from_item, rel.to_item, rel.relationship_type, e
                );
                result.failed += 1;
            }
        }
    }

    result
}
