use tracing::warn;

use crate::client::TrackerClient;
use crate::resolver::ItemResolver;
use crate::typemap::RelationshipTypeMap;
use crate::types::{PreparedRelationship, RawRow, Resolution, Side};

/// Outcome of preparing one batch of rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareResult {
    pub prepared: Vec<PreparedRelationship>,
    /// Rows dropped because an endpoint was not resolvable.
    pub skipped: usize,
}

/// Resolves each row's endpoints and relationship type, producing
/// submission-ready records.
///
/// Resolution failures are row-scoped: the row is logged and skipped, and
/// the rest of the batch proceeds. Self-relationships are not filtered
/// here; the submitter applies its own policy.
pub fn prepare_rows<C: TrackerClient>(
    rows: &[RawRow],
    resolver: &mut ItemResolver<'_, C>,
    type_map: &RelationshipTypeMap,
) -> PrepareResult {
    let mut result = PrepareResult::default();

    for row in rows {
        let from_item = match resolve_endpoint(resolver, Side::Source, row, &row.source_value) {
            Some(id) => id,
            None => {
                result.skipped += 1;
                continue;
            }
        };
        let to_item = match resolve_endpoint(resolver, Side::Target, row, &row.target_value) {
            Some(id) => id,
            None => {
                result.skipped += 1;
                continue;
            }
        };

        let relationship_type = type_map.resolve(row.rel_type_value.as_deref());

        result.prepared.push(PreparedRelationship {
            from_item,
            to_item,
            relationship_type,
            row_number: row.row_number,
        });
    }

    result
}

/// Resolves one endpoint, turning every failure mode into a logged skip.
fn resolve_endpoint<C: TrackerClient>(
    resolver: &mut ItemResolver<'_, C>,
    side: Side,
    row: &RawRow,
    raw_value: &str,
) -> Option<i64> {
    match resolver.resolve(side, raw_value) {
        Ok(Resolution::Resolved(id)) => Some(id),
        Ok(Resolution::NotFound) => {
            warn!(
                "row {}: no item found for {} value '{}', skipping",
                row.row_number,
                side.as_str(),
                raw_value
            );
            None
        }
        Err(e) => {
            warn!(
                "row {}: could not resolve {} value '{}': {}",
                row.row_number,
                side.as_str(),
                raw_value,
                e
            );
            None
        }
    }
}
