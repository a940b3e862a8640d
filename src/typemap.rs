use std::collections::HashMap;

use tracing::info;

use crate::client::TrackerClient;
use crate::errors::Result;
use crate::types::RelationshipType;

/// Display-name index over the instance's relationship type definitions,
/// built once per run and immutable afterwards.
pub struct RelationshipTypeMap {
    by_name: HashMap<String, i64>,
    default_id: i64,
}

impl RelationshipTypeMap {
    /// Indexes a set of relationship type definitions.
    pub fn new(types: Vec<RelationshipType>, default_id: i64) -> Self {
        let by_name = types.into_iter().map(|t| (t.name, t.id)).collect();
        RelationshipTypeMap {
            by_name,
            default_id,
        }
    }

    /// Fetches all relationship types from the remote service and indexes
    /// them. A failure here is fatal to the run; no relationship can be
    /// typed without the map.
    pub fn build<C: TrackerClient>(client: &C, default_id: i64) -> Result<Self> {
        let types = client.list_relationship_types()?;
        info!("loaded {} relationship types", types.len());
        Ok(Self::new(types, default_id))
    }

    /// Maps a display name to its type id, falling back to the default for
    /// absent or unrecognized names. Never fails.
    pub fn resolve(&self, name: Option<&str>) -> i64 {
        name.and_then(|n| self.by_name.get(n.trim()).copied())
            .unwrap_or(self.default_id)
    }

    pub fn default_id(&self) -> i64 {
        self.default_id
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
