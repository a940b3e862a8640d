use std::collections::HashMap;

use tracing::{debug, warn};

use crate::client::TrackerClient;
use crate::config::ImportConfig;
use crate::errors::{ImportError, Result};
use crate::types::{MatchStrategy, Resolution, SearchQuery, Side};

/// Maps raw cell values to internal item ids, memoizing remote lookups for
/// the duration of one run.
///
/// Each side keeps its own cache. When the source and target project scopes
/// are set-equal the two sides search the same candidate universe, so a
/// single cache serves both; scopes that merely overlap stay separate.
pub struct ItemResolver<'a, C: TrackerClient> {
    client: &'a C,
    strategy: MatchStrategy,
    source_field: String,
    target_field: String,
    source_projects: Vec<i64>,
    target_projects: Vec<i64>,
    /// Cached outcomes per raw value; `None` records a lookup that found
    /// nothing, so a bad value fails at most one remote call per run.
    source_cache: HashMap<String, Option<i64>>,
    target_cache: HashMap<String, Option<i64>>,
    unified: bool,
}

impl<'a, C: TrackerClient> ItemResolver<'a, C> {
    pub fn new(client: &'a C, import: &ImportConfig) -> Self {
        // Unification is only sound when both sides search the same
        // universe: same project scope and, for custom fields, the same
        // field name.
        let unified = set_equal(&import.source_projects, &import.target_projects)
            && (import.strategy != MatchStrategy::CustomField
                || import.source_custom_field == import.target_custom_field);
        ItemResolver {
            client,
            strategy: import.strategy,
            source_field: import.source_custom_field.clone().unwrap_or_default(),
            target_field: import.target_custom_field.clone().unwrap_or_default(),
            source_projects: import.source_projects.clone(),
            target_projects: import.target_projects.clone(),
            source_cache: HashMap::new(),
            target_cache: HashMap::new(),
            unified,
        }
    }

    /// Resolves one raw identifier to an internal item id.
    ///
    /// On a cache miss exactly one remote search is issued. Zero candidates
    /// cache and return `NotFound`; one candidate caches and returns its id;
    /// more than one is an `AmbiguousMatch` error.
    pub fn resolve(&mut self, side: Side, raw_value: &str) -> Result<Resolution> {
        if self.strategy == MatchStrategy::DirectId {
            return Ok(self.parse_direct(raw_value));
        }

        if let Some(cached) = self.cache(side).get(raw_value) {
            return Ok(to_resolution(*cached));
        }

        let query = match self.strategy {
            MatchStrategy::DirectId => unreachable!("handled above"),
            MatchStrategy::DocumentKey => SearchQuery::by_document_key(raw_value),
            MatchStrategy::CustomField => SearchQuery::by_custom_field(
                self.field_name(side),
                raw_value,
                self.projects(side),
            ),
        };

        debug!(
            "looking up '{}' by {} ({})",
            raw_value,
            self.field_name(side),
            side.as_str()
        );
        let items = self
            .client
            .search(&query)
            .map_err(|e| ImportError::Lookup {
                field: self.field_name(side).to_string(),
                value: raw_value.to_string(),
                message: e.to_string(),
            })?;

        match items.len() {
            0 => {
                self.cache_mut(side).insert(raw_value.to_string(), None);
                Ok(Resolution::NotFound)
            }
            1 => {
                let id = items[0].id;
                self.cache_mut(side).insert(raw_value.to_string(), Some(id));
                Ok(Resolution::Resolved(id))
            }
            count => Err(ImportError::AmbiguousMatch {
                field: self.field_name(side).to_string(),
                value: raw_value.to_string(),
                count,
            }),
        }
    }

    /// Direct-id strategy: the cell already holds the internal id. A cell
    /// that does not parse as an integer is unresolvable, not fatal.
    fn parse_direct(&self, raw_value: &str) -> Resolution {
        match raw_value.trim().parse::<i64>() {
            Ok(id) => Resolution::Resolved(id),
            Err(_) => {
                warn!("'{}' is not a numeric item id", raw_value);
                Resolution::NotFound
            }
        }
    }

    /// Field name used in queries and diagnostics for the given side.
    fn field_name(&self, side: Side) -> &str {
        match self.strategy {
            MatchStrategy::DirectId => "id",
            MatchStrategy::DocumentKey => "documentKey",
            MatchStrategy::CustomField => match side {
                Side::Source => &self.source_field,
                Side::Target => &self.target_field,
            },
        }
    }

    fn projects(&self, side: Side) -> &[i64] {
        match side {
            Side::Source => &self.source_projects,
            Side::Target => &self.target_projects,
        }
    }

    fn cache(&self, side: Side) -> &HashMap<String, Option<i64>> {
        match side {
            Side::Target if !self.unified => &self.target_cache,
            _ => &self.source_cache,
        }
    }

    fn cache_mut(&mut self, side: Side) -> &mut HashMap<String, Option<i64>> {
        match side {
            Side::Target if !self.unified => &mut self.target_cache,
            _ => &mut self.source_cache,
        }
    }
}

fn to_resolution(cached: Option<i64>) -> Resolution {
    match cached {
        Some(id) => Resolution::Resolved(id),
        None => Resolution::NotFound,
    }
}

/// Order-insensitive set equality of two project scopes.
fn set_equal(a: &[i64], b: &[i64]) -> bool {
    let mut a: Vec<i64> = a.to_vec();
    let mut b: Vec<i64> = b.to_vec();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    a == b
}
