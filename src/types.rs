use serde::{Deserialize, Serialize};

/// Strategy used to turn a raw cell value into an internal item id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// The cell already contains the internal API id.
    #[default]
    DirectId,
    /// The cell contains the item's unique document key.
    DocumentKey,
    /// The cell contains the value of a named custom field.
    CustomField,
}

impl MatchStrategy {
    /// Returns the string representation of this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStrategy::DirectId => "direct-id",
            MatchStrategy::DocumentKey => "document-key",
            MatchStrategy::CustomField => "custom-field",
        }
    }
}

/// Which endpoint of a relationship a value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Target => "target",
        }
    }
}

/// One normalized input row, produced by the loader in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Zero-based ordinal position in the file, for diagnostics only.
    pub row_number: usize,
    pub source_value: String,
    pub target_value: String,
    /// `None` when the file carries no relationship-type column, or the
    /// cell was empty.
    pub rel_type_value: Option<String>,
}

/// Outcome of resolving one raw identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Resolved(i64),
    NotFound,
}

/// A relationship ready for submission: both endpoints and the type are
/// internal ids, never raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRelationship {
    pub from_item: i64,
    pub to_item: i64,
    pub relationship_type: i64,
    /// Row the relationship came from, carried for log lines.
    pub row_number: usize,
}

/// A remote item reference as returned by a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: i64,
    #[serde(default, rename = "documentKey")]
    pub document_key: Option<String>,
}

/// A relationship type definition from the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipType {
    pub id: i64,
    pub name: String,
}

/// Query against the remote item store. The filter is built by the
/// resolver; the client maps it onto whatever wire parameters the service
/// expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Exact-match document key lookup, unscoped.
    pub document_key: Option<String>,
    /// Lucene-style `field:"value"` text filter.
    pub contains: Option<String>,
    /// Projects to restrict the search to; empty means all projects.
    pub projects: Vec<i64>,
}

impl SearchQuery {
    /// Exact document-key lookup, not restricted to any project.
    pub fn by_document_key(key: &str) -> Self {
        SearchQuery {
            document_key: Some(key.to_string()),
            contains: None,
            projects: Vec::new(),
        }
    }

    /// Custom-field text lookup scoped to the given projects.
    pub fn by_custom_field(field_name: &str, value: &str, projects: &[i64]) -> Self {
        SearchQuery {
            document_key: None,
            contains: Some(format!("{}:\"{}\"", field_name, value)),
            projects: projects.to_vec(),
        }
    }
}

/// Tallies for one submitted batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitResult {
    pub posted: usize,
    pub failed: usize,
    pub skipped_self: usize,
    pub skipped_duplicate: usize,
}

/// Aggregate outcome of an import run.
///
/// For every run `posted + failed + skipped_self + skipped_duplicate +
/// skipped_unresolved == rows_read`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of input files processed.
    pub files: usize,
    /// Total rows loaded across all files.
    pub rows_read: usize,
    /// Relationships created on the remote service.
    pub posted: usize,
    /// Relationships the service rejected.
    pub failed: usize,
    /// Rows dropped because an endpoint could not be resolved.
    pub skipped_unresolved: usize,
    /// Relationships from an item to itself, never submitted.
    pub skipped_self: usize,
    /// Relationships the service already had.
    pub skipped_duplicate: usize,
    /// Wall-clock time for the whole run.
    pub duration_ms: u64,
}
