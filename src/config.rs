use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{ImportError, Result};
use crate::types::MatchStrategy;

/// Environment variables that override the corresponding file values, so
/// credentials can stay out of the config file.
pub const ENV_BASE_URL: &str = "TRACELINK_BASE_URL";
pub const ENV_USERNAME: &str = "TRACELINK_USERNAME";
pub const ENV_PASSWORD: &str = "TRACELINK_PASSWORD";

/// Configuration for one import run, loaded from a TOML file.
///
/// Constructed once and passed by reference into each component; nothing in
/// the pipeline reads ambient process-wide state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImporterConfig {
    pub connection: ConnectionConfig,
    pub csv: CsvConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

/// Connection settings for the remote instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Instance URL, e.g. `https://example.jamacloud.com`.
    pub base_url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Shape of the tabular input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvConfig {
    /// A single `.csv`/`.tsv` file, or a directory of them.
    pub location: PathBuf,
    /// Whether the first row of each file is a header row.
    #[serde(default = "default_true")]
    pub has_headers: bool,
    /// Positional column names, used when `has_headers` is false.
    #[serde(default)]
    pub headers: Vec<String>,
    /// Column holding the source item identifier.
    pub source_column: String,
    /// Column holding the target item identifier.
    pub target_column: String,
    /// Column holding the relationship type name; `None` means every row
    /// uses the default relationship type.
    #[serde(default)]
    pub relationship_type_column: Option<String>,
}

/// How identifiers are matched against remote items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub strategy: MatchStrategy,
    /// Custom field searched for source values (custom-field strategy).
    #[serde(default)]
    pub source_custom_field: Option<String>,
    /// Custom field searched for target values; may differ from the source
    /// field.
    #[serde(default)]
    pub target_custom_field: Option<String>,
    /// Projects source lookups are restricted to; empty means all.
    #[serde(default)]
    pub source_projects: Vec<i64>,
    /// Projects target lookups are restricted to; empty means all.
    #[serde(default)]
    pub target_projects: Vec<i64>,
    /// Relationship type used when a row has no recognized type name.
    #[serde(default = "default_relationship_type")]
    pub default_relationship_type: i64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        ImportConfig {
            strategy: MatchStrategy::default(),
            source_custom_field: None,
            target_custom_field: None,
            source_projects: Vec::new(),
            target_projects: Vec::new(),
            default_relationship_type: default_relationship_type(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_relationship_type() -> i64 {
    4
}

/// Loads and validates a configuration file.
///
/// Environment overrides are applied and the base URL normalized before
/// validation, so a config with the password only in the environment is
/// valid.
pub fn load_config(path: &Path) -> Result<ImporterConfig> {
    let contents = fs::read_to_string(path).map_err(|e| ImportError::Config {
        message: format!("failed to read config file '{}': {}", path.display(), e),
    })?;

    let mut config: ImporterConfig = toml::from_str(&contents).map_err(|e| ImportError::Config {
        message: format!("failed to parse config file '{}': {}", path.display(), e),
    })?;

    apply_env_overrides(&mut config);
    config.connection.base_url = normalize_base_url(&config.connection.base_url);
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut ImporterConfig) {
    if let Ok(url) = std::env::var(ENV_BASE_URL) {
        config.connection.base_url = url;
    }
    if let Ok(user) = std::env::var(ENV_USERNAME) {
        config.connection.username = user;
    }
    if let Ok(pass) = std::env::var(ENV_PASSWORD) {
        config.connection.password = pass;
    }
}

/// Normalizes a user-supplied instance URL: lowercases, strips a trailing
/// slash, and prefixes `https://` when no scheme is present. A bare host
/// with no dot is treated as a cloud instance shorthand.
pub fn normalize_base_url(raw: &str) -> String {
    let mut url = raw.trim().to_lowercase();
    if url.ends_with('/') {
        url.pop();
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        url = format!("https://{}", url);
    }
    if !url.contains('.') {
        url = format!("{}.jamacloud.com", url);
    }
    url
}

impl ImporterConfig {
    /// Fails fast with a `Config` error on anything that would make the run
    /// misbehave later: missing connection fields, an empty location, a
    /// headerless file without positional names, or a custom-field strategy
    /// without both field names.
    pub fn validate(&self) -> Result<()> {
        if self.connection.base_url.is_empty() || self.connection.base_url == "https://" {
            return Err(config_error("connection.base_url must be set"));
        }
        if self.connection.username.is_empty() {
            return Err(config_error("connection.username must be set"));
        }
        if self.csv.location.as_os_str().is_empty() {
            return Err(config_error("csv.location must be set"));
        }
        if self.csv.source_column.is_empty() || self.csv.target_column.is_empty() {
            return Err(config_error(
                "csv.source_column and csv.target_column must be set",
            ));
        }
        if !self.csv.has_headers && self.csv.headers.is_empty() {
            return Err(config_error(
                "csv.headers must name every column when csv.has_headers is false",
            ));
        }
        if self.import.strategy == MatchStrategy::CustomField
            && (self.import.source_custom_field.is_none()
                || self.import.target_custom_field.is_none())
        {
            return Err(config_error(
                "custom-field strategy requires import.source_custom_field and \
                 import.target_custom_field",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str) -> ImportError {
    ImportError::Config {
        message: message.to_string(),
    }
}
