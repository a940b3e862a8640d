use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;

use crate::client::TrackerClient;
use crate::config::ImporterConfig;
use crate::errors::{ImportError, Result};
use crate::loader;
use crate::preparer::prepare_rows;
use crate::resolver::ItemResolver;
use crate::submitter::submit_all;
use crate::typemap::RelationshipTypeMap;
use crate::types::RunSummary;

/// Drives one import run: type map, file discovery, then per-file
/// load -> prepare -> submit.
pub struct Importer<'a, C: TrackerClient> {
    client: &'a C,
    config: &'a ImporterConfig,
}

impl<'a, C: TrackerClient> Importer<'a, C> {
    pub fn new(client: &'a C, config: &'a ImporterConfig) -> Self {
        Importer { client, config }
    }

    /// Runs the import and returns the aggregate summary.
    ///
    /// Only two failures are fatal here: the relationship type fetch and
    /// file-level problems (unreadable input, missing required columns).
    /// Everything row-scoped is isolated inside the pipeline stages.
    ///
    /// With `dry_run` set, rows are loaded and resolved but nothing is
    /// submitted.
    pub fn run(&self, dry_run: bool) -> Result<RunSummary> {
        let start = Instant::now();

        let type_map =
            RelationshipTypeMap::build(self.client, self.config.import.default_relationship_type)?;

        let files = discover_files(&self.config.csv.location)?;

        // One resolver for the whole run, so lookups memoize across files.
        let mut resolver = ItemResolver::new(self.client, &self.config.import);
        let mut summary = RunSummary::default();

        for path in &files {
            info!("processing '{}'", path.display());
            let rows = loader::load_file(path, &self.config.csv)?;
            summary.rows_read += rows.len();

            let prep = prepare_rows(&rows, &mut resolver, &type_map);
            summary.skipped_unresolved += prep.skipped;

            if dry_run {
                info!(
                    "dry run: {} relationships prepared from '{}', not submitting",
                    prep.prepared.len(),
                    path.display()
                );
            } else {
                let submitted = submit_all(self.client, &prep.prepared);
                summary.posted += submitted.posted;
                summary.failed += submitted.failed;
                summary.skipped_self += submitted.skipped_self;
                summary.skipped_duplicate += submitted.skipped_duplicate;
            }

            summary.files += 1;
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "processed {} rows across {} files: {} posted, {} failed, \
             {} unresolved, {} self, {} duplicate ({}ms)",
            summary.rows_read,
            summary.files,
            summary.posted,
            summary.failed,
            summary.skipped_unresolved,
            summary.skipped_self,
            summary.skipped_duplicate,
            summary.duration_ms
        );
        Ok(summary)
    }
}

/// Resolves the configured location to the list of input files.
///
/// A file is used as-is; a directory contributes every `.csv`/`.tsv`
/// directly inside it, sorted by name for deterministic processing order.
pub fn discover_files(location: &Path) -> Result<Vec<PathBuf>> {
    if location.is_file() {
        return Ok(vec![location.to_path_buf()]);
    }
    if !location.is_dir() {
        return Err(ImportError::Config {
            message: format!("csv location '{}' does not exist", location.display()),
        });
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(location)? {
        let path = entry?.path();
        if path.is_file() && is_tabular(&path) {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(ImportError::Config {
            message: format!(
                "csv location '{}' contains no .csv or .tsv files",
                location.display()
            ),
        });
    }
    Ok(files)
}

fn is_tabular(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("csv") || ext.eq_ignore_ascii_case("tsv")
    )
}
