mod common;

use std::fs;
use std::path::Path;

use common::{CreateOutcome, MockTracker};
use tempfile::TempDir;

use tracelink::config::{ConnectionConfig, CsvConfig, ImportConfig, ImporterConfig};
use tracelink::errors::ImportError;
use tracelink::importer::{discover_files, Importer};
use tracelink::types::MatchStrategy;

fn config(location: &Path, strategy: MatchStrategy) -> ImporterConfig {
    ImporterConfig {
        connection: ConnectionConfig {
            base_url: "https://example.jamacloud.com".to_string(),
            username: "importer".to_string(),
            password: "secret".to_string(),
            timeout_secs: 30,
        },
        csv: CsvConfig {
            location: location.to_path_buf(),
            has_headers: true,
            headers: Vec::new(),
            source_column: "SourceKey".to_string(),
            target_column: "TargetKey".to_string(),
            relationship_type_column: Some("Type".to_string()),
        },
        import: ImportConfig {
            strategy,
            ..ImportConfig::default()
        },
    }
}

fn tracker_with_trace_type() -> MockTracker {
    let mut tracker = MockTracker::new();
    tracker.add_relationship_type(7, "Trace");
    tracker
}

#[test]
fn test_direct_id_run_with_self_and_fallback_type() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("links.csv");
    fs::write(
        &path,
        "SourceKey,TargetKey,Type\n1,2,Trace\n3,3,Trace\n4,5,Unknown\n",
    )
    .expect("write failed");

    let tracker = tracker_with_trace_type();
    let config = config(&path, MatchStrategy::DirectId);
    let summary = Importer::new(&tracker, &config)
        .run(false)
        .expect("run failed");

    assert_eq!(summary.files, 1);
    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.posted, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped_self, 1);
    assert_eq!(
        tracker.created(),
        vec![(1, 2, 7), (4, 5, 4)],
        "known type maps to 7, unknown falls back to 4"
    );
}

#[test]
fn test_every_row_is_accounted_for() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("links.csv");
    fs::write(
        &path,
        "SourceKey,TargetKey,Type\n\
         REQ-1,REQ-2,Trace\n\
         REQ-1,REQ-MISSING,Trace\n\
         REQ-3,REQ-4,Trace\n\
         REQ-5,REQ-6,Trace\n\
         REQ-1,REQ-1,Trace\n",
    )
    .expect("write failed");

    let mut tracker = tracker_with_trace_type();
    for (key, id) in [
        ("REQ-1", 1),
        ("REQ-2", 2),
        ("REQ-3", 3),
        ("REQ-4", 4),
        ("REQ-5", 5),
        ("REQ-6", 6),
    ] {
        tracker.add_search_result(key, &[id]);
    }
    tracker.set_create_outcome(3, 4, CreateOutcome::Duplicate);
    tracker.set_create_outcome(5, 6, CreateOutcome::Fail("boom".to_string()));

    let config = config(&path, MatchStrategy::DocumentKey);
    let summary = Importer::new(&tracker, &config)
        .run(false)
        .expect("run failed");

    assert_eq!(summary.rows_read, 5);
    assert_eq!(summary.posted, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped_unresolved, 1);
    assert_eq!(summary.skipped_duplicate, 1);
    assert_eq!(summary.skipped_self, 1);
    assert_eq!(
        summary.posted
            + summary.failed
            + summary.skipped_unresolved
            + summary.skipped_duplicate
            + summary.skipped_self,
        summary.rows_read,
        "no row may go unaccounted"
    );
}

#[test]
fn test_directory_run_shares_lookup_cache_across_files() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(
        dir.path().join("a.csv"),
        "SourceKey,TargetKey,Type\nREQ-1,REQ-2,Trace\n",
    )
    .expect("write failed");
    fs::write(
        dir.path().join("b.csv"),
        "SourceKey,TargetKey,Type\nREQ-2,REQ-1,Trace\n",
    )
    .expect("write failed");
    // Ignored: not a tabular file.
    fs::write(dir.path().join("notes.txt"), "ignore me").expect("write failed");

    let mut tracker = tracker_with_trace_type();
    tracker.add_search_result("REQ-1", &[1]);
    tracker.add_search_result("REQ-2", &[2]);

    let config = config(dir.path(), MatchStrategy::DocumentKey);
    let summary = Importer::new(&tracker, &config)
        .run(false)
        .expect("run failed");

    assert_eq!(summary.files, 2);
    assert_eq!(summary.rows_read, 2);
    assert_eq!(summary.posted, 2);
    assert_eq!(
        tracker.search_call_count(),
        2,
        "each key resolved once for the whole run"
    );
    assert_eq!(tracker.created(), vec![(1, 2, 7), (2, 1, 7)]);
}

#[test]
fn test_type_fetch_failure_aborts_the_run() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("links.csv");
    fs::write(&path, "SourceKey,TargetKey,Type\n1,2,Trace\n").expect("write failed");

    let mut tracker = MockTracker::new();
    tracker.fail_type_fetch();

    let config = config(&path, MatchStrategy::DirectId);
    let err = Importer::new(&tracker, &config).run(false);
    assert!(err.is_err(), "no relationships can be typed without the map");
    assert!(tracker.created().is_empty());
}

#[test]
fn test_dry_run_submits_nothing() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("links.csv");
    fs::write(&path, "SourceKey,TargetKey,Type\n1,2,Trace\n").expect("write failed");

    let tracker = tracker_with_trace_type();
    let config = config(&path, MatchStrategy::DirectId);
    let summary = Importer::new(&tracker, &config)
        .run(true)
        .expect("run failed");

    assert_eq!(summary.rows_read, 1);
    assert_eq!(summary.posted, 0);
    assert!(tracker.created().is_empty());
}

#[test]
fn test_discover_files_sorted_and_filtered() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("b.csv"), "").expect("write failed");
    fs::write(dir.path().join("a.TSV"), "").expect("write failed");
    fs::write(dir.path().join("c.txt"), "").expect("write failed");

    let files = discover_files(dir.path()).expect("discover failed");
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.TSV", "b.csv"]);
}

#[test]
fn test_discover_files_single_file() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let path = dir.path().join("links.csv");
    fs::write(&path, "").expect("write failed");

    let files = discover_files(&path).expect("discover failed");
    assert_eq!(files, vec![path]);
}

#[test]
fn test_directory_without_tabular_files_is_an_error() {
    let dir = TempDir::new().expect("failed to create temp dir");
    fs::write(dir.path().join("notes.txt"), "").expect("write failed");

    match discover_files(dir.path()).unwrap_err() {
        ImportError::Config { message } => {
            assert!(message.contains("no .csv"), "message: {}", message)
        }
        other => panic!("expected Config error, got {:?}", other),
    }
}

#[test]
fn test_missing_location_is_an_error() {
    match discover_files(Path::new("/does/not/exist")).unwrap_err() {
        ImportError::Config { .. } => {}
        other => panic!("expected Config error, got {:?}", other),
    }
}
