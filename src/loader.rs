use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::ReaderBuilder;
use tracing::{info, warn};

use crate::config::CsvConfig;
use crate::errors::{ImportError, Result};
use crate::types::RawRow;

/// Column positions resolved against the header set, computed once per file
/// before any data row is read.
struct ColumnIndices {
    source: usize,
    target: usize,
    rel_type: Option<usize>,
}

/// Loads one delimited file into normalized rows.
///
/// The delimiter is inferred from the file extension (`.tsv` is
/// tab-separated, everything else comma-separated).
pub fn load_file(path: &Path, config: &CsvConfig) -> Result<Vec<RawRow>> {
    let file = File::open(path)?;
    let rows = load_rows(file, delimiter_for(path), config)?;
    info!("read {} rows from '{}'", rows.len(), path.display());
    Ok(rows)
}

/// Loads rows from any delimited byte source.
///
/// A leading UTF-8 byte-order mark is stripped, so exports from spreadsheet
/// tools are handled transparently. Header validation happens before any
/// data row is read: missing source or target columns fail the whole file,
/// a missing relationship-type column only downgrades every row to the
/// default type.
pub fn load_rows<R: Read>(source: R, delimiter: u8, config: &CsvConfig) -> Result<Vec<RawRow>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(skip_bom(source)?);

    let mut records = reader.records();

    let headers: Vec<String> = if config.has_headers {
        match records.next() {
            Some(record) => record?.iter().map(|h| h.trim().to_string()).collect(),
            None => Vec::new(),
        }
    } else {
        config.headers.clone()
    };

    let indices = resolve_columns(&headers, config)?;

    let mut rows = Vec::new();
    for (row_number, record) in records.enumerate() {
        let record = record?;

        let source_value = record.get(indices.source).map(str::trim);
        let target_value = record.get(indices.target).map(str::trim);
        let (source_value, target_value) = match (source_value, target_value) {
            (Some(s), Some(t)) => (s, t),
            _ => {
                warn!(
                    "row {}: fewer columns than expected ({}), skipping",
                    row_number,
                    record.len()
                );
                continue;
            }
        };

        let rel_type_value = indices
            .rel_type
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        rows.push(RawRow {
            row_number,
            source_value: source_value.to_string(),
            target_value: target_value.to_string(),
            rel_type_value,
        });
    }

    Ok(rows)
}

/// Locates the configured columns in the header set.
fn resolve_columns(headers: &[String], config: &CsvConfig) -> Result<ColumnIndices> {
    let position = |name: &str| headers.iter().position(|h| h == name);

    let source = position(&config.source_column);
    let target = position(&config.target_column);
    let (source, target) = match (source, target) {
        (Some(s), Some(t)) => (s, t),
        _ => {
            return Err(ImportError::Config {
                message: format!(
                    "source column '{}' and/or target column '{}' not found in headers {:?}",
                    config.source_column, config.target_column, headers
                ),
            });
        }
    };

    let rel_type = match &config.relationship_type_column {
        Some(name) => {
            let idx = position(name);
            if idx.is_none() {
                warn!(
                    "relationship type column '{}' not found in headers, \
                     every row will use the default type",
                    name
                );
            }
            idx
        }
        None => None,
    };

    Ok(ColumnIndices {
        source,
        target,
        rel_type,
    })
}

fn delimiter_for(path: &Path) -> u8 {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    }
}

/// Consumes a leading UTF-8 byte-order mark, passing everything else
/// through untouched.
fn skip_bom<R: Read>(mut source: R) -> io::Result<impl Read> {
    let mut buf = [0u8; 3];
    let mut filled = 0;
    while filled < buf.len() {
        let n = source.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    let prefix = if filled == 3 && buf == [0xEF, 0xBB, 0xBF] {
        Vec::new()
    } else {
        buf[..filled].to_vec()
    };
    Ok(io::Cursor::new(prefix).chain(source))
}
