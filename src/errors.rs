use thiserror::Error;

/// Errors that can occur during a relationship import run.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("config error: {message}")]
    Config { message: String },

    #[error("ambiguous match: '{value}' matched {count} items (field: {field})")]
    AmbiguousMatch {
        field: String,
        value: String,
        count: usize,
    },

    #[error("lookup failed for '{value}' (field: {field}): {message}")]
    Lookup {
        field: String,
        value: String,
        message: String,
    },

    #[error("relationship {from_item} -> {to_item} already exists")]
    Duplicate { from_item: i64, to_item: i64 },

    #[error("submission failed for {from_item} -> {to_item}: {message}")]
    Submission {
        from_item: i64,
        to_item: i64,
        message: String,
    },

    #[error("api error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] ureq::Error),
}

/// Convenience alias for results using `ImportError`.
pub type Result<T> = std::result::Result<T, ImportError>;
