use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for pipeline operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Fatal error returned by the loader, aggregator, and report writer.
///
/// Anything in this enum aborts the run. Row-level problems are never reported through it; see
/// [`RowRejection`] for those.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// An input or output file could not be opened/created.
    #[error("cannot open '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Underlying I/O error while reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader/writer error that is not recoverable at row level.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Run summary serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalyticsError {
    /// Returns `true` when the error originates from the filesystem / I/O layer.
    pub fn is_io(&self) -> bool {
        match self {
            AnalyticsError::Open { .. } | AnalyticsError::Io(_) => true,
            AnalyticsError::Csv(err) => matches!(err.kind(), csv::ErrorKind::Io(_)),
            AnalyticsError::Json(err) => err.is_io(),
        }
    }
}

/// Why a single input row was skipped.
///
/// Rejections are recovered locally: the row is dropped from every count and the stage carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowRejection {
    /// The row does not have the expected number of fields.
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    /// A column that must hold a digit string holds something else.
    #[error("column '{column}' is not a digit string (raw='{value}')")]
    NotDigits { column: &'static str, value: String },

    /// The row could not be decoded (e.g. invalid UTF-8).
    #[error("undecodable row: {message}")]
    Undecodable { message: String },

    /// The order references a product missing from the catalog.
    #[error("unknown product_id '{product_id}'")]
    UnknownProduct { product_id: String },
}

impl RowRejection {
    /// Unmatched products are an expected data-quality case rather than malformed input.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, RowRejection::UnknownProduct { .. })
    }
}
