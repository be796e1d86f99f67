//! Input stages: the product catalog loader and the order aggregator.
//!
//! Both stages read a headered, comma-separated table in one forward pass. Rows that fail
//! validation are skipped and reported to an optional [`PipelineObserver`]; only I/O failures
//! abort a stage.
//!
//! - [`catalog`]: product table → [`crate::types::CatalogMap`]
//! - [`orders`]: order table + catalog → [`crate::types::DepartmentTotals`]
//! - [`observability`]: observer trait and the stock implementations

pub mod catalog;
pub mod observability;
pub mod orders;

use std::fs::File;
use std::path::Path;

use crate::error::{AnalyticsError, AnalyticsResult, RowRejection};
use crate::types::StageStats;

pub use catalog::{load_catalog_from_path, load_catalog_from_reader, products_reader_builder};
pub use observability::{
    CompositeObserver, FileObserver, PipelineObserver, Severity, SkippedRow, Stage, StageContext,
    TracingObserver,
};
pub use orders::{aggregate_orders_from_path, aggregate_orders_from_reader, orders_reader_builder};

/// Result of a stage: what it built plus its row counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutput<T> {
    pub output: T,
    pub stats: StageStats,
}

pub(crate) fn open_input(path: &Path) -> AnalyticsResult<File> {
    File::open(path).map_err(|source| AnalyticsError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Split a reader error into "skip this row" and "abort the stage".
///
/// Only I/O errors are fatal; anything else the reader reports (bad UTF-8, etc.) is confined to
/// the current record.
pub(crate) fn classify_read_error(err: csv::Error) -> Result<RowRejection, AnalyticsError> {
    if matches!(err.kind(), csv::ErrorKind::Io(_)) {
        Err(AnalyticsError::Csv(err))
    } else {
        Ok(RowRejection::Undecodable {
            message: err.to_string(),
        })
    }
}

/// Tracks counters and forwards skipped rows to the observer.
pub(crate) struct RowTally<'a> {
    ctx: &'a StageContext,
    observer: Option<&'a dyn PipelineObserver>,
    stats: StageStats,
}

impl<'a> RowTally<'a> {
    pub(crate) fn new(ctx: &'a StageContext, observer: Option<&'a dyn PipelineObserver>) -> Self {
        Self {
            ctx,
            observer,
            stats: StageStats::default(),
        }
    }

    pub(crate) fn accept(&mut self) {
        self.stats.rows_read += 1;
        self.stats.rows_accepted += 1;
    }

    pub(crate) fn skip(&mut self, row: usize, reason: RowRejection) {
        self.stats.rows_read += 1;
        if reason.is_malformed() {
            self.stats.rows_rejected += 1;
        } else {
            self.stats.rows_unmatched += 1;
        }
        if let Some(obs) = self.observer {
            obs.on_row_skipped(self.ctx, &SkippedRow { row, reason });
        }
    }

    pub(crate) fn finish(self) -> StageStats {
        if let Some(obs) = self.observer {
            obs.on_stage_complete(self.ctx, self.stats);
        }
        self.stats
    }
}

/// 1-based line of a record, falling back to `fallback` when the reader has no position.
pub(crate) fn line_of(position: Option<&csv::Position>, fallback: usize) -> usize {
    position.map_or(fallback, |p| p.line() as usize)
}
