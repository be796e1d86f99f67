use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AnalyticsError, RowRejection};
use crate::types::StageStats;

/// Pipeline stage an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Product table → catalog map.
    Catalog,
    /// Order table → department totals.
    Orders,
    /// Department totals → report file.
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Catalog => "catalog",
            Stage::Orders => "orders",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Severity classification used for observer callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational event (e.g. an order for a product that is not in the catalog).
    Info,
    /// Warning-level event (malformed row, skipped).
    Warning,
    /// Error-level event (stage failed).
    Error,
    /// Critical error (I/O failures).
    Critical,
}

impl Severity {
    /// Severity of a skipped row.
    pub fn for_rejection(reason: &RowRejection) -> Self {
        if reason.is_malformed() {
            Severity::Warning
        } else {
            Severity::Info
        }
    }

    /// Severity of a fatal error.
    pub fn for_error(error: &AnalyticsError) -> Self {
        if error.is_io() {
            Severity::Critical
        } else {
            Severity::Error
        }
    }
}

/// Which stage and file an event came from.
#[derive(Debug, Clone)]
pub struct StageContext {
    pub stage: Stage,
    /// Input path for the loading stages, output path for the report stage.
    pub path: PathBuf,
}

impl StageContext {
    pub fn new(stage: Stage, path: impl Into<PathBuf>) -> Self {
        Self {
            stage,
            path: path.into(),
        }
    }
}

/// A row dropped by a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input; the header is line 1.
    pub row: usize,
    pub reason: RowRejection,
}

/// Observer interface for pipeline events.
///
/// Every method defaults to a no-op, so implementors only override what they care about.
pub trait PipelineObserver: Send + Sync {
    /// Called for every row a stage drops.
    fn on_row_skipped(&self, _ctx: &StageContext, _skipped: &SkippedRow) {}

    /// Called once when a stage finishes successfully.
    fn on_stage_complete(&self, _ctx: &StageContext, _stats: StageStats) {}

    /// Called when a stage fails.
    fn on_failure(&self, _ctx: &StageContext, _severity: Severity, _error: &AnalyticsError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_row_skipped(&self, ctx: &StageContext, skipped: &SkippedRow) {
        for o in &self.observers {
            o.on_row_skipped(ctx, skipped);
        }
    }

    fn on_stage_complete(&self, ctx: &StageContext, stats: StageStats) {
        for o in &self.observers {
            o.on_stage_complete(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &AnalyticsError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }
}

/// Forwards events to `tracing`.
///
/// Malformed rows are logged at `warn`, unmatched products at `debug`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_row_skipped(&self, ctx: &StageContext, skipped: &SkippedRow) {
        match Severity::for_rejection(&skipped.reason) {
            Severity::Info => tracing::debug!(
                stage = %ctx.stage,
                path = %ctx.path.display(),
                row = skipped.row,
                "skipped row: {}",
                skipped.reason
            ),
            _ => tracing::warn!(
                stage = %ctx.stage,
                path = %ctx.path.display(),
                row = skipped.row,
                "skipped row: {}",
                skipped.reason
            ),
        }
    }

    fn on_stage_complete(&self, ctx: &StageContext, stats: StageStats) {
        tracing::info!(
            stage = %ctx.stage,
            path = %ctx.path.display(),
            rows_read = stats.rows_read,
            rows_accepted = stats.rows_accepted,
            rows_rejected = stats.rows_rejected,
            rows_unmatched = stats.rows_unmatched,
            "stage complete"
        );
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &AnalyticsError) {
        tracing::error!(
            stage = %ctx.stage,
            path = %ctx.path.display(),
            ?severity,
            "stage failed: {error}"
        );
    }
}

/// Appends pipeline events to a local diagnostics file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl PipelineObserver for FileObserver {
    fn on_row_skipped(&self, ctx: &StageContext, skipped: &SkippedRow) {
        self.append_line(&format!(
            "{} skip severity={:?} stage={} path={} row={} reason={}",
            unix_ts(),
            Severity::for_rejection(&skipped.reason),
            ctx.stage,
            ctx.path.display(),
            skipped.row,
            skipped.reason
        ));
    }

    fn on_stage_complete(&self, ctx: &StageContext, stats: StageStats) {
        self.append_line(&format!(
            "{} ok stage={} path={} read={} accepted={} rejected={} unmatched={}",
            unix_ts(),
            ctx.stage,
            ctx.path.display(),
            stats.rows_read,
            stats.rows_accepted,
            stats.rows_rejected,
            stats.rows_unmatched
        ));
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, error: &AnalyticsError) {
        self.append_line(&format!(
            "{} fail severity={:?} stage={} path={} err={}",
            unix_ts(),
            severity,
            ctx.stage,
            ctx.path.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
