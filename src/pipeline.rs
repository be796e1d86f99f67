//! End-to-end job: load the catalog, aggregate orders, write the report.
//!
//! Most callers should use [`run_pipeline`], which drives the three stages from
//! [`PipelineOptions`] and reports each stage's completion or failure to the configured
//! [`PipelineObserver`].

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AnalyticsResult;
use crate::ingestion::observability::{PipelineObserver, Severity, Stage, StageContext};
use crate::ingestion::{
    aggregate_orders_from_path, aggregate_orders_from_reader, load_catalog_from_path,
    load_catalog_from_reader, orders_reader_builder, products_reader_builder,
};
use crate::report::write_report_to_path;
use crate::types::{DepartmentTotals, RunSummary, StageStats};

/// Default product table location.
pub const DEFAULT_PRODUCTS_PATH: &str = "./input/products.csv";
/// Default order table location.
pub const DEFAULT_ORDERS_PATH: &str = "./input/order_products.csv";
/// Default report location.
pub const DEFAULT_OUTPUT_PATH: &str = "./output/report.csv";

/// Options controlling a pipeline run.
///
/// Use [`Default`] for the conventional `./input` / `./output` layout.
#[derive(Clone)]
pub struct PipelineOptions {
    pub products_path: PathBuf,
    pub orders_path: PathBuf,
    pub output_path: PathBuf,
    /// Optional observer for skipped rows and stage outcomes.
    pub observer: Option<Arc<dyn PipelineObserver>>,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("products_path", &self.products_path)
            .field("orders_path", &self.orders_path)
            .field("output_path", &self.output_path)
            .field("observer_set", &self.observer.is_some())
            .finish()
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            products_path: PathBuf::from(DEFAULT_PRODUCTS_PATH),
            orders_path: PathBuf::from(DEFAULT_ORDERS_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            observer: None,
        }
    }
}

/// Run the whole job.
///
/// The catalog is loaded in full before the first order is read, and the report file is only
/// created once both inputs were consumed. Any I/O failure aborts the run without touching the
/// output path.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use purchase_analytics::ingestion::TracingObserver;
/// use purchase_analytics::pipeline::{run_pipeline, PipelineOptions};
///
/// # fn main() -> Result<(), purchase_analytics::AnalyticsError> {
/// let opts = PipelineOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     ..Default::default()
/// };
/// let summary = run_pipeline(&opts)?;
/// println!("departments={}", summary.departments);
/// # Ok(())
/// # }
/// ```
pub fn run_pipeline(options: &PipelineOptions) -> AnalyticsResult<RunSummary> {
    let observer = options.observer.as_deref();

    let catalog = observe_failure(Stage::Catalog, &options.products_path, observer, || {
        load_catalog_from_path(&options.products_path, observer)
    })?;

    let orders = observe_failure(Stage::Orders, &options.orders_path, observer, || {
        aggregate_orders_from_path(&options.orders_path, &catalog.output, observer)
    })?;

    let departments = observe_failure(Stage::Report, &options.output_path, observer, || {
        write_report_to_path(&orders.output, &options.output_path)
    })?;

    Ok(RunSummary {
        products: catalog.stats,
        orders: orders.stats,
        departments,
        output_path: options.output_path.clone(),
    })
}

/// Build department totals from in-memory tables.
///
/// Runs the same two stages as [`run_pipeline`] without touching the filesystem. Returns the
/// totals plus the product and order stage counters.
pub fn build_report_from_readers<P: Read, O: Read>(
    products: P,
    orders: O,
    observer: Option<&dyn PipelineObserver>,
) -> AnalyticsResult<(DepartmentTotals, StageStats, StageStats)> {
    let mut products_rdr = products_reader_builder().from_reader(products);
    let catalog = load_catalog_from_reader(
        &mut products_rdr,
        &StageContext::new(Stage::Catalog, "<products>"),
        observer,
    )?;

    let mut orders_rdr = orders_reader_builder().from_reader(orders);
    let totals = aggregate_orders_from_reader(
        &mut orders_rdr,
        &catalog.output,
        &StageContext::new(Stage::Orders, "<orders>"),
        observer,
    )?;

    Ok((totals.output, catalog.stats, totals.stats))
}

fn observe_failure<T>(
    stage: Stage,
    path: &Path,
    observer: Option<&dyn PipelineObserver>,
    f: impl FnOnce() -> AnalyticsResult<T>,
) -> AnalyticsResult<T> {
    let result = f();
    if let (Err(e), Some(obs)) = (&result, observer) {
        obs.on_failure(&StageContext::new(stage, path), Severity::for_error(e), e);
    }
    result
}
