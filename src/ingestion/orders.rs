//! Order table aggregation.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{AnalyticsResult, RowRejection};
use crate::types::{CatalogMap, DepartmentTotals, ORDERS_SCHEMA, OrderRecord};
use crate::validation::{check_header, validate_record};

use super::observability::{PipelineObserver, Stage, StageContext};
use super::{RowTally, StageOutput, classify_read_error, line_of, open_input};

/// Reader settings for the order table: header row, plain comma splitting with no quote handling,
/// ragged rows allowed.
pub fn orders_reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).quoting(false);
    builder
}

/// Stream the order table at `path` through `catalog`.
///
/// Fails only if the file cannot be opened or read.
pub fn aggregate_orders_from_path(
    path: impl AsRef<Path>,
    catalog: &CatalogMap,
    observer: Option<&dyn PipelineObserver>,
) -> AnalyticsResult<StageOutput<DepartmentTotals>> {
    let path = path.as_ref();
    let file = open_input(path)?;
    let mut rdr = orders_reader_builder().from_reader(file);
    aggregate_orders_from_reader(
        &mut rdr,
        catalog,
        &StageContext::new(Stage::Orders, path),
        observer,
    )
}

/// Fold order rows from an existing CSV reader into per-department totals.
///
/// Rules:
///
/// - the first row is a header and is discarded (a mismatch with the expected names is only
///   logged);
/// - a row must have 4 fields, all digit strings;
/// - a row whose `product_id` is not in `catalog` is skipped (counted as unmatched);
/// - `reordered == "0"` counts as a first order, any other value as a reorder.
pub fn aggregate_orders_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    catalog: &CatalogMap,
    ctx: &StageContext,
    observer: Option<&dyn PipelineObserver>,
) -> AnalyticsResult<StageOutput<DepartmentTotals>> {
    let _span = tracing::info_span!(
        "aggregate_orders",
        path = %ctx.path.display(),
        products = catalog.len()
    )
    .entered();

    let mut totals = DepartmentTotals::new();
    if let Err(err) = check_header(&ORDERS_SCHEMA, rdr) {
        classify_read_error(err)?;
    }
    let mut tally = RowTally::new(ctx, observer);

    for (row_idx0, result) in rdr.records().enumerate() {
        let fallback_row = row_idx0 + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                let row = line_of(err.position(), fallback_row);
                tally.skip(row, classify_read_error(err)?);
                continue;
            }
        };
        let row = line_of(record.position(), fallback_row);

        let order = match parse_order(&record) {
            Ok(order) => order,
            Err(reason) => {
                tally.skip(row, reason);
                continue;
            }
        };

        match catalog.department_of(&order.product_id) {
            Some(department_id) => {
                totals.record(department_id, order.is_first_order());
                tally.accept();
            }
            None => tally.skip(
                row,
                RowRejection::UnknownProduct {
                    product_id: order.product_id,
                },
            ),
        }
    }

    let stats = tally.finish();
    tracing::debug!(departments = totals.len(), "orders aggregated");
    Ok(StageOutput {
        output: totals,
        stats,
    })
}

fn parse_order(record: &StringRecord) -> Result<OrderRecord, RowRejection> {
    validate_record(&ORDERS_SCHEMA, record)?;
    Ok(OrderRecord {
        product_id: record[1].to_owned(),
        reordered: record[3].to_owned(),
    })
}
