//! Product table loading.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::error::{AnalyticsResult, RowRejection};
use crate::types::{CatalogMap, PRODUCTS_SCHEMA, ProductRecord};
use crate::validation::{check_header, validate_record};

use super::observability::{PipelineObserver, Stage, StageContext};
use super::{RowTally, StageOutput, classify_read_error, line_of, open_input};

/// Reader settings for the product table: header row, `"` quoting, ragged rows allowed so that
/// field-count problems surface as row rejections instead of reader errors.
pub fn products_reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true).quote(b'"');
    builder
}

/// Load the product table at `path` into a [`CatalogMap`].
///
/// Fails only if the file cannot be opened or read.
pub fn load_catalog_from_path(
    path: impl AsRef<Path>,
    observer: Option<&dyn PipelineObserver>,
) -> AnalyticsResult<StageOutput<CatalogMap>> {
    let path = path.as_ref();
    let file = open_input(path)?;
    let mut rdr = products_reader_builder().from_reader(file);
    load_catalog_from_reader(&mut rdr, &StageContext::new(Stage::Catalog, path), observer)
}

/// Load a product table from an existing CSV reader.
///
/// Rules:
///
/// - the first row is a header and is discarded (a mismatch with the expected names is only
///   logged);
/// - a row must have 4 fields, with `product_id`, `aisle_id`, `department_id` as digit strings;
/// - invalid rows are skipped and reported to `observer`;
/// - a later row for the same `product_id` overwrites the earlier one.
pub fn load_catalog_from_reader<R: Read>(
    rdr: &mut csv::Reader<R>,
    ctx: &StageContext,
    observer: Option<&dyn PipelineObserver>,
) -> AnalyticsResult<StageOutput<CatalogMap>> {
    let _span = tracing::info_span!("load_catalog", path = %ctx.path.display()).entered();

    let mut catalog = CatalogMap::new();
    if let Err(err) = check_header(&PRODUCTS_SCHEMA, rdr) {
        classify_read_error(err)?;
    }
    let mut tally = RowTally::new(ctx, observer);

    for (row_idx0, result) in rdr.records().enumerate() {
        // +1 for 1-based, +1 again because the header is row 1.
        let fallback_row = row_idx0 + 2;
        match result {
            Ok(record) => {
                let row = line_of(record.position(), fallback_row);
                match parse_product(&record) {
                    Ok(product) => {
                        catalog.insert(product);
                        tally.accept();
                    }
                    Err(reason) => tally.skip(row, reason),
                }
            }
            Err(err) => {
                let row = line_of(err.position(), fallback_row);
                tally.skip(row, classify_read_error(err)?);
            }
        }
    }

    let stats = tally.finish();
    tracing::debug!(products = catalog.len(), "catalog loaded");
    Ok(StageOutput {
        output: catalog,
        stats,
    })
}

fn parse_product(record: &StringRecord) -> Result<ProductRecord, RowRejection> {
    validate_record(&PRODUCTS_SCHEMA, record)?;
    Ok(ProductRecord {
        product_id: record[0].to_owned(),
        department_id: record[3].to_owned(),
    })
}
