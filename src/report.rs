//! Report output: one row per department, ordered by numeric department id.

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::DepartmentTotals;

/// Header line of the report.
pub const REPORT_HEADER: [&str; 4] = [
    "department_id",
    "number_of_orders",
    "number_of_first_orders",
    "percentage",
];

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    department_id: &'a str,
    number_of_orders: u64,
    number_of_first_orders: u64,
    percentage: &'a str,
}

fn report_writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

/// Write the report for `totals` to `writer`.
///
/// The header is always written, even when there are no departments. Returns the number of data
/// rows written.
pub fn write_report<W: Write>(totals: &DepartmentTotals, writer: W) -> AnalyticsResult<usize> {
    let mut wtr = report_writer_builder().from_writer(writer);
    wtr.write_record(REPORT_HEADER)?;

    let rows = totals.sorted();
    for &(department_id, stats) in &rows {
        wtr.serialize(ReportRow {
            department_id,
            number_of_orders: stats.number_of_orders(),
            number_of_first_orders: stats.number_of_first_orders(),
            percentage: stats.percentage(),
        })?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

/// Render the report into a `String`.
pub fn render_report(totals: &DepartmentTotals) -> AnalyticsResult<String> {
    let mut buf = Vec::new();
    write_report(totals, &mut buf)?;
    String::from_utf8(buf)
        .map_err(|e| AnalyticsError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Write the report to `path`, replacing any existing file only once the full report is on disk.
///
/// The report is first written to a temporary file next to `path` and then renamed over it, so a
/// failure never leaves a partial report behind. The parent directory must exist.
pub fn write_report_to_path(
    totals: &DepartmentTotals,
    path: impl AsRef<Path>,
) -> AnalyticsResult<usize> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let open_err = |source: io::Error| AnalyticsError::Open {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(open_err)?;
    let rows = write_report(totals, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| open_err(e.error))?;

    tracing::info!(path = %path.display(), departments = rows, "report written");
    Ok(rows)
}
