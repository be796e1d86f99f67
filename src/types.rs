//! Core data model: the product catalog, per-department accumulators, and the row schemas used to
//! validate both input tables.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::AnalyticsResult;

/// Kind of value a column must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Non-empty string of ASCII decimal digits.
    Digits,
    /// Free-form text; only presence is checked.
    Text,
}

impl ColumnKind {
    /// Returns `true` if `raw` satisfies this kind.
    pub fn accepts(self, raw: &str) -> bool {
        match self {
            ColumnKind::Digits => is_digit_string(raw),
            ColumnKind::Text => true,
        }
    }
}

/// A single named, typed column of a [`RowSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    /// Column name, used in diagnostics.
    pub name: &'static str,
    /// Expected value kind.
    pub kind: ColumnKind,
}

impl Column {
    /// Create a new column.
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Positional description of an input table.
///
/// Columns are checked left to right in declaration order; see [`crate::validation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSchema {
    /// Ordered columns; the slice length is the exact expected field count.
    pub columns: &'static [Column],
}

impl RowSchema {
    /// Create a schema from a static column list.
    pub const fn new(columns: &'static [Column]) -> Self {
        Self { columns }
    }

    /// Number of fields a row must have.
    pub fn field_count(&self) -> usize {
        self.columns.len()
    }

    /// Iterate column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|c| c.name)
    }
}

/// Product table: `product_id,product_name,aisle_id,department_id`.
pub const PRODUCTS_SCHEMA: RowSchema = RowSchema::new(&[
    Column::new("product_id", ColumnKind::Digits),
    Column::new("product_name", ColumnKind::Text),
    Column::new("aisle_id", ColumnKind::Digits),
    Column::new("department_id", ColumnKind::Digits),
]);

/// Order table: `order_id,product_id,add_to_cart_order,reordered`.
pub const ORDERS_SCHEMA: RowSchema = RowSchema::new(&[
    Column::new("order_id", ColumnKind::Digits),
    Column::new("product_id", ColumnKind::Digits),
    Column::new("add_to_cart_order", ColumnKind::Digits),
    Column::new("reordered", ColumnKind::Digits),
]);

pub(crate) fn is_digit_string(raw: &str) -> bool {
    !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit())
}

/// A validated product row. Only the fields needed downstream are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub product_id: String,
    pub department_id: String,
}

/// A validated order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    pub product_id: String,
    /// Raw `reordered` flag; `"0"` marks a first-time order.
    pub reordered: String,
}

impl OrderRecord {
    /// `true` when this line is a first-time (non-reorder) purchase.
    pub fn is_first_order(&self) -> bool {
        self.reordered == "0"
    }
}

/// Lookup table from product id to department id.
///
/// Built once by [`crate::ingestion::catalog`]; duplicate product ids keep the last department seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogMap {
    departments: HashMap<String, String>,
}

impl CatalogMap {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the department for a product.
    pub fn insert(&mut self, record: ProductRecord) {
        self.departments
            .insert(record.product_id, record.department_id);
    }

    /// Department id for `product_id`, if known.
    pub fn department_of(&self, product_id: &str) -> Option<&str> {
        self.departments.get(product_id).map(String::as_str)
    }

    /// Number of distinct products.
    pub fn len(&self) -> usize {
        self.departments.len()
    }

    /// `true` if no product was loaded.
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}

impl FromIterator<ProductRecord> for CatalogMap {
    fn from_iter<I: IntoIterator<Item = ProductRecord>>(iter: I) -> Self {
        let mut catalog = CatalogMap::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}

/// Running counters for one department.
///
/// The percentage is recomputed on every [`DepartmentStats::record_order`] call and can't be set
/// independently, so it always matches the counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentStats {
    number_of_orders: u64,
    number_of_first_orders: u64,
    percentage: String,
}

impl DepartmentStats {
    // Only reachable through `DepartmentTotals::record`, which records an order straight away.
    fn empty() -> Self {
        Self {
            number_of_orders: 0,
            number_of_first_orders: 0,
            percentage: String::new(),
        }
    }

    /// Count one order line.
    pub fn record_order(&mut self, first_order: bool) {
        self.number_of_orders += 1;
        if first_order {
            self.number_of_first_orders += 1;
        }
        self.percentage = format_ratio(self.number_of_first_orders, self.number_of_orders);
    }

    pub fn number_of_orders(&self) -> u64 {
        self.number_of_orders
    }

    pub fn number_of_first_orders(&self) -> u64 {
        self.number_of_first_orders
    }

    /// First-order ratio, formatted with exactly two decimals.
    pub fn percentage(&self) -> &str {
        &self.percentage
    }
}

/// Format `numerator / denominator` with two decimals.
///
/// The ratio is computed as an `f64` and rounded by the float formatter, which rounds the binary
/// value half to even: `1/8` is `0.12`, `3/40` is `0.07` (0.075 is stored just below the tie) and
/// `1/200` is `0.01` (0.005 is stored just above it).
///
/// # Panics
///
/// Panics if `denominator == 0`.
pub fn format_ratio(numerator: u64, denominator: u64) -> String {
    assert!(denominator > 0, "ratio denominator must be > 0");
    format!("{:.2}", numerator as f64 / denominator as f64)
}

/// Per-department accumulators keyed by department id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentTotals {
    stats: HashMap<String, DepartmentStats>,
}

impl DepartmentTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one order line for `department_id`, creating its entry on first sight.
    pub fn record(&mut self, department_id: &str, first_order: bool) {
        self.stats
            .entry(department_id.to_owned())
            .or_insert_with(DepartmentStats::empty)
            .record_order(first_order);
    }

    pub fn get(&self, department_id: &str) -> Option<&DepartmentStats> {
        self.stats.get(department_id)
    }

    /// Number of departments with at least one counted order.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Entries ordered by department id read as a non-negative integer.
    pub fn sorted(&self) -> Vec<(&str, &DepartmentStats)> {
        let mut rows: Vec<(&str, &DepartmentStats)> = self
            .stats
            .iter()
            .map(|(id, stats)| (id.as_str(), stats))
            .collect();
        rows.sort_by(|a, b| compare_numeric_ids(a.0, b.0));
        rows
    }
}

/// Compare two digit strings by numeric value without parsing them into a fixed-width integer.
///
/// Ids with equal value but different text (`"01"` vs `"1"`) fall back to a textual comparison,
/// which keeps the order total.
pub fn compare_numeric_ids(a: &str, b: &str) -> Ordering {
    let a_sig = a.trim_start_matches('0');
    let b_sig = b.trim_start_matches('0');
    a_sig
        .len()
        .cmp(&b_sig.len())
        .then_with(|| a_sig.cmp(b_sig))
        .then_with(|| a.cmp(b))
}

/// Row counters for one stage.
///
/// `rows_read == rows_accepted + rows_rejected + rows_unmatched` always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    /// Data rows seen (header excluded).
    pub rows_read: usize,
    /// Rows that contributed to the output.
    pub rows_accepted: usize,
    /// Malformed rows.
    pub rows_rejected: usize,
    /// Order rows whose product is not in the catalog.
    pub rows_unmatched: usize,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub products: StageStats,
    pub orders: StageStats,
    /// Number of report rows written.
    pub departments: usize,
    pub output_path: PathBuf,
}

impl RunSummary {
    /// Pretty-printed JSON form of the summary.
    pub fn to_json(&self) -> AnalyticsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ratio_plain_values() {
        assert_eq!(format_ratio(1, 1), "1.00");
        assert_eq!(format_ratio(1, 2), "0.50");
        assert_eq!(format_ratio(0, 7), "0.00");
        assert_eq!(format_ratio(1, 3), "0.33");
        assert_eq!(format_ratio(2, 3), "0.67");
        assert_eq!(format_ratio(1, 201), "0.00");
    }

    #[test]
    fn format_ratio_rounds_the_binary_value_half_to_even() {
        // Exact binary ties go to the even digit.
        assert_eq!(format_ratio(1, 8), "0.12");
        assert_eq!(format_ratio(3, 8), "0.38");
        assert_eq!(format_ratio(5, 8), "0.62");
        assert_eq!(format_ratio(7, 8), "0.88");
        // Decimal ties that are not exact in binary follow the stored value.
        assert_eq!(format_ratio(3, 40), "0.07");
        assert_eq!(format_ratio(1, 200), "0.01");
    }

    #[test]
    fn format_ratio_handles_large_counts() {
        assert_eq!(format_ratio(u64::MAX, u64::MAX), "1.00");
        assert_eq!(format_ratio(u64::MAX / 2, u64::MAX), "0.50");
    }

    #[test]
    fn department_stats_keep_percentage_in_sync() {
        let mut totals = DepartmentTotals::new();
        totals.record("4", true);
        assert_eq!(totals.get("4").unwrap().percentage(), "1.00");
        totals.record("4", false);
        let stats = totals.get("4").unwrap();
        assert_eq!(stats.number_of_orders(), 2);
        assert_eq!(stats.number_of_first_orders(), 1);
        assert_eq!(stats.percentage(), "0.50");
        totals.record("4", false);
        assert_eq!(totals.get("4").unwrap().percentage(), "0.33");
    }

    #[test]
    fn sorted_orders_numerically_not_lexicographically() {
        let mut totals = DepartmentTotals::new();
        for id in ["10", "9", "100", "1", "21"] {
            totals.record(id, true);
        }
        let ids: Vec<&str> = totals.sorted().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "9", "10", "21", "100"]);
    }

    #[test]
    fn compare_numeric_ids_handles_leading_zeros_and_huge_values() {
        assert_eq!(compare_numeric_ids("01", "1"), Ordering::Less);
        assert_eq!(compare_numeric_ids("002", "10"), Ordering::Less);
        assert_eq!(
            compare_numeric_ids("99999999999999999999999", "100000000000000000000000"),
            Ordering::Less
        );
        assert_eq!(compare_numeric_ids("7", "7"), Ordering::Equal);
    }

    #[test]
    fn catalog_keeps_last_department_for_duplicate_products() {
        let catalog: CatalogMap = vec![
            ProductRecord {
                product_id: "1".to_string(),
                department_id: "4".to_string(),
            },
            ProductRecord {
                product_id: "1".to_string(),
                department_id: "7".to_string(),
            },
        ]
        .into_iter()
        .collect();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.department_of("1"), Some("7"));
        assert_eq!(catalog.department_of("2"), None);
    }

    #[test]
    fn schemas_describe_four_columns() {
        assert_eq!(PRODUCTS_SCHEMA.field_count(), 4);
        assert_eq!(
            PRODUCTS_SCHEMA.column_names().collect::<Vec<_>>(),
            vec!["product_id", "product_name", "aisle_id", "department_id"]
        );
    }
}
