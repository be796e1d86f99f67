//! Positional row validation against a [`RowSchema`].

use csv::{ByteRecord, StringRecord};

use crate::error::RowRejection;
use crate::types::RowSchema;

/// Check `record` against `schema`.
///
/// Rules, evaluated in order with early exit:
///
/// - the record must have exactly `schema.field_count()` fields;
/// - each column's value must satisfy its [`crate::types::ColumnKind`], left to right.
pub fn validate_record(schema: &RowSchema, record: &StringRecord) -> Result<(), RowRejection> {
    if record.len() != schema.field_count() {
        return Err(RowRejection::FieldCount {
            expected: schema.field_count(),
            found: record.len(),
        });
    }

    for (column, raw) in schema.columns.iter().zip(record.iter()) {
        if !column.kind.accepts(raw) {
            return Err(RowRejection::NotDigits {
                column: column.name,
                value: raw.to_owned(),
            });
        }
    }
    Ok(())
}

/// `true` when `header` names exactly the schema's columns, in order.
///
/// The header row is never used to locate columns; a mismatch is only worth a diagnostic.
pub fn header_matches(schema: &RowSchema, header: &ByteRecord) -> bool {
    header.iter().eq(schema.column_names().map(str::as_bytes))
}

/// Header check shared by both loaders: log a mismatch, never fail on it.
pub(crate) fn check_header<R: std::io::Read>(
    schema: &RowSchema,
    rdr: &mut csv::Reader<R>,
) -> Result<(), csv::Error> {
    let header = rdr.byte_headers()?;
    if !header.is_empty() && !header_matches(schema, header) {
        tracing::warn!(
            expected = ?schema.column_names().collect::<Vec<_>>(),
            found = ?header,
            "unexpected header row; columns are read by position"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{header_matches, validate_record};
    use crate::error::RowRejection;
    use crate::types::{ORDERS_SCHEMA, PRODUCTS_SCHEMA};
    use csv::{ByteRecord, StringRecord};

    #[test]
    fn accepts_well_formed_rows() {
        let product = StringRecord::from(vec!["1", "Chocolate, dark", "10", "4"]);
        assert_eq!(validate_record(&PRODUCTS_SCHEMA, &product), Ok(()));

        let order = StringRecord::from(vec!["2", "33120", "1", "1"]);
        assert_eq!(validate_record(&ORDERS_SCHEMA, &order), Ok(()));
    }

    #[test]
    fn product_name_may_be_empty() {
        let product = StringRecord::from(vec!["1", "", "10", "4"]);
        assert_eq!(validate_record(&PRODUCTS_SCHEMA, &product), Ok(()));
    }

    #[test]
    fn rejects_wrong_field_count() {
        let short = StringRecord::from(vec!["1", "Chocolate", "10"]);
        assert_eq!(
            validate_record(&PRODUCTS_SCHEMA, &short),
            Err(RowRejection::FieldCount {
                expected: 4,
                found: 3
            })
        );

        let long = StringRecord::from(vec!["1", "2", "3", "0", "9"]);
        assert!(matches!(
            validate_record(&ORDERS_SCHEMA, &long),
            Err(RowRejection::FieldCount { found: 5, .. })
        ));
    }

    #[test]
    fn reports_first_failing_column() {
        let order = StringRecord::from(vec!["1", "x", "", "0"]);
        assert_eq!(
            validate_record(&ORDERS_SCHEMA, &order),
            Err(RowRejection::NotDigits {
                column: "product_id",
                value: "x".to_string()
            })
        );
    }

    #[test]
    fn rejects_signs_spaces_and_non_ascii_digits() {
        for bad in ["-1", " 1", "1 ", "+4", "1.0", "\u{0663}"] {
            let order = StringRecord::from(vec!["1", "2", "3", bad]);
            assert!(
                validate_record(&ORDERS_SCHEMA, &order).is_err(),
                "expected rejection for {bad:?}"
            );
        }
    }

    #[test]
    fn department_id_must_be_digits() {
        let product = StringRecord::from(vec!["1", "Bread", "5", "dairy"]);
        assert_eq!(
            validate_record(&PRODUCTS_SCHEMA, &product),
            Err(RowRejection::NotDigits {
                column: "department_id",
                value: "dairy".to_string()
            })
        );
    }

    #[test]
    fn header_must_name_schema_columns_in_order() {
        let good =
            ByteRecord::from(vec!["order_id", "product_id", "add_to_cart_order", "reordered"]);
        assert!(header_matches(&ORDERS_SCHEMA, &good));

        let swapped =
            ByteRecord::from(vec!["product_id", "order_id", "add_to_cart_order", "reordered"]);
        assert!(!header_matches(&ORDERS_SCHEMA, &swapped));

        let short = ByteRecord::from(vec!["product_id", "product_name", "aisle_id"]);
        assert!(!header_matches(&PRODUCTS_SCHEMA, &short));
    }
}
