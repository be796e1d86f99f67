//! `purchase-analytics` computes per-department purchase statistics from two CSV tables: a
//! product catalog (`product_id → department_id`) and an order-line table.
//!
//! For each department it reports how many order lines were placed, how many of those were
//! first-time (non-reorder) purchases, and the ratio of the two, sorted by numeric department id.
//!
//! The primary entrypoint is [`pipeline::run_pipeline`], which runs three stages in order:
//!
//! 1. [`ingestion::catalog`] loads the product table into a [`types::CatalogMap`];
//! 2. [`ingestion::orders`] streams the order table through the catalog into
//!    [`types::DepartmentTotals`];
//! 3. [`report`] writes the sorted report.
//!
//! Malformed rows (wrong field count, non-digit ids, undecodable bytes) and orders for unknown
//! products are skipped and reported to an optional [`ingestion::PipelineObserver`]. Only I/O
//! failures abort a run, and a failed run never leaves a partial report behind.
//!
//! ## Quick example
//!
//! ```rust
//! use purchase_analytics::pipeline::build_report_from_readers;
//! use purchase_analytics::report::render_report;
//!
//! let products = "product_id,product_name,aisle_id,department_id\n\
//!                 1,Chocolate,10,4\n\
//!                 2,Bread,5,1\n";
//! let orders = "order_id,product_id,add_to_cart_order,reordered\n\
//!               1,1,1,0\n\
//!               2,1,2,1\n\
//!               3,2,1,0\n\
//!               4,99,1,0\n";
//!
//! let (totals, _, order_stats) =
//!     build_report_from_readers(products.as_bytes(), orders.as_bytes(), None).unwrap();
//! assert_eq!(order_stats.rows_unmatched, 1);
//! assert_eq!(
//!     render_report(&totals).unwrap(),
//!     "department_id,number_of_orders,number_of_first_orders,percentage\n\
//!      1,1,1,1.00\n\
//!      4,2,1,0.50\n"
//! );
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: catalog loader, order aggregator, and observers
//! - [`validation`]: positional row validation
//! - [`types`]: catalog, accumulators, schemas, and run counters
//! - [`report`]: report serialization
//! - [`pipeline`]: end-to-end job and its options
//! - [`error`]: fatal errors and row rejections

pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod validation;

pub use error::{AnalyticsError, AnalyticsResult, RowRejection};
