use std::fs;
use std::sync::{Arc, Mutex};

use purchase_analytics::error::RowRejection;
use purchase_analytics::ingestion::{
    CompositeObserver, FileObserver, PipelineObserver, Severity, SkippedRow, Stage, StageContext,
};
use purchase_analytics::pipeline::{build_report_from_readers, run_pipeline, PipelineOptions};
use purchase_analytics::types::StageStats;
use purchase_analytics::AnalyticsError;

#[derive(Default)]
struct RecordingObserver {
    skipped: Mutex<Vec<(Stage, SkippedRow)>>,
    completed: Mutex<Vec<(Stage, StageStats)>>,
    failures: Mutex<Vec<(Stage, Severity)>>,
}

impl PipelineObserver for RecordingObserver {
    fn on_row_skipped(&self, ctx: &StageContext, skipped: &SkippedRow) {
        self.skipped.lock().unwrap().push((ctx.stage, skipped.clone()));
    }

    fn on_stage_complete(&self, ctx: &StageContext, stats: StageStats) {
        self.completed.lock().unwrap().push((ctx.stage, stats));
    }

    fn on_failure(&self, ctx: &StageContext, severity: Severity, _error: &AnalyticsError) {
        self.failures.lock().unwrap().push((ctx.stage, severity));
    }
}

#[test]
fn observer_sees_every_skipped_row_with_line_numbers() {
    let obs = RecordingObserver::default();
    let products = "product_id,product_name,aisle_id,department_id\n1,Chocolate,10,4\nbad,Oops,1,1\n";
    let orders = "order_id,product_id,add_to_cart_order,reordered\n1,1,1,0\n2,99,1,0\n3,1\n";

    build_report_from_readers(products.as_bytes(), orders.as_bytes(), Some(&obs)).unwrap();

    let skipped = obs.skipped.lock().unwrap().clone();
    assert_eq!(skipped.len(), 3);

    assert_eq!(skipped[0].0, Stage::Catalog);
    assert_eq!(skipped[0].1.row, 3);
    assert_eq!(
        skipped[0].1.reason,
        RowRejection::NotDigits {
            column: "product_id",
            value: "bad".to_string()
        }
    );

    assert_eq!(skipped[1].0, Stage::Orders);
    assert_eq!(skipped[1].1.row, 3);
    assert_eq!(
        skipped[1].1.reason,
        RowRejection::UnknownProduct {
            product_id: "99".to_string()
        }
    );
    assert_eq!(Severity::for_rejection(&skipped[1].1.reason), Severity::Info);

    assert_eq!(skipped[2].1.row, 4);
    assert_eq!(
        skipped[2].1.reason,
        RowRejection::FieldCount {
            expected: 4,
            found: 2
        }
    );
    assert_eq!(Severity::for_rejection(&skipped[2].1.reason), Severity::Warning);

    let completed = obs.completed.lock().unwrap().clone();
    assert_eq!(
        completed.iter().map(|(stage, _)| *stage).collect::<Vec<_>>(),
        vec![Stage::Catalog, Stage::Orders]
    );
    assert_eq!(completed[1].1.rows_unmatched, 1);
    assert_eq!(completed[1].1.rows_rejected, 1);
}

#[test]
fn observer_receives_critical_failure_for_missing_input() {
    let obs = Arc::new(RecordingObserver::default());
    let dir = tempfile::tempdir().unwrap();
    let opts = PipelineOptions {
        products_path: "tests/fixtures/products.csv".into(),
        orders_path: "tests/fixtures/does_not_exist.csv".into(),
        output_path: dir.path().join("report.csv"),
        observer: Some(obs.clone()),
    };

    let _ = run_pipeline(&opts).unwrap_err();

    let failures = obs.failures.lock().unwrap().clone();
    assert_eq!(failures, vec![(Stage::Orders, Severity::Critical)]);
    let completed = obs.completed.lock().unwrap().clone();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].0, Stage::Catalog);
}

#[test]
fn file_observer_appends_through_composite() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("skipped.log");
    let recorder = Arc::new(RecordingObserver::default());
    let observers: Vec<Arc<dyn PipelineObserver>> =
        vec![Arc::new(FileObserver::new(&log_path)), recorder.clone()];
    let composite = CompositeObserver::new(observers);

    let opts = PipelineOptions {
        products_path: "tests/fixtures/products.csv".into(),
        orders_path: "tests/fixtures/order_products.csv".into(),
        output_path: dir.path().join("report.csv"),
        observer: Some(Arc::new(composite)),
    };
    run_pipeline(&opts).unwrap();

    let log = fs::read_to_string(&log_path).unwrap();
    let skip_lines = log.lines().filter(|l| l.contains(" skip ")).count();
    let ok_lines = log.lines().filter(|l| l.contains(" ok ")).count();
    // 3 bad products + 2 bad orders + 3 unknown products.
    assert_eq!(skip_lines, 8);
    assert_eq!(ok_lines, 2);
    assert!(log.contains("unknown product_id '404'"));
    assert_eq!(recorder.skipped.lock().unwrap().len(), 8);
}
