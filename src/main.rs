use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};

use purchase_analytics::ingestion::{
    CompositeObserver, FileObserver, PipelineObserver, TracingObserver,
};
use purchase_analytics::pipeline::{
    DEFAULT_ORDERS_PATH, DEFAULT_OUTPUT_PATH, DEFAULT_PRODUCTS_PATH, PipelineOptions,
    run_pipeline,
};

/// Per-department order statistics from a product catalog and an order-line table
#[derive(Parser, Debug)]
#[command(name = "purchase-analytics", version, about, long_about = None)]
struct Cli {
    /// Product table (product_id,product_name,aisle_id,department_id)
    #[arg(long, alias = "products_file", default_value = DEFAULT_PRODUCTS_PATH)]
    products_file: PathBuf,

    /// Order table (order_id,product_id,add_to_cart_order,reordered)
    #[arg(long, alias = "orders_file", default_value = DEFAULT_ORDERS_PATH)]
    orders_file: PathBuf,

    /// Report output path
    #[arg(long, alias = "output_file", default_value = DEFAULT_OUTPUT_PATH)]
    output_file: PathBuf,

    /// Append every skipped row and stage outcome to this file
    #[arg(long)]
    skipped_log: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    summary_json: bool,

    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .with_writer(std::io::stderr)
        .init();

    debug!(?cli, "starting");

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut observers: Vec<Arc<dyn PipelineObserver>> = vec![Arc::new(TracingObserver)];
    if let Some(path) = &cli.skipped_log {
        observers.push(Arc::new(FileObserver::new(path)));
    }

    let options = PipelineOptions {
        products_path: cli.products_file,
        orders_path: cli.orders_file,
        output_path: cli.output_file,
        observer: Some(Arc::new(CompositeObserver::new(observers))),
    };

    let summary = run_pipeline(&options).with_context(|| {
        format!(
            "purchase analytics failed (products={}, orders={}, output={})",
            options.products_path.display(),
            options.orders_path.display(),
            options.output_path.display()
        )
    })?;

    if cli.summary_json {
        println!("{}", summary.to_json().context("serializing run summary")?);
    }
    Ok(())
}
