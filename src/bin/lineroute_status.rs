#![cfg(feature = "http")]

use std::env;

use lineroute::cli::{DEFAULT_RESULTS_DIR, StatusArgs, init_tracing};
use lineroute::{ColumnSelector, Pipeline, ResultsDir, StatusClassifier};
use tracing::{error, info};

const CONCURRENCY: usize = 200;

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = env::args().skip(1).collect();
    let args = match StatusArgs::parse(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: lineroute-status [file.csv] [column] [url-prefix]");
            std::process::exit(1);
        }
    };

    let pipeline = Pipeline::builder()
        .input(args.file)
        .results_dir(ResultsDir::new(DEFAULT_RESULTS_DIR).with_extension("csv"))
        .with_concurrency(CONCURRENCY)
        .with_header(true)
        .with_skip_key(Some("skipped".into()))
        .build()?;

    let prepared = pipeline.prepare().await?;
    let column = ColumnSelector::parse(&args.column).resolve(prepared.header())?;
    info!(column, prefix = ?args.prefix, "checking urls");

    let classifier = StatusClassifier::http(column).with_prefix(args.prefix);
    let summary = prepared.run(&classifier).await?;
    for dest in summary.opened() {
        info!(status = %dest.key, lines = dest.lines, "written");
    }
    Ok(())
}

fn main() {
    init_tracing("info");
    if let Err(e) = run_blocking() {
        error!(error = %e, "lineroute-status failed");
        std::process::exit(1);
    }
}

fn run_blocking() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run())
}
