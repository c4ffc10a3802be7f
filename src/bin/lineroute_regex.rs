#![cfg(feature = "regex")]

use std::env;

use lineroute::cli::{RegexArgs, init_tracing};
use lineroute::{PatternFile, Pipeline, ResultsDir};
use tracing::{error, info};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = env::args().skip(1).collect();
    let args = match RegexArgs::parse(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("Usage: lineroute-regex <input> <patterns-file> [results-dir]");
            std::process::exit(1);
        }
    };

    let classifier = PatternFile::classifier(&args.patterns).await?;
    info!(patterns = classifier.rules().len(), "patterns loaded");

    let pipeline = Pipeline::builder()
        .input(args.input)
        .results_dir(ResultsDir::new(args.results_dir))
        .build()?;

    let summary = pipeline.run(&classifier).await?;
    for dest in summary.opened() {
        info!(destination = %dest.key, lines = dest.lines, file = %dest.target, "written");
    }
    Ok(())
}

fn main() {
    init_tracing("info");
    if let Err(e) = run_blocking() {
        error!(error = %e, "lineroute-regex failed");
        std::process::exit(1);
    }
}

fn run_blocking() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run())
}
