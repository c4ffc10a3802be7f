use std::env;

use lineroute::PipelineConfig;
use lineroute::cli::init_tracing;
use tracing::{error, info};

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let config_path = match args.next() {
        Some(path) => path,
        None => {
            eprintln!("Usage: lineroute-pipeline <pipeline-config.{{yaml,json,toml}}>");
            std::process::exit(1);
        }
    };

    let config = PipelineConfig::load(&config_path).await?;
    let summary = lineroute::run_config(&config).await?;
    info!(
        read = summary.counters.read,
        destinations = summary.opened().count(),
        "done"
    );
    Ok(())
}

fn main() {
    init_tracing("info");
    if let Err(e) = run_blocking() {
        error!(error = %e, "lineroute-pipeline failed");
        std::process::exit(1);
    }
}

fn run_blocking() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(run())
}
