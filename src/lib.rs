//! # lineroute
//!
//! Concurrent line pipelines that classify every line of a large text or CSV
//! input and route it to one flat output file per destination.
//!
//! ## Overview
//!
//! lineroute provides:
//! - **Line source**: reads the input strictly sequentially into a bounded queue
//! - **Classifier stage**: runs an injected classifier with fixed concurrency
//! - **Destination writers**: one bounded queue and one drain task per output,
//!   so lines for the same destination are never reordered or interleaved
//! - **Writer registry**: destinations are created on first use, keyed by name
//! - **Coordinator**: staged shutdown, best-effort flushing, first-error reporting
//! - **Classifiers**: regex match/extract rules and CSV URL status checks
//!
//! ```text
//! source -> [input queue] -> workers (N) -> [queue per key] -> writer -> <dir>/<key>.<ext>
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lineroute::{Pipeline, RegexClassifier, ResultsDir};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let classifier = RegexClassifier::new().with_rule("matched", r"^a")?;
//!
//!     let pipeline = Pipeline::builder()
//!         .input("input.csv")
//!         .results_dir(ResultsDir::new("results"))
//!         .with_concurrency(4)
//!         .build()?;
//!
//!     let summary = pipeline.run(&classifier).await?;
//!     println!("{} lines matched", summary.counters.matched);
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Every line read ends up in exactly one destination, or is dropped only
//!   when no skip destination is configured.
//! - Per-destination output order is submission order; global order is not
//!   preserved.
//! - A destination that never receives a line never creates its file.
//! - A failing sink releases every producer waiting on it with its error.
//! - The first fatal error is returned only after every writer was flushed.
//!
//! ## Features
//!
//! - `regex` - Regex classifier (enabled by default)
//! - `csv` - CSV column lookup (enabled by default)
//! - `http` - URL status classifier using `reqwest`
//! - `yaml` / `json` / `toml` - Config file formats (`yaml` and `json` by default)
//! - `miette` - Pretty error reporting with miette

pub mod builder;
pub mod classify;
pub mod cli;
pub mod config;
pub mod counters;
pub mod error;
pub mod io;
pub mod line;
pub mod pipeline;
pub mod registry;
pub mod results;
pub mod source;
pub mod worker;
pub mod writer;

// Re-exports for convenience
pub use builder::PipelineBuilder;
pub use classify::{Classifier, FnClassifier, Outcome, classify_fn};
#[cfg(feature = "csv")]
pub use classify::{ColumnSelector, extract_field};
#[cfg(feature = "regex")]
pub use classify::{PatternFile, RegexClassifier};
#[cfg(feature = "http")]
pub use classify::{HttpStatusProbe, StatusClassifier, StatusProbe};
pub use config::{ClassifierConfig, PipelineConfig, PipelineOptions};
pub use counters::{CounterSnapshot, PipelineCounters};
pub use error::{BoxError, ConfigError, PipelineError, Stage};
pub use io::{
    AsyncFileInput, AsyncFileOutput, AsyncInMemorySource, AsyncInputProvider, AsyncOutputTarget,
    AsyncStdinInput, InMemorySink,
};
pub use line::{DestinationKey, Line};
pub use pipeline::{Pipeline, PreparedRun, RunSummary};
pub use registry::WriterRegistry;
pub use results::ResultsDir;
pub use source::LineSource;
pub use worker::WorkerPool;
pub use writer::{DestinationWriter, WriteSummary, WriterOptions};

// Miette re-exports
#[cfg(feature = "miette")]
pub use error::PipelineDiagnostic;

/// Load a config file and run the pipeline it describes.
///
/// The classifier is built after the header line (if any) has been read, so
/// a CSV column may be selected by name.
pub async fn run_config(config: &PipelineConfig) -> Result<RunSummary, PipelineError> {
    let pipeline = PipelineBuilder::from_config(config).build()?;
    let prepared = pipeline.prepare().await?;
    let classifier = config.classifier.build(prepared.header()).await?;
    prepared.run(classifier.as_ref()).await
}
