//! Configuration types for pipeline runs.
//!
//! This module provides:
//! - `PipelineOptions`: Typed tuning knobs consumed by the coordinator
//! - `PipelineConfig`: A complete run described in a YAML, JSON or TOML file
//! - `ClassifierConfig`: Which classifier the run uses and how it is set up

mod options;
mod pipeline;

pub use options::PipelineOptions;
pub use pipeline::{ClassifierConfig, ConfigFormat, PipelineConfig};
