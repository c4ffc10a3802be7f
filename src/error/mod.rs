//! Error types for lineroute pipelines.
//!
//! This module provides:
//! - `Stage`: Indicates where an error occurred in the pipeline
//! - `PipelineError`: A single fatal error with context
//! - `ConfigError`: Problems detected before a pipeline starts

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Boxed error type accepted from classifiers and other collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Invalid configuration detected before the run started
    Config,
    /// Error while reading the input stream
    Read,
    /// The injected classifier failed on a line
    Classify,
    /// Error while opening, writing or flushing a destination sink
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "Config"),
            Stage::Read => write!(f, "Read"),
            Stage::Classify => write!(f, "Classify"),
            Stage::Write => write!(f, "Write"),
        }
    }
}

/// A fatal pipeline error.
///
/// The underlying error is reference counted: a faulted writer hands the same
/// error to every producer blocked on it and to every caller awaiting its
/// completion.
#[derive(Debug, Clone)]
pub struct PipelineError {
    /// Stage where the error occurred
    pub stage: Stage,
    /// Identifier of the target (input id, destination key, line number, ...)
    pub target: String,
    /// The underlying error
    pub error: Arc<dyn std::error::Error + Send + Sync>,
}

impl PipelineError {
    pub fn new(
        stage: Stage,
        target: impl Into<String>,
        error: impl Into<BoxError>,
    ) -> Self {
        Self {
            stage,
            target: target.into(),
            error: Arc::from(error.into()),
        }
    }

    pub fn read(target: impl Into<String>, error: impl Into<BoxError>) -> Self {
        Self::new(Stage::Read, target, error)
    }

    pub fn classify(target: impl Into<String>, error: impl Into<BoxError>) -> Self {
        Self::new(Stage::Classify, target, error)
    }

    pub fn write(target: impl Into<String>, error: impl Into<BoxError>) -> Self {
        Self::new(Stage::Write, target, error)
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.target, self.error)
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Errors surfaced before any line is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("column '{0}' not found in header")]
    ColumnNotFound(String),

    #[error("input has no header line")]
    MissingHeader,

    #[error("invalid pattern #{index} '{pattern}': {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: BoxError,
    },

    #[error("no patterns were supplied")]
    NoPatterns,

    #[error("cannot read '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported config format '{0}'")]
    UnsupportedFormat(String),

    #[error("failed to parse config: {0}")]
    Parse(#[source] BoxError),

    #[error("feature '{0}' is not enabled")]
    NotEnabled(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("concurrency and queue capacities must be at least 1")]
    ZeroCapacity,
}

impl From<ConfigError> for PipelineError {
    fn from(error: ConfigError) -> Self {
        PipelineError::new(Stage::Config, "config", error)
    }
}

#[cfg(feature = "miette")]
mod miette_impl;

#[cfg(feature = "miette")]
pub use miette_impl::*;
