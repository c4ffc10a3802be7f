//! Miette integration for pretty error reporting.

use miette::{Diagnostic, Severity};
use thiserror::Error;

use super::{PipelineError, Stage};

/// A diagnostic wrapper for pipeline errors compatible with miette.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
pub struct PipelineDiagnostic {
    /// The error message
    pub message: String,

    #[source]
    /// The underlying error source
    pub source: Option<PipelineError>,

    #[help]
    /// Help text for the user
    pub help: Option<String>,

    #[diagnostic(severity)]
    /// Severity level
    pub severity: Severity,
}

fn help_for(stage: Stage) -> &'static str {
    match stage {
        Stage::Config => "Check the input column, pattern file and command-line arguments",
        Stage::Read => "The input stream failed mid-run; output files hold the lines routed so far",
        Stage::Classify => "A line could not be classified; the run was stopped without retrying",
        Stage::Write => "A destination file could not be written; check the results directory",
    }
}

impl From<PipelineError> for PipelineDiagnostic {
    fn from(e: PipelineError) -> Self {
        PipelineDiagnostic {
            message: format!("[{}] on '{}'", e.stage, e.target),
            help: Some(help_for(e.stage).into()),
            source: Some(e),
            severity: Severity::Error,
        }
    }
}

impl From<PipelineError> for miette::Report {
    fn from(e: PipelineError) -> Self {
        miette::Report::new(PipelineDiagnostic::from(e))
    }
}
