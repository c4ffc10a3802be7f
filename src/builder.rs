//! Builder for creating [`Pipeline`] instances.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{PipelineConfig, PipelineOptions};
use crate::error::ConfigError;
use crate::io::{AsyncFileInput, AsyncInputProvider, AsyncOutputTarget, AsyncStdinInput};
use crate::pipeline::Pipeline;
use crate::registry::SinkFactory;
use crate::results::ResultsDir;

/// Builder for creating [`Pipeline`] instances.
#[derive(Default)]
pub struct PipelineBuilder {
    input: Option<Arc<dyn AsyncInputProvider>>,
    results: Option<ResultsDir>,
    factory: Option<SinkFactory>,
    options: PipelineOptions,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("input", &self.input.as_ref().map(|i| i.id().to_string()))
            .field("results", &self.results)
            .field("custom_sinks", &self.factory.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read from a file path, or from stdin when `raw` is "-".
    pub fn input(mut self, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let provider: Arc<dyn AsyncInputProvider> = if raw == "-" {
            Arc::new(AsyncStdinInput::new())
        } else {
            Arc::new(AsyncFileInput::new(PathBuf::from(raw)))
        };
        self.input = Some(provider);
        self
    }

    /// Read from a pre-built input provider.
    pub fn input_provider(mut self, provider: Arc<dyn AsyncInputProvider>) -> Self {
        self.input = Some(provider);
        self
    }

    /// Write one file per destination into `dir`.
    pub fn results_dir(mut self, dir: ResultsDir) -> Self {
        self.results = Some(dir);
        self
    }

    /// Derive destination sinks with a custom factory instead of the results
    /// directory.
    pub fn sink_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Arc<dyn AsyncOutputTarget> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.options.concurrency = concurrency;
        self
    }

    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.options.input_capacity = capacity;
        self
    }

    pub fn with_writer_capacity(mut self, capacity: usize) -> Self {
        self.options.writer_capacity = capacity;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.options.has_header = has_header;
        self
    }

    pub fn with_skip_key(mut self, key: Option<String>) -> Self {
        self.options.skip_key = key;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.options.progress_interval = interval;
        self
    }

    pub fn with_clear_results(mut self, clear: bool) -> Self {
        self.options.clear_results = clear;
        self
    }

    /// Create a builder from a pipeline configuration.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new()
            .input(config.input.clone())
            .results_dir(config.results())
            .with_options(config.options())
    }

    /// Build the pipeline from the current configuration.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        self.options.validate()?;

        let input = self
            .input
            .ok_or_else(|| ConfigError::InvalidArgument("no input configured".into()))?;

        let factory: SinkFactory = match (self.factory, &self.results) {
            (Some(factory), _) => factory,
            (None, Some(dir)) => {
                let dir = dir.clone();
                Arc::new(move |key: &str| dir.target_for(key))
            }
            (None, None) => {
                return Err(ConfigError::InvalidArgument(
                    "no results directory or sink factory configured".into(),
                ));
            }
        };

        Ok(Pipeline {
            input,
            results: self.results,
            factory,
            options: self.options,
        })
    }
}
