use crate::error::ConfigError;
use crate::source::DEFAULT_PROGRESS_INTERVAL;
use crate::worker::{DEFAULT_CONCURRENCY, DEFAULT_SKIP_KEY};
use crate::writer::DEFAULT_WRITER_CAPACITY;

/// Default capacity of the input queue between source and workers.
pub const DEFAULT_INPUT_CAPACITY: usize = 100;

/// Tuning knobs for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Lines buffered between the source and the workers
    pub input_capacity: usize,
    /// Lines buffered per destination writer
    pub writer_capacity: usize,
    /// Lines classified concurrently
    pub concurrency: usize,
    /// Lines between progress reports (0 disables)
    pub progress_interval: u64,
    /// Treat the first input line as a header and copy it into every output
    pub has_header: bool,
    /// Destination for skipped lines; `None` drops them
    pub skip_key: Option<String>,
    /// Delete files left in the results directory before the run
    pub clear_results: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            input_capacity: DEFAULT_INPUT_CAPACITY,
            writer_capacity: DEFAULT_WRITER_CAPACITY,
            concurrency: DEFAULT_CONCURRENCY,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            has_header: false,
            skip_key: Some(DEFAULT_SKIP_KEY.to_string()),
            clear_results: true,
        }
    }
}

impl PipelineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input_capacity(mut self, capacity: usize) -> Self {
        self.input_capacity = capacity;
        self
    }

    pub fn with_writer_capacity(mut self, capacity: usize) -> Self {
        self.writer_capacity = capacity;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    pub fn with_skip_key(mut self, key: Option<String>) -> Self {
        self.skip_key = key;
        self
    }

    pub fn with_clear_results(mut self, clear: bool) -> Self {
        self.clear_results = clear;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input_capacity == 0 || self.writer_capacity == 0 || self.concurrency == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}
