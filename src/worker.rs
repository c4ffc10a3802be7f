//! Classifier stage draining the input queue with bounded concurrency.

use futures::stream::{self, TryStreamExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::classify::{Classifier, Outcome};
use crate::counters::PipelineCounters;
use crate::error::{PipelineError, Stage};
use crate::line::Line;
use crate::registry::WriterRegistry;
use crate::source::LineItem;

/// Default number of lines classified at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Destination for lines the classifier skips, unless configured otherwise.
pub const DEFAULT_SKIP_KEY: &str = "not-matched";

/// Runs the injected classifier over every queued line.
///
/// Up to `concurrency` lines are in flight at once; a new line is only pulled
/// from the queue when one finishes, so the input queue keeps exerting
/// backpressure on the source. Completion order across lines is not
/// preserved, per-destination order is preserved by the writers.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    skip_key: Option<String>,
    progress_interval: u64,
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl WorkerPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            skip_key: Some(DEFAULT_SKIP_KEY.to_string()),
            progress_interval: 0,
        }
    }

    /// Destination for skipped lines; `None` drops them.
    pub fn with_skip_key(mut self, key: Option<String>) -> Self {
        self.skip_key = key;
        self
    }

    /// Log progress every `interval` processed lines; 0 disables it.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn skip_key(&self) -> Option<&str> {
        self.skip_key.as_deref()
    }

    /// Drain `queue` until it is closed and empty.
    ///
    /// Stops at the first classify error or queued read error; the queue is
    /// dropped on return, which stops the source. A failed destination only
    /// loses its own lines: its error is reported when the writer completes.
    pub async fn run<C>(
        &self,
        mut queue: mpsc::Receiver<LineItem>,
        classifier: &C,
        registry: &WriterRegistry,
        counters: &PipelineCounters,
    ) -> Result<(), PipelineError>
    where
        C: Classifier + ?Sized,
    {
        let lines = stream::poll_fn(move |cx| queue.poll_recv(cx));
        lines
            .try_for_each_concurrent(self.concurrency, |line| {
                self.handle(line, classifier, registry, counters)
            })
            .await
    }

    async fn handle<C>(
        &self,
        line: Line,
        classifier: &C,
        registry: &WriterRegistry,
        counters: &PipelineCounters,
    ) -> Result<(), PipelineError>
    where
        C: Classifier + ?Sized,
    {
        let outcome = classifier
            .classify(&line)
            .await
            .map_err(|e| PipelineError::classify(format!("line {}", line.number()), e))?;

        let delivered = match outcome {
            Outcome::Route { key, text } => {
                counters.record_matched();
                registry.writer(&key).submit(text).await
            }
            Outcome::Skip => {
                counters.record_skipped();
                match &self.skip_key {
                    Some(key) => registry.writer(key).submit(line.into_text()).await,
                    None => Ok(()),
                }
            }
        };

        match delivered {
            Ok(()) => {}
            Err(e) if e.stage == Stage::Write => {
                if counters.record_undelivered() == 1 {
                    warn!(error = %e, "destination failed, its remaining lines are dropped");
                }
            }
            Err(e) => return Err(e),
        }

        let processed = counters.record_processed();
        if self.progress_interval > 0 && processed % self.progress_interval == 0 {
            info!(processed, matched = counters.matched(), "lines processed");
        }
        Ok(())
    }
}
