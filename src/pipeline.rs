//! Pipeline coordinator: wires source, workers and writers, and drives a
//! strictly staged shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::builder::PipelineBuilder;
use crate::classify::Classifier;
use crate::config::PipelineOptions;
use crate::counters::{CounterSnapshot, PipelineCounters};
use crate::error::{PipelineError, Stage};
use crate::io::AsyncInputProvider;
use crate::registry::{SinkFactory, WriterRegistry};
use crate::results::ResultsDir;
use crate::source::LineSource;
use crate::worker::WorkerPool;
use crate::writer::{WriteSummary, WriterOptions};

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub counters: CounterSnapshot,
    pub elapsed: Duration,
    /// Every destination writer, in key order
    pub destinations: Vec<WriteSummary>,
}

impl RunSummary {
    /// Summary of the destination named `key`, if it was ever referenced.
    pub fn destination(&self, key: &str) -> Option<&WriteSummary> {
        self.destinations.iter().find(|d| d.key == key)
    }

    /// Destinations whose sink was actually created.
    pub fn opened(&self) -> impl Iterator<Item = &WriteSummary> {
        self.destinations.iter().filter(|d| d.opened)
    }
}

/// A configured pipeline. Build one with [`Pipeline::builder`].
pub struct Pipeline {
    pub(crate) input: Arc<dyn AsyncInputProvider>,
    pub(crate) results: Option<ResultsDir>,
    pub(crate) factory: SinkFactory,
    pub(crate) options: PipelineOptions,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("input", &self.input.id())
            .field("results", &self.results)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn results(&self) -> Option<&ResultsDir> {
        self.results.as_ref()
    }

    /// Clear the results directory, open the input and read the header line.
    ///
    /// The returned run exposes the header so a classifier that depends on it
    /// (a CSV column looked up by name) can be built before any line flows.
    pub async fn prepare(&self) -> Result<PreparedRun, PipelineError> {
        let started = Instant::now();

        if self.options.clear_results
            && let Some(dir) = &self.results
        {
            let removed = dir.prepare().await.map_err(|e| {
                PipelineError::new(Stage::Config, dir.path().display().to_string(), e)
            })?;
            if removed > 0 {
                info!(dir = %dir.path().display(), removed, "cleared previous results");
            }
        }

        let mut source = LineSource::open(self.input.clone()).await?;
        let header = if self.options.has_header {
            source.read_header().await?
        } else {
            None
        };

        Ok(PreparedRun {
            source,
            header,
            factory: self.factory.clone(),
            options: self.options.clone(),
            started,
        })
    }

    /// Prepare and run in one step.
    pub async fn run<C>(&self, classifier: &C) -> Result<RunSummary, PipelineError>
    where
        C: Classifier + ?Sized,
    {
        self.prepare().await?.run(classifier).await
    }
}

/// A pipeline whose input is open and whose header (if any) has been read.
pub struct PreparedRun {
    source: LineSource,
    header: Option<String>,
    factory: SinkFactory,
    options: PipelineOptions,
    started: Instant,
}

impl std::fmt::Debug for PreparedRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedRun")
            .field("source", &self.source)
            .field("header", &self.header)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl PreparedRun {
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    /// Run every line through `classifier` and route it to its destination.
    ///
    /// Writers are completed only after the worker stage has returned, so no
    /// queue is closed while a worker may still submit to it. Every writer is
    /// flushed even when the run failed; the first fatal error is returned
    /// afterwards, preferring stage errors over source errors over writer
    /// errors.
    pub async fn run<C>(self, classifier: &C) -> Result<RunSummary, PipelineError>
    where
        C: Classifier + ?Sized,
    {
        let PreparedRun {
            source,
            header,
            factory,
            options,
            started,
        } = self;

        let counters = Arc::new(PipelineCounters::new());
        let writer_options = WriterOptions::new(options.writer_capacity)
            .with_header(header.as_deref().map(Arc::from));
        let registry = WriterRegistry::with_factory(factory, writer_options);
        if let Some(key) = &options.skip_key {
            registry.register(key);
        }

        let input_id = source.id().to_string();
        let (queue_tx, queue_rx) = mpsc::channel(options.input_capacity.max(1));
        let source_task = source
            .with_progress_interval(options.progress_interval)
            .spawn(queue_tx, counters.clone());

        let workers = WorkerPool::new(options.concurrency)
            .with_skip_key(options.skip_key.clone())
            .with_progress_interval(options.progress_interval);

        info!(
            input = %input_id,
            concurrency = workers.concurrency(),
            header = header.is_some(),
            "pipeline started"
        );

        let stage_result = workers
            .run(queue_rx, classifier, &registry, &counters)
            .await;

        let source_result = if stage_result.is_ok() {
            match source_task.await {
                Ok(result) => result.map(|_| ()),
                Err(e) => Err(PipelineError::read(input_id.clone(), e)),
            }
        } else {
            source_task.abort();
            Ok(())
        };

        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            "input processing finished, completing destinations"
        );

        let mut destinations = Vec::new();
        let mut errors = Vec::new();
        errors.extend(stage_result.err());
        errors.extend(source_result.err());
        for result in registry.complete_all().await {
            match result {
                Ok(summary) => destinations.push(summary),
                Err(e) => errors.push(e),
            }
        }

        let counters = counters.snapshot();
        let elapsed = started.elapsed();

        let mut errors = errors.into_iter();
        if let Some(first) = errors.next() {
            for other in errors {
                warn!(error = %other, "additional pipeline error");
            }
            error!(
                error = %first,
                read = counters.read,
                processed = counters.processed,
                "pipeline failed"
            );
            return Err(first);
        }

        info!(
            elapsed_secs = elapsed.as_secs_f64(),
            read = counters.read,
            processed = counters.processed,
            matched = counters.matched,
            skipped = counters.skipped,
            destinations = destinations.iter().filter(|d| d.opened).count(),
            "pipeline complete"
        );

        Ok(RunSummary {
            counters,
            elapsed,
            destinations,
        })
    }
}
