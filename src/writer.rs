//! Per-destination writer serializing lines from many producers into one sink.
//!
//! Every writer owns a bounded queue drained by exactly one spawned task. That
//! task performs one write per dequeued line, in dequeue order, so lines sent
//! to the same destination are never reordered or interleaved. The sink is
//! opened by the drain task when the first line arrives; a destination that
//! never receives a line never creates its output.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::PipelineError;
use crate::io::AsyncOutputTarget;

/// Default capacity of a writer's queue.
pub const DEFAULT_WRITER_CAPACITY: usize = 100;

/// Settings shared by every writer of a run.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Lines that may wait in the queue before `submit` suspends
    pub capacity: usize,
    /// Line written first into every sink that gets opened
    pub header: Option<Arc<str>>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WRITER_CAPACITY,
            header: None,
        }
    }
}

impl WriterOptions {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            header: None,
        }
    }

    pub fn with_header(mut self, header: Option<Arc<str>>) -> Self {
        self.header = header;
        self
    }
}

/// Final state of a completed writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub key: String,
    pub target: String,
    /// Submitted lines written (the header is not counted)
    pub lines: u64,
    /// Whether the sink was ever opened
    pub opened: bool,
}

type Completion = Shared<BoxFuture<'static, Result<WriteSummary, PipelineError>>>;

/// Binds one destination key to one output sink.
pub struct DestinationWriter {
    key: String,
    target_id: String,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    fault: Arc<OnceLock<PipelineError>>,
    completion: Completion,
}

impl std::fmt::Debug for DestinationWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationWriter")
            .field("key", &self.key)
            .field("target", &self.target_id)
            .field("faulted", &self.is_faulted())
            .finish()
    }
}

impl DestinationWriter {
    /// Create a writer and spawn its drain task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        key: impl Into<String>,
        target: Arc<dyn AsyncOutputTarget>,
        options: &WriterOptions,
    ) -> Self {
        let key = key.into();
        let target_id = target.id().to_string();
        let (tx, rx) = mpsc::channel(options.capacity.max(1));
        let fault = Arc::new(OnceLock::new());

        let drain = Drain {
            key: key.clone(),
            target,
            header: options.header.clone(),
            sink: None,
            lines: 0,
        };
        let handle = tokio::spawn(drain.run(rx, fault.clone()));

        let join_key = key.clone();
        let completion = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(PipelineError::write(join_key, e)),
            }
        }
        .boxed()
        .shared();

        Self {
            key,
            target_id,
            sender: Mutex::new(Some(tx)),
            fault,
            completion,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Whether a write to the sink has failed.
    pub fn is_faulted(&self) -> bool {
        self.fault.get().is_some()
    }

    fn sender(&self) -> Option<mpsc::Sender<String>> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn closed_error(&self) -> PipelineError {
        match self.fault.get() {
            Some(e) => e.clone(),
            None => PipelineError::write(self.key.clone(), "destination writer is closed"),
        }
    }

    /// Queue one line for this destination.
    ///
    /// Suspends while the queue is full. Fails with the writer's first error
    /// once its sink has failed, including for callers already suspended.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), PipelineError> {
        let sender = self.sender().ok_or_else(|| self.closed_error())?;
        sender
            .send(text.into())
            .await
            .map_err(|_| self.closed_error())
    }

    /// Future resolving once the sink is flushed and closed, without closing
    /// the queue.
    pub fn completion(&self) -> Completion {
        self.completion.clone()
    }

    /// Signal that no more lines will be submitted and wait for the sink to be
    /// flushed and closed. Calling it again returns the same result.
    pub async fn complete(&self) -> Result<WriteSummary, PipelineError> {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.completion.clone().await
    }
}

/// State owned by the single drain task.
struct Drain {
    key: String,
    target: Arc<dyn AsyncOutputTarget>,
    header: Option<Arc<str>>,
    sink: Option<BufWriter<Box<dyn AsyncWrite + Unpin + Send>>>,
    lines: u64,
}

impl Drain {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<String>,
        fault: Arc<OnceLock<PipelineError>>,
    ) -> Result<WriteSummary, PipelineError> {
        match self.drain(&mut rx).await {
            Ok(()) => {
                debug!(
                    destination = %self.key,
                    lines = self.lines,
                    opened = self.sink.is_some(),
                    "destination complete"
                );
                Ok(WriteSummary {
                    key: self.key,
                    target: self.target.id().to_string(),
                    lines: self.lines,
                    opened: self.sink.is_some(),
                })
            }
            Err(e) => {
                let err = PipelineError::write(self.key.clone(), e);
                let _ = fault.set(err.clone());
                // Release producers suspended on a full queue.
                rx.close();
                drop(rx);
                if let Some(sink) = self.sink.as_mut() {
                    let _ = sink.flush().await;
                }
                error!(destination = %self.key, error = %err, "destination writer failed");
                Err(err)
            }
        }
    }

    async fn drain(&mut self, rx: &mut mpsc::Receiver<String>) -> std::io::Result<()> {
        while let Some(text) = rx.recv().await {
            if self.sink.is_none() {
                let opened =
                    open_sink(self.key.clone(), self.target.clone(), self.header.clone()).await?;
                self.sink = Some(opened);
            }
            if let Some(sink) = self.sink.as_mut() {
                sink.write_all(text.as_bytes()).await?;
                sink.write_all(b"\n").await?;
                self.lines += 1;
            }
        }

        if let Some(sink) = self.sink.as_mut() {
            sink.flush().await?;
            sink.shutdown().await?;
        }
        Ok(())
    }
}

/// Open `target` and write the header, if any.
///
/// Arguments are owned: the drain future must stay `Send`, and borrowing
/// `Drain` across this await would require `Drain: Sync`.
async fn open_sink(
    key: String,
    target: Arc<dyn AsyncOutputTarget>,
    header: Option<Arc<str>>,
) -> std::io::Result<BufWriter<Box<dyn AsyncWrite + Unpin + Send>>> {
    debug!(destination = %key, target = %target.id(), "opening destination");
    let mut sink = BufWriter::new(target.open_overwrite().await?);
    if let Some(header) = header {
        sink.write_all(header.as_bytes()).await?;
        sink.write_all(b"\n").await?;
    }
    Ok(sink)
}
