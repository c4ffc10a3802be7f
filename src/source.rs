//! Sequential line source feeding the bounded input queue.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::counters::PipelineCounters;
use crate::error::PipelineError;
use crate::io::AsyncInputProvider;
use crate::line::Line;

/// Item carried by the input queue. An `Err` closes the queue with that error.
pub type LineItem = Result<Line, PipelineError>;

/// Default number of lines between progress reports.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1000;

/// Reads an input stream strictly sequentially, one line at a time.
pub struct LineSource {
    id: String,
    reader: BufReader<Box<dyn AsyncRead + Unpin + Send>>,
    total_bytes: Option<u64>,
    consumed: u64,
    next_seq: u64,
    progress_interval: u64,
    buf: String,
}

impl std::fmt::Debug for LineSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource")
            .field("id", &self.id)
            .field("total_bytes", &self.total_bytes)
            .field("consumed", &self.consumed)
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl LineSource {
    /// Open the provider's stream and capture its length hint.
    pub async fn open(provider: Arc<dyn AsyncInputProvider>) -> Result<Self, PipelineError> {
        let id = provider.id().to_string();
        let reader = provider
            .open()
            .await
            .map_err(|e| PipelineError::read(id.clone(), e))?;
        let total_bytes = provider.len_hint().await;

        Ok(Self {
            id,
            reader: BufReader::new(reader),
            total_bytes,
            consumed: 0,
            next_seq: 0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            buf: String::new(),
        })
    }

    /// Report progress every `interval` lines; 0 disables reporting.
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Bytes left to read, when the total length is known.
    ///
    /// Never increases between calls.
    pub fn bytes_remaining(&self) -> Option<u64> {
        self.total_bytes
            .map(|total| total.saturating_sub(self.consumed))
    }

    /// Number of records produced so far (the header is not counted).
    pub fn lines_produced(&self) -> u64 {
        self.next_seq
    }

    async fn read_raw(&mut self) -> Result<Option<String>, PipelineError> {
        self.buf.clear();
        let n = self
            .reader
            .read_line(&mut self.buf)
            .await
            .map_err(|e| PipelineError::read(self.id.clone(), e))?;
        if n == 0 {
            return Ok(None);
        }
        self.consumed += n as u64;

        let mut text = std::mem::take(&mut self.buf);
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        }
        Ok(Some(text))
    }

    /// Consume the first line as a header. Must be called before any record
    /// is read.
    pub async fn read_header(&mut self) -> Result<Option<String>, PipelineError> {
        debug_assert_eq!(self.next_seq, 0, "header must be read first");
        self.read_raw().await
    }

    /// Read the next record, or `None` at end of stream.
    pub async fn next_line(&mut self) -> Result<Option<Line>, PipelineError> {
        let Some(text) = self.read_raw().await? else {
            return Ok(None);
        };

        let line = Line::new(self.next_seq, text);
        self.next_seq += 1;

        if self.progress_interval > 0 && self.next_seq % self.progress_interval == 0 {
            info!(
                input = %self.id,
                lines = self.next_seq,
                bytes_remaining = ?self.bytes_remaining(),
                "reading input"
            );
        }

        Ok(Some(line))
    }

    /// Turn the source into a lazy, finite stream of lines.
    pub fn into_lines(self) -> BoxStream<'static, LineItem> {
        stream::try_unfold(self, |mut source| async move {
            Ok(source.next_line().await?.map(|line| (line, source)))
        })
        .boxed()
    }

    /// Push every line into `queue`, suspending while the queue is full.
    ///
    /// Returns the number of lines pushed. On a read error the error is sent
    /// down the queue before returning it. If every receiver is gone the
    /// source stops early without error; the consumer side owns that failure.
    pub async fn run(
        mut self,
        queue: mpsc::Sender<LineItem>,
        counters: Arc<PipelineCounters>,
    ) -> Result<u64, PipelineError> {
        loop {
            match self.next_line().await {
                Ok(Some(line)) => {
                    if queue.send(Ok(line)).await.is_err() {
                        debug!(input = %self.id, "line queue closed by consumers, stopping source");
                        return Ok(self.next_seq);
                    }
                    counters.record_read();
                }
                Ok(None) => {
                    debug!(input = %self.id, lines = self.next_seq, "end of input");
                    return Ok(self.next_seq);
                }
                Err(e) => {
                    let _ = queue.send(Err(e.clone())).await;
                    return Err(e);
                }
            }
        }
    }

    /// Run the source as its own task.
    pub fn spawn(
        self,
        queue: mpsc::Sender<LineItem>,
        counters: Arc<PipelineCounters>,
    ) -> JoinHandle<Result<u64, PipelineError>> {
        tokio::spawn(self.run(queue, counters))
    }
}
