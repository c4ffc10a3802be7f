//! In-memory I/O implementations for testing and embedding.

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use super::{AsyncInputProvider, AsyncOutputTarget};

/// In-memory line source.
#[derive(Debug, Clone)]
pub struct AsyncInMemorySource {
    id: String,
    data: Arc<Vec<u8>>,
}

impl AsyncInMemorySource {
    pub fn new(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            data: Arc::new(data),
        }
    }

    pub fn from_string(id: impl Into<String>, data: impl Into<String>) -> Self {
        Self::new(id, data.into().into_bytes())
    }

    /// Build a source from individual lines, each terminated by `\n`.
    pub fn from_lines<I, S>(id: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut data = String::new();
        for line in lines {
            data.push_str(line.as_ref());
            data.push('\n');
        }
        Self::from_string(id, data)
    }
}

#[async_trait]
impl AsyncInputProvider for AsyncInMemorySource {
    fn id(&self) -> &str {
        &self.id
    }

    async fn open(&self) -> io::Result<Box<dyn AsyncRead + Unpin + Send>> {
        Ok(Box::new(Cursor::new(self.data.as_ref().clone())))
    }

    async fn len_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// In-memory output sink.
///
/// Clones share the same buffer, so a test can keep one handle and give the
/// other to a destination writer. Every open is counted.
#[derive(Debug, Clone)]
pub struct InMemorySink {
    id: String,
    buf: Arc<Mutex<Vec<u8>>>,
    opens: Arc<AtomicUsize>,
}

impl InMemorySink {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buf: Arc::new(Mutex::new(Vec::new())),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn contents(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub fn contents_string(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    /// Contents split into lines, without terminators.
    pub fn lines(&self) -> Vec<String> {
        self.contents_string().lines().map(str::to_owned).collect()
    }

    /// Number of times the sink has been opened.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn was_opened(&self) -> bool {
        self.open_count() > 0
    }

    fn handle(&self) -> Box<dyn AsyncWrite + Unpin + Send> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        Box::new(InMemoryWriteHandle {
            buf: self.buf.clone(),
        })
    }
}

#[async_trait]
impl AsyncOutputTarget for InMemorySink {
    fn id(&self) -> &str {
        &self.id
    }

    async fn open_overwrite(&self) -> io::Result<Box<dyn AsyncWrite + Unpin + Send>> {
        self.lock().clear();
        Ok(self.handle())
    }
}

/// Write handle for in-memory sink.
struct InMemoryWriteHandle {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl AsyncWrite for InMemoryWriteHandle {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(data);
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
