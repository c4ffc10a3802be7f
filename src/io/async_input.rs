//! Async input provider trait definition.

use std::fmt::Debug;

use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Trait for asynchronous input providers.
#[async_trait]
pub trait AsyncInputProvider: Send + Sync + Debug {
    /// Returns a unique identifier for this input source.
    ///
    /// Convention: "-" for stdin, file path for files.
    fn id(&self) -> &str;

    /// Open and return a new async readable stream.
    async fn open(&self) -> std::io::Result<Box<dyn AsyncRead + Unpin + Send>>;

    /// Total length of the stream in bytes, when known up front.
    ///
    /// Used only for "bytes remaining" progress reporting.
    async fn len_hint(&self) -> Option<u64> {
        None
    }
}
