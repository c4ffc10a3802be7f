//! Lazily populated map from destination key to its writer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;

use crate::error::PipelineError;
use crate::io::AsyncOutputTarget;
use crate::results::ResultsDir;
use crate::writer::{DestinationWriter, WriteSummary, WriterOptions};

/// Derives the sink for a destination key.
pub type SinkFactory = Arc<dyn Fn(&str) -> Arc<dyn AsyncOutputTarget> + Send + Sync>;

/// One [`DestinationWriter`] per distinct key, created on first reference.
///
/// Creation happens under a short synchronous lock that is never held across
/// an `.await`, so concurrent callers asking for the same key always get the
/// same instance and the sink factory runs at most once per key.
pub struct WriterRegistry {
    writers: Mutex<HashMap<String, Arc<DestinationWriter>>>,
    factory: SinkFactory,
    options: WriterOptions,
}

impl std::fmt::Debug for WriterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterRegistry")
            .field("keys", &self.keys())
            .field("options", &self.options)
            .finish()
    }
}

impl WriterRegistry {
    pub fn new<F>(factory: F, options: WriterOptions) -> Self
    where
        F: Fn(&str) -> Arc<dyn AsyncOutputTarget> + Send + Sync + 'static,
    {
        Self::with_factory(Arc::new(factory), options)
    }

    pub fn with_factory(factory: SinkFactory, options: WriterOptions) -> Self {
        Self {
            writers: Mutex::new(HashMap::new()),
            factory,
            options,
        }
    }

    /// Registry writing `<dir>/<key>.<ext>` files.
    pub fn in_results_dir(dir: ResultsDir, options: WriterOptions) -> Self {
        Self::new(move |key| dir.target_for(key), options)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<DestinationWriter>>> {
        self.writers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the writer for `key`, creating it with `sink_factory` if absent.
    pub fn get_or_create<F>(&self, key: &str, sink_factory: F) -> Arc<DestinationWriter>
    where
        F: FnOnce(&str) -> Arc<dyn AsyncOutputTarget>,
    {
        let mut writers = self.lock();
        if let Some(writer) = writers.get(key) {
            return writer.clone();
        }

        let target = sink_factory(key);
        let writer = Arc::new(DestinationWriter::new(key, target, &self.options));
        writers.insert(key.to_string(), writer.clone());
        writer
    }

    /// Return the writer for `key` using the registry's default factory.
    pub fn writer(&self, key: &str) -> Arc<DestinationWriter> {
        let factory = self.factory.clone();
        self.get_or_create(key, move |k| factory(k))
    }

    /// Eagerly create a well-known writer. Its sink still opens only when a
    /// line arrives.
    pub fn register(&self, key: &str) -> Arc<DestinationWriter> {
        self.writer(key)
    }

    pub fn get(&self, key: &str) -> Option<Arc<DestinationWriter>> {
        self.lock().get(key).cloned()
    }

    /// Known keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Complete every writer concurrently, returning each result in key
    /// order. Writers that fail do not prevent the others from flushing.
    pub async fn complete_all(&self) -> Vec<Result<WriteSummary, PipelineError>> {
        let mut writers: Vec<Arc<DestinationWriter>> = self.lock().values().cloned().collect();
        writers.sort_by(|a, b| a.key().cmp(b.key()));

        join_all(writers.iter().map(|w| w.complete())).await
    }
}
