//! Per-line classification strategies.
//!
//! This module provides:
//! - `Classifier`: The injected decision function of a pipeline
//! - `Outcome`: Route a line to a destination or skip it
//! - `classify_fn`: Adapter turning an async closure into a classifier
//! - `RegexClassifier`: Ordered regex rules with optional capture extraction
//! - `StatusClassifier`: Route CSV rows by the HTTP status of a URL column

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;
use crate::line::{DestinationKey, Line};

#[cfg(feature = "csv")]
mod column;
#[cfg(feature = "regex")]
mod pattern;
#[cfg(feature = "http")]
mod status;

#[cfg(feature = "csv")]
pub use column::{ColumnSelector, extract_field};
#[cfg(feature = "regex")]
pub use pattern::{DEFAULT_OUTPUT_GROUP, PatternFile, PatternRule, RegexClassifier};
#[cfg(feature = "http")]
pub use status::{HttpStatusProbe, StatusClassifier, StatusProbe, status_key};

/// Result of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Write `text` to the destination named `key`
    Route { key: DestinationKey, text: String },
    /// No destination matched
    Skip,
}

impl Outcome {
    pub fn route(key: impl Into<DestinationKey>, text: impl Into<String>) -> Self {
        Outcome::Route {
            key: key.into(),
            text: text.into(),
        }
    }
}

/// Decides where a line goes.
///
/// Implementations may suspend (e.g. on a network call). An error is fatal to
/// the whole run and is never retried.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, line: &Line) -> Result<Outcome, BoxError>;
}

#[async_trait]
impl<C: Classifier + ?Sized> Classifier for Arc<C> {
    async fn classify(&self, line: &Line) -> Result<Outcome, BoxError> {
        (**self).classify(line).await
    }
}

/// Classifier backed by an async closure. See [`classify_fn`].
pub struct FnClassifier<F>(F);

impl<F> std::fmt::Debug for FnClassifier<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnClassifier").finish_non_exhaustive()
    }
}

/// Wrap a closure taking an owned [`Line`] as a [`Classifier`].
pub fn classify_fn<F, Fut>(f: F) -> FnClassifier<F>
where
    F: Fn(Line) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Outcome, BoxError>> + Send,
{
    FnClassifier(f)
}

#[async_trait]
impl<F, Fut> Classifier for FnClassifier<F>
where
    F: Fn(Line) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Outcome, BoxError>> + Send,
{
    async fn classify(&self, line: &Line) -> Result<Outcome, BoxError> {
        (self.0)(line.clone()).await
    }
}
