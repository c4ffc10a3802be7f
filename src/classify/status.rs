//! Route CSV rows by the HTTP status returned for a URL column.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{Classifier, Outcome, extract_field};
use crate::error::BoxError;
use crate::line::Line;

/// Issues the outbound request whose status code becomes the destination.
#[async_trait]
pub trait StatusProbe: Send + Sync {
    async fn status(&self, url: &str) -> Result<u16, BoxError>;
}

/// `HEAD` request through a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpStatusProbe {
    client: reqwest::Client,
}

impl HttpStatusProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, BoxError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProbe for HttpStatusProbe {
    async fn status(&self, url: &str) -> Result<u16, BoxError> {
        let response = self.client.head(url).send().await?;
        Ok(response.status().as_u16())
    }
}

/// Destination key for a status code: the number followed by its reason
/// phrase without spaces, e.g. `404-NotFound`. Codes without a known reason
/// repeat the number, e.g. `599-599`.
pub fn status_key(code: u16) -> String {
    let reason = StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason());
    match reason {
        Some(reason) => {
            let name: String = reason
                .split(|c: char| c == ' ' || c == '-')
                .filter(|w| !w.is_empty())
                .collect();
            format!("{code}-{name}")
        }
        None => format!("{code}-{code}"),
    }
}

/// Reads a URL from a CSV column and routes the whole line by its status.
///
/// Root-relative URLs (`/path`) are joined to the configured prefix. A line
/// whose column is missing or empty, or whose URL is relative with no prefix,
/// is skipped without a request.
pub struct StatusClassifier<P = HttpStatusProbe> {
    probe: P,
    column: usize,
    prefix: Option<String>,
}

impl<P> std::fmt::Debug for StatusClassifier<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusClassifier")
            .field("column", &self.column)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl StatusClassifier<HttpStatusProbe> {
    pub fn http(column: usize) -> Self {
        Self::new(HttpStatusProbe::new(), column)
    }
}

impl<P: StatusProbe> StatusClassifier<P> {
    pub fn new(probe: P, column: usize) -> Self {
        Self {
            probe,
            column,
            prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: Option<String>) -> Self {
        self.prefix = prefix.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// URL to probe for `text`, or `None` if the line should be skipped.
    pub fn url_for(&self, text: &str) -> Option<String> {
        let url = extract_field(text, self.column)?;
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        if url.starts_with('/') {
            let prefix = self.prefix.as_deref()?;
            return Some(format!("{prefix}{url}"));
        }
        Some(url.to_string())
    }
}

#[async_trait]
impl<P: StatusProbe> Classifier for StatusClassifier<P> {
    async fn classify(&self, line: &Line) -> Result<Outcome, BoxError> {
        let Some(url) = self.url_for(line.text()) else {
            return Ok(Outcome::Skip);
        };
        let code = self.probe.status(&url).await?;
        Ok(Outcome::route(status_key(code), line.text()))
    }
}
