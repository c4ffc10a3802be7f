use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::classify::status_key;
use crate::error::BoxError;
use crate::{Classifier, Line, Outcome, StatusClassifier, StatusProbe};

/// Answers from a fixed table and records every requested URL.
#[derive(Clone, Default)]
struct TableProbe {
    requested: Arc<Mutex<Vec<String>>>,
}

impl TableProbe {
    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatusProbe for TableProbe {
    async fn status(&self, url: &str) -> Result<u16, BoxError> {
        self.requested.lock().unwrap().push(url.to_string());
        match url {
            u if u.ends_with("/missing") => Ok(404),
            u if u.ends_with("/down") => Err("connection refused".into()),
            _ => Ok(200),
        }
    }
}

#[test]
fn status_keys_name_the_reason() {
    assert_eq!(status_key(404), "404-NotFound");
    assert_eq!(status_key(200), "200-OK");
    assert_eq!(status_key(500), "500-InternalServerError");
    assert_eq!(status_key(413), "413-PayloadTooLarge");
    assert_eq!(status_key(599), "599-599");
    assert_eq!(status_key(299), "299-299");
}

#[tokio::test]
async fn routes_whole_line_by_status() {
    let probe = TableProbe::default();
    let classifier =
        StatusClassifier::new(probe.clone(), 1).with_prefix(Some("https://site.test".into()));

    let out = classifier
        .classify(&Line::new(0, "a,https://x.test/missing,z"))
        .await
        .unwrap();
    assert_eq!(out, Outcome::route("404-NotFound", "a,https://x.test/missing,z"));

    let out = classifier.classify(&Line::new(1, "b,/page")).await.unwrap();
    assert_eq!(out, Outcome::route("200-OK", "b,/page"));

    assert_eq!(
        probe.requested(),
        vec!["https://x.test/missing", "https://site.test/page"]
    );
}

#[tokio::test]
async fn missing_or_relative_urls_are_skipped_without_requests() {
    let probe = TableProbe::default();
    let classifier = StatusClassifier::new(probe.clone(), 1);

    for text in ["only-one-field", "a,", "a,/relative"] {
        let out = classifier.classify(&Line::new(0, text)).await.unwrap();
        assert_eq!(out, Outcome::Skip, "{text}");
    }
    assert!(probe.requested().is_empty());

    let blank_prefix = StatusClassifier::new(TableProbe::default(), 0)
        .with_prefix(Some("  ".into()));
    assert!(blank_prefix.url_for("/x").is_none());
}

#[tokio::test]
async fn probe_failure_is_a_classify_error() {
    let classifier = StatusClassifier::new(TableProbe::default(), 0);
    let err = classifier
        .classify(&Line::new(0, "https://x.test/down"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}
