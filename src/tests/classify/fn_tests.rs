use std::sync::Arc;

use crate::{Classifier, Line, Outcome, classify_fn};

#[tokio::test]
async fn closure_classifier_sees_the_line() {
    let classifier = classify_fn(|line: Line| async move {
        Ok(if line.seq() == 0 {
            Outcome::route("first", line.text().to_uppercase())
        } else {
            Outcome::Skip
        })
    });

    let first = classifier.classify(&Line::new(0, "abc")).await.unwrap();
    assert_eq!(first, Outcome::route("first", "ABC"));

    let shared: Arc<dyn Classifier> = Arc::new(classifier);
    assert_eq!(shared.classify(&Line::new(1, "x")).await.unwrap(), Outcome::Skip);
}
