use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{BoxError, ConfigError, Stage};
use crate::tests::support::{BrokenSink, MemorySinks};
use crate::{
    AsyncInMemorySource, AsyncOutputTarget, Line, Outcome, Pipeline, ResultsDir, classify_fn,
};

fn memory_input(lines: &[&str]) -> Arc<AsyncInMemorySource> {
    Arc::new(AsyncInMemorySource::from_lines("input", lines))
}

async fn read_lines(path: impl AsRef<std::path::Path>) -> Vec<String> {
    tokio::fs::read_to_string(path)
        .await
        .expect("read result file")
        .lines()
        .map(str::to_owned)
        .collect()
}

async fn file_names(dir: &std::path::Path) -> Vec<String> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    names
}

#[cfg(feature = "regex")]
#[tokio::test]
async fn regex_routes_matches_and_leftovers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path().join("results"));
    let classifier = crate::RegexClassifier::new()
        .with_rule("matched", "^a")
        .unwrap();

    let pipeline = Pipeline::builder()
        .input_provider(memory_input(&["a1,b1", "skip,b2", "a3,b3"]))
        .results_dir(results.clone())
        .with_concurrency(1)
        .build()
        .unwrap();
    let summary = pipeline.run(&classifier).await.expect("run succeeds");

    assert_eq!(read_lines(results.file_for("matched")).await, vec!["a1,b1", "a3,b3"]);
    assert_eq!(read_lines(results.file_for("not-matched")).await, vec!["skip,b2"]);
    assert_eq!(summary.counters.read, 3);
    assert_eq!(summary.counters.matched, 2);
    assert_eq!(summary.counters.skipped, 1);
    assert_eq!(summary.destination("matched").unwrap().lines, 2);
}

#[tokio::test]
async fn classify_failure_salvages_earlier_lines() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path());
    let calls = Arc::new(AtomicUsize::new(0));

    let seen = calls.clone();
    let classifier = classify_fn(move |line: Line| {
        let seen = seen.clone();
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            if line.number() == 2 {
                return Err(BoxError::from("classifier exploded"));
            }
            Ok(Outcome::route("ok", line.text()))
        }
    });

    let pipeline = Pipeline::builder()
        .input_provider(memory_input(&["l1", "l2", "l3", "l4", "l5"]))
        .results_dir(results.clone())
        .with_concurrency(1)
        .build()
        .unwrap();
    let err = pipeline.run(&classifier).await.unwrap_err();

    assert_eq!(err.stage, Stage::Classify);
    assert_eq!(err.target, "line 2");
    assert!(err.to_string().contains("classifier exploded"));
    assert_eq!(read_lines(results.file_for("ok")).await, vec!["l1"]);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn simultaneous_first_submissions_share_one_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path()).with_extension("csv");
    let barrier = Arc::new(tokio::sync::Barrier::new(2));

    let classifier = classify_fn(move |line: Line| {
        let barrier = barrier.clone();
        async move {
            barrier.wait().await;
            Ok(Outcome::route("404", line.text()))
        }
    });

    let pipeline = Pipeline::builder()
        .input_provider(memory_input(&["http://a/x,1", "http://b/y,2"]))
        .results_dir(results.clone())
        .with_concurrency(2)
        .with_skip_key(None)
        .build()
        .unwrap();
    pipeline.run(&classifier).await.expect("run succeeds");

    assert_eq!(file_names(dir.path()).await, vec!["404.csv"]);
    let mut lines = read_lines(results.file_for("404")).await;
    lines.sort();
    assert_eq!(lines, vec!["http://a/x,1", "http://b/y,2"]);
}

#[tokio::test]
async fn every_line_lands_in_exactly_one_destination() {
    let sinks = MemorySinks::new();
    let factory = sinks.clone();
    let input: Vec<String> = (0..2000).map(|i| format!("row-{i}")).collect();

    let classifier = classify_fn(|line: Line| async move {
        tokio::task::yield_now().await;
        match line.seq() % 5 {
            0 => Ok(Outcome::Skip),
            n => Ok(Outcome::route(format!("bucket-{n}"), line.text())),
        }
    });

    let pipeline = Pipeline::builder()
        .input_provider(Arc::new(AsyncInMemorySource::from_lines("input", &input)))
        .sink_factory(move |key| factory.target(key))
        .with_concurrency(8)
        .with_input_capacity(16)
        .with_writer_capacity(4)
        .build()
        .unwrap();
    let summary = pipeline.run(&classifier).await.expect("run succeeds");

    let mut written = Vec::new();
    for key in ["bucket-1", "bucket-2", "bucket-3", "bucket-4", "not-matched"] {
        let lines = sinks.lines(key);
        assert_eq!(lines.len(), 400, "{key}");
        written.extend(lines);
    }
    written.sort();
    let mut expected = input.clone();
    expected.sort();
    assert_eq!(written, expected);

    assert_eq!(summary.counters.read, 2000);
    assert_eq!(summary.counters.processed, 2000);
    assert_eq!(summary.counters.matched + summary.counters.skipped, 2000);
    assert_eq!(summary.opened().count(), 5);
}

#[tokio::test]
async fn header_is_copied_into_every_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path()).with_extension("csv");
    let classifier = classify_fn(|line: Line| async move {
        let key = line.text().split(',').nth(1).unwrap_or_default().to_string();
        Ok(Outcome::route(key, line.text()))
    });

    let pipeline = Pipeline::builder()
        .input_provider(memory_input(&["url,status", "u1,200", "u2,404", "u3,200"]))
        .results_dir(results.clone())
        .with_concurrency(1)
        .with_header(true)
        .build()
        .unwrap();
    let prepared = pipeline.prepare().await.unwrap();
    assert_eq!(prepared.header(), Some("url,status"));
    let summary = prepared.run(&classifier).await.unwrap();

    assert_eq!(read_lines(results.file_for("200")).await, vec!["url,status", "u1,200", "u3,200"]);
    assert_eq!(read_lines(results.file_for("404")).await, vec!["url,status", "u2,404"]);
    assert_eq!(summary.counters.read, 3);
    assert!(!results.file_for("not-matched").exists());
}

#[tokio::test]
async fn previous_results_are_cleared_unless_disabled() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path());
    tokio::fs::write(results.file_for("stale"), "old\n").await.unwrap();
    let classifier = classify_fn(|line: Line| async move { Ok(Outcome::route("fresh", line.text())) });

    let keep = Pipeline::builder()
        .input_provider(memory_input(&["x"]))
        .results_dir(results.clone())
        .with_clear_results(false)
        .build()
        .unwrap();
    keep.run(&classifier).await.unwrap();
    assert!(results.file_for("stale").exists());

    let clear = Pipeline::builder()
        .input_provider(memory_input(&["y"]))
        .results_dir(results.clone())
        .build()
        .unwrap();
    clear.run(&classifier).await.unwrap();
    assert_eq!(file_names(dir.path()).await, vec!["fresh.txt"]);
    assert_eq!(read_lines(results.file_for("fresh")).await, vec!["y"]);
}

#[tokio::test]
async fn empty_input_creates_no_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path().join("out"));
    let classifier = classify_fn(|line: Line| async move { Ok(Outcome::route("k", line.text())) });

    let pipeline = Pipeline::builder()
        .input_provider(memory_input(&[]))
        .results_dir(results.clone())
        .build()
        .unwrap();
    let summary = pipeline.run(&classifier).await.unwrap();

    assert_eq!(summary.counters.read, 0);
    assert_eq!(summary.opened().count(), 0);
    assert!(file_names(results.path()).await.is_empty());
}

#[tokio::test]
async fn read_error_fails_run_after_flushing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let results = ResultsDir::new(dir.path());
    let mut data = b"one\ntwo\n".to_vec();
    data.extend_from_slice(&[0xc3, 0x28, b'\n', b'f', b'\n']);
    let classifier = classify_fn(|line: Line| async move { Ok(Outcome::route("k", line.text())) });

    let pipeline = Pipeline::builder()
        .input_provider(Arc::new(AsyncInMemorySource::new("broken-input", data)))
        .results_dir(results.clone())
        .with_concurrency(1)
        .build()
        .unwrap();
    let err = pipeline.run(&classifier).await.unwrap_err();

    assert_eq!(err.stage, Stage::Read);
    assert_eq!(err.target, "broken-input");
    assert_eq!(read_lines(results.file_for("k")).await, vec!["one", "two"]);
}

#[tokio::test]
async fn write_failure_is_reported_after_other_destinations_flush() {
    let sinks = MemorySinks::new();
    let factory = sinks.clone();
    let classifier = classify_fn(|line: Line| async move {
        Ok(Outcome::route(line.text().to_string(), line.text()))
    });

    let pipeline = Pipeline::builder()
        .input_provider(memory_input(&["good", "bad", "good"]))
        .sink_factory(move |key| {
            if key == "bad" {
                Arc::new(BrokenSink::failing_write()) as Arc<dyn AsyncOutputTarget>
            } else {
                factory.target(key)
            }
        })
        .with_concurrency(2)
        .build()
        .unwrap();
    let err = pipeline.run(&classifier).await.unwrap_err();

    assert_eq!(err.stage, Stage::Write);
    assert_eq!(err.target, "bad");
    assert_eq!(sinks.lines("good"), vec!["good", "good"]);
}

#[test]
fn builder_rejects_incomplete_configuration() {
    let no_input = Pipeline::builder()
        .results_dir(ResultsDir::new("results"))
        .build()
        .unwrap_err();
    assert!(matches!(no_input, ConfigError::InvalidArgument(_)));

    let no_output = Pipeline::builder().input("in.txt").build().unwrap_err();
    assert!(matches!(no_output, ConfigError::InvalidArgument(_)));

    let zero = Pipeline::builder()
        .input("in.txt")
        .results_dir(ResultsDir::new("results"))
        .with_writer_capacity(0)
        .build()
        .unwrap_err();
    assert!(matches!(zero, ConfigError::ZeroCapacity));
}
