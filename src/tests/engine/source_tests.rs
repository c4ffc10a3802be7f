use std::sync::Arc;
use std::time::Duration;

use futures::TryStreamExt;
use tokio::sync::mpsc;

use crate::error::Stage;
use crate::{AsyncInMemorySource, LineSource, PipelineCounters};

async fn open(data: &str) -> LineSource {
    LineSource::open(Arc::new(AsyncInMemorySource::from_string("mem", data)))
        .await
        .expect("open source")
}

#[tokio::test]
async fn lines_are_numbered_and_stripped_of_terminators() {
    let mut source = open("first\r\nsecond\nlast").await;

    let a = source.next_line().await.unwrap().unwrap();
    let b = source.next_line().await.unwrap().unwrap();
    let c = source.next_line().await.unwrap().unwrap();
    assert_eq!((a.seq(), a.text()), (0, "first"));
    assert_eq!((b.number(), b.text()), (2, "second"));
    assert_eq!(c.text(), "last");
    assert!(source.next_line().await.unwrap().is_none());
    assert_eq!(source.lines_produced(), 3);
}

#[tokio::test]
async fn empty_lines_are_records() {
    let lines: Vec<String> = open("a\n\nb\n")
        .await
        .into_lines()
        .map_ok(|l| l.into_text())
        .try_collect()
        .await
        .unwrap();
    assert_eq!(lines, vec!["a", "", "b"]);
}

#[tokio::test]
async fn header_is_not_a_record() {
    let mut source = open("url,name\nhttp://a,x\n").await;
    assert_eq!(source.read_header().await.unwrap().as_deref(), Some("url,name"));

    let first = source.next_line().await.unwrap().unwrap();
    assert_eq!(first.seq(), 0);
    assert_eq!(first.text(), "http://a,x");
}

#[tokio::test]
async fn bytes_remaining_never_increases() {
    let mut source = open("aa\nbbbb\nc\n").await;
    let mut last = source.bytes_remaining().unwrap();
    assert_eq!(last, 10);

    while source.next_line().await.unwrap().is_some() {
        let now = source.bytes_remaining().unwrap();
        assert!(now <= last);
        last = now;
    }
    assert_eq!(last, 0);
}

#[tokio::test]
async fn invalid_utf8_is_a_read_error() {
    let provider = AsyncInMemorySource::new("bad", vec![b'o', b'k', b'\n', 0xff, 0xfe, b'\n']);
    let mut source = LineSource::open(Arc::new(provider)).await.unwrap();

    assert_eq!(source.next_line().await.unwrap().unwrap().text(), "ok");
    let err = source.next_line().await.unwrap_err();
    assert_eq!(err.stage, Stage::Read);
    assert_eq!(err.target, "bad");
}

#[tokio::test]
async fn read_error_is_forwarded_through_the_queue() {
    let provider = AsyncInMemorySource::new("bad", vec![0xff, b'\n']);
    let source = LineSource::open(Arc::new(provider)).await.unwrap();
    let (tx, mut rx) = mpsc::channel(4);

    let result = source.run(tx, Arc::new(PipelineCounters::new())).await;
    assert!(result.is_err());

    let item = rx.recv().await.expect("error item");
    assert_eq!(item.unwrap_err().stage, Stage::Read);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn source_blocks_when_queue_is_full() {
    const CAPACITY: usize = 5;
    let lines: Vec<String> = (0..50).map(|i| format!("line-{i}")).collect();
    let source = LineSource::open(Arc::new(AsyncInMemorySource::from_lines("mem", &lines)))
        .await
        .unwrap();
    let counters = Arc::new(PipelineCounters::new());

    let (tx, rx) = mpsc::channel(CAPACITY);
    let task = source.spawn(tx, counters.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(counters.read(), CAPACITY as u64);
    assert!(!task.is_finished());

    // Dropping the consumer stops the source quietly.
    drop(rx);
    let produced = task.await.unwrap().expect("source stops without error");
    assert!(produced <= CAPACITY as u64 + 1);
}

#[tokio::test]
async fn source_run_reports_every_line() {
    let source = open("a\nb\nc\n").await;
    let counters = Arc::new(PipelineCounters::new());
    let (tx, mut rx) = mpsc::channel(1);

    let task = source.spawn(tx, counters.clone());
    let mut seen = Vec::new();
    while let Some(item) = rx.recv().await {
        seen.push(item.unwrap().into_text());
    }

    assert_eq!(task.await.unwrap().unwrap(), 3);
    assert_eq!(seen, vec!["a", "b", "c"]);
    assert_eq!(counters.read(), 3);
}
