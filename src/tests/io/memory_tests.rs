//! Tests for in-memory IO implementations.

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::{AsyncInMemorySource, AsyncInputProvider, AsyncOutputTarget, InMemorySink};

#[tokio::test]
async fn in_memory_source_reads_lines_and_reports_length() {
    let src = AsyncInMemorySource::from_lines("id", ["a", "b"]);
    assert_eq!(src.len_hint().await, Some(4));

    let mut reader = src.open().await.expect("open in-memory source");
    let mut buf = String::new();
    reader.read_to_string(&mut buf).await.unwrap();
    assert_eq!(buf, "a\nb\n");

    // every open starts from the beginning
    let mut again = String::new();
    src.open().await.unwrap().read_to_string(&mut again).await.unwrap();
    assert_eq!(again, buf);
}

#[tokio::test]
async fn in_memory_sink_overwrite_clears_previous_contents() {
    let sink = InMemorySink::new("out");
    assert!(!sink.was_opened());

    {
        let mut w = sink.open_overwrite().await.unwrap();
        w.write_all(b"abc\n").await.unwrap();
        w.write_all(b"def\n").await.unwrap();
    }
    assert_eq!(sink.lines(), vec!["abc", "def"]);

    sink.open_overwrite().await.unwrap();
    assert!(sink.contents().is_empty());
    assert_eq!(sink.open_count(), 2);
}

#[tokio::test]
async fn in_memory_sink_clones_share_contents() {
    let sink = InMemorySink::new("out");
    let handle = sink.clone();

    let mut w = handle.open_overwrite().await.unwrap();
    w.write_all(b"x").await.unwrap();

    assert_eq!(sink.contents_string(), "x");
    assert_eq!(sink.open_count(), 1);
}
