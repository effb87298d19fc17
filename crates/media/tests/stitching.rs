mod common;

use assert_matches::assert_matches;

use casablanca_media::{stitch_chunks, MediaError};
use common::{DownloadTransport, RecordingConcat};

fn urls(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn skips_failed_chunks_and_keeps_order() {
    let transport = DownloadTransport::failing(&["https://cdn/c1.mp4"]);
    let concat = RecordingConcat::default();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("final.mp4");

    let outcome = stitch_chunks(
        &transport,
        &urls(&["https://cdn/c0.mp4", "https://cdn/c1.mp4", "https://cdn/c2.mp4"]),
        &output,
        &concat,
    )
    .await
    .unwrap();

    assert_eq!(outcome.output, output);
    assert_eq!(outcome.used, vec![0, 2]);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].index, 1);
    assert!(outcome.skipped[0].reason.contains("404"));

    // All three were attempted, in order.
    assert_eq!(transport.downloads().len(), 3);
    let written = std::fs::read_to_string(&output).unwrap();
    assert_eq!(written, "https://cdn/c0.mp4\nhttps://cdn/c2.mp4\n");

    // Chunk files live in a temp dir that is gone once stitching returns.
    let inputs = concat.inputs.lock().unwrap().clone();
    assert_eq!(inputs.len(), 2);
    assert!(inputs.iter().all(|p| !p.exists()));
}

#[tokio::test]
async fn all_failures_produce_no_output() {
    let transport = DownloadTransport::failing(&["https://cdn/c0.mp4", "https://cdn/c1.mp4"]);
    let concat = RecordingConcat::default();
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("final.mp4");

    let err = stitch_chunks(
        &transport,
        &urls(&["https://cdn/c0.mp4", "https://cdn/c1.mp4"]),
        &output,
        &concat,
    )
    .await
    .unwrap_err();

    assert_matches!(err, MediaError::NoChunksDownloaded { attempted: 2 });
    assert!(!output.exists());
    assert!(concat.inputs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn empty_chunk_list_is_an_error() {
    let transport = DownloadTransport::default();
    let concat = RecordingConcat::default();
    let dir = tempfile::tempdir().unwrap();

    let err = stitch_chunks(&transport, &[], &dir.path().join("final.mp4"), &concat)
        .await
        .unwrap_err();

    assert_matches!(err, MediaError::NoChunksDownloaded { attempted: 0 });
}
