//! Integration tests for synchronous text-to-video calls.

mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::json;

use casablanca_client::{CasablancaClient, PredictionOutput, TransportError};
use casablanca_core::error::PredictError;
use casablanca_core::request::PredictionRequest;
use casablanca_core::types::OutputFormat;
use common::{config, media_files, ok, Call, ScriptedTransport};

fn text_request(image: std::path::PathBuf) -> PredictionRequest {
    PredictionRequest::image_text("atv_sync", image, "Hello there")
}

#[tokio::test(start_paused = true)]
async fn single_call_returns_output_without_polling() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_post(ok(json!({
        "status": "succeeded",
        "output": "https://cdn/talk.mp4",
        "metrics": {"tts_predict_time": 1.25}
    })));
    let client = CasablancaClient::with_transport(config(), transport.clone());

    let (_dir, image, _audio) = media_files();
    let result = client
        .predict(&text_request(image))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(result.output, PredictionOutput::Url("https://cdn/talk.mp4".into()));
    assert_eq!(result.metrics["tts_predict_time"], 1.25);
    assert_eq!(transport.get_count(), 0);
    assert_matches!(transport.first_post(), Some(Call::Post { body, timeout, .. }) => {
        assert_eq!(timeout, Some(Duration::from_secs(600)));
        assert_eq!(body["text"], "Hello there");
        assert!(body.get("audio").is_none());
    });
}

#[tokio::test(start_paused = true)]
async fn failed_single_call_is_remote_failure() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_post(ok(json!({"status": "failed", "error": {"reason": "tts down"}})));
    let client = CasablancaClient::with_transport(config(), transport.clone());

    let (_dir, image, _audio) = media_files();
    let err = client.predict(&text_request(image)).await.unwrap_err();

    assert_matches!(err, PredictError::RemoteJobFailed { message, .. } if message.contains("tts down"));
}

#[tokio::test(start_paused = true)]
async fn non_terminal_answer_is_unexpected() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_post(ok(json!({"status": "processing"})));
    let client = CasablancaClient::with_transport(config(), transport.clone());

    let (_dir, image, _audio) = media_files();
    let err = client.predict(&text_request(image)).await.unwrap_err();

    assert_matches!(err, PredictError::UnexpectedRemoteState(msg) if msg.contains("processing"));
    assert_eq!(transport.get_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out() {
    let transport = Arc::new(ScriptedTransport::new().with_post_delay(Duration::from_secs(601)));
    transport.push_post(ok(json!({"status": "succeeded", "output": "late"})));
    let client = CasablancaClient::with_transport(config(), transport.clone());

    let (_dir, image, _audio) = media_files();
    let started = tokio::time::Instant::now();
    let err = client.predict(&text_request(image)).await.unwrap_err();

    assert_matches!(err, PredictError::RemoteCallTimeout(limit) if limit == Duration::from_secs(600));
    assert_eq!(started.elapsed(), Duration::from_secs(600));
}

#[tokio::test(start_paused = true)]
async fn transport_timeout_is_remote_call_timeout() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_post(Err(TransportError::Timeout));
    let client = CasablancaClient::with_transport(
        config().with_sync_timeout(Duration::from_secs(30)),
        transport.clone(),
    );

    let (_dir, image, _audio) = media_files();
    let err = client.predict(&text_request(image)).await.unwrap_err();

    assert_matches!(err, PredictError::RemoteCallTimeout(limit) if limit == Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn chunks_without_loader_is_rejected_before_the_call() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_post(ok(json!({"status": "succeeded", "output": "https://cdn/out.pt"})));
    let client = CasablancaClient::with_transport(config(), transport.clone());

    let (_dir, image, _audio) = media_files();
    let request = text_request(image).with_output_format(OutputFormat::Chunks);
    let err = client.predict(&request).await.unwrap_err();

    assert_matches!(err, PredictError::InvalidArgument(msg) if msg.contains("loader"));
    assert!(transport.calls().is_empty());
}
