//! Timing metrics reported by the service.
//!
//! Per-stage keys are passed through untouched. When the service only
//! reports generic totals, the queue time is derived from them.

use serde_json::{Map, Value};

use crate::types::Metrics;

/// Queue and inference time of the two pipeline stages (speech synthesis
/// and video generation).
pub const STAGE_METRIC_KEYS: &[&str] = &[
    "tts_queue_time",
    "tts_predict_time",
    "video_queue_time",
    "video_predict_time",
];

pub const TOTAL_TIME_KEY: &str = "total_time";
pub const PREDICT_TIME_KEY: &str = "predict_time";
pub const QUEUE_TIME_KEY: &str = "queue_time";

/// Extract a [`Metrics`] map from a snapshot's `metrics` object.
///
/// Absent metrics are not an error and yield an empty map.
pub fn extract_metrics(raw: Option<&Map<String, Value>>) -> Metrics {
    let mut metrics = Metrics::new();
    let Some(raw) = raw else {
        return metrics;
    };

    for key in STAGE_METRIC_KEYS {
        if let Some(value) = raw.get(*key).and_then(Value::as_f64) {
            metrics.insert((*key).to_string(), value);
        }
    }
    if !metrics.is_empty() {
        return metrics;
    }

    let total = raw.get(TOTAL_TIME_KEY).and_then(Value::as_f64);
    let predict = raw.get(PREDICT_TIME_KEY).and_then(Value::as_f64);

    if let Some(total) = total {
        metrics.insert(TOTAL_TIME_KEY.to_string(), total);
    }
    if let Some(predict) = predict {
        metrics.insert(PREDICT_TIME_KEY.to_string(), predict);
    }
    if let (Some(total), Some(predict)) = (total, predict) {
        metrics.insert(QUEUE_TIME_KEY.to_string(), (total - predict).max(0.0));
    }

    metrics
}
