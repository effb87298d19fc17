//! Parsing of job status payloads.
//!
//! The service's state vocabulary and field names have varied over time,
//! so [`JobSnapshot::from_json`] is tolerant: only a recognized success or
//! failure word is terminal, anything else means the job is still running.

use serde_json::{Map, Value};

/// Lifecycle state of a remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    /// Any non-terminal state, with the raw value the service reported.
    Running(String),
    Succeeded,
    Failed,
}

impl JobState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "succeeded" | "success" | "successful" | "completed" | "complete" => Self::Succeeded,
            "failed" | "failure" | "error" | "canceled" | "cancelled" => Self::Failed,
            _ => Self::Running(raw.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Running(raw) => raw,
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Output field of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SnapshotOutput {
    #[default]
    None,
    /// A single result reference (URL).
    Single(String),
    /// Chunk references produced so far, in order.
    Chunks(Vec<String>),
}

impl SnapshotOutput {
    fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(s)) => Self::Single(s.clone()),
            Some(Value::Array(items)) => Self::Chunks(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            _ => Self::None,
        }
    }

    /// The final result reference: the single URL, or the last chunk.
    pub fn reference(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Single(url) => Some(url),
            Self::Chunks(urls) => urls.last().map(String::as_str),
        }
    }

    /// Chunk references, treating a single URL as a one-element list.
    pub fn chunks(&self) -> &[String] {
        match self {
            Self::None => &[],
            Self::Single(url) => std::slice::from_ref(url),
            Self::Chunks(urls) => urls,
        }
    }
}

/// One observation of a job's state.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSnapshot {
    pub state: JobState,
    pub output: SnapshotOutput,
    pub metrics: Option<Map<String, Value>>,
    pub error: Option<String>,
    /// Full payload, kept for diagnostics.
    pub raw: Value,
}

impl JobSnapshot {
    pub fn from_json(raw: Value) -> Self {
        let state = ["status", "state"]
            .iter()
            .find_map(|field| raw.get(field).and_then(Value::as_str))
            .map(JobState::parse)
            .unwrap_or_else(|| JobState::Running(String::new()));

        let output = SnapshotOutput::from_value(raw.get("output"));

        let metrics = raw.get("metrics").and_then(Value::as_object).cloned();

        let error = ["error", "message", "detail"]
            .iter()
            .find_map(|field| match raw.get(field)? {
                Value::Null => None,
                Value::String(s) if s.is_empty() => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            });

        Self {
            state,
            output,
            metrics,
            error,
            raw,
        }
    }

    /// Error text for a failed snapshot, with a fallback when the service
    /// gave none.
    pub fn failure_message(&self) -> String {
        self.error.clone().unwrap_or_else(|| {
            format!(
                "job reported state '{}' without an error message",
                self.state.as_str()
            )
        })
    }
}
