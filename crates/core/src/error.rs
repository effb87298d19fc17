//! Error taxonomy shared by every stage of a prediction.
//!
//! [`PredictError`] is the single error type surfaced to callers. Every
//! variant can be rendered into a [`Diagnostic`] carrying the remote
//! status code and response body when the service provided them, so the
//! caller decides how to display failures.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// Missing mode-required inputs, bad parameters, or a submission
    /// response without a job handle.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found at: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Could not determine MIME type for file: {}", .0.display())]
    UnknownContentType(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Network failure or a non-2xx HTTP response.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        /// HTTP status code, when a response was received.
        status: Option<u16>,
        /// Raw response body for debugging.
        body: Option<String>,
    },

    /// The service answered and reported the job as failed.
    #[error("Remote job failed: {message}")]
    RemoteJobFailed {
        /// Server-reported error text.
        message: String,
        /// Raw snapshot body the failure was read from.
        body: Option<String>,
    },

    /// The service never answered within the synchronous call bound.
    #[error("Remote call timed out after {}s", .0.as_secs())]
    RemoteCallTimeout(Duration),

    #[error("Unexpected remote state: {0}")]
    UnexpectedRemoteState(String),

    #[error("Failed to decode result payload: {0}")]
    Decode(String),

    #[error("Prediction cancelled")]
    Cancelled,
}

/// Coarse classification of a [`PredictError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    FileNotFound,
    UnknownContentType,
    Io,
    Transport,
    RemoteJobFailed,
    RemoteCallTimeout,
    UnexpectedRemoteState,
    Decode,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid_argument",
            Self::FileNotFound => "file_not_found",
            Self::UnknownContentType => "unknown_content_type",
            Self::Io => "io",
            Self::Transport => "transport",
            Self::RemoteJobFailed => "remote_job_failed",
            Self::RemoteCallTimeout => "remote_call_timeout",
            Self::UnexpectedRemoteState => "unexpected_remote_state",
            Self::Decode => "decode",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::UnknownContentType(_) => ErrorKind::UnknownContentType,
            Self::Io { .. } => ErrorKind::Io,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::RemoteJobFailed { .. } => ErrorKind::RemoteJobFailed,
            Self::RemoteCallTimeout(_) => ErrorKind::RemoteCallTimeout,
            Self::UnexpectedRemoteState(_) => ErrorKind::UnexpectedRemoteState,
            Self::Decode(_) => ErrorKind::Decode,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// HTTP status code returned by the service, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// Raw response body returned by the service, if any.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Transport { body, .. } | Self::RemoteJobFailed { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// Normalize this error into a renderable [`Diagnostic`].
    ///
    /// JSON bodies are pretty-printed; anything else is kept verbatim.
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            kind: self.kind(),
            message: self.to_string(),
            status_code: self.status_code(),
            body: self.response_body().map(pretty_body),
        }
    }

    /// True for failures raised before any network call was attempted.
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidArgument
                | ErrorKind::FileNotFound
                | ErrorKind::UnknownContentType
                | ErrorKind::Io
        )
    }
}

/// Structured, display-ready view of a [`PredictError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ErrorKind,
    pub message: String,
    pub status_code: Option<u16>,
    pub body: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "An error occurred: {}", self.message)?;
        if let Some(status) = self.status_code {
            write!(f, "\nServer responded with status {status}:")?;
        }
        if let Some(body) = &self.body {
            write!(f, "\n{body}")?;
        }
        Ok(())
    }
}

fn pretty_body(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| serde_json::to_string_pretty(&v).ok())
        .unwrap_or_else(|| body.to_string())
}
