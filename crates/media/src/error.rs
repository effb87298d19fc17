use casablanca_client::TransportError;
use casablanca_core::error::PredictError;

/// Error type for media loading, muxing and stitching.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode tensor payload: {0}")]
    Decode(String),

    #[error("download failed: {0}")]
    Download(#[from] TransportError),

    #[error("no chunks could be downloaded ({attempted} attempted)")]
    NoChunksDownloaded { attempted: usize },

    #[error("invalid tensor: {0}")]
    InvalidTensor(String),
}

impl From<MediaError> for PredictError {
    fn from(e: MediaError) -> Self {
        match e {
            MediaError::Download(transport) => transport.into(),
            other => PredictError::Decode(other.to_string()),
        }
    }
}
