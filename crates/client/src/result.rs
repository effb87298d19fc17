//! Client-facing prediction results and the output resolution shared by
//! the batch and single-call strategies.

use async_trait::async_trait;

use casablanca_core::error::PredictError;
use casablanca_core::metrics::extract_metrics;
use casablanca_core::snapshot::JobSnapshot;
use casablanca_core::types::{Metrics, OutputFormat, RawData};

use crate::stream::ChunkStream;

/// Downloads and decodes a serialized frame/audio payload.
///
/// Implementations must remove any transient files they create, whether
/// decoding succeeds or not.
#[async_trait]
pub trait RawDataLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<RawData, PredictError>;
}

/// Final output reference of a completed job.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutput {
    /// URL of the generated file.
    Url(String),
    /// Decoded payload of a `chunks` job.
    Raw(RawData),
}

impl PredictionOutput {
    pub fn as_url(&self) -> Option<&str> {
        match self {
            Self::Url(url) => Some(url),
            Self::Raw(_) => None,
        }
    }
}

/// Terminal, successful outcome of a prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub output: PredictionOutput,
    pub metrics: Metrics,
}

/// What `predict` hands back: a finished result, or a lazy sequence of
/// chunk references for streaming models.
pub enum Prediction {
    Completed(PredictionResult),
    Streaming(ChunkStream),
}

impl Prediction {
    pub fn into_completed(self) -> Option<PredictionResult> {
        match self {
            Self::Completed(result) => Some(result),
            Self::Streaming(_) => None,
        }
    }

    pub fn into_stream(self) -> Option<ChunkStream> {
        match self {
            Self::Completed(_) => None,
            Self::Streaming(stream) => Some(stream),
        }
    }
}

impl std::fmt::Debug for Prediction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed(result) => f.debug_tuple("Completed").field(result).finish(),
            Self::Streaming(stream) => f.debug_tuple("Streaming").field(stream).finish(),
        }
    }
}

/// Turn a succeeded snapshot into a [`PredictionResult`].
///
/// `chunks` outputs are resolved through `loader`; everything else is
/// returned as the URL the service reported.
pub(crate) async fn resolve_output(
    snapshot: &JobSnapshot,
    output_format: OutputFormat,
    loader: Option<&dyn RawDataLoader>,
) -> Result<PredictionResult, PredictError> {
    let reference = snapshot.output.reference().ok_or_else(|| {
        PredictError::UnexpectedRemoteState("job succeeded without an output reference".into())
    })?;

    let output = match output_format {
        OutputFormat::Chunks => {
            let loader = loader.ok_or_else(|| {
                PredictError::InvalidArgument(
                    "chunks output requires a raw data loader".into(),
                )
            })?;
            PredictionOutput::Raw(loader.load(reference).await?)
        }
        OutputFormat::Mp4 => PredictionOutput::Url(reference.to_string()),
    };

    Ok(PredictionResult {
        output,
        metrics: extract_metrics(snapshot.metrics.as_ref()),
    })
}
