//! Synchronous single-call generation: the service performs the whole job
//! inside one request and answers with a terminal state.

use tokio_util::sync::CancellationToken;

use casablanca_core::error::PredictError;
use casablanca_core::snapshot::JobState;
use casablanca_core::types::OutputFormat;

use crate::api::CasablancaApi;
use crate::poll::{cancellable, remote_failure};
use crate::result::{resolve_output, PredictionResult, RawDataLoader};

pub(crate) async fn run(
    api: &CasablancaApi,
    body: &serde_json::Value,
    output_format: OutputFormat,
    loader: Option<&dyn RawDataLoader>,
    cancel: &CancellationToken,
) -> Result<PredictionResult, PredictError> {
    let timeout = api.config().sync_timeout;
    tracing::info!(timeout_secs = timeout.as_secs(), "Submitting synchronous job");

    let call = async {
        match tokio::time::timeout(timeout, api.submit_sync(body, timeout)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(PredictError::RemoteCallTimeout(timeout)),
        }
    };

    let snapshot = cancellable(cancel, call).await?;

    match &snapshot.state {
        JobState::Succeeded => {
            tracing::info!("Synchronous job succeeded");
            resolve_output(&snapshot, output_format, loader).await
        }
        JobState::Failed => {
            tracing::warn!("Synchronous job failed");
            Err(remote_failure(&snapshot))
        }
        JobState::Running(state) => Err(PredictError::UnexpectedRemoteState(format!(
            "synchronous call returned non-terminal state '{state}'"
        ))),
    }
}
