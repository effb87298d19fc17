//! Batch polling: submit, then poll the status endpoint at a fixed
//! interval until the job reaches a terminal state.
//!
//! There is no timeout or attempt limit: jobs can run for a long time and
//! only caller cancellation ends the loop early.

use tokio_util::sync::CancellationToken;

use casablanca_core::error::PredictError;
use casablanca_core::snapshot::JobState;
use casablanca_core::types::OutputFormat;

use crate::api::CasablancaApi;
use crate::poll::{cancellable, log_progress, remote_failure, wait_interval};
use crate::result::{resolve_output, PredictionResult, RawDataLoader};

pub(crate) async fn run(
    api: &CasablancaApi,
    body: &serde_json::Value,
    output_format: OutputFormat,
    verbose: bool,
    loader: Option<&dyn RawDataLoader>,
    cancel: &CancellationToken,
) -> Result<PredictionResult, PredictError> {
    let handle = cancellable(cancel, api.submit(body)).await?;
    tracing::info!(handle = %handle, "Job submitted, polling for completion");

    let interval = api.config().poll_interval;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let snapshot = cancellable(cancel, api.status(&handle)).await?;

        match &snapshot.state {
            JobState::Succeeded => {
                tracing::info!(handle = %handle, attempt, "Job succeeded");
                return resolve_output(&snapshot, output_format, loader).await;
            }
            JobState::Failed => {
                tracing::warn!(handle = %handle, attempt, "Job failed");
                return Err(remote_failure(&snapshot));
            }
            JobState::Running(state) => log_progress(verbose, &handle, attempt, state),
        }

        if let Err(e) = wait_interval(interval, cancel).await {
            tracing::info!(handle = %handle, "Polling cancelled, remote job left running");
            return Err(e);
        }
    }
}
