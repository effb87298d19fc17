//! Helpers shared by the polling strategies.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use casablanca_core::error::PredictError;
use casablanca_core::snapshot::JobSnapshot;

use crate::api::JobHandle;

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, PredictError>
where
    F: Future<Output = Result<T, PredictError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PredictError::Cancelled),
        result = fut => result,
    }
}

/// Sleep for one poll interval, respecting cancellation.
pub(crate) async fn wait_interval(
    interval: Duration,
    cancel: &CancellationToken,
) -> Result<(), PredictError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(PredictError::Cancelled),
        _ = tokio::time::sleep(interval) => Ok(()),
    }
}

/// Error for a snapshot whose state is `failed`.
pub(crate) fn remote_failure(snapshot: &JobSnapshot) -> PredictError {
    PredictError::RemoteJobFailed {
        message: snapshot.failure_message(),
        body: Some(snapshot.raw.to_string()),
    }
}

/// Log a non-terminal snapshot; `verbose` raises it to `info`.
pub(crate) fn log_progress(verbose: bool, handle: &JobHandle, attempt: u32, state: &str) {
    if verbose {
        tracing::info!(handle = %handle, attempt, state, "Job still running");
    } else {
        tracing::debug!(handle = %handle, attempt, state, "Job still running");
    }
}
