//! REST API wrapper for the prediction service endpoints.
//!
//! Wraps job submission, status retrieval and model listing on top of a
//! [`Transport`], turning non-2xx responses and malformed bodies into
//! [`PredictError::Transport`] with the status code and body preserved.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use casablanca_core::error::PredictError;
use casablanca_core::snapshot::JobSnapshot;

use crate::config::ClientConfig;
use crate::transport::{HttpResponse, Transport, TransportError};

/// Server-assigned identifier of one submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One entry of the model listing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    /// Display name.
    #[serde(default, alias = "display_name")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Price per generated second, in USD.
    #[serde(default, alias = "price")]
    pub price_per_second: Option<f64>,
}

/// The listing endpoint has returned both a bare array and a wrapper.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ModelList {
    Bare(Vec<ModelDescriptor>),
    Wrapped { models: Vec<ModelDescriptor> },
}

/// HTTP client for the prediction service.
#[derive(Clone)]
pub struct CasablancaApi {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
}

impl CasablancaApi {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<ClientConfig>) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit a job and return its handle.
    ///
    /// Sends `POST {predict_url}` with bearer auth. A response without any
    /// recognized handle field is an [`PredictError::InvalidArgument`].
    pub async fn submit(&self, body: &serde_json::Value) -> Result<JobHandle, PredictError> {
        let response = self
            .transport
            .post_json(&self.config.predict_url, Some(&self.config.api_key), body, None)
            .await?;

        let json: serde_json::Value = Self::parse_response(response)?;
        self.config
            .wire_schema
            .extract_handle(&json)
            .map(JobHandle)
            .ok_or_else(|| {
                PredictError::InvalidArgument(format!(
                    "Server response did not include a job id: {json}"
                ))
            })
    }

    /// Submit a job that the service completes within the same call.
    ///
    /// The transport is asked to enforce `timeout`; a transport timeout is
    /// reported as [`PredictError::RemoteCallTimeout`].
    pub async fn submit_sync(
        &self,
        body: &serde_json::Value,
        timeout: Duration,
    ) -> Result<JobSnapshot, PredictError> {
        let response = self
            .transport
            .post_json(
                &self.config.predict_url,
                Some(&self.config.api_key),
                body,
                Some(timeout),
            )
            .await
            .map_err(|e| match e {
                TransportError::Timeout => PredictError::RemoteCallTimeout(timeout),
                other => other.into(),
            })?;

        Ok(JobSnapshot::from_json(Self::parse_response(response)?))
    }

    /// Fetch one status snapshot via `GET {status_url}?id={handle}`.
    pub async fn status(&self, handle: &JobHandle) -> Result<JobSnapshot, PredictError> {
        let response = self
            .transport
            .get(
                &self.config.status_url,
                Some(&self.config.api_key),
                &[("id", handle.as_str())],
            )
            .await?;

        Ok(JobSnapshot::from_json(Self::parse_response(response)?))
    }

    /// List available models. This endpoint is unauthenticated.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, PredictError> {
        let response = self.transport.get(&self.config.models_url, None, &[]).await?;

        Ok(match Self::parse_response::<ModelList>(response)? {
            ModelList::Bare(models) | ModelList::Wrapped { models } => models,
        })
    }

    // ---- private helpers ----

    /// Return the response unchanged on a 2xx status, or a
    /// [`PredictError::Transport`] carrying the status and body.
    fn ensure_success(response: HttpResponse) -> Result<HttpResponse, PredictError> {
        if !response.is_success() {
            return Err(PredictError::Transport {
                message: format!("Server responded with status {}", response.status),
                status: Some(response.status),
                body: Some(response.body),
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    fn parse_response<T: serde::de::DeserializeOwned>(
        response: HttpResponse,
    ) -> Result<T, PredictError> {
        let response = Self::ensure_success(response)?;
        serde_json::from_str(&response.body).map_err(|e| PredictError::Transport {
            message: format!("Malformed response body: {e}"),
            status: Some(response.status),
            body: Some(response.body),
        })
    }
}
