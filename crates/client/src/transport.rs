//! HTTP transport seam.
//!
//! The lifecycle client talks to the service only through [`Transport`],
//! so tests can script responses without a network. [`ReqwestTransport`]
//! is the production implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;

use casablanca_core::error::PredictError;

/// Status and body of an HTTP response, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Errors raised before a response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request exceeded its timeout.
    #[error("HTTP request timed out")]
    Timeout,

    /// A download returned a non-2xx status.
    #[error("Download failed ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Request(e.to_string())
        }
    }
}

impl From<TransportError> for PredictError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Status { status, body } => PredictError::Transport {
                message: format!("Server responded with status {status}"),
                status: Some(status),
                body: Some(body),
            },
            other => PredictError::Transport {
                message: other.to_string(),
                status: None,
                body: None,
            },
        }
    }
}

/// Minimal HTTP client capability the lifecycle client needs.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `POST` a JSON body. Non-2xx responses are returned, not raised.
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError>;

    /// `GET` with query parameters. Non-2xx responses are returned, not raised.
    async fn get(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError>;

    /// Stream the body at `url` into `dest`, returning the byte count.
    /// Non-2xx responses are raised as [`TransportError::Status`].
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError>;
}

/// [`Transport`] backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling, proxies).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn into_response(response: reqwest::Response) -> Result<HttpResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        Self::into_response(request.send().await?).await
    }

    async fn get(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        Self::into_response(request.send().await?).await
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        tracing::debug!(url, bytes = written, "Downloaded payload");
        Ok(written)
    }
}
