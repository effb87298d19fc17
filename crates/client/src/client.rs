//! Prediction entry point.
//!
//! [`CasablancaClient::predict`] validates and encodes the request, then
//! dispatches on the generation mode and model to one of three completion
//! strategies.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use casablanca_core::error::PredictError;
use casablanca_core::request::PredictionRequest;
use casablanca_core::types::{GenerationMode, OutputFormat};

use crate::api::{CasablancaApi, ModelDescriptor};
use crate::config::ClientConfig;
use crate::poll::cancellable;
use crate::result::{Prediction, RawDataLoader};
use crate::stream::ChunkStream;
use crate::transport::{ReqwestTransport, Transport};
use crate::{batch, oneshot};

/// How a request will be driven to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One request; the service answers with the finished job.
    SingleCall,
    /// Poll for a growing list of chunk URLs.
    Streaming,
    /// Poll until the job reaches a terminal state.
    BatchPolling,
}

/// Client for the avatar-generation prediction service.
///
/// Cheap to clone; each call to [`predict`](Self::predict) owns its own
/// job handle, so concurrent predictions are independent.
#[derive(Clone)]
pub struct CasablancaClient {
    api: CasablancaApi,
    loader: Option<Arc<dyn RawDataLoader>>,
}

impl CasablancaClient {
    /// Create a client that talks HTTP through [`ReqwestTransport`].
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            api: CasablancaApi::new(transport, Arc::new(config)),
            loader: None,
        }
    }

    /// Loader used to resolve `chunks` outputs into raw frame/audio data.
    pub fn with_raw_loader(mut self, loader: Arc<dyn RawDataLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        self.api.config()
    }

    pub fn api(&self) -> &CasablancaApi {
        &self.api
    }

    /// Pick the completion strategy for a request.
    pub fn strategy_for(&self, request: &PredictionRequest) -> Strategy {
        match request.mode {
            GenerationMode::ImageTextToVideo => Strategy::SingleCall,
            GenerationMode::ImageAudioToVideo if self.config().is_stream_model(&request.model) => {
                Strategy::Streaming
            }
            GenerationMode::ImageAudioToVideo => Strategy::BatchPolling,
        }
    }

    /// Run a prediction to completion, or until the stream is handed back.
    pub async fn predict(&self, request: &PredictionRequest) -> Result<Prediction, PredictError> {
        self.predict_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`predict`](Self::predict), but stops polling once `cancel`
    /// fires. The remote job is not cancelled.
    pub async fn predict_with_cancel(
        &self,
        request: &PredictionRequest,
        cancel: CancellationToken,
    ) -> Result<Prediction, PredictError> {
        let result = self.dispatch(request, cancel).await;
        if let Err(e) = &result {
            tracing::warn!(
                model = %request.model,
                mode = %request.mode,
                kind = %e.kind(),
                status = e.status_code(),
                error = %e,
                "Prediction failed",
            );
        }
        result
    }

    /// List the models the service offers.
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>, PredictError> {
        self.api.list_models().await
    }

    // ---- private helpers ----

    async fn dispatch(
        &self,
        request: &PredictionRequest,
        cancel: CancellationToken,
    ) -> Result<Prediction, PredictError> {
        // Encoding validates first; nothing reaches the network on bad input.
        let encoded = request.encode()?;
        let body = encoded.to_body(&self.config().wire_schema);
        let params = &request.params;
        let strategy = self.strategy_for(request);

        if strategy != Strategy::Streaming
            && params.output_format == OutputFormat::Chunks
            && self.loader.is_none()
        {
            return Err(PredictError::InvalidArgument(
                "chunks output requires a raw data loader".into(),
            ));
        }

        tracing::info!(
            model = %request.model,
            mode = %request.mode,
            ?strategy,
            output_format = params.output_format.as_str(),
            "Starting prediction",
        );

        match strategy {
            Strategy::SingleCall => oneshot::run(
                &self.api,
                &body,
                params.output_format,
                self.loader.as_deref(),
                &cancel,
            )
            .await
            .map(Prediction::Completed),
            Strategy::Streaming => {
                let handle = cancellable(&cancel, self.api.submit(&body)).await?;
                tracing::info!(handle = %handle, "Streaming job submitted");
                Ok(Prediction::Streaming(ChunkStream::new(
                    self.api.clone(),
                    handle,
                    params.verbose,
                    cancel,
                )))
            }
            Strategy::BatchPolling => batch::run(
                &self.api,
                &body,
                params.output_format,
                params.verbose,
                self.loader.as_deref(),
                &cancel,
            )
            .await
            .map(Prediction::Completed),
        }
    }
}
