//! Resolve `chunks` output URLs into decoded [`RawData`].
//!
//! The payload is downloaded into a `.pt` temp file, handed to a
//! [`TensorDecoder`], and the temp file is removed when the load returns,
//! whether decoding succeeded or not.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use casablanca_client::{RawDataLoader, Transport};
use casablanca_core::error::PredictError;
use casablanca_core::types::RawData;

use crate::error::MediaError;

/// Decodes a downloaded tensor container into frames and audio.
pub trait TensorDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RawData, MediaError>;
}

/// [`RawDataLoader`] that downloads through a [`Transport`] into a temp file.
pub struct TempFileRawLoader<D> {
    transport: Arc<dyn Transport>,
    decoder: D,
}

impl<D: TensorDecoder> TempFileRawLoader<D> {
    pub fn new(transport: Arc<dyn Transport>, decoder: D) -> Self {
        Self { transport, decoder }
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// Download `url` and decode it, reporting media-level errors.
    pub async fn fetch(&self, url: &str) -> Result<RawData, MediaError> {
        let file = tempfile::Builder::new()
            .prefix("casablanca-")
            .suffix(".pt")
            .tempfile()?;

        let bytes = self.transport.download(url, file.path()).await?;
        tracing::debug!(url, bytes, path = %file.path().display(), "Raw payload downloaded");

        let raw = self.decoder.decode(file.path())?;
        if !raw.frames.is_consistent() || !raw.audio.is_consistent() {
            return Err(MediaError::InvalidTensor(format!(
                "decoded data does not match its shape ({})",
                raw.info()
            )));
        }

        tracing::info!(url, info = %raw.info(), "Raw data loaded");
        Ok(raw)
    }
}

#[async_trait]
impl<D: TensorDecoder> RawDataLoader for TempFileRawLoader<D> {
    async fn load(&self, url: &str) -> Result<RawData, PredictError> {
        self.fetch(url).await.map_err(|e| {
            tracing::warn!(url, error = %e, "Failed to load raw data");
            e.into()
        })
    }
}
