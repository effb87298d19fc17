//! Test doubles: a download-only transport, a recording concatenator and a
//! fake tensor decoder.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use casablanca_client::{HttpResponse, Transport, TransportError};
use casablanca_core::types::{AudioTensor, FrameTensor, RawData};
use casablanca_media::{ChunkConcatenator, MediaError, TensorDecoder};

/// Writes the URL itself as file content; URLs in `failing` answer 404.
#[derive(Default)]
pub struct DownloadTransport {
    failing: HashSet<String>,
    downloads: Mutex<Vec<String>>,
}

impl DownloadTransport {
    pub fn failing(urls: &[&str]) -> Self {
        Self {
            failing: urls.iter().map(|u| u.to_string()).collect(),
            downloads: Mutex::new(Vec::new()),
        }
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for DownloadTransport {
    async fn post_json(
        &self,
        _url: &str,
        _bearer: Option<&str>,
        _body: &Value,
        _timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Request("not used".into()))
    }

    async fn get(
        &self,
        _url: &str,
        _bearer: Option<&str>,
        _query: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Request("not used".into()))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, TransportError> {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.failing.contains(url) {
            return Err(TransportError::Status {
                status: 404,
                body: "not found".into(),
            });
        }
        tokio::fs::write(dest, url.as_bytes()).await?;
        Ok(url.len() as u64)
    }
}

/// Records the inputs it was given and writes their contents to `output`.
#[derive(Default)]
pub struct RecordingConcat {
    pub inputs: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl ChunkConcatenator for RecordingConcat {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MediaError> {
        let mut joined = Vec::new();
        for input in inputs {
            joined.extend(tokio::fs::read(input).await?);
            joined.push(b'\n');
        }
        tokio::fs::write(output, joined).await?;
        *self.inputs.lock().unwrap() = inputs.to_vec();
        Ok(())
    }
}

/// Decoder that remembers the path it saw and returns fixed data or an error.
pub struct FakeDecoder {
    pub seen: Mutex<Option<PathBuf>>,
    pub result: fn() -> Result<RawData, MediaError>,
}

impl FakeDecoder {
    pub fn returning(result: fn() -> Result<RawData, MediaError>) -> Self {
        Self {
            seen: Mutex::new(None),
            result,
        }
    }

    pub fn seen(&self) -> Option<PathBuf> {
        self.seen.lock().unwrap().clone()
    }
}

impl TensorDecoder for FakeDecoder {
    fn decode(&self, path: &Path) -> Result<RawData, MediaError> {
        assert!(path.exists(), "payload must exist while decoding");
        *self.seen.lock().unwrap() = Some(path.to_path_buf());
        (self.result)()
    }
}

pub fn sample_raw() -> Result<RawData, MediaError> {
    Ok(RawData {
        frames: FrameTensor {
            shape: [2, 3, 2, 2],
            data: vec![10.0; 24],
        },
        audio: AudioTensor {
            channels: 1,
            samples: 8,
            data: vec![0.0; 8],
        },
    })
}
