//! Shared test helpers: a scripted [`Transport`] and media fixtures.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use casablanca_client::{ClientConfig, HttpResponse, Transport, TransportError};

pub const API_KEY: &str = "test-api-key-1234";

/// One recorded transport call.
#[derive(Debug, Clone)]
pub enum Call {
    Post {
        url: String,
        bearer: Option<String>,
        body: Value,
        timeout: Option<Duration>,
    },
    Get {
        url: String,
        bearer: Option<String>,
        query: Vec<(String, String)>,
    },
    Download {
        url: String,
    },
}

type Scripted = Result<HttpResponse, TransportError>;

/// Transport that replays queued responses and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    posts: Mutex<VecDeque<Scripted>>,
    gets: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
    post_delay: Option<Duration>,
}

pub fn ok(json: Value) -> Scripted {
    Ok(HttpResponse {
        status: 200,
        body: json.to_string(),
    })
}

pub fn status(code: u16, body: &str) -> Scripted {
    Ok(HttpResponse {
        status: code,
        body: body.to_string(),
    })
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every POST by `delay` before answering.
    pub fn with_post_delay(mut self, delay: Duration) -> Self {
        self.post_delay = Some(delay);
        self
    }

    pub fn push_post(&self, response: Scripted) -> &Self {
        self.posts.lock().unwrap().push_back(response);
        self
    }

    pub fn push_get(&self, response: Scripted) -> &Self {
        self.gets.lock().unwrap().push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Post { .. }))
            .count()
    }

    pub fn get_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Get { .. }))
            .count()
    }

    pub fn first_post(&self) -> Option<Call> {
        self.calls()
            .into_iter()
            .find(|c| matches!(c, Call::Post { .. }))
    }

    fn next(queue: &Mutex<VecDeque<Scripted>>) -> Scripted {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Request("no scripted response".into())))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(Call::Post {
            url: url.to_string(),
            bearer: bearer.map(str::to_string),
            body: body.clone(),
            timeout,
        });
        if let Some(delay) = self.post_delay {
            tokio::time::sleep(delay).await;
        }
        Self::next(&self.posts)
    }

    async fn get(
        &self,
        url: &str,
        bearer: Option<&str>,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(Call::Get {
            url: url.to_string(),
            bearer: bearer.map(str::to_string),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        Self::next(&self.gets)
    }

    async fn download(&self, url: &str, _dest: &Path) -> Result<u64, TransportError> {
        self.calls.lock().unwrap().push(Call::Download {
            url: url.to_string(),
        });
        Err(TransportError::Request("downloads are not scripted".into()))
    }
}

pub fn config() -> ClientConfig {
    ClientConfig::new(API_KEY)
        .unwrap()
        .with_base_url("http://service.test/api")
}

/// A temp dir holding `face.png` and `voice.wav`.
pub fn media_files() -> (tempfile::TempDir, PathBuf, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let image = dir.path().join("face.png");
    let audio = dir.path().join("voice.wav");
    std::fs::write(&image, b"\x89PNG fake image").expect("write image");
    std::fs::write(&audio, b"RIFF fake audio").expect("write audio");
    (dir, image, audio)
}
