use std::fmt;
use std::time::Duration;

use casablanca_core::error::PredictError;
use casablanca_core::wire::WireSchema;

pub const DEFAULT_BASE_URL: &str = "https://atv-model-api.vercel.app/api";

/// Interval between status polls for batch jobs.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Interval between status polls for streaming jobs.
pub const DEFAULT_STREAM_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Upper bound on a synchronous single-call generation.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(600);

/// Models whose output is delivered as incremental chunks.
pub const DEFAULT_STREAM_MODELS: &[&str] = &["atv_stream"];

/// Client configuration.
///
/// Construct with [`ClientConfig::new`] and override via the `with_*`
/// builders, or load everything from the environment with
/// [`ClientConfig::from_env`].
#[derive(Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub predict_url: String,
    pub status_url: String,
    pub models_url: String,
    pub stream_models: Vec<String>,
    pub poll_interval: Duration,
    pub stream_poll_interval: Duration,
    pub sync_timeout: Duration,
    pub wire_schema: WireSchema,
}

impl ClientConfig {
    /// Configuration with default endpoints and timings.
    ///
    /// Fails with [`PredictError::InvalidArgument`] when `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self, PredictError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(PredictError::InvalidArgument("An API key is required".into()));
        }

        Ok(Self {
            api_key,
            predict_url: format!("{DEFAULT_BASE_URL}/predict"),
            status_url: format!("{DEFAULT_BASE_URL}/status"),
            models_url: format!("{DEFAULT_BASE_URL}/models"),
            stream_models: DEFAULT_STREAM_MODELS.iter().map(|m| m.to_string()).collect(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            stream_poll_interval: DEFAULT_STREAM_POLL_INTERVAL,
            sync_timeout: DEFAULT_SYNC_TIMEOUT,
            wire_schema: WireSchema::default(),
        })
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                                | Default                        |
    /// |----------------------------------------|--------------------------------|
    /// | `CASABLANCA_API_KEY`                   | required                       |
    /// | `CASABLANCA_BASE_URL`                  | `https://atv-model-api.vercel.app/api` |
    /// | `CASABLANCA_PREDICT_URL`               | `{base}/predict`               |
    /// | `CASABLANCA_STATUS_URL`                | `{base}/status`                |
    /// | `CASABLANCA_MODELS_URL`                | `{base}/models`                |
    /// | `CASABLANCA_STREAM_MODELS`             | `atv_stream`                   |
    /// | `CASABLANCA_POLL_INTERVAL_SECS`        | `5`                            |
    /// | `CASABLANCA_STREAM_POLL_INTERVAL_SECS` | `2`                            |
    /// | `CASABLANCA_SYNC_TIMEOUT_SECS`         | `600`                          |
    /// | `CASABLANCA_WIRE_SCHEMA`               | `current`                      |
    pub fn from_env() -> Result<Self, PredictError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PredictError> {
        let mut config = Self::new(lookup("CASABLANCA_API_KEY").unwrap_or_default())?;

        if let Some(base) = lookup("CASABLANCA_BASE_URL") {
            config = config.with_base_url(&base);
        }
        if let Some(url) = lookup("CASABLANCA_PREDICT_URL") {
            config.predict_url = url;
        }
        if let Some(url) = lookup("CASABLANCA_STATUS_URL") {
            config.status_url = url;
        }
        if let Some(url) = lookup("CASABLANCA_MODELS_URL") {
            config.models_url = url;
        }
        if let Some(models) = lookup("CASABLANCA_STREAM_MODELS") {
            config.stream_models = models
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(secs) = lookup("CASABLANCA_POLL_INTERVAL_SECS") {
            config.poll_interval = parse_secs("CASABLANCA_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CASABLANCA_STREAM_POLL_INTERVAL_SECS") {
            config.stream_poll_interval =
                parse_secs("CASABLANCA_STREAM_POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CASABLANCA_SYNC_TIMEOUT_SECS") {
            config.sync_timeout = parse_secs("CASABLANCA_SYNC_TIMEOUT_SECS", &secs)?;
        }
        if let Some(schema) = lookup("CASABLANCA_WIRE_SCHEMA") {
            config.wire_schema = WireSchema::from_spec(&schema)?;
        }

        Ok(config)
    }

    /// Point all three endpoints at `{base}/predict`, `{base}/status`,
    /// `{base}/models`.
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.predict_url = format!("{base}/predict");
        self.status_url = format!("{base}/status");
        self.models_url = format!("{base}/models");
        self
    }

    pub fn with_stream_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stream_models = models.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_stream_poll_interval(mut self, interval: Duration) -> Self {
        self.stream_poll_interval = interval;
        self
    }

    pub fn with_sync_timeout(mut self, timeout: Duration) -> Self {
        self.sync_timeout = timeout;
        self
    }

    pub fn with_wire_schema(mut self, schema: WireSchema) -> Self {
        self.wire_schema = schema;
        self
    }

    /// Whether `model` delivers its output as incremental chunks.
    pub fn is_stream_model(&self, model: &str) -> bool {
        self.stream_models.iter().any(|m| m == model)
    }

    /// The API key with all but the last 4 characters hidden.
    pub fn api_key_hint(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() >= 8 {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("...{tail}")
        } else {
            "****".to_string()
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key_hint())
            .field("predict_url", &self.predict_url)
            .field("status_url", &self.status_url)
            .field("models_url", &self.models_url)
            .field("stream_models", &self.stream_models)
            .field("poll_interval", &self.poll_interval)
            .field("stream_poll_interval", &self.stream_poll_interval)
            .field("sync_timeout", &self.sync_timeout)
            .field("wire_schema", &self.wire_schema)
            .finish()
    }
}

fn parse_secs(var: &str, value: &str) -> Result<Duration, PredictError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| {
            PredictError::InvalidArgument(format!(
                "{var} must be a whole number of seconds, got '{value}'"
            ))
        })
}
