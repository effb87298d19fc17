//! Field-name mapping for the service's JSON contract.
//!
//! The service has renamed submission fields over time (`source_image`
//! vs `image_input`, with and without `model`/`api_set`), so the names are
//! carried in a [`WireSchema`] instead of being hard-coded.

use serde::{Deserialize, Serialize};

use crate::error::PredictError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireSchema {
    pub image_field: String,
    pub audio_field: String,
    pub text_field: String,
    pub guidance_scale_field: String,
    pub output_format_field: String,
    pub voice_field: String,
    pub emotion_field: String,
    pub language_field: String,
    /// Field carrying the model id; omitted from the body when `None`.
    pub model_field: Option<String>,
    /// Field carrying the generation mode name; omitted when `None`.
    pub api_set_field: Option<String>,
    /// Candidate fields for the job handle in a submission response,
    /// tried in order.
    pub handle_fields: Vec<String>,
}

impl Default for WireSchema {
    fn default() -> Self {
        Self::current()
    }
}

impl WireSchema {
    /// Field names of the current service revision.
    pub fn current() -> Self {
        Self {
            image_field: "image_input".into(),
            audio_field: "audio".into(),
            text_field: "text".into(),
            guidance_scale_field: "guidance_scale".into(),
            output_format_field: "output_format".into(),
            voice_field: "voice_id".into(),
            emotion_field: "emotion".into(),
            language_field: "language_boost".into(),
            model_field: Some("model".into()),
            api_set_field: Some("api_set".into()),
            handle_fields: vec!["id".into(), "prediction_id".into(), "job_id".into()],
        }
    }

    /// Field names of the first revision: `source_image`, no model selector.
    pub fn legacy() -> Self {
        Self {
            image_field: "source_image".into(),
            model_field: None,
            api_set_field: None,
            ..Self::current()
        }
    }

    /// Resolve a schema from a preset name (`current`, `legacy`) or an
    /// inline JSON object overriding individual fields.
    pub fn from_spec(spec: &str) -> Result<Self, PredictError> {
        match spec.trim() {
            "" | "current" => Ok(Self::current()),
            "legacy" => Ok(Self::legacy()),
            json if json.starts_with('{') => serde_json::from_str(json)
                .map_err(|e| PredictError::InvalidArgument(format!("Invalid wire schema: {e}"))),
            other => Err(PredictError::InvalidArgument(format!(
                "Unknown wire schema '{other}'. Valid presets: current, legacy"
            ))),
        }
    }

    /// Find the job handle in a submission response.
    pub fn extract_handle(&self, response: &serde_json::Value) -> Option<String> {
        self.handle_fields.iter().find_map(|field| match response.get(field)? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}
