//! Prediction requests: caller-facing inputs, validation, and the encoded
//! job body submitted to the service.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::encoding::{encode_file, DataUri};
use crate::error::PredictError;
use crate::types::{GenerationMode, OutputFormat};
use crate::wire::WireSchema;

/// Default classifier-free guidance scale.
pub const DEFAULT_GUIDANCE_SCALE: f64 = 1.0;

/// Named generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GenerationParams {
    #[validate(range(exclusive_min = 0.0, message = "guidance_scale must be positive"))]
    pub guidance_scale: f64,
    pub output_format: OutputFormat,
    pub voice_id: Option<String>,
    pub emotion: Option<String>,
    pub language: Option<String>,
    /// Log poll progress at `info` instead of `debug`.
    pub verbose: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            output_format: OutputFormat::Mp4,
            voice_id: None,
            emotion: None,
            language: None,
            verbose: false,
        }
    }
}

/// One call to `predict`: local inputs plus parameters.
#[derive(Debug, Clone, Validate)]
pub struct PredictionRequest {
    pub mode: GenerationMode,
    #[validate(length(min = 1, message = "model must not be empty"))]
    pub model: String,
    pub image_path: Option<PathBuf>,
    pub audio_path: Option<PathBuf>,
    pub text: Option<String>,
    #[validate(nested)]
    pub params: GenerationParams,
}

impl PredictionRequest {
    /// Image + audio lip-sync request.
    pub fn image_audio(
        model: impl Into<String>,
        image_path: impl Into<PathBuf>,
        audio_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mode: GenerationMode::ImageAudioToVideo,
            model: model.into(),
            image_path: Some(image_path.into()),
            audio_path: Some(audio_path.into()),
            text: None,
            params: GenerationParams::default(),
        }
    }

    /// Image + text request, voiced by the service.
    pub fn image_text(
        model: impl Into<String>,
        image_path: impl Into<PathBuf>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            mode: GenerationMode::ImageTextToVideo,
            model: model.into(),
            image_path: Some(image_path.into()),
            audio_path: None,
            text: Some(text.into()),
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_output_format(mut self, output_format: OutputFormat) -> Self {
        self.params.output_format = output_format;
        self
    }

    pub fn with_guidance_scale(mut self, guidance_scale: f64) -> Self {
        self.params.guidance_scale = guidance_scale;
        self
    }

    /// Check parameters and mode-required inputs without touching the
    /// filesystem or the network.
    pub fn validate_inputs(&self) -> Result<(), PredictError> {
        self.validate()
            .map_err(|e| PredictError::InvalidArgument(e.to_string()))?;

        if !self.params.guidance_scale.is_finite() {
            return Err(PredictError::InvalidArgument(
                "guidance_scale must be a finite number".into(),
            ));
        }

        if self.image_path.is_none() {
            return Err(PredictError::InvalidArgument(format!(
                "{} mode requires an image",
                self.mode
            )));
        }

        match self.mode {
            GenerationMode::ImageAudioToVideo if self.audio_path.is_none() => {
                Err(PredictError::InvalidArgument(
                    "audio_to_video mode requires an audio file".into(),
                ))
            }
            GenerationMode::ImageTextToVideo
                if self.text.as_deref().map_or(true, |t| t.trim().is_empty()) =>
            {
                Err(PredictError::InvalidArgument(
                    "text_to_video mode requires non-empty text".into(),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Validate, then read and encode every referenced file.
    pub fn encode(&self) -> Result<EncodedRequest, PredictError> {
        self.validate_inputs()?;

        let image_path = self.image_path.as_deref().ok_or_else(|| {
            PredictError::InvalidArgument(format!("{} mode requires an image", self.mode))
        })?;
        let image = encode_file(image_path)?;
        let audio = match (self.mode, &self.audio_path) {
            (GenerationMode::ImageAudioToVideo, Some(path)) => Some(encode_file(path)?),
            _ => None,
        };
        let text = match self.mode {
            GenerationMode::ImageTextToVideo => self.text.clone(),
            GenerationMode::ImageAudioToVideo => None,
        };

        Ok(EncodedRequest {
            mode: self.mode,
            model: self.model.clone(),
            image,
            audio,
            text,
            params: self.params.clone(),
        })
    }
}

/// A validated request whose media is already inlined.
#[derive(Debug, Clone)]
pub struct EncodedRequest {
    pub mode: GenerationMode,
    pub model: String,
    pub image: DataUri,
    pub audio: Option<DataUri>,
    pub text: Option<String>,
    pub params: GenerationParams,
}

impl EncodedRequest {
    /// Build the JSON submission body using the given field names.
    ///
    /// Unset optional parameters are omitted rather than sent as `null`.
    pub fn to_body(&self, schema: &WireSchema) -> Value {
        let mut body = Map::new();

        if let Some(field) = &schema.model_field {
            body.insert(field.clone(), Value::String(self.model.clone()));
        }
        if let Some(field) = &schema.api_set_field {
            body.insert(field.clone(), Value::String(self.mode.wire_name().into()));
        }

        body.insert(schema.image_field.clone(), Value::String(self.image.to_string()));
        if let Some(audio) = &self.audio {
            body.insert(schema.audio_field.clone(), Value::String(audio.to_string()));
        }
        if let Some(text) = &self.text {
            body.insert(schema.text_field.clone(), Value::String(text.clone()));
        }

        body.insert(
            schema.guidance_scale_field.clone(),
            serde_json::json!(self.params.guidance_scale),
        );
        body.insert(
            schema.output_format_field.clone(),
            Value::String(self.params.output_format.as_str().into()),
        );

        let optional = [
            (&schema.voice_field, &self.params.voice_id),
            (&schema.emotion_field, &self.params.emotion),
            (&schema.language_field, &self.params.language),
        ];
        for (field, value) in optional {
            if let Some(value) = value {
                body.insert(field.clone(), Value::String(value.clone()));
            }
        }

        Value::Object(body)
    }
}
