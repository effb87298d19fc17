//! Shared domain types: generation modes, output shapes, metrics and
//! decoded raw payloads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stage name to duration in seconds.
pub type Metrics = BTreeMap<String, f64>;

/// Which inputs drive the generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationMode {
    /// Image + audio track, lip-synced to the audio.
    #[serde(rename = "audio_to_video")]
    ImageAudioToVideo,
    /// Image + text, spoken through a synthesized voice.
    #[serde(rename = "text_to_video")]
    ImageTextToVideo,
}

impl GenerationMode {
    /// Name the service uses for this mode (`api_set`).
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::ImageAudioToVideo => "audio_to_video",
            Self::ImageTextToVideo => "text_to_video",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Declared shape of the final output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A single encoded video file, returned as a URL.
    #[default]
    Mp4,
    /// A serialized frame/audio payload that is downloaded and decoded.
    Chunks,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Chunks => "chunks",
        }
    }
}

/// Video frames laid out as `(T, C, H, W)` with sample values in `0..=255`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTensor {
    pub shape: [usize; 4],
    pub data: Vec<f32>,
}

/// Audio samples laid out as `(channels, samples)`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioTensor {
    pub channels: usize,
    pub samples: usize,
    pub data: Vec<f32>,
}

impl FrameTensor {
    pub fn num_frames(&self) -> usize {
        self.shape[0]
    }

    /// `(C, H, W)` of a single frame.
    pub fn frame_shape(&self) -> [usize; 3] {
        [self.shape[1], self.shape[2], self.shape[3]]
    }

    /// Whether `data` holds exactly as many values as `shape` describes.
    pub fn is_consistent(&self) -> bool {
        self.shape
            .iter()
            .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
            == Some(self.data.len())
    }
}

impl AudioTensor {
    pub fn is_consistent(&self) -> bool {
        self.channels.checked_mul(self.samples) == Some(self.data.len())
    }
}

/// Decoded frame and audio payload of a `chunks` result.
#[derive(Debug, Clone, PartialEq)]
pub struct RawData {
    pub frames: FrameTensor,
    pub audio: AudioTensor,
}

/// Summary of a [`RawData`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawDataInfo {
    pub num_frames: usize,
    pub frame_shape: [usize; 3],
    pub audio_samples: usize,
}

impl RawData {
    pub fn info(&self) -> RawDataInfo {
        RawDataInfo {
            num_frames: self.frames.num_frames(),
            frame_shape: self.frames.frame_shape(),
            audio_samples: self.audio.samples,
        }
    }
}

impl fmt::Display for RawDataInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [c, h, w] = self.frame_shape;
        write!(
            f,
            "Video Frames: {}, Frame Shape (C, H, W): ({c}, {h}, {w}), Audio Samples: {}",
            self.num_frames, self.audio_samples
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_names_match_serde() {
        for mode in [GenerationMode::ImageAudioToVideo, GenerationMode::ImageTextToVideo] {
            let json = serde_json::to_value(mode).unwrap();
            assert_eq!(json, mode.wire_name());
        }
    }

    #[test]
    fn output_format_defaults_to_mp4() {
        assert_eq!(OutputFormat::default(), OutputFormat::Mp4);
        assert_eq!(serde_json::to_value(OutputFormat::Chunks).unwrap(), "chunks");
    }

    #[test]
    fn raw_data_info_reports_shapes() {
        let raw = RawData {
            frames: FrameTensor {
                shape: [2, 3, 4, 5],
                data: vec![0.0; 120],
            },
            audio: AudioTensor {
                channels: 1,
                samples: 640,
                data: vec![0.0; 640],
            },
        };
        let info = raw.info();
        assert_eq!(info.num_frames, 2);
        assert_eq!(info.frame_shape, [3, 4, 5]);
        assert_eq!(info.audio_samples, 640);
        assert!(raw.frames.is_consistent());
        assert!(raw.audio.is_consistent());
    }

    #[test]
    fn overflowing_shapes_are_inconsistent() {
        let frames = FrameTensor {
            shape: [usize::MAX, 2, 2, 1],
            data: vec![0.0; 4],
        };
        assert!(!frames.is_consistent());

        let audio = AudioTensor {
            channels: usize::MAX,
            samples: 3,
            data: vec![0.0; 3],
        };
        assert!(!audio.is_consistent());
    }
}
