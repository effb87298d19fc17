//! FFmpeg command utilities: mux raw frames and audio into an MP4 clip, and
//! concatenate chunk files with the concat demuxer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use casablanca_core::types::{AudioTensor, FrameTensor, RawData};

use crate::error::MediaError;

pub const DEFAULT_FPS: u32 = 25;
pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;

/// Encoding settings for [`save_av_clip`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipOptions {
    pub fps: u32,
    pub sample_rate: u32,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write `raw` to `output` as an H.264/AAC MP4.
///
/// Frames are clamped to `0..=255` and passed as `rgb24`; audio is passed as
/// interleaved `f32le`. Intermediate files live in a temp dir that is removed
/// when this returns.
pub async fn save_av_clip(
    raw: &RawData,
    output: &Path,
    options: ClipOptions,
) -> Result<(), MediaError> {
    let [channels, height, width] = raw.frames.frame_shape();
    if raw.frames.num_frames() == 0 {
        return Err(MediaError::InvalidTensor("clip has no frames".into()));
    }
    if channels != 3 {
        return Err(MediaError::InvalidTensor(format!(
            "expected 3 colour channels, got {channels}"
        )));
    }

    let video = frames_to_rgb24(&raw.frames)?;
    let audio = audio_to_f32le(&raw.audio)?;

    let workdir = tempfile::tempdir()?;
    let video_path = workdir.path().join("frames.rgb");
    let audio_path = workdir.path().join("audio.f32");
    tokio::fs::write(&video_path, &video).await?;
    tokio::fs::write(&audio_path, &audio).await?;

    let mut cmd = tokio::process::Command::new("ffmpeg");
    cmd.args(["-y", "-f", "rawvideo", "-pix_fmt", "rgb24", "-s"])
        .arg(format!("{width}x{height}"))
        .arg("-r")
        .arg(options.fps.to_string())
        .arg("-i")
        .arg(&video_path)
        .args(["-f", "f32le", "-ar"])
        .arg(options.sample_rate.to_string())
        .arg("-ac")
        .arg(raw.audio.channels.max(1).to_string())
        .arg("-i")
        .arg(&audio_path)
        .args([
            "-c:v", "libx264", "-crf", "18", "-pix_fmt", "yuv420p", "-c:a", "aac",
        ])
        .arg(output);

    run(cmd).await?;

    tracing::info!(
        output = %output.display(),
        frames = raw.frames.num_frames(),
        fps = options.fps,
        "Clip written",
    );
    Ok(())
}

/// Convert `(T, C, H, W)` frames into packed `rgb24` bytes, frame by frame
/// in `H, W, C` order.
pub fn frames_to_rgb24(frames: &FrameTensor) -> Result<Vec<u8>, MediaError> {
    if !frames.is_consistent() {
        return Err(MediaError::InvalidTensor(format!(
            "frame data has {} values for shape {:?}",
            frames.data.len(),
            frames.shape
        )));
    }

    let [t, c, h, w] = frames.shape;
    let plane = h * w;
    let mut out = Vec::with_capacity(frames.data.len());
    for frame in 0..t {
        let base = frame * c * plane;
        for pixel in 0..plane {
            for channel in 0..c {
                let value = frames.data[base + channel * plane + pixel];
                out.push(value.round().clamp(0.0, 255.0) as u8);
            }
        }
    }
    Ok(out)
}

/// Convert `(channels, samples)` audio into interleaved little-endian `f32`
/// bytes. A single channel is written as-is.
pub fn audio_to_f32le(audio: &AudioTensor) -> Result<Vec<u8>, MediaError> {
    if !audio.is_consistent() {
        return Err(MediaError::InvalidTensor(format!(
            "audio data has {} values for {} x {}",
            audio.data.len(),
            audio.channels,
            audio.samples
        )));
    }

    let mut out = Vec::with_capacity(audio.data.len() * 4);
    for sample in 0..audio.samples {
        for channel in 0..audio.channels {
            let value = audio.data[channel * audio.samples + sample];
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Concatenation
// ---------------------------------------------------------------------------

/// Joins downloaded chunk files into a single output file.
#[async_trait]
pub trait ChunkConcatenator: Send + Sync {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MediaError>;
}

/// Concatenation through ffmpeg's concat demuxer with stream copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfmpegConcat;

#[async_trait]
impl ChunkConcatenator for FfmpegConcat {
    async fn concat(&self, inputs: &[PathBuf], output: &Path) -> Result<(), MediaError> {
        let list = tempfile::Builder::new()
            .prefix("concat-")
            .suffix(".txt")
            .tempfile()?;
        tokio::fs::write(list.path(), concat_list_contents(inputs)).await?;

        let mut cmd = tokio::process::Command::new("ffmpeg");
        cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(list.path())
            .args(["-c", "copy"])
            .arg(output);

        run(cmd).await
    }
}

/// Body of a concat demuxer list file.
pub fn concat_list_contents(inputs: &[PathBuf]) -> String {
    inputs
        .iter()
        .map(|path| {
            let escaped = path.to_string_lossy().replace('\'', r"'\''");
            format!("file '{escaped}'\n")
        })
        .collect()
}

async fn run(mut cmd: tokio::process::Command) -> Result<(), MediaError> {
    let output = cmd.output().await.map_err(MediaError::NotFound)?;

    if !output.status.success() {
        return Err(MediaError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }
    Ok(())
}
