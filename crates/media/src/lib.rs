//! Media collaborators for Casablanca results: load `chunks` payloads into
//! [`RawData`](casablanca_core::types::RawData), write them out as playable
//! clips, and stitch streamed chunk files into one video.

pub mod error;
pub mod ffmpeg;
pub mod raw_loader;
pub mod stitch;

pub use error::MediaError;
pub use ffmpeg::{save_av_clip, ChunkConcatenator, ClipOptions, FfmpegConcat};
pub use raw_loader::{TempFileRawLoader, TensorDecoder};
pub use stitch::{stitch_chunks, SkippedChunk, StitchOutcome};
