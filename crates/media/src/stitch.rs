//! Download streamed chunks and join them into one video file.

use std::path::{Path, PathBuf};

use casablanca_client::Transport;

use crate::error::MediaError;
use crate::ffmpeg::ChunkConcatenator;

/// A chunk that could not be downloaded and was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedChunk {
    pub index: usize,
    pub url: String,
    pub reason: String,
}

/// Result of [`stitch_chunks`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StitchOutcome {
    pub output: PathBuf,
    /// Indices of the chunks included, in order.
    pub used: Vec<usize>,
    pub skipped: Vec<SkippedChunk>,
}

/// Download every chunk in order and concatenate the ones that arrived.
///
/// A failed download is logged and skipped. If no chunk could be
/// downloaded, nothing is written and [`MediaError::NoChunksDownloaded`]
/// is returned.
pub async fn stitch_chunks(
    transport: &dyn Transport,
    urls: &[String],
    output: &Path,
    concatenator: &dyn ChunkConcatenator,
) -> Result<StitchOutcome, MediaError> {
    let workdir = tempfile::tempdir()?;
    let mut files = Vec::with_capacity(urls.len());
    let mut used = Vec::with_capacity(urls.len());
    let mut skipped = Vec::new();

    for (index, url) in urls.iter().enumerate() {
        let dest = workdir
            .path()
            .join(format!("chunk_{index:04}.{}", chunk_extension(url)));

        match transport.download(url, &dest).await {
            Ok(bytes) => {
                tracing::debug!(index, url = %url, bytes, "Chunk downloaded");
                files.push(dest);
                used.push(index);
            }
            Err(e) => {
                tracing::warn!(
                    index,
                    url = %url,
                    error = %e,
                    "Skipping chunk that failed to download",
                );
                skipped.push(SkippedChunk {
                    index,
                    url: url.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if files.is_empty() {
        return Err(MediaError::NoChunksDownloaded {
            attempted: urls.len(),
        });
    }

    concatenator.concat(&files, output).await?;

    tracing::info!(
        output = %output.display(),
        used = used.len(),
        skipped = skipped.len(),
        "Chunks stitched",
    );

    Ok(StitchOutcome {
        output: output.to_path_buf(),
        used,
        skipped,
    })
}

/// File extension taken from the URL path, ignoring any query string.
fn chunk_extension(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_plain_extension(ext) => ext,
        _ => "mp4",
    }
}

fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
}
