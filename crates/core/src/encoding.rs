//! Inline-binary request payloads.
//!
//! Local media files are sent to the service as base64 `data:` URIs
//! tagged with a MIME type detected from the file extension. Both
//! preconditions (file exists, type is known) are checked here so that a
//! bad input aborts before any job is submitted.

use std::fmt;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use mime_guess::Mime;

use crate::error::PredictError;

/// A `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    mime: String,
    payload: String,
}

impl DataUri {
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            mime: mime.to_string(),
            payload: BASE64.encode(bytes),
        }
    }

    /// Parse a base64 data URI produced by [`encode_file`] or the service.
    pub fn parse(uri: &str) -> Result<Self, PredictError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PredictError::InvalidArgument("Not a data URI".into()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| PredictError::InvalidArgument("Data URI has no payload".into()))?;
        let mime = header.strip_suffix(";base64").ok_or_else(|| {
            PredictError::InvalidArgument(format!("Data URI is not base64-encoded: '{header}'"))
        })?;
        Ok(Self {
            mime: mime.to_string(),
            payload: payload.to_string(),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Decode the payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>, PredictError> {
        BASE64
            .decode(&self.payload)
            .map_err(|e| PredictError::Decode(format!("invalid base64 payload: {e}")))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "data:{};base64,{}", self.mime, self.payload)
    }
}

/// Read a local file and encode it as a [`DataUri`].
pub fn encode_file(path: &Path) -> Result<DataUri, PredictError> {
    if !path.exists() {
        return Err(PredictError::FileNotFound(path.to_path_buf()));
    }

    let mime =
        guess_mime(path).ok_or_else(|| PredictError::UnknownContentType(path.to_path_buf()))?;

    let bytes = std::fs::read(path).map_err(|source| PredictError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(DataUri::from_bytes(mime.essence_str(), &bytes))
}

/// Detect the MIME type of a media file from its extension.
pub fn guess_mime(path: &Path) -> Option<Mime> {
    mime_guess::from_path(path).first()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn write_temp(name: &str, bytes: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        (dir, path)
    }

    #[test]
    fn encoded_file_decodes_to_identical_bytes() {
        let bytes: Vec<u8> = (0..=255).cycle().take(4099).collect();
        let (_dir, path) = write_temp("face.PNG", &bytes);

        let uri = encode_file(&path).unwrap();
        assert_eq!(uri.mime(), "image/png");

        let parsed = DataUri::parse(&uri.to_string()).unwrap();
        assert_eq!(parsed, uri);
        assert_eq!(parsed.decode().unwrap(), bytes);
    }

    #[test]
    fn short_files_round_trip_through_padding() {
        for len in 0..=3u8 {
            let bytes: Vec<u8> = (0..len).map(|b| b.wrapping_mul(97)).collect();
            let (_dir, path) = write_temp("voice.wav", &bytes);

            let uri = encode_file(&path).unwrap();
            let decoded = DataUri::parse(&uri.to_string()).unwrap().decode().unwrap();
            assert_eq!(decoded, bytes, "length {len}");
        }
    }

    #[test]
    fn common_media_types_are_recognized() {
        for (name, prefix) in [
            ("face.tiff", "image/"),
            ("face.tif", "image/"),
            ("face.svg", "image/svg"),
            ("voice.aiff", "audio/"),
            ("clip.avi", "video/"),
            ("face.jpeg", "image/jpeg"),
            ("voice.mp3", "audio/mpeg"),
        ] {
            let (_dir, path) = write_temp(name, b"data");
            let uri = encode_file(&path).unwrap();
            assert!(uri.mime().starts_with(prefix), "{name} -> {}", uri.mime());
        }
    }

    #[test]
    fn identical_bytes_encode_identically() {
        let (_a, first) = write_temp("a.wav", b"RIFF....WAVE");
        let (_b, second) = write_temp("b.wav", b"RIFF....WAVE");
        assert_eq!(
            encode_file(&first).unwrap().to_string(),
            encode_file(&second).unwrap().to_string()
        );
    }

    #[test]
    fn data_uri_prefix() {
        let uri = DataUri::from_bytes("audio/wav", b"abc");
        assert_eq!(uri.to_string(), "data:audio/wav;base64,YWJj");
    }

    #[test]
    fn missing_file_is_reported() {
        let err = encode_file(Path::new("/definitely/not/here.png")).unwrap_err();
        assert_matches!(err, PredictError::FileNotFound(p) if p.ends_with("here.png"));
    }

    #[test]
    fn unknown_extension_is_reported() {
        let (_dir, path) = write_temp("notes.qqzz", b"hello");
        assert_matches!(encode_file(&path), Err(PredictError::UnknownContentType(_)));

        let (_dir, bare) = write_temp("noext", b"hello");
        assert_matches!(encode_file(&bare), Err(PredictError::UnknownContentType(_)));
    }

    #[test]
    fn parse_rejects_non_base64_uri() {
        assert_matches!(
            DataUri::parse("data:text/plain,hello"),
            Err(PredictError::InvalidArgument(_))
        );
        assert_matches!(
            DataUri::parse("https://example.com/a.png"),
            Err(PredictError::InvalidArgument(_))
        );
    }
}
