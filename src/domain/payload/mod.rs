//! Encoded recording payload

mod mime_type;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

pub use mime_type::AudioMimeType;

/// Payload errors
#[derive(Debug, Clone, Error)]
pub enum PayloadError {
    #[error("Recording produced no audio data")]
    Empty,

    #[error("Invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Unsupported audio MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("Encoding task failed: {0}")]
    EncodingFailed(String),
}

/// Value object holding one recording as standard base64 (no line
/// wraps) together with its container MIME type.
///
/// Built either by encoding bytes or by validating existing base64, so the
/// preview URI always decodes to the same bytes as the base64 string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    base64: String,
    mime_type: AudioMimeType,
    size_bytes: usize,
}

impl Payload {
    /// Encode raw container bytes
    pub fn encode(data: &[u8], mime_type: AudioMimeType) -> Self {
        Self {
            base64: STANDARD.encode(data),
            mime_type,
            size_bytes: data.len(),
        }
    }

    /// Wrap an existing base64 string after checking it decodes
    pub fn from_base64(base64: impl Into<String>, mime_type: AudioMimeType) -> Result<Self, PayloadError> {
        let base64 = base64.into();
        let decoded = STANDARD
            .decode(base64.as_bytes())
            .map_err(|e| PayloadError::InvalidBase64(e.to_string()))?;
        Ok(Self {
            base64,
            mime_type,
            size_bytes: decoded.len(),
        })
    }

    /// Parse a `data:<mime>;base64,<payload>` URI
    pub fn from_data_uri(uri: &str) -> Result<Self, PayloadError> {
        let rest = uri
            .strip_prefix("data:")
            .ok_or_else(|| PayloadError::InvalidDataUri("missing 'data:' scheme".into()))?;
        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| PayloadError::InvalidDataUri("missing ',' separator".into()))?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| PayloadError::InvalidDataUri("payload is not base64".into()))?;

        Self::from_base64(data, mime.parse()?)
    }

    /// The base64 string
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// Container MIME type
    pub fn mime_type(&self) -> AudioMimeType {
        self.mime_type
    }

    /// Preview source for the audio element
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type.as_str(), self.base64)
    }

    /// Decode back to the container bytes
    pub fn decode(&self) -> Result<Vec<u8>, PayloadError> {
        STANDARD
            .decode(self.base64.as_bytes())
            .map_err(|e| PayloadError::InvalidBase64(e.to_string()))
    }

    /// Size of the decoded audio in bytes
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// True for a zero-byte recording
    pub fn is_empty(&self) -> bool {
        self.size_bytes == 0
    }

    /// Get human-readable size
    pub fn human_readable_size(&self) -> String {
        let bytes = self.size_bytes;
        if bytes < 1024 {
            format!("{} B", bytes)
        } else if bytes < 1024 * 1024 {
            format!("{:.1} KB", bytes as f64 / 1024.0)
        } else {
            format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
        }
    }
}
