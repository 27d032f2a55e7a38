//! Audio container MIME types

use std::fmt;
use std::str::FromStr;

use super::PayloadError;

/// Supported audio container MIME types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AudioMimeType {
    #[default]
    Webm,
    Ogg,
    Flac,
    Wav,
}

impl AudioMimeType {
    /// Get the MIME type string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Webm => "audio/webm",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
            Self::Wav => "audio/wav",
        }
    }

    /// Get the file extension
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
            Self::Wav => "wav",
        }
    }
}

impl fmt::Display for AudioMimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AudioMimeType {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // codec parameters such as ";codecs=opus" are ignored
        let essence = s.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "audio/webm" => Ok(Self::Webm),
            "audio/ogg" => Ok(Self::Ogg),
            "audio/flac" | "audio/x-flac" => Ok(Self::Flac),
            "audio/wav" | "audio/x-wav" | "audio/wave" => Ok(Self::Wav),
            _ => Err(PayloadError::UnsupportedMimeType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_webm() {
        assert_eq!(AudioMimeType::default(), AudioMimeType::Webm);
        assert_eq!(AudioMimeType::default().as_str(), "audio/webm");
    }

    #[test]
    fn extensions() {
        assert_eq!(AudioMimeType::Webm.extension(), "webm");
        assert_eq!(AudioMimeType::Flac.extension(), "flac");
    }

    #[test]
    fn parse_with_codec_parameter() {
        let mime: AudioMimeType = "audio/webm;codecs=opus".parse().unwrap();
        assert_eq!(mime, AudioMimeType::Webm);
        assert_eq!("AUDIO/X-FLAC".parse::<AudioMimeType>().unwrap(), AudioMimeType::Flac);
    }

    #[test]
    fn parse_unsupported() {
        assert!("video/mp4".parse::<AudioMimeType>().is_err());
    }
}
