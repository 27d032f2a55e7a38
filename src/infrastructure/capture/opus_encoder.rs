//! Speech-oriented Opus encoding of captured PCM into a WebM container
//!
//! Samples are resampled from the device rate to 16 kHz mono, cut into
//! 20 ms frames and encoded with VOIP settings. The packets are muxed into
//! a single-track WebM file by [`super::webm`].

use rubato::{FftFixedIn, Resampler};

use super::webm::{self, OpusTrack};

/// Sample rate the encoder runs at
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Opus frame size in samples (20ms at 16kHz)
pub const FRAME_SIZE: usize = 320;

/// Duration of one Opus frame
pub const FRAME_DURATION_MS: u64 = 20;

/// Target bitrate in bits per second
const TARGET_BITRATE: i32 = 24000;

/// Largest packet libopus will produce for one frame
const MAX_PACKET_SIZE: usize = 4000;

/// Encoder lookahead in 48kHz samples, written as the OpusHead pre-skip
const PRE_SKIP: u16 = 312;

/// Opus encoder with VOIP settings
pub struct OpusEncoder {
    encoder: opus::Encoder,
}

impl OpusEncoder {
    pub fn new() -> Result<Self, EncodingError> {
        let mut encoder = opus::Encoder::new(
            TARGET_SAMPLE_RATE,
            opus::Channels::Mono,
            opus::Application::Voip,
        )
        .map_err(init_error)?;

        encoder
            .set_bitrate(opus::Bitrate::Bits(TARGET_BITRATE))
            .map_err(init_error)?;
        encoder.set_vbr(true).map_err(init_error)?;
        encoder.set_inband_fec(true).map_err(init_error)?;

        Ok(Self { encoder })
    }

    /// Encode mono 16kHz samples into one Opus packet per 20ms frame.
    /// The last frame is padded with silence.
    pub fn encode_frames(&mut self, pcm_samples: &[i16]) -> Result<Vec<Vec<u8>>, EncodingError> {
        let mut packets = Vec::with_capacity(pcm_samples.len() / FRAME_SIZE + 1);

        for chunk in pcm_samples.chunks(FRAME_SIZE) {
            let frame = if chunk.len() < FRAME_SIZE {
                let mut padded = vec![0i16; FRAME_SIZE];
                padded[..chunk.len()].copy_from_slice(chunk);
                padded
            } else {
                chunk.to_vec()
            };

            let mut packet = vec![0u8; MAX_PACKET_SIZE];
            let len = self
                .encoder
                .encode(&frame, &mut packet)
                .map_err(|e| EncodingError::OpusEncode(e.to_string()))?;
            packet.truncate(len);
            packets.push(packet);
        }

        Ok(packets)
    }
}

/// Opus identification header, stored as the track's codec private data
pub fn opus_head() -> Vec<u8> {
    let mut head = Vec::with_capacity(19);
    head.extend_from_slice(b"OpusHead");
    head.push(1); // version
    head.push(1); // mono
    head.extend_from_slice(&PRE_SKIP.to_le_bytes());
    head.extend_from_slice(&TARGET_SAMPLE_RATE.to_le_bytes());
    head.extend_from_slice(&0i16.to_le_bytes()); // output gain
    head.push(0); // channel mapping family
    head
}

fn init_error(e: opus::Error) -> EncodingError {
    EncodingError::OpusInit(e.to_string())
}

/// Encode mono i16 samples captured at `sample_rate` into a complete WebM file
pub fn encode_to_webm(pcm_samples: &[i16], sample_rate: u32) -> Result<Vec<u8>, EncodingError> {
    if pcm_samples.is_empty() {
        return Err(EncodingError::NoSamples);
    }

    let resampled = resample_to_target(pcm_samples, sample_rate)?;
    let packets = OpusEncoder::new()?.encode_frames(&resampled)?;

    let track = OpusTrack {
        codec_private: opus_head(),
        codec_delay_ns: u64::from(PRE_SKIP) * 1_000_000_000 / 48_000,
        frame_duration_ms: FRAME_DURATION_MS,
    };
    Ok(webm::mux(&track, &packets))
}

/// Resample mono i16 audio to 16kHz
fn resample_to_target(samples: &[i16], source_rate: u32) -> Result<Vec<i16>, EncodingError> {
    if source_rate == TARGET_SAMPLE_RATE {
        return Ok(samples.to_vec());
    }
    if source_rate == 0 {
        return Err(EncodingError::Resample("sample rate is zero".into()));
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        TARGET_SAMPLE_RATE as usize,
        1024,
        2,
        1,
    )
    .map_err(|e| EncodingError::Resample(e.to_string()))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());

        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| EncodingError::Resample(e.to_string()))?;

        output.extend(
            resampled[0]
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16),
        );
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

/// Encoding errors
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("No audio samples captured")]
    NoSamples,

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Opus encoder setup failed: {0}")]
    OpusInit(String),

    #[error("Opus encoding failed: {0}")]
    OpusEncode(String),
}
