//! Minimal WebM (Matroska) muxer for a single mono Opus track
//!
//! Writes an EBML header, then one Segment holding Info, Tracks and a
//! Cluster every [`CLUSTER_DURATION_MS`] of SimpleBlocks. Element sizes
//! are known up front, so no Cues or SeekHead are written.

/// Track settings for the muxed Opus stream
#[derive(Debug, Clone)]
pub struct OpusTrack {
    /// OpusHead identification header
    pub codec_private: Vec<u8>,
    /// Decoder pre-skip in nanoseconds
    pub codec_delay_ns: u64,
    pub frame_duration_ms: u64,
}

/// Maximum span of one cluster. SimpleBlock offsets are signed 16-bit.
pub const CLUSTER_DURATION_MS: u64 = 5000;

/// Opus output rate as declared in the Audio element
const OPUS_OUTPUT_RATE: f64 = 48000.0;

const SEEK_PRE_ROLL_NS: u64 = 80_000_000;

mod id {
    pub const EBML: u32 = 0x1A45_DFA3;
    pub const EBML_VERSION: u32 = 0x4286;
    pub const EBML_READ_VERSION: u32 = 0x42F7;
    pub const EBML_MAX_ID_LENGTH: u32 = 0x42F2;
    pub const EBML_MAX_SIZE_LENGTH: u32 = 0x42F3;
    pub const DOC_TYPE: u32 = 0x4282;
    pub const DOC_TYPE_VERSION: u32 = 0x4287;
    pub const DOC_TYPE_READ_VERSION: u32 = 0x4285;

    pub const SEGMENT: u32 = 0x1853_8067;
    pub const INFO: u32 = 0x1549_A966;
    pub const TIMECODE_SCALE: u32 = 0x2A_D7B1;
    pub const MUXING_APP: u32 = 0x4D80;
    pub const WRITING_APP: u32 = 0x5741;
    pub const DURATION: u32 = 0x4489;

    pub const TRACKS: u32 = 0x1654_AE6B;
    pub const TRACK_ENTRY: u32 = 0xAE;
    pub const TRACK_NUMBER: u32 = 0xD7;
    pub const TRACK_UID: u32 = 0x73C5;
    pub const TRACK_TYPE: u32 = 0x83;
    pub const CODEC_ID: u32 = 0x86;
    pub const CODEC_PRIVATE: u32 = 0x63A2;
    pub const CODEC_DELAY: u32 = 0x56AA;
    pub const SEEK_PRE_ROLL: u32 = 0x56BB;
    pub const AUDIO: u32 = 0xE1;
    pub const SAMPLING_FREQUENCY: u32 = 0xB5;
    pub const CHANNELS: u32 = 0x9F;

    pub const CLUSTER: u32 = 0x1F43_B675;
    pub const TIMECODE: u32 = 0xE7;
    pub const SIMPLE_BLOCK: u32 = 0xA3;
}

const TRACK_TYPE_AUDIO: u64 = 2;

/// Mux Opus packets, one per frame, into a complete WebM file
pub fn mux(track: &OpusTrack, packets: &[Vec<u8>]) -> Vec<u8> {
    let duration_ms = packets.len() as u64 * track.frame_duration_ms;

    let mut out = Vec::new();
    element(&mut out, id::EBML, &ebml_header());

    let mut segment = Vec::new();
    element(&mut segment, id::INFO, &info(duration_ms));
    element(&mut segment, id::TRACKS, &tracks(track));
    for cluster in clusters(track.frame_duration_ms, packets) {
        element(&mut segment, id::CLUSTER, &cluster);
    }
    element(&mut out, id::SEGMENT, &segment);

    out
}

fn ebml_header() -> Vec<u8> {
    let mut header = Vec::new();
    uint(&mut header, id::EBML_VERSION, 1);
    uint(&mut header, id::EBML_READ_VERSION, 1);
    uint(&mut header, id::EBML_MAX_ID_LENGTH, 4);
    uint(&mut header, id::EBML_MAX_SIZE_LENGTH, 8);
    element(&mut header, id::DOC_TYPE, b"webm");
    uint(&mut header, id::DOC_TYPE_VERSION, 4);
    uint(&mut header, id::DOC_TYPE_READ_VERSION, 2);
    header
}

fn info(duration_ms: u64) -> Vec<u8> {
    let app = concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION"));

    let mut info = Vec::new();
    uint(&mut info, id::TIMECODE_SCALE, 1_000_000);
    element(&mut info, id::MUXING_APP, app.as_bytes());
    element(&mut info, id::WRITING_APP, app.as_bytes());
    float(&mut info, id::DURATION, duration_ms as f64);
    info
}

fn tracks(track: &OpusTrack) -> Vec<u8> {
    let mut audio = Vec::new();
    float(&mut audio, id::SAMPLING_FREQUENCY, OPUS_OUTPUT_RATE);
    uint(&mut audio, id::CHANNELS, 1);

    let mut entry = Vec::new();
    uint(&mut entry, id::TRACK_NUMBER, 1);
    uint(&mut entry, id::TRACK_UID, 1);
    uint(&mut entry, id::TRACK_TYPE, TRACK_TYPE_AUDIO);
    element(&mut entry, id::CODEC_ID, b"A_OPUS");
    element(&mut entry, id::CODEC_PRIVATE, &track.codec_private);
    uint(&mut entry, id::CODEC_DELAY, track.codec_delay_ns);
    uint(&mut entry, id::SEEK_PRE_ROLL, SEEK_PRE_ROLL_NS);
    element(&mut entry, id::AUDIO, &audio);

    let mut tracks = Vec::new();
    element(&mut tracks, id::TRACK_ENTRY, &entry);
    tracks
}

/// Group packets into cluster bodies of at most CLUSTER_DURATION_MS each
fn clusters(frame_duration_ms: u64, packets: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let per_cluster = (CLUSTER_DURATION_MS / frame_duration_ms.max(1)).max(1) as usize;

    packets
        .chunks(per_cluster)
        .enumerate()
        .map(|(index, chunk)| {
            let cluster_start = (index * per_cluster) as u64 * frame_duration_ms;

            let mut cluster = Vec::new();
            uint(&mut cluster, id::TIMECODE, cluster_start);
            for (offset, packet) in chunk.iter().enumerate() {
                let relative = (offset as u64 * frame_duration_ms) as i16;
                element(&mut cluster, id::SIMPLE_BLOCK, &simple_block(relative, packet));
            }
            cluster
        })
        .collect()
}

fn simple_block(relative_ms: i16, packet: &[u8]) -> Vec<u8> {
    let mut block = Vec::with_capacity(packet.len() + 4);
    block.push(0x81); // track number 1 as a vint
    block.extend_from_slice(&relative_ms.to_be_bytes());
    block.push(0x80); // keyframe
    block.extend_from_slice(packet);
    block
}

fn element(out: &mut Vec<u8>, id: u32, payload: &[u8]) {
    write_id(out, id);
    write_size(out, payload.len() as u64);
    out.extend_from_slice(payload);
}

fn uint(out: &mut Vec<u8>, id: u32, value: u64) {
    let bytes = value.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    element(out, id, &bytes[start..]);
}

fn float(out: &mut Vec<u8>, id: u32, value: f64) {
    element(out, id, &value.to_be_bytes());
}

/// Element IDs carry their own length marker, so leading zero bytes are dropped
fn write_id(out: &mut Vec<u8>, id: u32) {
    let bytes = id.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    out.extend_from_slice(&bytes[start..]);
}

/// Shortest EBML variable-length integer for `size`. All-ones values are
/// reserved for "unknown size" and never produced.
fn write_size(out: &mut Vec<u8>, size: u64) {
    let width = (1..=8u32)
        .find(|&n| size < (1u64 << (7 * n)) - 1)
        .unwrap_or(8);
    let marked = size | (1u64 << (7 * width));
    out.extend_from_slice(&marked.to_be_bytes()[(8 - width as usize)..]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track() -> OpusTrack {
        OpusTrack {
            codec_private: b"OpusHead-test".to_vec(),
            codec_delay_ns: 6_500_000,
            frame_duration_ms: 20,
        }
    }

    fn sized(size: u64) -> Vec<u8> {
        let mut out = Vec::new();
        write_size(&mut out, size);
        out
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn sizes_use_shortest_vint() {
        assert_eq!(sized(0), vec![0x80]);
        assert_eq!(sized(5), vec![0x85]);
        assert_eq!(sized(126), vec![0xFE]);
        // 127 would be the reserved all-ones pattern in one byte
        assert_eq!(sized(127), vec![0x40, 0x7F]);
        assert_eq!(sized(300), vec![0x41, 0x2C]);
    }

    #[test]
    fn uint_drops_leading_zero_bytes() {
        let mut out = Vec::new();
        uint(&mut out, id::TRACK_NUMBER, 1);
        assert_eq!(out, vec![0xD7, 0x81, 0x01]);

        let mut zero = Vec::new();
        uint(&mut zero, id::TIMECODE, 0);
        assert_eq!(zero, vec![0xE7, 0x81, 0x00]);
    }

    #[test]
    fn header_declares_webm_doc_type() {
        let file = mux(&track(), &[vec![1, 2, 3]]);
        assert_eq!(&file[0..4], &[0x1A, 0x45, 0xDF, 0xA3]);
        assert_eq!(count(&file, b"webm"), 1);
        assert_eq!(count(&file, b"A_OPUS"), 1);
        assert_eq!(count(&file, b"OpusHead-test"), 1);
    }

    #[test]
    fn segment_size_covers_rest_of_file() {
        let file = mux(&track(), &vec![vec![0xAA; 40]; 10]);

        let header_len = 4 + 1 + ebml_header().len();
        let segment = &file[header_len..];
        assert_eq!(&segment[0..4], &[0x18, 0x53, 0x80, 0x67]);

        let width = segment[4].leading_zeros() as usize + 1;
        let mut size = u64::from(segment[4] & (0xFF >> width));
        for &byte in &segment[5..4 + width] {
            size = (size << 8) | u64::from(byte);
        }
        assert_eq!(size as usize, segment.len() - 4 - width);
    }

    #[test]
    fn packets_split_into_five_second_clusters() {
        // 12 seconds of 20ms frames
        let packets = vec![vec![0x55; 8]; 600];
        let file = mux(&track(), &packets);
        assert_eq!(count(&file, &[0x1F, 0x43, 0xB6, 0x75]), 3);

        let bodies = clusters(20, &packets);
        assert_eq!(bodies.len(), 3);
        // second cluster starts at 5000ms
        assert_eq!(&bodies[1][0..4], &[0xE7, 0x82, 0x13, 0x88]);
    }

    #[test]
    fn simple_block_layout() {
        let block = simple_block(40, &[9, 8]);
        assert_eq!(block, vec![0x81, 0x00, 0x28, 0x80, 9, 8]);
    }
}
