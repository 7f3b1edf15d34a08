//! WAV container header codec.
//!
//! Generates and parses the standard 44-byte RIFF/WAVE header for PCM audio
//! and patches its two size fields in place once the data length is known.

use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Bytes between the end of the RIFF size field and the start of the data payload.
pub const RIFF_OVERHEAD: u32 = 36;

const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;

/// Decoded view of a 44-byte PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data_size: u32,
    pub overall_size: u32,
}

impl WavHeader {
    /// Whole frames declared by `data_size`.
    pub fn total_frames(&self) -> u64 {
        u64::from(self.data_size) / u64::from(self.block_align.max(1))
    }
}

/// Bytes per frame across all channels.
pub fn block_align(channels: u16, bits_per_sample: u16) -> u16 {
    channels * bits_per_sample / 8
}

/// Generate a 44-byte WAV RIFF header.
///
/// Format: PCM (format code 1), little-endian.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    overall_size = data_size + 36
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate = sample_rate * channels * bits_per_sample / 8
/// [32-33]  block_align = channels * bits_per_sample / 8
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
///
/// Fails with `UnsupportedParameters` when `byte_rate` does not fit in 32 bits.
pub fn generate_wav_header(
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    data_size: u32,
) -> Result<[u8; WAV_HEADER_SIZE], CaptureError> {
    let block_align = block_align(channels, bits_per_sample);
    let byte_rate = sample_rate.checked_mul(u32::from(block_align)).ok_or_else(|| {
        CaptureError::UnsupportedParameters(format!(
            "byte rate for {} Hz at {} bytes per frame exceeds the WAV limit",
            sample_rate, block_align
        ))
    })?;
    let overall_size = data_size.wrapping_add(RIFF_OVERHEAD);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&overall_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&channels.to_le_bytes());
    header[24..28].copy_from_slice(&sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&block_align.to_le_bytes());
    header[34..36].copy_from_slice(&bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    Ok(header)
}

/// The two size fields to rewrite for a given data length, as
/// `(file offset, little-endian bytes)` pairs: RIFF size first, then data size.
pub fn size_patches(data_size: u32) -> [(u64, [u8; 4]); 2] {
    [
        (RIFF_SIZE_OFFSET, data_size.wrapping_add(RIFF_OVERHEAD).to_le_bytes()),
        (DATA_SIZE_OFFSET, data_size.to_le_bytes()),
    ]
}

/// Parse and validate a 44-byte PCM WAV header.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, CaptureError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(CaptureError::InvalidHeader(format!(
            "expected {} bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }

    let tag = |at: usize, expected: &[u8; 4]| -> Result<(), CaptureError> {
        if &bytes[at..at + 4] != expected {
            return Err(CaptureError::InvalidHeader(format!(
                "missing {:?} tag at offset {}",
                String::from_utf8_lossy(expected),
                at
            )));
        }
        Ok(())
    };
    let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
    let u32_at = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);

    tag(0, b"RIFF")?;
    tag(8, b"WAVE")?;
    tag(12, b"fmt ")?;
    tag(36, b"data")?;

    if u32_at(16) != 16 {
        return Err(CaptureError::InvalidHeader(format!(
            "unexpected fmt chunk length {}",
            u32_at(16)
        )));
    }
    if u16_at(20) != 1 {
        return Err(CaptureError::InvalidHeader(format!(
            "format code {} is not PCM",
            u16_at(20)
        )));
    }

    let header = WavHeader {
        overall_size: u32_at(4),
        channels: u16_at(22),
        sample_rate: u32_at(24),
        byte_rate: u32_at(28),
        block_align: u16_at(32),
        bits_per_sample: u16_at(34),
        data_size: u32_at(40),
    };

    if header.overall_size != header.data_size.wrapping_add(RIFF_OVERHEAD) {
        return Err(CaptureError::InvalidHeader(format!(
            "RIFF size {} does not match data size {}",
            header.overall_size, header.data_size
        )));
    }

    Ok(header)
}
