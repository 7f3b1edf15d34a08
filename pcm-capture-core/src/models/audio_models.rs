use serde::{Deserialize, Serialize};

use super::error::CaptureError;

/// A capture endpoint available on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    pub id: String,
    pub description: String,
}

/// Hardware parameters requested from a capture stream.
///
/// Access is always interleaved and the sample format always S16_LE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamRequest {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub period_frames: u32,
    pub buffer_frames: u32,
}

/// Hardware parameters actually granted by the device.
///
/// The rate may differ from the requested one; callers must use this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiatedParams {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub period_frames: u32,
    pub buffer_frames: u32,
}

impl NegotiatedParams {
    pub fn block_align(&self) -> usize {
        usize::from(self.channels) * usize::from(self.bits_per_sample / 8)
    }

    pub fn period_bytes(&self) -> usize {
        self.period_frames as usize * self.block_align()
    }
}

/// Outcome of one blocking period read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Number of frames written to the front of the buffer.
    Frames(usize),
    /// The device buffer overflowed since the previous read; the stream needs `prepare`.
    Overrun,
}

/// Loudness of one period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loudness {
    /// Root-mean-square amplitude in raw sample units, never negative.
    pub rms: f64,
    /// `20 * log10(rms)`, or the floor value when `rms` is zero.
    pub db: f64,
}

/// Report emitted for every period, in capture order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReport {
    /// Zero-based period index.
    pub index: u64,
    /// Frames appended to the file for this period.
    pub frames: usize,
    /// `None` when the period contributed no frames.
    pub loudness: Option<Loudness>,
    /// Recoverable condition hit while reading this period, if any.
    pub condition: Option<CaptureError>,
}

/// Counters for debugging capture runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDiagnostics {
    pub periods_read: u64,
    pub frames_captured: u64,
    pub bytes_written: u64,
    pub overruns: u64,
    pub short_reads: u64,
    pub read_errors: u64,
    /// Read errors since the last read that returned data or an overrun.
    #[serde(default)]
    pub consecutive_read_errors: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiated_sizes() {
        let params = NegotiatedParams {
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 16,
            period_frames: 1024,
            buffer_frames: 32768,
        };
        assert_eq!(params.block_align(), 2);
        assert_eq!(params.period_bytes(), 2048);
    }
}
