use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::audio_models::{CaptureDiagnostics, NegotiatedParams};

/// Result returned when a capture run completes and the file is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub total_frames: u64,
    pub data_size: u32,
    pub duration_secs: f64,
    pub checksum: String,
    pub diagnostics: CaptureDiagnostics,
    pub metadata: RecordingMetadata,
}

/// Metadata describing a finished recording.
///
/// Serializable for the JSON sidecar written next to the WAV file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub device: String,
    pub file_path: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub requested_frames: Option<u64>,
    pub total_frames: u64,
    pub duration_secs: f64,
    pub checksum: String,
    /// True when fewer frames were captured than the configured duration asked for.
    pub truncated: bool,
}

impl RecordingMetadata {
    pub fn new(
        device: &str,
        file_path: &str,
        params: &NegotiatedParams,
        requested_frames: Option<u64>,
        total_frames: u64,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            device: device.to_string(),
            file_path: file_path.to_string(),
            sample_rate: params.sample_rate,
            channels: params.channels,
            bits_per_sample: params.bits_per_sample,
            requested_frames,
            total_frames,
            duration_secs: total_frames as f64 / f64::from(params.sample_rate),
            checksum: checksum.to_string(),
            truncated: requested_frames.is_some_and(|requested| total_frames < requested),
        }
    }
}
