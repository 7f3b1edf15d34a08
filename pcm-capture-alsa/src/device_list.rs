//! ALSA capture device listing via the device-name hint API.

use alsa::device_name::HintIter;
use alsa::Direction;

use pcm_capture_core::models::audio_models::AudioSource;
use pcm_capture_core::models::error::CaptureError;

/// List PCM endpoints usable for capture.
///
/// Hints without a direction are bidirectional and included.
pub fn capture_devices() -> Result<Vec<AudioSource>, CaptureError> {
    let hints = HintIter::new_str(None, "pcm")
        .map_err(|e| CaptureError::DeviceUnavailable(format!("failed to enumerate pcm devices: {}", e)))?;

    Ok(hints
        .filter(|hint| matches!(hint.direction, None | Some(Direction::Capture)))
        .filter_map(|hint| {
            let id = hint.name?;
            let description = hint
                .desc
                .map(|d| d.replace('\n', " "))
                .unwrap_or_else(|| id.clone());
            Some(AudioSource { id, description })
        })
        .collect())
}
