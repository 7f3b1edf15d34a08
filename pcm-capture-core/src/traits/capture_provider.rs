use crate::models::audio_models::AudioSource;
use crate::models::error::CaptureError;
use crate::traits::capture_stream::CaptureStream;

/// Entry point to a platform audio subsystem.
///
/// Implemented by:
/// - `AlsaCapture` (Linux)
pub trait CaptureProvider {
    type Stream: CaptureStream;

    /// Acquire a capture-mode handle to the named endpoint.
    ///
    /// Fails with `CaptureError::DeviceUnavailable`.
    fn open(&self, device: &str) -> Result<Self::Stream, CaptureError>;

    /// Capture endpoints known to the subsystem.
    fn list_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        Ok(Vec::new())
    }
}
