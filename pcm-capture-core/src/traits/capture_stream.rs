use crate::models::audio_models::{NegotiatedParams, ReadOutcome, StreamRequest};
use crate::models::error::CaptureError;

/// An opened capture stream on a hardware endpoint.
///
/// Reads block the calling thread until a period is available or the device
/// reports an overrun or error. Callers normally hold a stream through
/// `DeviceSession`, which guarantees `drain`/`close` run exactly once.
pub trait CaptureStream {
    /// Apply interleaved S16_LE access with the requested channels, a rate
    /// near the requested one, and explicit buffer/period sizes.
    ///
    /// All parameters are applied together or not at all. Returns what the
    /// device actually granted. Fails with `CaptureError::UnsupportedParameters`.
    fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedParams, CaptureError>;

    /// Blocking read of up to one period of frames into the front of `buffer`.
    ///
    /// `buffer` is exactly one negotiated period long.
    fn read_period(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome, CaptureError>;

    /// Reset the stream to a ready state after an overrun.
    fn prepare(&mut self) -> Result<(), CaptureError>;

    /// Let the device deliver any frames still buffered.
    fn drain(&mut self) -> Result<(), CaptureError>;

    /// Release the handle. No other call is made afterwards.
    fn close(&mut self) -> Result<(), CaptureError>;
}
