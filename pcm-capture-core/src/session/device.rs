use crate::models::audio_models::{NegotiatedParams, ReadOutcome, StreamRequest};
use crate::models::error::CaptureError;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::capture_stream::CaptureStream;

/// Scoped ownership of an opened capture stream.
///
/// Releases the stream exactly once, either through [`DeviceSession::finish`]
/// or on drop. A negotiated stream is drained before it is closed; a stream
/// that never got its parameters is only closed.
pub struct DeviceSession<S: CaptureStream> {
    device: String,
    stream: Option<S>,
    negotiated: Option<NegotiatedParams>,
}

impl<S: CaptureStream> DeviceSession<S> {
    pub fn open<P>(provider: &P, device: &str) -> Result<Self, CaptureError>
    where
        P: CaptureProvider<Stream = S>,
    {
        let stream = provider.open(device)?;
        log::info!("opened capture device {}", device);
        Ok(Self {
            device: device.to_string(),
            stream: Some(stream),
            negotiated: None,
        })
    }

    /// Negotiate hardware parameters and read back what was granted.
    ///
    /// A substituted rate is accepted and logged; a different channel count
    /// or sample width, or an empty period, is rejected.
    pub fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedParams, CaptureError> {
        let stream = self.stream_mut()?;
        let granted = stream.negotiate(request)?;

        if granted.channels != request.channels || granted.bits_per_sample != request.bits_per_sample {
            return Err(CaptureError::UnsupportedParameters(format!(
                "device granted {} channel(s) at {} bits, requested {} at {}",
                granted.channels, granted.bits_per_sample, request.channels, request.bits_per_sample
            )));
        }
        if granted.sample_rate == 0 || granted.period_frames == 0 {
            return Err(CaptureError::UnsupportedParameters(format!(
                "device granted rate {} Hz with {}-frame periods",
                granted.sample_rate, granted.period_frames
            )));
        }
        if granted.sample_rate != request.sample_rate {
            log::warn!(
                "{}: requested {} Hz, device granted {} Hz",
                self.device,
                request.sample_rate,
                granted.sample_rate
            );
        }
        if granted.period_frames != request.period_frames || granted.buffer_frames != request.buffer_frames {
            log::info!(
                "{}: period {} frames, buffer {} frames (requested {} / {})",
                self.device,
                granted.period_frames,
                granted.buffer_frames,
                request.period_frames,
                request.buffer_frames
            );
        }

        self.negotiated = Some(granted);
        Ok(granted)
    }

    pub fn negotiated(&self) -> Option<&NegotiatedParams> {
        self.negotiated.as_ref()
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Blocking read of one period into `buffer`.
    pub fn read_period(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome, CaptureError> {
        if self.negotiated.is_none() {
            return Err(CaptureError::ReadError("stream parameters not negotiated".into()));
        }
        self.stream_mut()?.read_period(buffer)
    }

    /// Reset the stream after an overrun.
    pub fn recover(&mut self) -> Result<(), CaptureError> {
        self.stream_mut()?.prepare()
    }

    /// Drain and close now, reporting any failure.
    pub fn finish(mut self) -> Result<(), CaptureError> {
        self.release()
    }

    fn stream_mut(&mut self) -> Result<&mut S, CaptureError> {
        self.stream
            .as_mut()
            .ok_or_else(|| CaptureError::ReadError("capture stream already closed".into()))
    }

    fn release(&mut self) -> Result<(), CaptureError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        let drained = if self.negotiated.is_some() {
            stream.drain()
        } else {
            Ok(())
        };
        let closed = stream.close();
        log::info!("closed capture device {}", self.device);
        drained.and(closed)
    }
}

impl<S: CaptureStream> Drop for DeviceSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to release capture device {}: {}", self.device, e);
        }
    }
}
