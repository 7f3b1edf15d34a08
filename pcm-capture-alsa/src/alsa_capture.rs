//! ALSA PCM capture provider.
//!
//! Opens a capture endpoint in blocking mode, negotiates interleaved S16_LE
//! mono hardware parameters, and reads one period per call.

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};

use pcm_capture_core::models::audio_models::{AudioSource, NegotiatedParams, ReadOutcome, StreamRequest};
use pcm_capture_core::models::error::CaptureError;
use pcm_capture_core::traits::capture_provider::CaptureProvider;
use pcm_capture_core::traits::capture_stream::CaptureStream;

use crate::device_list;

/// Linux `EPIPE`: returned by `snd_pcm_readi` when the capture buffer overran.
const EPIPE: i32 = 32;

/// ALSA capture provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsaCapture;

impl AlsaCapture {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureProvider for AlsaCapture {
    type Stream = AlsaStream;

    fn open(&self, device: &str) -> Result<AlsaStream, CaptureError> {
        let pcm = PCM::new(device, Direction::Capture, false).map_err(|e| {
            CaptureError::DeviceUnavailable(format!("unable to open pcm device {}: {}", device, e))
        })?;
        Ok(AlsaStream {
            device: device.to_string(),
            pcm: Some(pcm),
        })
    }

    fn list_devices(&self) -> Result<Vec<AudioSource>, CaptureError> {
        device_list::capture_devices()
    }
}

/// An opened ALSA capture handle. Dropping it (or `close`) releases the device.
pub struct AlsaStream {
    device: String,
    pcm: Option<PCM>,
}

impl AlsaStream {
    fn pcm(&self) -> Result<&PCM, CaptureError> {
        self.pcm
            .as_ref()
            .ok_or_else(|| CaptureError::ReadError(format!("{} is closed", self.device)))
    }
}

fn unsupported(what: &str, e: alsa::Error) -> CaptureError {
    CaptureError::UnsupportedParameters(format!("error setting {}: {}", what, e))
}

fn to_frames(what: &str, frames: u32) -> Result<Frames, CaptureError> {
    Frames::try_from(frames).map_err(|_| {
        CaptureError::UnsupportedParameters(format!("{} of {} frames is out of range", what, frames))
    })
}

fn from_frames(what: &str, frames: Frames) -> Result<u32, CaptureError> {
    u32::try_from(frames)
        .ok()
        .filter(|&f| f > 0)
        .ok_or_else(|| CaptureError::UnsupportedParameters(format!("device granted {} of {} frames", what, frames)))
}

impl CaptureStream for AlsaStream {
    fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedParams, CaptureError> {
        if request.bits_per_sample != 16 {
            return Err(CaptureError::UnsupportedParameters(format!(
                "only 16-bit capture is supported, requested {}",
                request.bits_per_sample
            )));
        }

        let pcm = self.pcm()?;
        {
            // Nothing reaches the device until hw_params() applies the whole set.
            let hwp = HwParams::any(pcm).map_err(|e| unsupported("hardware parameters", e))?;
            hwp.set_access(Access::RWInterleaved)
                .map_err(|e| unsupported("access", e))?;
            hwp.set_format(Format::S16LE)
                .map_err(|e| unsupported("format", e))?;
            hwp.set_channels(u32::from(request.channels))
                .map_err(|e| unsupported("channels", e))?;
            hwp.set_rate_near(request.sample_rate, ValueOr::Nearest)
                .map_err(|e| unsupported("rate", e))?;
            hwp.set_buffer_size(to_frames("buffer", request.buffer_frames)?)
                .map_err(|e| unsupported("buffer size", e))?;
            hwp.set_period_size(to_frames("period", request.period_frames)?, ValueOr::Nearest)
                .map_err(|e| unsupported("period size", e))?;
            pcm.hw_params(&hwp)
                .map_err(|e| unsupported("hw parameters", e))?;
        }

        let current = pcm
            .hw_params_current()
            .map_err(|e| unsupported("hw parameter readback", e))?;
        let sample_rate = current.get_rate().map_err(|e| unsupported("rate readback", e))?;
        let channels = current
            .get_channels()
            .map_err(|e| unsupported("channel readback", e))?;
        let period = current
            .get_period_size()
            .map_err(|e| unsupported("period readback", e))?;
        let buffer = current
            .get_buffer_size()
            .map_err(|e| unsupported("buffer readback", e))?;

        let params = NegotiatedParams {
            sample_rate,
            channels: u16::try_from(channels).map_err(|_| {
                CaptureError::UnsupportedParameters(format!("device granted {} channels", channels))
            })?,
            bits_per_sample: 16,
            period_frames: from_frames("period", period)?,
            buffer_frames: from_frames("buffer", buffer)?,
        };
        log::debug!("{}: negotiated {:?}", self.device, params);
        Ok(params)
    }

    fn read_period(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome, CaptureError> {
        let pcm = self.pcm()?;
        match pcm.io_bytes().readi(buffer) {
            Ok(frames) => Ok(ReadOutcome::Frames(frames)),
            Err(e) if e.errno() == EPIPE => Ok(ReadOutcome::Overrun),
            Err(e) => Err(CaptureError::ReadError(e.to_string())),
        }
    }

    fn prepare(&mut self) -> Result<(), CaptureError> {
        self.pcm()?
            .prepare()
            .map_err(|e| CaptureError::ReadError(format!("prepare failed: {}", e)))
    }

    fn drain(&mut self) -> Result<(), CaptureError> {
        self.pcm()?
            .drain()
            .map_err(|e| CaptureError::ReadError(format!("drain failed: {}", e)))
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        // snd_pcm_close runs when the handle drops.
        self.pcm.take();
        Ok(())
    }
}
