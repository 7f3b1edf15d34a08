//! In-memory capture provider that replays a fixed script of read outcomes.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::audio_models::{NegotiatedParams, ReadOutcome, StreamRequest};
use crate::models::error::CaptureError;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::capture_stream::CaptureStream;

/// One scripted `read_period` outcome.
#[derive(Debug, Clone)]
pub enum Step {
    /// Fill the whole period with this sample value.
    Full(i16),
    /// Fill only this many frames with the sample value.
    Partial(i16, usize),
    Overrun,
    Fail(String),
}

/// Calls observed by the scripted streams of one provider.
#[derive(Debug, Default)]
pub struct CallLog {
    pub opened: Vec<String>,
    pub requests: Vec<StreamRequest>,
    pub reads: usize,
    pub prepares: usize,
    pub drains: usize,
    pub closes: usize,
}

pub struct ScriptedProvider {
    pub log: Arc<Mutex<CallLog>>,
    script: Vec<Step>,
    idle_sample: i16,
    fail_open: bool,
    fail_negotiate: bool,
    granted_rate: Option<u32>,
    granted_channels: Option<u16>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            log: Arc::new(Mutex::new(CallLog::default())),
            script,
            idle_sample: 0,
            fail_open: false,
            fail_negotiate: false,
            granted_rate: None,
            granted_channels: None,
        }
    }

    /// Sample value delivered once the script runs out.
    pub fn idle_sample(mut self, value: i16) -> Self {
        self.idle_sample = value;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_negotiate(mut self) -> Self {
        self.fail_negotiate = true;
        self
    }

    pub fn granting_rate(mut self, rate: u32) -> Self {
        self.granted_rate = Some(rate);
        self
    }

    pub fn granting_channels(mut self, channels: u16) -> Self {
        self.granted_channels = Some(channels);
        self
    }
}

impl CaptureProvider for ScriptedProvider {
    type Stream = ScriptedStream;

    fn open(&self, device: &str) -> Result<ScriptedStream, CaptureError> {
        if self.fail_open {
            return Err(CaptureError::DeviceUnavailable(format!("no such device: {}", device)));
        }
        self.log.lock().opened.push(device.to_string());
        Ok(ScriptedStream {
            log: Arc::clone(&self.log),
            script: self.script.iter().cloned().collect(),
            idle_sample: self.idle_sample,
            fail_negotiate: self.fail_negotiate,
            granted_rate: self.granted_rate,
            granted_channels: self.granted_channels,
        })
    }
}

pub struct ScriptedStream {
    log: Arc<Mutex<CallLog>>,
    script: VecDeque<Step>,
    idle_sample: i16,
    fail_negotiate: bool,
    granted_rate: Option<u32>,
    granted_channels: Option<u16>,
}

fn fill(buffer: &mut [u8], value: i16, frames: usize) -> usize {
    let frames = frames.min(buffer.len() / 2);
    for pair in buffer[..frames * 2].chunks_exact_mut(2) {
        pair.copy_from_slice(&value.to_le_bytes());
    }
    frames
}

impl CaptureStream for ScriptedStream {
    fn negotiate(&mut self, request: &StreamRequest) -> Result<NegotiatedParams, CaptureError> {
        self.log.lock().requests.push(*request);
        if self.fail_negotiate {
            return Err(CaptureError::UnsupportedParameters("rate not supported".into()));
        }
        Ok(NegotiatedParams {
            sample_rate: self.granted_rate.unwrap_or(request.sample_rate),
            channels: self.granted_channels.unwrap_or(request.channels),
            bits_per_sample: request.bits_per_sample,
            period_frames: request.period_frames,
            buffer_frames: request.buffer_frames,
        })
    }

    fn read_period(&mut self, buffer: &mut [u8]) -> Result<ReadOutcome, CaptureError> {
        self.log.lock().reads += 1;
        let period = buffer.len() / 2;
        match self.script.pop_front().unwrap_or(Step::Full(self.idle_sample)) {
            Step::Full(value) => Ok(ReadOutcome::Frames(fill(buffer, value, period))),
            Step::Partial(value, frames) => Ok(ReadOutcome::Frames(fill(buffer, value, frames))),
            Step::Overrun => Ok(ReadOutcome::Overrun),
            Step::Fail(message) => Err(CaptureError::ReadError(message)),
        }
    }

    fn prepare(&mut self) -> Result<(), CaptureError> {
        self.log.lock().prepares += 1;
        Ok(())
    }

    fn drain(&mut self) -> Result<(), CaptureError> {
        self.log.lock().drains += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        self.log.lock().closes += 1;
        Ok(())
    }
}
