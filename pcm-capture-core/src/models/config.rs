use super::error::CaptureError;

/// Channel count of every capture stream (mono).
pub const CHANNELS: u16 = 1;

/// Bits per sample of every capture stream (signed 16-bit little-endian).
pub const BITS_PER_SAMPLE: u16 = 16;

/// How long a capture run lasts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureDuration {
    /// Fixed duration in seconds.
    Seconds(f64),
    /// Runs until a stop is requested through a `StopHandle`.
    Unbounded,
}

/// What to do with the period buffer after an overrun has been recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverrunPolicy {
    /// Append whatever the buffer holds, as a full period.
    #[default]
    KeepBuffer,
    /// Append nothing for the overrun period.
    DropPeriod,
}

/// What to do when the device reports a non-overrun read failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadErrorPolicy {
    /// Report the error and move on to the next period.
    #[default]
    Continue,
    /// Finalize the file against the frames written so far and fail the run.
    Abort,
}

/// Immutable, validated configuration for a capture run.
///
/// Built through [`CaptureConfiguration::new`], which rejects zero or oversized
/// rates, zero frame counts, a buffer smaller than one period and empty durations.
/// Channel count and bit depth are fixed at [`CHANNELS`] and [`BITS_PER_SAMPLE`].
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureConfiguration {
    sample_rate: u32,
    period_frames: u32,
    buffer_frames: u32,
    duration: CaptureDuration,
    overrun_policy: OverrunPolicy,
    read_error_policy: ReadErrorPolicy,
}

impl CaptureConfiguration {
    pub fn new(
        sample_rate: u32,
        period_frames: u32,
        buffer_frames: u32,
        duration: CaptureDuration,
    ) -> Result<Self, CaptureError> {
        let config = Self {
            sample_rate,
            period_frames,
            buffer_frames,
            duration,
            overrun_policy: OverrunPolicy::default(),
            read_error_policy: ReadErrorPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrun_policy(mut self, policy: OverrunPolicy) -> Self {
        self.overrun_policy = policy;
        self
    }

    pub fn with_read_error_policy(mut self, policy: ReadErrorPolicy) -> Self {
        self.read_error_policy = policy;
        self
    }

    fn validate(&self) -> Result<(), CaptureError> {
        if self.sample_rate == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "sample rate must be positive".into(),
            ));
        }
        if self.sample_rate.checked_mul(u32::from(self.block_align())).is_none() {
            return Err(CaptureError::ConfigurationFailed(format!(
                "sample rate {} Hz exceeds the WAV byte-rate range",
                self.sample_rate
            )));
        }
        if self.period_frames == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "period size must be positive".into(),
            ));
        }
        if self.buffer_frames < self.period_frames {
            return Err(CaptureError::ConfigurationFailed(format!(
                "buffer size ({} frames) is smaller than period size ({} frames)",
                self.buffer_frames, self.period_frames
            )));
        }
        if let CaptureDuration::Seconds(secs) = self.duration {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(CaptureError::ConfigurationFailed(format!(
                    "invalid capture duration: {} s",
                    secs
                )));
            }
        }
        Ok(())
    }

    /// Requested sample rate in Hz. The device may grant a different one.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        CHANNELS
    }

    pub fn bits_per_sample(&self) -> u16 {
        BITS_PER_SAMPLE
    }

    pub fn period_frames(&self) -> u32 {
        self.period_frames
    }

    pub fn buffer_frames(&self) -> u32 {
        self.buffer_frames
    }

    pub fn duration(&self) -> CaptureDuration {
        self.duration
    }

    pub fn overrun_policy(&self) -> OverrunPolicy {
        self.overrun_policy
    }

    pub fn read_error_policy(&self) -> ReadErrorPolicy {
        self.read_error_policy
    }

    /// Bytes per frame across all channels.
    pub fn block_align(&self) -> u16 {
        CHANNELS * BITS_PER_SAMPLE / 8
    }

    /// Bytes per second at the requested rate.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }

    /// Frames the configured duration amounts to at `rate`, rounded to the
    /// nearest frame, or `None` when unbounded. Sizes the provisional header
    /// and decides whether a recording came up short.
    pub fn requested_frames(&self, rate: u32) -> Option<u64> {
        match self.duration {
            CaptureDuration::Seconds(secs) => Some((secs * f64::from(rate)).round() as u64),
            CaptureDuration::Unbounded => None,
        }
    }

    /// Number of period reads needed to cover the duration:
    /// `ceil(duration * rate / period_frames)`, never less than one.
    pub fn planned_iterations(&self, rate: u32, period_frames: u32) -> Option<u64> {
        match self.duration {
            CaptureDuration::Seconds(secs) => {
                let periods = secs * f64::from(rate) / f64::from(period_frames.max(1));
                Some((periods.ceil() as u64).max(1))
            }
            CaptureDuration::Unbounded => None,
        }
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            sample_rate: 8000,
            period_frames: 1024,
            buffer_frames: 32 * 1024,
            duration: CaptureDuration::Seconds(10.0),
            overrun_policy: OverrunPolicy::default(),
            read_error_policy: ReadErrorPolicy::default(),
        }
    }
}
