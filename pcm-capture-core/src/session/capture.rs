use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_models::{
    CaptureDiagnostics, Loudness, NegotiatedParams, PeriodReport, ReadOutcome, StreamRequest,
};
use crate::models::config::{CaptureConfiguration, OverrunPolicy, ReadErrorPolicy};
use crate::models::error::CaptureError;
use crate::models::recording_result::{RecordingMetadata, RecordingResult};
use crate::models::state::CaptureState;
use crate::processing::loudness;
use crate::session::device::DeviceSession;
use crate::storage::wav_writer::WavWriter;
use crate::traits::capture_delegate::CaptureDelegate;
use crate::traits::capture_provider::CaptureProvider;
use crate::traits::capture_stream::CaptureStream;

/// Cloneable request to end a capture run after the current period.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Internal mutable run state, protected by `parking_lot::Mutex`.
struct SessionState {
    state: CaptureState,
    diagnostics: CaptureDiagnostics,
    last_loudness: Option<Loudness>,
}

impl SessionState {
    fn new() -> Self {
        Self {
            state: CaptureState::Idle,
            diagnostics: CaptureDiagnostics::default(),
            last_loudness: None,
        }
    }
}

/// Capture orchestrator.
///
/// Drives one device stream period by period, on the calling thread:
/// ```text
/// [DeviceSession] → [period buffer] ─┬→ [WavWriter]
///                                    └→ [loudness] → [PeriodReport] → [CaptureDelegate]
/// ```
/// A bounded run performs `ceil(duration * granted_rate / period_frames)`
/// reads. Overruns, short reads and read errors are reported and the loop
/// moves on; open and negotiate failures abort before any file exists; file
/// errors abort after the header has been finalized against the frames
/// already written.
pub struct CaptureSession {
    config: CaptureConfiguration,
    session_state: Arc<Mutex<SessionState>>,
    delegate: Option<Arc<dyn CaptureDelegate>>,
    stop: StopHandle,
}

impl CaptureSession {
    pub fn new(config: CaptureConfiguration) -> Self {
        Self {
            config,
            session_state: Arc::new(Mutex::new(SessionState::new())),
            delegate: None,
            stop: StopHandle::default(),
        }
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn CaptureDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn state(&self) -> CaptureState {
        self.session_state.lock().state.clone()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.session_state.lock().diagnostics.clone()
    }

    /// Loudness of the most recent period that delivered frames.
    pub fn last_loudness(&self) -> Option<Loudness> {
        self.session_state.lock().last_loudness
    }

    /// Handle that ends the run cleanly after the current period.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Capture from `device` into a WAV file at `output`.
    ///
    /// Transitions: idle → opening → ready → capturing → finalizing → completed/failed.
    pub fn run<P: CaptureProvider>(
        &mut self,
        provider: &P,
        device: &str,
        output: &Path,
    ) -> Result<RecordingResult, CaptureError> {
        {
            let mut s = self.session_state.lock();
            if !s.state.is_idle() && !s.state.is_terminal() {
                return Err(CaptureError::ConfigurationFailed(
                    "a capture run is already in progress".into(),
                ));
            }
            *s = SessionState::new();
        }
        self.stop.reset();

        match self.capture(provider, device, output) {
            Ok(result) => {
                self.set_state(CaptureState::Completed(Box::new(result.clone())));
                if let Some(ref delegate) = self.delegate {
                    delegate.on_capture_finished(&result);
                }
                Ok(result)
            }
            Err(e) => {
                log::error!("capture from {} failed: {}", device, e);
                self.set_state(CaptureState::Failed(e.clone()));
                if let Some(ref delegate) = self.delegate {
                    delegate.on_error(&e);
                }
                Err(e)
            }
        }
    }

    // --- Internal helpers ---

    fn capture<P: CaptureProvider>(
        &self,
        provider: &P,
        device: &str,
        output: &Path,
    ) -> Result<RecordingResult, CaptureError> {
        self.set_state(CaptureState::Opening);
        let mut device_session = DeviceSession::open(provider, device)?;

        let request = StreamRequest {
            sample_rate: self.config.sample_rate(),
            channels: self.config.channels(),
            bits_per_sample: self.config.bits_per_sample(),
            period_frames: self.config.period_frames(),
            buffer_frames: self.config.buffer_frames(),
        };
        let params = device_session.negotiate(&request)?;
        self.set_state(CaptureState::Ready);

        let requested_frames = self.config.requested_frames(params.sample_rate);
        let iterations = self
            .config
            .planned_iterations(params.sample_rate, params.period_frames);

        let mut writer = WavWriter::new(
            output.to_path_buf(),
            params.sample_rate,
            params.channels,
            params.bits_per_sample,
        );
        writer.begin(requested_frames)?;

        match iterations {
            Some(n) => log::info!(
                "capturing {} periods of {} frames at {} Hz into {}",
                n,
                params.period_frames,
                params.sample_rate,
                output.display()
            ),
            None => log::info!(
                "capturing {}-frame periods at {} Hz into {} until stopped",
                params.period_frames,
                params.sample_rate,
                output.display()
            ),
        }
        self.set_state(CaptureState::Capturing { periods: 0, frames: 0 });

        let loop_result = self.capture_loop(&mut device_session, &mut writer, &params, iterations);

        self.set_state(CaptureState::Finalizing);
        let finalized = writer.finalize(writer.frames_written());
        if let Err(e) = device_session.finish() {
            log::warn!("failed to release capture device {}: {}", device, e);
        }

        if let Err(e) = loop_result {
            if let Err(finalize_err) = &finalized {
                log::error!("could not finalize {} after failure: {}", output.display(), finalize_err);
            }
            return Err(e);
        }
        let finalized = finalized?;

        let checksum = finalized.checksum;
        let metadata = RecordingMetadata::new(
            device,
            &output.to_string_lossy(),
            &params,
            requested_frames,
            finalized.total_frames,
            &checksum,
        );
        if metadata.truncated {
            log::warn!(
                "captured {} of {} requested frames",
                finalized.total_frames,
                requested_frames.unwrap_or_default()
            );
        }

        Ok(RecordingResult {
            file_path: output.to_path_buf(),
            total_frames: finalized.total_frames,
            data_size: finalized.data_size,
            duration_secs: metadata.duration_secs,
            checksum,
            diagnostics: self.diagnostics(),
            metadata,
        })
    }

    /// Read periods until the plan is exhausted or a stop is requested.
    ///
    /// One buffer, one period long, is reused for every read.
    fn capture_loop<S: CaptureStream>(
        &self,
        device: &mut DeviceSession<S>,
        writer: &mut WavWriter,
        params: &NegotiatedParams,
        iterations: Option<u64>,
    ) -> Result<(), CaptureError> {
        let period_frames = params.period_frames as usize;
        let block_align = params.block_align();
        let mut buffer = vec![0u8; params.period_bytes()];
        let period_time = Duration::from_secs_f64(f64::from(params.period_frames) / f64::from(params.sample_rate));
        let mut index = 0u64;

        while iterations.map_or(true, |n| index < n) {
            if self.stop.is_stop_requested() {
                log::info!("stop requested after {} periods", index);
                break;
            }

            let (frames, condition) = match device.read_period(&mut buffer) {
                Ok(ReadOutcome::Frames(n)) if n >= period_frames => {
                    if n > period_frames {
                        log::warn!("device reported {} frames for a {}-frame period", n, period_frames);
                    }
                    (period_frames, None)
                }
                Ok(ReadOutcome::Frames(n)) => {
                    log::warn!("short read, read {} frames", n);
                    (
                        n,
                        Some(CaptureError::ShortRead {
                            expected: period_frames,
                            actual: n,
                        }),
                    )
                }
                Ok(ReadOutcome::Overrun) => {
                    log::warn!("overrun occurred");
                    if let Err(e) = device.recover() {
                        log::error!("failed to prepare stream after overrun: {}", e);
                    }
                    let frames = match self.config.overrun_policy() {
                        OverrunPolicy::KeepBuffer => period_frames,
                        OverrunPolicy::DropPeriod => 0,
                    };
                    (frames, Some(CaptureError::Overrun))
                }
                Err(e) => {
                    let e = if matches!(e, CaptureError::ReadError(_)) {
                        e
                    } else {
                        CaptureError::ReadError(e.to_string())
                    };
                    let streak = self.session_state.lock().diagnostics.consecutive_read_errors + 1;
                    if streak.is_power_of_two() {
                        log::error!("error from read ({} in a row): {}", streak, e);
                    } else {
                        log::debug!("error from read ({} in a row): {}", streak, e);
                    }
                    if self.config.read_error_policy() == ReadErrorPolicy::Abort {
                        let mut s = self.session_state.lock();
                        s.diagnostics.read_errors += 1;
                        s.diagnostics.consecutive_read_errors = streak;
                        return Err(e);
                    }
                    if streak > 1 {
                        // A dead device fails at once; retry at the period rate.
                        std::thread::sleep(period_time);
                    }
                    (0, Some(e))
                }
            };

            let bytes = &buffer[..frames * block_align];
            writer.append(bytes)?;

            let loudness = (frames > 0).then(|| loudness::estimate(bytes, frames, params.channels));
            let report = PeriodReport {
                index,
                frames,
                loudness,
                condition,
            };
            self.record_period(&report, writer.frames_written(), bytes.len());

            if let Some(ref delegate) = self.delegate {
                if let Some(ref condition) = report.condition {
                    delegate.on_error(condition);
                }
                delegate.on_period(&report);
            }
            if let Some(l) = report.loudness {
                log::debug!("period {}: rms {:.1}, {:.2} dB", index, l.rms, l.db);
            }

            index += 1;
        }

        Ok(())
    }

    fn record_period(&self, report: &PeriodReport, frames_written: u64, bytes: usize) {
        let mut s = self.session_state.lock();
        let d = &mut s.diagnostics;
        d.periods_read += 1;
        d.frames_captured += report.frames as u64;
        d.bytes_written += bytes as u64;
        match report.condition {
            Some(CaptureError::Overrun) => d.overruns += 1,
            Some(CaptureError::ShortRead { .. }) => d.short_reads += 1,
            Some(_) => d.read_errors += 1,
            None => {}
        }
        if matches!(report.condition, Some(CaptureError::ReadError(_))) {
            d.consecutive_read_errors += 1;
        } else {
            d.consecutive_read_errors = 0;
        }
        if report.loudness.is_some() {
            s.last_loudness = report.loudness;
        }
        s.state = CaptureState::Capturing {
            periods: report.index + 1,
            frames: frames_written,
        };
    }

    fn set_state(&self, new_state: CaptureState) {
        {
            let mut s = self.session_state.lock();
            s.state = new_state.clone();
        }
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&new_state);
        }
    }
}
