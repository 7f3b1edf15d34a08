use crate::models::audio_models::PeriodReport;
use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingResult;
use crate::models::state::CaptureState;

/// Report sink for capture run notifications.
///
/// All methods are called synchronously from the thread driving the run,
/// between period reads. Keep them short; a slow delegate delays the next
/// read and invites overruns.
pub trait CaptureDelegate: Send + Sync {
    /// Called when the run moves to a new state (not on per-period progress).
    fn on_state_changed(&self, state: &CaptureState);

    /// Called once per period, in capture order.
    fn on_period(&self, report: &PeriodReport);

    /// Called for every recoverable condition and for the fatal error ending a run.
    fn on_error(&self, error: &CaptureError);

    /// Called when the file is finalized and the device released.
    fn on_capture_finished(&self, result: &RecordingResult);
}
