use super::error::CaptureError;
use super::recording_result::RecordingResult;

/// Capture run state machine.
///
/// State transitions:
/// ```text
/// idle → opening → ready → capturing → finalizing → completed
///          ↓         ↓         ↓            ↓
///        failed    failed    failed       failed
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureState {
    Idle,
    Opening,
    Ready,
    Capturing { periods: u64, frames: u64 },
    Finalizing,
    Completed(Box<RecordingResult>),
    Failed(CaptureError),
}

impl CaptureState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub fn is_capturing(&self) -> bool {
        matches!(self, Self::Capturing { .. })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed(_))
    }

    /// Frames captured so far, if the state tracks it.
    pub fn frames(&self) -> Option<u64> {
        match self {
            Self::Capturing { frames, .. } => Some(*frames),
            Self::Completed(result) => Some(result.total_frames),
            _ => None,
        }
    }
}
