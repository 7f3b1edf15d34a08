//! Console report sink: one loudness line per period on stdout.

use std::io::Write;

use pcm_capture_core::{CaptureDelegate, CaptureError, CaptureState, PeriodReport, RecordingResult};

pub struct ConsoleDelegate {
    quiet: bool,
}

impl ConsoleDelegate {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }
}

impl CaptureDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: &CaptureState) {
        match state.frames() {
            Some(frames) if state.is_capturing() => log::debug!("capturing, {} frames so far", frames),
            _ => log::debug!("state: {:?}", state),
        }
    }

    fn on_period(&self, report: &PeriodReport) {
        if self.quiet {
            return;
        }
        if let Some(loudness) = report.loudness {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "Current dB level: {:.2} dB", loudness.db).ok();
        }
    }

    fn on_error(&self, error: &CaptureError) {
        // recoverable conditions are already logged by the session
        if !error.is_recoverable() {
            eprintln!("pcm-record: {}", error);
        }
    }

    fn on_capture_finished(&self, result: &RecordingResult) {
        if self.quiet {
            return;
        }
        let d = &result.diagnostics;
        println!(
            "Wrote {} ({} frames, {:.2} s, {} overruns, {} short reads, {} read errors)",
            result.file_path.display(),
            result.total_frames,
            result.duration_secs,
            d.overruns,
            d.short_reads,
            d.read_errors
        );
    }
}
