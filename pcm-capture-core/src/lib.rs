//! # pcm-capture-core
//!
//! Platform-agnostic core of a mono PCM recorder.
//!
//! Provides the device-session guard, per-period loudness estimation,
//! streaming WAV I/O, and the capture orchestrator. Platform backends
//! (Linux ALSA) implement the `CaptureProvider` / `CaptureStream` traits
//! and plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! pcm-capture-core (this crate)
//! ├── traits/       ← CaptureProvider, CaptureStream, CaptureDelegate
//! ├── models/       ← CaptureError, CaptureState, CaptureConfiguration, PeriodReport, etc.
//! ├── processing/   ← loudness estimator, WAV header codec
//! ├── session/      ← DeviceSession (scoped stream), CaptureSession (orchestrator)
//! └── storage/      ← WavWriter, metadata sidecar
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{
    AudioSource, CaptureDiagnostics, Loudness, NegotiatedParams, PeriodReport, ReadOutcome, StreamRequest,
};
pub use models::config::{CaptureConfiguration, CaptureDuration, OverrunPolicy, ReadErrorPolicy};
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RecordingResult};
pub use models::state::CaptureState;
pub use processing::wav_format::WavHeader;
pub use session::capture::{CaptureSession, StopHandle};
pub use session::device::DeviceSession;
pub use storage::wav_writer::WavWriter;
pub use traits::capture_delegate::CaptureDelegate;
pub use traits::capture_provider::CaptureProvider;
pub use traits::capture_stream::CaptureStream;
