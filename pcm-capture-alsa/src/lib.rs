//! # pcm-capture-alsa
//!
//! Linux ALSA backend for pcm-capture.
//!
//! Provides:
//! - `AlsaCapture`: `CaptureProvider` opening PCM capture endpoints (`hw:0,0`, `default`, ...)
//! - `AlsaStream`: blocking interleaved S16_LE reads with overrun detection
//! - `device_list`: PCM capture hints for `--list-devices`
//!
//! ## Platform Requirements
//! - Linux with `libasound` (headers and pkg-config file) for linking
//! - Built only with the `alsa` feature
//!
//! ## Usage
//! ```ignore
//! use pcm_capture_alsa::AlsaCapture;
//! use pcm_capture_core::{CaptureConfiguration, CaptureSession};
//!
//! let mut session = CaptureSession::new(CaptureConfiguration::default());
//! let result = session.run(&AlsaCapture::new(), "hw:0,0", "record8k.wav".as_ref())?;
//! ```

#[cfg(all(target_os = "linux", feature = "alsa"))]
pub mod alsa_capture;
#[cfg(all(target_os = "linux", feature = "alsa"))]
pub mod device_list;

#[cfg(all(target_os = "linux", feature = "alsa"))]
pub use alsa_capture::{AlsaCapture, AlsaStream};
