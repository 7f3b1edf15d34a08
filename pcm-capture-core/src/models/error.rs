use thiserror::Error;

/// Errors that can occur during a capture run.
///
/// `DeviceUnavailable`, `UnsupportedParameters`, `ConfigurationFailed` and `Io`
/// are fatal and abort the run. `Overrun`, `ShortRead` and `ReadError` are
/// reported per period and the loop carries on (unless the read-error policy
/// says otherwise).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("unsupported parameters: {0}")]
    UnsupportedParameters(String),

    #[error("overrun occurred")]
    Overrun,

    #[error("short read: {actual} of {expected} frames")]
    ShortRead { expected: usize, actual: usize },

    #[error("read error: {0}")]
    ReadError(String),

    #[error("i/o error: {0}")]
    Io(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid WAV header: {0}")]
    InvalidHeader(String),
}

impl CaptureError {
    /// Whether the capture loop may continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Overrun | Self::ShortRead { .. } | Self::ReadError(_)
        )
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
