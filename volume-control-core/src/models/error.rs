use thiserror::Error;

/// Errors returned by volume control operations.
///
/// Device errors and disconnects that happen asynchronously are not errors
/// in this sense; they are delivered as [`VolumeEvent`](super::event::VolumeEvent)s.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VolumeError {
    #[error("device not available")]
    DeviceUnavailable,

    #[error("native call failed: {0}")]
    NativeCallFailed(String),

    #[error("notification registration failed: {0}")]
    RegistrationFailed(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl VolumeError {
    pub fn native(call: &str, detail: impl std::fmt::Display) -> Self {
        Self::NativeCallFailed(format!("{}: {}", call, detail))
    }
}
