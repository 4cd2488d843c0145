use serde::Serialize;

use super::level::VolumeLevel;

/// Event forwarded to the active subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", content = "level", rename_all = "camelCase")]
pub enum VolumeEvent {
    VolumeChanged(VolumeLevel),
    DeviceError,
    DeviceDisconnected,
}

impl VolumeEvent {
    /// Terminal events end the subscription that delivered them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::DeviceError | Self::DeviceDisconnected)
    }
}

/// Raw notification raised by a device binding on its notification thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceSignal {
    /// Volume or mute changed; the new level must be read back.
    ValuesChanged,
    Error,
    Disconnected,
}
