//! Method names, argument keys and error codes shared with the host shell.

pub mod method {
    pub const GET_VOLUME: &str = "getVolume";
    pub const SET_VOLUME: &str = "setVolume";
    pub const RAISE_VOLUME: &str = "raiseVolume";
    pub const LOWER_VOLUME: &str = "lowerVolume";
    pub const GET_MUTE: &str = "getMute";
    pub const SET_MUTE: &str = "setMute";
    pub const TOGGLE_MUTE: &str = "toggleMute";
}

pub mod arg {
    pub const VOLUME: &str = "volume";
    pub const STEP: &str = "step";
    pub const SHOW_SYSTEM_UI: &str = "showSystemUI";
    pub const EMIT_ON_START: &str = "emitOnStart";
    pub const IS_MUTED: &str = "isMuted";
}

/// Error code and message reported for a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorKind {
    pub code: &'static str,
    pub message: &'static str,
}

pub mod error {
    use super::ErrorKind;

    pub const GET_VOLUME: ErrorKind = ErrorKind { code: "1000", message: "Failed to get volume" };
    pub const SET_VOLUME: ErrorKind = ErrorKind { code: "1001", message: "Failed to set volume" };
    pub const RAISE_VOLUME: ErrorKind = ErrorKind { code: "1002", message: "Failed to raise volume" };
    pub const LOWER_VOLUME: ErrorKind = ErrorKind { code: "1003", message: "Failed to lower volume" };
    pub const REGISTER_VOLUME_LISTENER: ErrorKind = ErrorKind {
        code: "1004",
        message: "Failed to register volume listener",
    };
    pub const GET_MUTE: ErrorKind = ErrorKind { code: "1005", message: "Failed to get mute" };
    pub const SET_MUTE: ErrorKind = ErrorKind { code: "1006", message: "Failed to set mute" };
    pub const TOGGLE_MUTE: ErrorKind = ErrorKind { code: "1007", message: "Failed to toggle mute" };
}
