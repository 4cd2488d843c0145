//! # volume-control-core
//!
//! Platform-agnostic core for controlling the default audio output device.
//!
//! Normalizes native step models into a `[0, 1]` level, implements the
//! raise/lower/min/max policy, and bridges native change notifications onto
//! the owner thread. Platform backends (Windows endpoint volume, ALSA mixer)
//! implement the `DeviceBinding` trait and plug into `VolumeController`.
//!
//! ## Architecture
//!
//! ```text
//! volume-control-core (this crate)
//! ├── traits/   ← DeviceBinding, VolumeEventSink
//! ├── models/   ← VolumeError, VolumeLevel, StepMetric, VolumeEvent, VolumeConfiguration
//! ├── bridge/   ← NotificationBridge (native thread → owner thread hand-off)
//! ├── session/  ← VolumeController (policy, lifecycle)
//! ├── plugin/   ← VolumePlugin (method-call dispatch, event stream)
//! └── mock      ← MockBinding (in-memory device)
//! ```

pub mod bridge;
pub mod mock;
pub mod models;
pub mod plugin;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use bridge::notification::NotificationBridge;
pub use models::config::{VolumeConfiguration, DEFAULT_VOLUME_STEP};
pub use models::error::VolumeError;
pub use models::event::{DeviceSignal, VolumeEvent};
pub use models::level::{StepMetric, VolumeLevel, APPROXIMATE_STEP_DELTA};
pub use models::state::ControllerState;
pub use plugin::dispatcher::{EventStreamSink, VolumePlugin};
pub use plugin::method::{MethodCall, MethodResponse, PluginError};
pub use session::controller::VolumeController;
pub use traits::device_binding::{DeviceBinding, NotificationCallback};
pub use traits::event_sink::VolumeEventSink;
