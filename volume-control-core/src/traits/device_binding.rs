use std::sync::Arc;

use crate::models::error::VolumeError;
use crate::models::event::DeviceSignal;
use crate::models::level::{StepMetric, VolumeLevel};

/// Callback invoked by the native layer when the device raises a signal.
///
/// Runs on a platform notification thread, never the owner thread.
pub type NotificationCallback = Arc<dyn Fn(DeviceSignal) + Send + Sync + 'static>;

/// Raw access to the default audio output endpoint.
///
/// Implemented by:
/// - `EndpointVolumeBinding` (Windows, `IAudioEndpointVolume`)
/// - `AlsaMixerBinding` (Linux, ALSA simple mixer)
/// - `MockBinding` (in-memory, for tests)
///
/// Bindings hold no policy. Every method other than `bind`, `unbind` and
/// `unregister_notifications` returns [`VolumeError::DeviceUnavailable`]
/// when no handle is held.
pub trait DeviceBinding {
    /// Acquire the default output endpoint. No-op when already bound.
    fn bind(&mut self) -> Result<(), VolumeError>;

    /// Release the native handle, deregistering notifications first.
    /// Safe to call repeatedly.
    fn unbind(&mut self);

    fn is_bound(&self) -> bool;

    fn read_level(&self) -> Result<VolumeLevel, VolumeError>;

    /// Set the closest representable level.
    fn write_level(&mut self, level: VolumeLevel) -> Result<(), VolumeError>;

    /// `None` on hardware without discrete steps.
    fn read_step_metric(&self) -> Result<Option<StepMetric>, VolumeError>;

    /// One native step up; scalar hardware moves by an equivalent delta.
    fn step_up(&mut self) -> Result<(), VolumeError>;

    /// One native step down; scalar hardware moves by an equivalent delta.
    fn step_down(&mut self) -> Result<(), VolumeError>;

    fn get_mute(&self) -> Result<bool, VolumeError>;

    fn set_mute(&mut self, muted: bool) -> Result<(), VolumeError>;

    /// Install the single native change listener, replacing any previous one.
    fn register_notifications(&mut self, callback: NotificationCallback) -> Result<(), VolumeError>;

    /// Remove the native listener. Once this returns the callback is never
    /// invoked again. Safe to call when nothing is registered.
    fn unregister_notifications(&mut self);
}
