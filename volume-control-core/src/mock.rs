//! In-memory device binding for tests and desktop development.
//!
//! `MockBinding` behaves like a default output endpoint: step-based (like
//! WASAPI or an ALSA integer range) or scalar-only, with injectable
//! failures and a counter of every native call it serves.
//!
//! ```
//! use volume_control_core::mock::MockBinding;
//! use volume_control_core::DeviceBinding;
//!
//! let mut binding = MockBinding::stepped(50, 20);
//! binding.bind().unwrap();
//! assert_eq!(binding.read_level().unwrap().value(), 0.4);
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::models::error::VolumeError;
use crate::models::event::DeviceSignal;
use crate::models::level::{StepMetric, VolumeLevel, APPROXIMATE_STEP_DELTA};
use crate::traits::device_binding::{DeviceBinding, NotificationCallback};

/// Native operations a test can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOperation {
    Bind,
    Read,
    Write,
    Step,
    Mute,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum VolumeModel {
    Stepped { current: u32, count: u32 },
    Scalar(f32),
}

#[derive(Debug)]
struct DeviceState {
    model: VolumeModel,
    muted: bool,
    has_mute_switch: bool,
    present: bool,
    failing: Vec<MockOperation>,
    /// Fail the next N step calls after this many succeed.
    step_failure_after: Option<u32>,
}

/// Shared view of a [`MockBinding`]'s hardware, usable from any thread.
///
/// Lets a test change the "hardware" behind the binding's back and fire
/// native notifications the way a platform notification thread would.
#[derive(Clone)]
pub struct MockDevice {
    state: Arc<Mutex<DeviceState>>,
    callback: Arc<Mutex<Option<NotificationCallback>>>,
    native_calls: Arc<AtomicUsize>,
}

impl MockDevice {
    /// Change the level as another application would, then notify.
    pub fn external_set_level(&self, level: f32) {
        {
            let mut state = self.state.lock();
            state.model = match state.model {
                VolumeModel::Stepped { count, .. } => VolumeModel::Stepped {
                    current: VolumeLevel::saturating(level).unwrap_or_default().to_step(count),
                    count,
                },
                VolumeModel::Scalar(_) => {
                    VolumeModel::Scalar(VolumeLevel::saturating(level).unwrap_or_default().value())
                }
            };
        }
        self.fire(DeviceSignal::ValuesChanged);
    }

    /// Invoke the registered native callback, if any.
    pub fn fire(&self, signal: DeviceSignal) {
        let callback = self.callback.lock().clone();
        if let Some(callback) = callback {
            callback(signal);
        }
    }

    /// Unplug the device: later native calls fail and a disconnect is raised.
    pub fn disconnect(&self) {
        self.state.lock().present = false;
        self.fire(DeviceSignal::Disconnected);
    }

    pub fn reconnect(&self) {
        self.state.lock().present = true;
    }

    pub fn fail(&self, operation: MockOperation) {
        self.state.lock().failing.push(operation);
    }

    pub fn recover(&self, operation: MockOperation) {
        self.state.lock().failing.retain(|op| *op != operation);
    }

    /// Let `successes` step calls through, then fail every following one.
    pub fn fail_steps_after(&self, successes: u32) {
        self.state.lock().step_failure_after = Some(successes);
    }

    pub fn is_muted(&self) -> bool {
        self.state.lock().muted
    }

    pub fn set_muted(&self, muted: bool) {
        self.state.lock().muted = muted;
    }

    /// Model an element with no mute control: it is never muted, unmuting
    /// is a no-op and muting fails.
    pub fn remove_mute_switch(&self) {
        let mut state = self.state.lock();
        state.has_mute_switch = false;
        state.muted = false;
    }

    pub fn step_metric(&self) -> Option<StepMetric> {
        match self.state.lock().model {
            VolumeModel::Stepped { current, count } => Some(StepMetric::new(current, count)),
            VolumeModel::Scalar(_) => None,
        }
    }

    pub fn has_listener(&self) -> bool {
        self.callback.lock().is_some()
    }

    /// The registered callback, as a notification already in flight holds it.
    pub fn listener(&self) -> Option<NotificationCallback> {
        self.callback.lock().clone()
    }

    /// Total native calls served, successful or not.
    pub fn native_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
    }
}

/// In-memory [`DeviceBinding`].
pub struct MockBinding {
    device: MockDevice,
    bound: bool,
}

impl MockBinding {
    /// Step-based device at `current_step` out of `step_count`.
    pub fn stepped(step_count: u32, current_step: u32) -> Self {
        Self::with_model(VolumeModel::Stepped {
            current: current_step.min(step_count),
            count: step_count,
        })
    }

    /// Scalar-only device (no step metric) at `level`.
    pub fn scalar(level: f32) -> Self {
        Self::with_model(VolumeModel::Scalar(level.clamp(0.0, 1.0)))
    }

    fn with_model(model: VolumeModel) -> Self {
        Self {
            device: MockDevice {
                state: Arc::new(Mutex::new(DeviceState {
                    model,
                    muted: false,
                    has_mute_switch: true,
                    present: true,
                    failing: Vec::new(),
                    step_failure_after: None,
                })),
                callback: Arc::new(Mutex::new(None)),
                native_calls: Arc::new(AtomicUsize::new(0)),
            },
            bound: false,
        }
    }

    /// Handle for driving the hardware from tests.
    pub fn device(&self) -> MockDevice {
        self.device.clone()
    }

    fn guard(&self) -> Result<(), VolumeError> {
        if self.bound {
            Ok(())
        } else {
            Err(VolumeError::DeviceUnavailable)
        }
    }

    /// Account for one native call and check it may succeed.
    fn native(&self, operation: MockOperation) -> Result<(), VolumeError> {
        self.device.native_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.device.state.lock();
        if !state.present {
            return Err(VolumeError::native("mock", "device removed"));
        }
        if state.failing.contains(&operation) {
            return Err(VolumeError::native("mock", format!("{:?} failed", operation)));
        }
        if operation == MockOperation::Step {
            if let Some(remaining) = state.step_failure_after.as_mut() {
                if *remaining == 0 {
                    return Err(VolumeError::native("mock", "step failed"));
                }
                *remaining -= 1;
            }
        }
        Ok(())
    }

    fn nudge(&mut self, up: bool) -> Result<(), VolumeError> {
        self.guard()?;
        self.native(MockOperation::Step)?;
        let mut state = self.device.state.lock();
        state.model = match state.model {
            VolumeModel::Stepped { current, count } => VolumeModel::Stepped {
                current: if up { (current + 1).min(count) } else { current.saturating_sub(1) },
                count,
            },
            VolumeModel::Scalar(value) => {
                let delta = if up { APPROXIMATE_STEP_DELTA } else { -APPROXIMATE_STEP_DELTA };
                VolumeModel::Scalar((value + delta).clamp(0.0, 1.0))
            }
        };
        Ok(())
    }
}

impl DeviceBinding for MockBinding {
    fn bind(&mut self) -> Result<(), VolumeError> {
        if self.bound {
            return Ok(());
        }
        self.native(MockOperation::Bind)
            .map_err(|_| VolumeError::DeviceUnavailable)?;
        self.bound = true;
        Ok(())
    }

    fn unbind(&mut self) {
        if !self.bound {
            return;
        }
        self.unregister_notifications();
        self.bound = false;
    }

    fn is_bound(&self) -> bool {
        self.bound
    }

    fn read_level(&self) -> Result<VolumeLevel, VolumeError> {
        self.guard()?;
        self.native(MockOperation::Read)?;
        Ok(match self.device.state.lock().model {
            VolumeModel::Stepped { current, count } => VolumeLevel::from_steps(current, count),
            VolumeModel::Scalar(value) => VolumeLevel::saturating(value)?,
        })
    }

    fn write_level(&mut self, level: VolumeLevel) -> Result<(), VolumeError> {
        self.guard()?;
        self.native(MockOperation::Write)?;
        let mut state = self.device.state.lock();
        state.model = match state.model {
            VolumeModel::Stepped { count, .. } => VolumeModel::Stepped {
                current: level.to_step(count),
                count,
            },
            VolumeModel::Scalar(_) => VolumeModel::Scalar(level.value()),
        };
        Ok(())
    }

    fn read_step_metric(&self) -> Result<Option<StepMetric>, VolumeError> {
        self.guard()?;
        self.native(MockOperation::Read)?;
        Ok(self.device.step_metric())
    }

    fn step_up(&mut self) -> Result<(), VolumeError> {
        self.nudge(true)
    }

    fn step_down(&mut self) -> Result<(), VolumeError> {
        self.nudge(false)
    }

    fn get_mute(&self) -> Result<bool, VolumeError> {
        self.guard()?;
        self.native(MockOperation::Mute)?;
        Ok(self.device.is_muted())
    }

    fn set_mute(&mut self, muted: bool) -> Result<(), VolumeError> {
        self.guard()?;
        self.native(MockOperation::Mute)?;
        let mut state = self.device.state.lock();
        if !state.has_mute_switch {
            if muted {
                return Err(VolumeError::native("mock", "no mute switch"));
            }
            return Ok(());
        }
        state.muted = muted;
        Ok(())
    }

    fn register_notifications(&mut self, callback: NotificationCallback) -> Result<(), VolumeError> {
        self.guard()?;
        self.native(MockOperation::Register)
            .map_err(|e| VolumeError::RegistrationFailed(e.to_string()))?;
        *self.device.callback.lock() = Some(callback);
        Ok(())
    }

    fn unregister_notifications(&mut self) {
        self.device.callback.lock().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unbound_calls_fail_without_native_call() {
        let mut binding = MockBinding::stepped(50, 10);
        let device = binding.device();

        assert_eq!(binding.read_level(), Err(VolumeError::DeviceUnavailable));
        assert_eq!(binding.step_up(), Err(VolumeError::DeviceUnavailable));
        assert_eq!(binding.set_mute(true), Err(VolumeError::DeviceUnavailable));
        assert_eq!(device.native_calls(), 0);
    }

    #[test]
    fn bind_is_idempotent() {
        let mut binding = MockBinding::stepped(50, 10);
        binding.bind().unwrap();
        binding.bind().unwrap();
        assert_eq!(binding.device().native_calls(), 1);
    }

    #[test]
    fn scalar_device_steps_by_delta() {
        let mut binding = MockBinding::scalar(0.5);
        binding.bind().unwrap();
        assert_eq!(binding.read_step_metric().unwrap(), None);

        binding.step_up().unwrap();
        assert_relative_eq!(binding.read_level().unwrap().value(), 0.52, epsilon = 1e-6);
    }

    #[test]
    fn unbind_drops_listener() {
        let mut binding = MockBinding::stepped(50, 10);
        binding.bind().unwrap();
        binding
            .register_notifications(Arc::new(|_signal: DeviceSignal| {}))
            .unwrap();
        assert!(binding.device().has_listener());

        binding.unbind();
        binding.unbind();
        assert!(!binding.device().has_listener());
        assert!(!binding.is_bound());
    }

    #[test]
    fn step_failure_after_successes() {
        let mut binding = MockBinding::stepped(10, 0);
        binding.bind().unwrap();
        binding.device().fail_steps_after(2);

        assert!(binding.step_up().is_ok());
        assert!(binding.step_up().is_ok());
        assert!(binding.step_up().is_err());
        assert_eq!(binding.device().step_metric(), Some(StepMetric::new(2, 10)));
    }
}
