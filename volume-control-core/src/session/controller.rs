use std::sync::Arc;
use std::time::Duration;

use crate::bridge::notification::{NotificationBridge, QueuedSignal};
use crate::models::config::VolumeConfiguration;
use crate::models::error::VolumeError;
use crate::models::event::VolumeEvent;
use crate::models::level::{StepMetric, VolumeLevel};
use crate::models::state::ControllerState;
use crate::traits::device_binding::DeviceBinding;
use crate::traits::event_sink::VolumeEventSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkDirection {
    Up,
    Down,
}

/// Volume policy over a platform [`DeviceBinding`].
///
/// Owns the binding (and so the native device handle) for its whole
/// lifetime. All calls are synchronous and must come from one owner thread;
/// native notifications are queued by the [`NotificationBridge`] and
/// delivered when the owner calls [`dispatch_pending`](Self::dispatch_pending)
/// or [`dispatch_next`](Self::dispatch_next).
///
/// Dropping the controller disposes it: unsubscribe, then unbind.
pub struct VolumeController<B: DeviceBinding> {
    binding: B,
    config: VolumeConfiguration,
    bridge: NotificationBridge,
}

impl<B: DeviceBinding> VolumeController<B> {
    pub fn new(binding: B) -> Self {
        Self {
            binding,
            config: VolumeConfiguration::default(),
            bridge: NotificationBridge::default(),
        }
    }

    pub fn with_config(binding: B, config: VolumeConfiguration) -> Result<Self, VolumeError> {
        config.validate().map_err(VolumeError::InvalidArgument)?;
        Ok(Self {
            binding,
            bridge: NotificationBridge::new(config.dedupe_events),
            config,
        })
    }

    pub fn config(&self) -> &VolumeConfiguration {
        &self.config
    }

    pub fn binding(&self) -> &B {
        &self.binding
    }

    // --- Lifecycle ---

    /// Bind to the default output device. No-op when already bound.
    pub fn bind(&mut self) -> Result<(), VolumeError> {
        if self.binding.is_bound() {
            return Ok(());
        }
        self.binding.bind()?;
        log::info!("Bound to default output device");
        Ok(())
    }

    /// Release the device handle, ending any subscription first.
    pub fn unbind(&mut self) {
        self.unsubscribe();
        if self.binding.is_bound() {
            self.binding.unbind();
            log::info!("Released default output device");
        }
    }

    /// Unsubscribe, then unbind. Also run on drop.
    pub fn dispose(&mut self) {
        self.unbind();
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }

    pub fn state(&self) -> ControllerState {
        if !self.binding.is_bound() {
            return ControllerState::Unbound;
        }
        let muted = self.binding.get_mute().unwrap_or_else(|e| {
            log::warn!("Failed to read mute state: {}", e);
            false
        });
        ControllerState::Bound { muted }
    }

    // --- Volume ---

    pub fn get_volume(&self) -> Result<VolumeLevel, VolumeError> {
        self.ensure_bound()?;
        self.binding.read_level()
    }

    /// Set the volume, saturating `level` into `[0, 1]`.
    ///
    /// Mute is cleared when the resulting level is audible and left alone
    /// at exactly 0.
    pub fn set_volume(&mut self, level: f32) -> Result<(), VolumeError> {
        self.ensure_bound()?;
        let level = VolumeLevel::saturating(level)?;
        if level.is_audible() {
            self.binding.set_mute(false)?;
        }
        self.binding.write_level(level)?;
        log::debug!("Volume set to {:.3}", level.value());
        Ok(())
    }

    /// Raise by `step` (default from config), saturating at 1.0.
    ///
    /// Like [`set_volume`](Self::set_volume), an audible result clears mute.
    pub fn raise_volume(&mut self, step: Option<f32>) -> Result<VolumeLevel, VolumeError> {
        self.adjust_volume(step, VolumeLevel::raised_by)
    }

    /// Lower by `step` (default from config), saturating at 0.0.
    pub fn lower_volume(&mut self, step: Option<f32>) -> Result<VolumeLevel, VolumeError> {
        self.adjust_volume(step, VolumeLevel::lowered_by)
    }

    /// Walk up to the highest native step.
    pub fn set_max_volume(&mut self) -> Result<(), VolumeError> {
        self.walk_to_boundary(WalkDirection::Up)
    }

    /// Walk down to step 0.
    pub fn set_min_volume(&mut self) -> Result<(), VolumeError> {
        self.walk_to_boundary(WalkDirection::Down)
    }

    // --- Mute ---

    pub fn get_mute(&self) -> Result<bool, VolumeError> {
        self.ensure_bound()?;
        self.binding.get_mute()
    }

    pub fn set_mute(&mut self, muted: bool) -> Result<(), VolumeError> {
        self.ensure_bound()?;
        self.binding.set_mute(muted)
    }

    /// Flip the mute state and return the new one.
    pub fn toggle_mute(&mut self) -> Result<bool, VolumeError> {
        self.ensure_bound()?;
        let muted = !self.binding.get_mute()?;
        self.binding.set_mute(muted)?;
        Ok(muted)
    }

    // --- Notifications ---

    /// Open the notification stream, replacing any active subscriber.
    pub fn subscribe(&mut self, sink: Arc<dyn VolumeEventSink>) -> Result<(), VolumeError> {
        let emit_on_start = self.config.emit_on_start;
        self.subscribe_with(sink, emit_on_start)
    }

    /// Like [`subscribe`](Self::subscribe); with `emit_on_start` the current
    /// level is delivered before this returns.
    pub fn subscribe_with(
        &mut self,
        sink: Arc<dyn VolumeEventSink>,
        emit_on_start: bool,
    ) -> Result<(), VolumeError> {
        self.ensure_bound()?;

        // Single slot: the previous listener goes before the new one is installed.
        self.unsubscribe();

        let callback = self.bridge.open(sink);
        if let Err(e) = self.binding.register_notifications(callback) {
            self.bridge.close();
            log::warn!("Failed to register volume listener: {}", e);
            return Err(match e {
                VolumeError::RegistrationFailed(_) => e,
                other => VolumeError::RegistrationFailed(other.to_string()),
            });
        }
        log::debug!("Volume listener registered (subscription {})", self.bridge.generation());

        if emit_on_start {
            match self.binding.read_level() {
                Ok(level) => {
                    self.bridge.emit(VolumeEvent::VolumeChanged(level));
                }
                Err(e) => log::warn!("Failed to read initial volume: {}", e),
            }
        }
        Ok(())
    }

    /// Close the notification stream. Idempotent; never fails.
    ///
    /// The native listener is deregistered before this returns, so no event
    /// reaches the old sink afterward.
    pub fn unsubscribe(&mut self) {
        if self.bridge.is_active() {
            log::debug!("Volume listener unregistered");
        }
        self.binding.unregister_notifications();
        self.bridge.close();
    }

    pub fn is_subscribed(&self) -> bool {
        self.bridge.is_active()
    }

    /// Deliver every queued notification. Returns the number of events delivered.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut delivered = 0;
        while let Some(queued) = self.bridge.try_next() {
            if self.dispatch(queued).is_some() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Wait up to `timeout` for one notification and deliver it.
    pub fn dispatch_next(&mut self, timeout: Duration) -> Option<VolumeEvent> {
        let queued = self.bridge.next_timeout(timeout)?;
        self.dispatch(queued)
    }

    // --- Internal helpers ---

    fn ensure_bound(&self) -> Result<(), VolumeError> {
        if self.binding.is_bound() {
            Ok(())
        } else {
            Err(VolumeError::DeviceUnavailable)
        }
    }

    fn resolve_step(&self, step: Option<f32>) -> Result<f32, VolumeError> {
        let step = step.unwrap_or(self.config.default_step);
        if !step.is_finite() || step <= 0.0 {
            return Err(VolumeError::InvalidArgument(format!(
                "step must be positive: {}",
                step
            )));
        }
        Ok(step)
    }

    fn adjust_volume(
        &mut self,
        step: Option<f32>,
        apply: fn(VolumeLevel, f32) -> VolumeLevel,
    ) -> Result<VolumeLevel, VolumeError> {
        self.ensure_bound()?;
        let step = self.resolve_step(step)?;

        let current = self.binding.read_level().map_err(|e| {
            log::warn!("Failed to read current volume: {}", e);
            VolumeError::DeviceUnavailable
        })?;
        let target = apply(current, step);

        if target.is_audible() {
            self.binding.set_mute(false)?;
        }
        self.binding.write_level(target)?;
        log::debug!(
            "Volume adjusted {:.3} -> {:.3} (step {:.3})",
            current.value(),
            target.value(),
            step
        );
        Ok(target)
    }

    fn walk_to_boundary(&mut self, direction: WalkDirection) -> Result<(), VolumeError> {
        self.ensure_bound()?;
        let metric = self.binding.read_step_metric()?;
        self.binding.set_mute(false)?;

        let boundary = match direction {
            WalkDirection::Up => VolumeLevel::MAX,
            WalkDirection::Down => VolumeLevel::SILENT,
        };

        let Some(metric) = metric.filter(|m| m.step_count <= self.config.max_step_walk) else {
            // No walkable step model: the boundary scalar is exact on any hardware.
            return self.binding.write_level(boundary);
        };

        let steps = Self::walk_length(&metric, direction);
        for taken in 0..steps {
            let result = match direction {
                WalkDirection::Up => self.binding.step_up(),
                WalkDirection::Down => self.binding.step_down(),
            };
            if let Err(e) = result {
                log::warn!(
                    "Step walk {:?} aborted after {} of {} steps: {}",
                    direction,
                    taken,
                    steps,
                    e
                );
                return Err(e);
            }
        }
        log::debug!("Walked {} steps {:?}", steps, direction);
        Ok(())
    }

    fn walk_length(metric: &StepMetric, direction: WalkDirection) -> u32 {
        match direction {
            WalkDirection::Up => metric.steps_to_max(),
            WalkDirection::Down => metric.steps_to_min(),
        }
    }

    fn dispatch(&mut self, queued: QueuedSignal) -> Option<VolumeEvent> {
        let binding = &self.binding;
        let event = self.bridge.deliver(queued, || binding.read_level())?;

        if event.is_terminal() {
            self.binding.unregister_notifications();
            if event == VolumeEvent::DeviceDisconnected {
                // The handle may point at a vanished endpoint.
                self.binding.unbind();
                log::info!("Released disconnected output device");
            }
        }
        Some(event)
    }
}

impl<B: DeviceBinding> Drop for VolumeController<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
