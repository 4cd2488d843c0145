use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::constants::{arg, error, method, ErrorKind};
use super::method::{MethodCall, MethodResponse, PluginError};
use crate::models::config::VolumeConfiguration;
use crate::models::error::VolumeError;
use crate::models::event::VolumeEvent;
use crate::session::controller::VolumeController;
use crate::traits::device_binding::DeviceBinding;
use crate::traits::event_sink::VolumeEventSink;

/// Host side of the volume event stream.
pub trait EventStreamSink: Send + Sync {
    /// Push one value onto the stream.
    fn success(&self, value: Value);

    /// The stream ended on the device side; no more values follow.
    fn end_of_stream(&self);
}

/// Adapts volume events to stream values.
struct StreamForwarder {
    stream: Arc<dyn EventStreamSink>,
}

impl VolumeEventSink for StreamForwarder {
    fn on_event(&self, event: &VolumeEvent) {
        match event {
            VolumeEvent::VolumeChanged(level) => self.stream.success(Value::from(f64::from(level.value()))),
            VolumeEvent::DeviceError | VolumeEvent::DeviceDisconnected => self.stream.end_of_stream(),
        }
    }
}

/// Plugin-facing dispatcher owning the one controller of the process.
///
/// Constructed when the host registers the plugin and dropped at teardown;
/// dropping it disposes the controller.
pub struct VolumePlugin<B: DeviceBinding> {
    controller: VolumeController<B>,
}

impl<B: DeviceBinding> VolumePlugin<B> {
    /// Create the plugin and try to bind right away.
    ///
    /// A failed bind is logged, not returned: every call retries it.
    pub fn new(binding: B, config: VolumeConfiguration) -> Result<Self, VolumeError> {
        let mut controller = VolumeController::with_config(binding, config)?;
        if let Err(e) = controller.bind() {
            log::error!("Failed to bind default output device: {}", e);
        }
        Ok(Self { controller })
    }

    pub fn controller(&self) -> &VolumeController<B> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut VolumeController<B> {
        &mut self.controller
    }

    /// Decode and run one method call.
    pub fn handle(&mut self, call: &MethodCall) -> MethodResponse {
        log::debug!("Method call '{}'", call.method);

        match call.method.as_str() {
            method::GET_VOLUME => self.respond(error::GET_VOLUME, |c| {
                c.get_volume().map(|level| Value::from(f64::from(level.value())))
            }),
            method::SET_VOLUME => {
                let volume = match call.required_f32(arg::VOLUME) {
                    Ok(volume) => volume,
                    Err(details) => return Self::reject(error::SET_VOLUME, details),
                };
                self.respond(error::SET_VOLUME, |c| c.set_volume(volume).map(|_| Value::Null))
            }
            method::RAISE_VOLUME => {
                let step = match call.optional_f32(arg::STEP) {
                    Ok(step) => step,
                    Err(details) => return Self::reject(error::RAISE_VOLUME, details),
                };
                self.respond(error::RAISE_VOLUME, |c| c.raise_volume(step).map(|_| Value::Null))
            }
            method::LOWER_VOLUME => {
                let step = match call.optional_f32(arg::STEP) {
                    Ok(step) => step,
                    Err(details) => return Self::reject(error::LOWER_VOLUME, details),
                };
                self.respond(error::LOWER_VOLUME, |c| c.lower_volume(step).map(|_| Value::Null))
            }
            method::GET_MUTE => self.respond(error::GET_MUTE, |c| c.get_mute().map(Value::Bool)),
            method::SET_MUTE => {
                let muted = match call.required_bool(arg::IS_MUTED) {
                    Ok(muted) => muted,
                    Err(details) => return Self::reject(error::SET_MUTE, details),
                };
                self.respond(error::SET_MUTE, |c| c.set_mute(muted).map(|_| Value::Null))
            }
            method::TOGGLE_MUTE => {
                self.respond(error::TOGGLE_MUTE, |c| c.toggle_mute().map(|_| Value::Null))
            }
            other => {
                log::debug!("Method '{}' not implemented", other);
                MethodResponse::NotImplemented
            }
        }
    }

    /// Open the event stream, replacing any open one.
    ///
    /// `args` may carry `emitOnStart`; without it the configured default applies.
    pub fn listen(&mut self, args: &Value, stream: Arc<dyn EventStreamSink>) -> Result<(), PluginError> {
        let call = MethodCall::new("listen", args.clone());
        let emit_on_start = call
            .optional_bool(arg::EMIT_ON_START)
            .map_err(|details| PluginError::new(error::REGISTER_VOLUME_LISTENER, details))?
            .unwrap_or(self.controller.config().emit_on_start);

        let sink: Arc<dyn VolumeEventSink> = Arc::new(StreamForwarder { stream });
        self.ensure_bound()
            .and_then(|_| self.controller.subscribe_with(sink, emit_on_start))
            .map_err(|e| {
                log::warn!("{}: {}", error::REGISTER_VOLUME_LISTENER.message, e);
                PluginError::new(error::REGISTER_VOLUME_LISTENER, e.to_string())
            })
    }

    /// Close the event stream. Never fails.
    pub fn cancel(&mut self) {
        self.controller.unsubscribe();
    }

    /// Forward queued device notifications to the open stream.
    pub fn dispatch_pending(&mut self) -> usize {
        self.controller.dispatch_pending()
    }

    pub fn dispatch_next(&mut self, timeout: Duration) -> Option<VolumeEvent> {
        self.controller.dispatch_next(timeout)
    }

    // --- Internal helpers ---

    /// Bind on demand, so calls recover after a disconnect released the device.
    fn ensure_bound(&mut self) -> Result<(), VolumeError> {
        if self.controller.is_bound() {
            return Ok(());
        }
        self.controller.bind()
    }

    fn respond<F>(&mut self, kind: ErrorKind, operation: F) -> MethodResponse
    where
        F: FnOnce(&mut VolumeController<B>) -> Result<Value, VolumeError>,
    {
        let result = self
            .ensure_bound()
            .and_then(|_| operation(&mut self.controller));

        match result {
            Ok(value) => MethodResponse::Success(value),
            Err(e) => {
                log::warn!("{}: {}", kind.message, e);
                MethodResponse::Error(PluginError::new(kind, e.to_string()))
            }
        }
    }

    fn reject(kind: ErrorKind, details: String) -> MethodResponse {
        log::warn!("{}: {}", kind.message, details);
        MethodResponse::Error(PluginError::new(kind, details))
    }
}
