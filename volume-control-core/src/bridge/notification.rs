use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

use crate::models::error::VolumeError;
use crate::models::event::{DeviceSignal, VolumeEvent};
use crate::models::level::VolumeLevel;
use crate::traits::device_binding::NotificationCallback;
use crate::traits::event_sink::VolumeEventSink;

/// A native signal tagged with the subscription that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueuedSignal {
    pub generation: u64,
    pub signal: DeviceSignal,
}

/// Hands native signals from notification threads to the owner thread.
///
/// Native callbacks only check the active flag and push into an unbounded
/// channel:
/// ```text
/// [native thread] → callback → channel ─┐
///                                       ├→ deliver() → read level → sink
/// [owner thread]  → dispatch ───────────┘
/// ```
/// The sink is only ever invoked from `deliver`/`emit` on the owner thread.
pub struct NotificationBridge {
    sender: Sender<QueuedSignal>,
    receiver: Receiver<QueuedSignal>,
    active: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    sink: Option<Arc<dyn VolumeEventSink>>,
    last_level: Option<VolumeLevel>,
    dedupe: bool,
}

impl NotificationBridge {
    pub fn new(dedupe: bool) -> Self {
        let (sender, receiver) = channel::unbounded();
        Self {
            sender,
            receiver,
            active: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            sink: None,
            last_level: None,
            dedupe,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Start a new subscription delivering to `sink`.
    ///
    /// Any previous subscription is closed first. Returns the callback to
    /// hand to the native layer; it only enqueues signals while this
    /// subscription is the current, active one.
    pub fn open(&mut self, sink: Arc<dyn VolumeEventSink>) -> NotificationCallback {
        self.close();

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.sink = Some(sink);
        self.active.store(true, Ordering::Release);

        let active = Arc::clone(&self.active);
        let current = Arc::clone(&self.generation);
        let sender = self.sender.clone();

        Arc::new(move |signal: DeviceSignal| {
            if !active.load(Ordering::Acquire) || current.load(Ordering::Acquire) != generation {
                log::trace!("Dropping {:?} for inactive subscription {}", signal, generation);
                return;
            }
            // The receiver lives as long as the bridge; a send error only
            // means the bridge is being torn down.
            let _ = sender.send(QueuedSignal { generation, signal });
        })
    }

    /// End the current subscription. Idempotent.
    ///
    /// Signals already queued for it are discarded.
    pub fn close(&mut self) {
        if self.active.swap(false, Ordering::AcqRel) {
            self.generation.fetch_add(1, Ordering::AcqRel);
            log::debug!("Notification subscription closed");
        }
        self.sink = None;
        self.last_level = None;
        while self.receiver.try_recv().is_ok() {}
    }

    /// Next queued signal, without blocking.
    pub fn try_next(&self) -> Option<QueuedSignal> {
        self.receiver.try_recv().ok()
    }

    /// Next queued signal, waiting up to `timeout`.
    pub fn next_timeout(&self, timeout: Duration) -> Option<QueuedSignal> {
        match self.receiver.recv_timeout(timeout) {
            Ok(queued) => Some(queued),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Translate a queued signal into an event and forward it to the sink.
    ///
    /// `read_level` is only called for `ValuesChanged`. Stale signals, failed
    /// reads and (with dedupe on) repeated levels deliver nothing. A terminal
    /// event closes the subscription after it is delivered.
    pub fn deliver<F>(&mut self, queued: QueuedSignal, read_level: F) -> Option<VolumeEvent>
    where
        F: FnOnce() -> Result<VolumeLevel, VolumeError>,
    {
        if !self.is_active() || queued.generation != self.generation() {
            return None;
        }

        let event = match queued.signal {
            DeviceSignal::ValuesChanged => match read_level() {
                Ok(level) => VolumeEvent::VolumeChanged(level),
                Err(e) => {
                    log::warn!("Failed to read volume after change notification: {}", e);
                    return None;
                }
            },
            DeviceSignal::Error => VolumeEvent::DeviceError,
            DeviceSignal::Disconnected => VolumeEvent::DeviceDisconnected,
        };

        self.emit(event)
    }

    /// Forward `event` to the current sink, if any.
    pub fn emit(&mut self, event: VolumeEvent) -> Option<VolumeEvent> {
        let sink = self.sink.clone()?;

        if let VolumeEvent::VolumeChanged(level) = event {
            if self.dedupe && self.last_level == Some(level) {
                return None;
            }
            self.last_level = Some(level);
        }

        sink.on_event(&event);

        if event.is_terminal() {
            log::error!("Device reported {:?}; ending subscription", event);
            self.close();
        }
        Some(event)
    }
}

impl Default for NotificationBridge {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording_sink() -> (Arc<dyn VolumeEventSink>, Arc<Mutex<Vec<VolumeEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let sink: Arc<dyn VolumeEventSink> =
            Arc::new(move |event: &VolumeEvent| captured.lock().push(*event));
        (sink, events)
    }

    fn level(value: f32) -> VolumeLevel {
        VolumeLevel::saturating(value).unwrap()
    }

    fn drain(bridge: &mut NotificationBridge, value: f32) {
        while let Some(queued) = bridge.try_next() {
            bridge.deliver(queued, || Ok(level(value)));
        }
    }

    #[test]
    fn inactive_bridge_drops_signals() {
        let mut bridge = NotificationBridge::new(false);
        let (sink, events) = recording_sink();
        let callback = bridge.open(sink);
        bridge.close();

        callback(DeviceSignal::ValuesChanged);
        assert!(bridge.try_next().is_none());
        assert!(events.lock().is_empty());
    }

    #[test]
    fn values_changed_reads_level() {
        let mut bridge = NotificationBridge::new(false);
        let (sink, events) = recording_sink();
        let callback = bridge.open(sink);

        callback(DeviceSignal::ValuesChanged);
        drain(&mut bridge, 0.55);

        assert_eq!(*events.lock(), vec![VolumeEvent::VolumeChanged(level(0.55))]);
    }

    #[test]
    fn terminal_signal_skips_read_and_closes() {
        let mut bridge = NotificationBridge::new(false);
        let (sink, events) = recording_sink();
        let callback = bridge.open(sink);

        callback(DeviceSignal::Disconnected);
        callback(DeviceSignal::ValuesChanged);

        let first = bridge.try_next().unwrap();
        let delivered = bridge.deliver(first, || panic!("level must not be read"));
        assert_eq!(delivered, Some(VolumeEvent::DeviceDisconnected));
        assert!(!bridge.is_active());

        drain(&mut bridge, 0.3);
        assert_eq!(*events.lock(), vec![VolumeEvent::DeviceDisconnected]);
    }

    #[test]
    fn stale_generation_is_not_delivered() {
        let mut bridge = NotificationBridge::new(false);
        let (old_sink, old_events) = recording_sink();
        let old_callback = bridge.open(old_sink);

        let (new_sink, new_events) = recording_sink();
        let _callback = bridge.open(new_sink);

        old_callback(DeviceSignal::ValuesChanged);
        drain(&mut bridge, 0.2);

        assert!(old_events.lock().is_empty());
        assert!(new_events.lock().is_empty());
    }

    #[test]
    fn dedupe_drops_repeated_levels() {
        let mut bridge = NotificationBridge::new(true);
        let (sink, events) = recording_sink();
        let callback = bridge.open(sink);

        callback(DeviceSignal::ValuesChanged);
        callback(DeviceSignal::ValuesChanged);
        drain(&mut bridge, 0.4);
        callback(DeviceSignal::ValuesChanged);
        drain(&mut bridge, 0.5);

        assert_eq!(
            *events.lock(),
            vec![
                VolumeEvent::VolumeChanged(level(0.4)),
                VolumeEvent::VolumeChanged(level(0.5)),
            ]
        );
    }

    #[test]
    fn failed_read_delivers_nothing() {
        let mut bridge = NotificationBridge::new(false);
        let (sink, events) = recording_sink();
        let callback = bridge.open(sink);

        callback(DeviceSignal::ValuesChanged);
        let queued = bridge.try_next().unwrap();
        assert!(bridge
            .deliver(queued, || Err(VolumeError::DeviceUnavailable))
            .is_none());
        assert!(events.lock().is_empty());
        assert!(bridge.is_active());
    }

    #[test]
    fn close_is_idempotent() {
        let mut bridge = NotificationBridge::new(false);
        bridge.close();
        bridge.close();
        assert!(!bridge.is_active());
        assert_eq!(bridge.generation(), 0);
    }

    #[test]
    fn signals_from_another_thread_keep_order() {
        let mut bridge = NotificationBridge::new(false);
        let (sink, events) = recording_sink();
        let callback = bridge.open(sink);

        std::thread::spawn(move || {
            callback(DeviceSignal::ValuesChanged);
            callback(DeviceSignal::Error);
        })
        .join()
        .unwrap();

        let mut delivered = Vec::new();
        while let Some(queued) = bridge.next_timeout(Duration::from_millis(50)) {
            if let Some(event) = bridge.deliver(queued, || Ok(level(0.7))) {
                delivered.push(event);
            }
        }
        assert_eq!(
            delivered,
            vec![VolumeEvent::VolumeChanged(level(0.7)), VolumeEvent::DeviceError]
        );
        assert_eq!(events.lock().len(), 2);
    }
}
