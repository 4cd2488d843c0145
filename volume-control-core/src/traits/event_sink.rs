use crate::models::event::VolumeEvent;

/// Receiver for the notification stream.
///
/// Always called on the thread that dispatches the controller's pending
/// events, never on a native notification thread.
pub trait VolumeEventSink: Send + Sync {
    fn on_event(&self, event: &VolumeEvent);
}

impl<F> VolumeEventSink for F
where
    F: Fn(&VolumeEvent) + Send + Sync,
{
    fn on_event(&self, event: &VolumeEvent) {
        self(event)
    }
}
