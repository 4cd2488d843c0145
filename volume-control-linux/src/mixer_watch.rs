//! Watcher thread raising [`DeviceSignal`]s for one ALSA mixer.
//!
//! The thread opens its own mixer handle so the binding's handle is never
//! shared across threads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use alsa::mixer::Mixer;
use alsa::poll::{self, Descriptors, Flags};
use parking_lot::Mutex;

use volume_control_core::{DeviceSignal, NotificationCallback, VolumeError};

use crate::readiness::MixerReadiness;

/// How long one poll waits before re-checking the running flag.
const POLL_INTERVAL_MS: i32 = 100;

pub(crate) struct MixerWatch {
    running: Arc<AtomicBool>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
}

impl MixerWatch {
    /// Spawn the watcher and wait until its mixer handle is open.
    pub(crate) fn start(card: &str, callback: NotificationCallback) -> Result<Self, VolumeError> {
        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = crossbeam::channel::bounded::<Result<(), String>>(1);

        let thread_running = Arc::clone(&running);
        let card = card.to_string();
        let handle = thread::Builder::new()
            .name("alsa-mixer-watch".into())
            .spawn(move || {
                let mixer = match Mixer::new(&card, true) {
                    Ok(mixer) => mixer,
                    Err(e) => {
                        let _ = ready_tx.send(Err(format!("opening mixer {}: {}", card, e)));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                watch_loop(&mixer, &thread_running, &callback);
                thread_running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| VolumeError::RegistrationFailed(format!("failed to spawn watcher: {}", e)))?;

        let watch = Self {
            running,
            handle: Mutex::new(Some(handle)),
        };
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(watch),
            Ok(Err(detail)) => {
                watch.stop();
                Err(VolumeError::RegistrationFailed(detail))
            }
            Err(_) => {
                watch.stop();
                Err(VolumeError::RegistrationFailed("watcher exited before starting".into()))
            }
        }
    }

    /// Stop the thread and wait for it. Idempotent.
    pub(crate) fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.lock().take() {
            if handle.join().is_err() {
                log::error!("ALSA mixer watcher panicked");
            }
        }
    }
}

impl Drop for MixerWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(mixer: &Mixer, running: &AtomicBool, callback: &NotificationCallback) {
    log::debug!("ALSA mixer watcher started");
    while running.load(Ordering::SeqCst) {
        let mut fds = match Descriptors::get(mixer) {
            Ok(fds) => fds,
            Err(e) => {
                log::error!("Failed to get mixer poll descriptors: {}", e);
                callback(DeviceSignal::Error);
                return;
            }
        };

        let ready = match poll::poll(&mut fds, POLL_INTERVAL_MS) {
            Ok(ready) => ready,
            Err(e) => {
                log::error!("Polling mixer failed: {}", e);
                callback(DeviceSignal::Error);
                return;
            }
        };
        if ready == 0 {
            continue;
        }
        if !running.load(Ordering::SeqCst) {
            break;
        }

        let revents = match mixer.revents(&fds) {
            Ok(flags) => flags,
            Err(e) => {
                log::error!("Reading mixer poll events failed: {}", e);
                callback(DeviceSignal::Error);
                return;
            }
        };

        let readiness = MixerReadiness::classify(
            ready,
            revents.contains(Flags::IN),
            revents.intersects(Flags::ERR | Flags::HUP),
        );
        match readiness {
            MixerReadiness::Idle => {}
            MixerReadiness::Gone => {
                log::error!("Mixer device went away ({:?})", revents);
                callback(DeviceSignal::Disconnected);
                return;
            }
            MixerReadiness::Pending => match mixer.handle_events() {
                Ok(_) => callback(DeviceSignal::ValuesChanged),
                Err(e) => {
                    log::error!("Handling mixer events failed: {}", e);
                    callback(DeviceSignal::Error);
                    return;
                }
            },
        }
    }
    log::debug!("ALSA mixer watcher stopped");
}
