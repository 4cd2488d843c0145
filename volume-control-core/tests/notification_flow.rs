use std::sync::Arc;
use std::thread;
use std::time::Duration;

use approx::assert_abs_diff_eq;
use parking_lot::Mutex;

use volume_control_core::mock::MockBinding;
use volume_control_core::{
    DeviceSignal, VolumeConfiguration, VolumeController, VolumeEvent, VolumeEventSink, VolumeLevel,
};

fn recording_sink() -> (Arc<dyn VolumeEventSink>, Arc<Mutex<Vec<VolumeEvent>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&events);
    let sink: Arc<dyn VolumeEventSink> =
        Arc::new(move |event: &VolumeEvent| captured.lock().push(*event));
    (sink, events)
}

fn changed_levels(events: &[VolumeEvent]) -> Vec<f32> {
    events
        .iter()
        .filter_map(|event| match event {
            VolumeEvent::VolumeChanged(level) => Some(level.value()),
            _ => None,
        })
        .collect()
}

#[test]
fn raise_scenario_from_forty_percent() {
    let mut controller = VolumeController::new(MockBinding::stepped(100, 40));
    controller.bind().unwrap();
    let device = controller.binding().device();
    let (sink, events) = recording_sink();
    controller.subscribe(sink).unwrap();

    controller.raise_volume(Some(0.15)).unwrap();
    device.fire(DeviceSignal::ValuesChanged);
    let event = controller.dispatch_next(Duration::from_millis(100));
    assert_eq!(
        event,
        Some(VolumeEvent::VolumeChanged(VolumeLevel::from_steps(55, 100)))
    );

    controller.raise_volume(Some(0.60)).unwrap();
    assert_eq!(controller.get_volume().unwrap(), VolumeLevel::MAX);
    assert_eq!(changed_levels(&events.lock()), vec![0.55]);
}

#[test]
fn notifications_from_native_thread_reach_owner_in_order() {
    let mut controller = VolumeController::new(MockBinding::stepped(100, 0));
    controller.bind().unwrap();
    let device = controller.binding().device();
    let (sink, events) = recording_sink();
    controller.subscribe(sink).unwrap();

    // Stands in for a platform notification thread.
    let native = thread::spawn(move || {
        for step in 1..=5 {
            device.external_set_level(step as f32 / 10.0);
            thread::sleep(Duration::from_millis(2));
        }
    });

    let mut delivered = 0;
    while delivered < 5 {
        if controller.dispatch_next(Duration::from_secs(2)).is_some() {
            delivered += 1;
        } else {
            break;
        }
    }
    native.join().unwrap();

    let levels = changed_levels(&events.lock());
    assert_eq!(levels.len(), 5);
    // Levels are read at dispatch time, so they never go backwards.
    assert!(levels.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_abs_diff_eq!(*levels.last().unwrap(), 0.5, epsilon = 1e-6);
}

#[test]
fn disconnect_ends_stream_until_resubscribe() {
    let mut controller = VolumeController::new(MockBinding::stepped(100, 30));
    controller.bind().unwrap();
    let device = controller.binding().device();
    let (sink, events) = recording_sink();
    controller.subscribe(sink).unwrap();

    device.disconnect();
    device.fire(DeviceSignal::ValuesChanged);
    controller.dispatch_pending();

    assert_eq!(*events.lock(), vec![VolumeEvent::DeviceDisconnected]);
    assert!(!controller.is_subscribed());
    assert!(!controller.is_bound());

    // Device still gone: re-subscribing fails fast.
    let (retry, _) = recording_sink();
    assert!(controller.bind().is_err());
    assert!(controller.subscribe(retry).is_err());

    device.reconnect();
    controller.bind().unwrap();
    let (resubscribed, new_events) = recording_sink();
    controller.subscribe(resubscribed).unwrap();
    device.external_set_level(0.6);
    controller.dispatch_pending();

    assert_eq!(changed_levels(&new_events.lock()), vec![0.6]);
    assert_eq!(events.lock().len(), 1);
}

#[test]
fn late_signal_after_unsubscribe_is_dropped() {
    let mut controller = VolumeController::new(MockBinding::stepped(100, 30));
    controller.bind().unwrap();
    let device = controller.binding().device();
    let (sink, events) = recording_sink();
    controller.subscribe(sink).unwrap();

    let in_flight = device.listener().unwrap();
    device.fire(DeviceSignal::ValuesChanged);
    controller.unsubscribe();
    in_flight(DeviceSignal::ValuesChanged);
    assert!(!device.has_listener());

    assert!(controller.dispatch_next(Duration::from_millis(20)).is_none());
    assert!(events.lock().is_empty());
}

#[test]
fn dedupe_coalesces_repeated_levels() {
    let config = VolumeConfiguration {
        dedupe_events: true,
        ..Default::default()
    };
    let mut controller = VolumeController::with_config(MockBinding::stepped(100, 30), config).unwrap();
    controller.bind().unwrap();
    let device = controller.binding().device();
    let (sink, events) = recording_sink();
    controller.subscribe(sink).unwrap();

    // Mute toggles raise change notifications without moving the level.
    controller.toggle_mute().unwrap();
    device.fire(DeviceSignal::ValuesChanged);
    controller.toggle_mute().unwrap();
    device.fire(DeviceSignal::ValuesChanged);
    controller.set_volume(0.8).unwrap();
    device.fire(DeviceSignal::ValuesChanged);

    assert_eq!(controller.dispatch_pending(), 2);
    assert_eq!(changed_levels(&events.lock()), vec![0.3, 0.8]);
}

#[test]
fn saturation_holds_for_any_step() {
    let mut controller = VolumeController::new(MockBinding::stepped(64, 0));
    controller.bind().unwrap();

    for start in 0..=10 {
        for step in [0.01_f32, 0.15, 0.5, 0.99, 1.0, 3.0] {
            controller.set_volume(start as f32 / 10.0).unwrap();
            let raised = controller.raise_volume(Some(step)).unwrap();
            assert!(raised.value() <= 1.0);
            assert!(controller.get_volume().unwrap().value() <= 1.0);

            controller.set_volume(start as f32 / 10.0).unwrap();
            let lowered = controller.lower_volume(Some(step)).unwrap();
            assert!(lowered.value() >= 0.0);
            assert!(controller.get_volume().unwrap().value() >= 0.0);
        }
    }
}
