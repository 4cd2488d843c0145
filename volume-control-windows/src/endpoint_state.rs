//! Endpoint bookkeeping shared by the COM callbacks and the binding.
//!
//! Kept free of COM types so the rules can be tested on any host.

use volume_control_core::{DeviceSignal, StepMetric};

/// Convert `GetVolumeStepInfo` output into a [`StepMetric`].
///
/// WASAPI reports the number of positions (`nStepCount`), with `nStep` in
/// `0..nStepCount`. A device reporting fewer than two positions has no
/// usable step model.
pub fn step_metric_from_info(step: u32, step_count: u32) -> Option<StepMetric> {
    if step_count < 2 {
        return None;
    }
    Some(StepMetric::new(step, step_count - 1))
}

/// Endpoint state as reported by `IMMNotificationClient::OnDeviceStateChanged`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Active,
    Disabled,
    NotPresent,
    Unplugged,
}

/// A change to the set of audio endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointChange {
    StateChanged { device_id: String, state: EndpointState },
    Removed { device_id: String },
    /// New default render/console endpoint, `None` when no output is left.
    DefaultRenderChanged { device_id: Option<String> },
}

/// Signal to raise for `change`, given the id of the bound endpoint.
///
/// Changes to other endpoints are ignored. A disabled endpoint is reported
/// as an error; an endpoint that is gone or no longer the default output is
/// reported as disconnected.
pub fn signal_for(bound_id: &str, change: &EndpointChange) -> Option<DeviceSignal> {
    match change {
        EndpointChange::StateChanged { device_id, state } if device_id == bound_id => match state {
            EndpointState::Active => None,
            EndpointState::Disabled => Some(DeviceSignal::Error),
            EndpointState::NotPresent | EndpointState::Unplugged => Some(DeviceSignal::Disconnected),
        },
        EndpointChange::Removed { device_id } if device_id == bound_id => {
            Some(DeviceSignal::Disconnected)
        }
        EndpointChange::DefaultRenderChanged { device_id } => match device_id {
            Some(id) if id == bound_id => None,
            _ => Some(DeviceSignal::Disconnected),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUND: &str = "{0.0.0.00000000}.{speakers}";

    #[test]
    fn step_info_is_normalized_to_highest_step() {
        assert_eq!(step_metric_from_info(25, 51), Some(StepMetric::new(25, 50)));
        assert_eq!(step_metric_from_info(50, 51).unwrap().level().value(), 1.0);
        assert_eq!(step_metric_from_info(0, 1), None);
        assert_eq!(step_metric_from_info(0, 0), None);
    }

    #[test]
    fn other_endpoints_are_ignored() {
        let change = EndpointChange::StateChanged {
            device_id: "{0.0.0.00000000}.{headset}".into(),
            state: EndpointState::Unplugged,
        };
        assert_eq!(signal_for(BOUND, &change), None);

        let removed = EndpointChange::Removed {
            device_id: "{0.0.0.00000000}.{headset}".into(),
        };
        assert_eq!(signal_for(BOUND, &removed), None);
    }

    #[test]
    fn bound_endpoint_state_changes() {
        let state = |state| EndpointChange::StateChanged {
            device_id: BOUND.into(),
            state,
        };
        assert_eq!(signal_for(BOUND, &state(EndpointState::Active)), None);
        assert_eq!(
            signal_for(BOUND, &state(EndpointState::Disabled)),
            Some(DeviceSignal::Error)
        );
        assert_eq!(
            signal_for(BOUND, &state(EndpointState::Unplugged)),
            Some(DeviceSignal::Disconnected)
        );
        assert_eq!(
            signal_for(BOUND, &EndpointChange::Removed { device_id: BOUND.into() }),
            Some(DeviceSignal::Disconnected)
        );
    }

    #[test]
    fn losing_default_role_disconnects() {
        let moved = EndpointChange::DefaultRenderChanged {
            device_id: Some("{0.0.0.00000000}.{hdmi}".into()),
        };
        assert_eq!(signal_for(BOUND, &moved), Some(DeviceSignal::Disconnected));

        let none_left = EndpointChange::DefaultRenderChanged { device_id: None };
        assert_eq!(signal_for(BOUND, &none_left), Some(DeviceSignal::Disconnected));

        let same = EndpointChange::DefaultRenderChanged {
            device_id: Some(BOUND.into()),
        };
        assert_eq!(signal_for(BOUND, &same), None);
    }
}
