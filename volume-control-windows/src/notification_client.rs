//! COM callback objects that feed native endpoint events into a
//! [`NotificationCallback`].
//!
//! Both run on COM worker threads. They never touch the endpoint interfaces
//! themselves and always return `Ok` so nothing unwinds into the caller.

use windows::core::PCWSTR;
use windows::Win32::Foundation::PROPERTYKEY;
use windows::Win32::Media::Audio::Endpoints::{
    IAudioEndpointVolumeCallback, IAudioEndpointVolumeCallback_Impl, AUDIO_VOLUME_NOTIFICATION_DATA,
};
use windows::Win32::Media::Audio::{
    eConsole, eRender, EDataFlow, ERole, IMMNotificationClient, IMMNotificationClient_Impl,
    DEVICE_STATE, DEVICE_STATE_ACTIVE, DEVICE_STATE_DISABLED, DEVICE_STATE_NOTPRESENT,
};
use windows_core::implement;

use volume_control_core::{DeviceSignal, NotificationCallback};

use crate::endpoint_state::{signal_for, EndpointChange, EndpointState};

/// Forwards `IAudioEndpointVolume` volume and mute changes.
#[implement(IAudioEndpointVolumeCallback)]
pub(crate) struct VolumeChangeListener {
    callback: NotificationCallback,
}

impl VolumeChangeListener {
    pub(crate) fn create(callback: NotificationCallback) -> IAudioEndpointVolumeCallback {
        Self { callback }.into()
    }
}

impl IAudioEndpointVolumeCallback_Impl for VolumeChangeListener_Impl {
    fn OnNotify(&self, _data: *mut AUDIO_VOLUME_NOTIFICATION_DATA) -> windows_core::Result<()> {
        (self.callback)(DeviceSignal::ValuesChanged);
        Ok(())
    }
}

/// Watches the endpoint set for the bound endpoint going away.
#[implement(IMMNotificationClient)]
pub(crate) struct EndpointWatcher {
    device_id: String,
    callback: NotificationCallback,
}

impl EndpointWatcher {
    pub(crate) fn create(device_id: String, callback: NotificationCallback) -> IMMNotificationClient {
        Self { device_id, callback }.into()
    }

    fn raise(&self, change: EndpointChange) {
        if let Some(signal) = signal_for(&self.device_id, &change) {
            log::warn!("Bound endpoint {} changed: {:?}", self.device_id, change);
            (self.callback)(signal);
        }
    }
}

fn wide_to_string(value: &PCWSTR) -> Option<String> {
    if value.is_null() {
        return None;
    }
    unsafe { value.to_string().ok() }
}

fn endpoint_state(state: DEVICE_STATE) -> EndpointState {
    if state == DEVICE_STATE_ACTIVE {
        EndpointState::Active
    } else if state == DEVICE_STATE_DISABLED {
        EndpointState::Disabled
    } else if state == DEVICE_STATE_NOTPRESENT {
        EndpointState::NotPresent
    } else {
        EndpointState::Unplugged
    }
}

impl IMMNotificationClient_Impl for EndpointWatcher_Impl {
    fn OnDeviceStateChanged(&self, device_id: &PCWSTR, new_state: DEVICE_STATE) -> windows_core::Result<()> {
        if let Some(device_id) = wide_to_string(device_id) {
            self.raise(EndpointChange::StateChanged {
                device_id,
                state: endpoint_state(new_state),
            });
        }
        Ok(())
    }

    fn OnDeviceAdded(&self, _device_id: &PCWSTR) -> windows_core::Result<()> {
        Ok(())
    }

    fn OnDeviceRemoved(&self, device_id: &PCWSTR) -> windows_core::Result<()> {
        if let Some(device_id) = wide_to_string(device_id) {
            self.raise(EndpointChange::Removed { device_id });
        }
        Ok(())
    }

    fn OnDefaultDeviceChanged(
        &self,
        flow: EDataFlow,
        role: ERole,
        default_device_id: &PCWSTR,
    ) -> windows_core::Result<()> {
        if flow == eRender && role == eConsole {
            self.raise(EndpointChange::DefaultRenderChanged {
                device_id: wide_to_string(default_device_id),
            });
        }
        Ok(())
    }

    fn OnPropertyValueChanged(&self, _device_id: &PCWSTR, _key: &PROPERTYKEY) -> windows_core::Result<()> {
        Ok(())
    }
}
