//! `DeviceBinding` over the default render endpoint's `IAudioEndpointVolume`.
//!
//! Levels are read from `GetVolumeStepInfo` so that reads agree with the
//! step walk used for min/max; writes go through
//! `SetMasterVolumeLevelScalar`.

use windows::Win32::Media::Audio::Endpoints::{IAudioEndpointVolume, IAudioEndpointVolumeCallback};
use windows::Win32::Media::Audio::{
    eConsole, eRender, IMMDevice, IMMDeviceEnumerator, IMMNotificationClient, MMDeviceEnumerator,
};
use windows::Win32::System::Com::{CoCreateInstance, CoTaskMemFree, CLSCTX_ALL};

use volume_control_core::{
    DeviceBinding, NotificationCallback, StepMetric, VolumeError, VolumeLevel,
};

use crate::com::ComApartment;
use crate::endpoint_state::step_metric_from_info;
use crate::notification_client::{EndpointWatcher, VolumeChangeListener};

struct BoundEndpoint {
    enumerator: IMMDeviceEnumerator,
    volume: IAudioEndpointVolume,
    device_id: String,
}

struct RegisteredListener {
    volume_callback: IAudioEndpointVolumeCallback,
    endpoint_watcher: IMMNotificationClient,
}

/// Windows endpoint-volume binding.
///
/// Must be created, used and dropped on one thread: COM is initialized for
/// that thread on the first `bind` and uninitialized when the binding drops,
/// after every interface has been released.
pub struct EndpointVolumeBinding {
    endpoint: Option<BoundEndpoint>,
    listener: Option<RegisteredListener>,
    // Declared last so it drops after the interfaces above.
    apartment: Option<ComApartment>,
}

impl EndpointVolumeBinding {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            listener: None,
            apartment: None,
        }
    }

    /// Id of the bound endpoint, if any.
    pub fn device_id(&self) -> Option<&str> {
        self.endpoint.as_ref().map(|endpoint| endpoint.device_id.as_str())
    }

    fn endpoint(&self) -> Result<&BoundEndpoint, VolumeError> {
        self.endpoint.as_ref().ok_or(VolumeError::DeviceUnavailable)
    }

    fn open_default_endpoint() -> Result<BoundEndpoint, VolumeError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|e| {
                    log::warn!("Failed to create device enumerator: {}", e);
                    VolumeError::DeviceUnavailable
                })?;

            let device = enumerator
                .GetDefaultAudioEndpoint(eRender, eConsole)
                .map_err(|e| {
                    log::warn!("No default render endpoint: {}", e);
                    VolumeError::DeviceUnavailable
                })?;

            let volume: IAudioEndpointVolume = device.Activate(CLSCTX_ALL, None).map_err(|e| {
                log::warn!("Failed to activate IAudioEndpointVolume: {}", e);
                VolumeError::DeviceUnavailable
            })?;

            let device_id = Self::read_device_id(&device)?;

            Ok(BoundEndpoint {
                enumerator,
                volume,
                device_id,
            })
        }
    }

    unsafe fn read_device_id(device: &IMMDevice) -> Result<String, VolumeError> {
        let raw = device
            .GetId()
            .map_err(|e| VolumeError::native("IMMDevice::GetId", e))?;
        let id = raw.to_string().unwrap_or_default();
        CoTaskMemFree(Some(raw.0 as *const _));
        Ok(id)
    }
}

impl Default for EndpointVolumeBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBinding for EndpointVolumeBinding {
    fn bind(&mut self) -> Result<(), VolumeError> {
        if self.endpoint.is_some() {
            return Ok(());
        }
        if self.apartment.is_none() {
            self.apartment = Some(ComApartment::enter()?);
        }

        let endpoint = Self::open_default_endpoint()?;
        log::info!("Bound default render endpoint {}", endpoint.device_id);
        self.endpoint = Some(endpoint);
        Ok(())
    }

    fn unbind(&mut self) {
        if self.endpoint.is_none() {
            return;
        }
        self.unregister_notifications();
        if let Some(endpoint) = self.endpoint.take() {
            log::info!("Released render endpoint {}", endpoint.device_id);
        }
    }

    fn is_bound(&self) -> bool {
        self.endpoint.is_some()
    }

    fn read_level(&self) -> Result<VolumeLevel, VolumeError> {
        if let Some(metric) = self.read_step_metric()? {
            return Ok(metric.level());
        }
        let endpoint = self.endpoint()?;
        let scalar = unsafe { endpoint.volume.GetMasterVolumeLevelScalar() }
            .map_err(|e| VolumeError::native("GetMasterVolumeLevelScalar", e))?;
        VolumeLevel::saturating(scalar)
    }

    fn write_level(&mut self, level: VolumeLevel) -> Result<(), VolumeError> {
        let endpoint = self.endpoint()?;
        unsafe {
            endpoint
                .volume
                .SetMasterVolumeLevelScalar(level.value(), std::ptr::null())
        }
        .map_err(|e| VolumeError::native("SetMasterVolumeLevelScalar", e))
    }

    fn read_step_metric(&self) -> Result<Option<StepMetric>, VolumeError> {
        let endpoint = self.endpoint()?;
        let mut step = 0u32;
        let mut step_count = 0u32;
        unsafe { endpoint.volume.GetVolumeStepInfo(&mut step, &mut step_count) }
            .map_err(|e| VolumeError::native("GetVolumeStepInfo", e))?;
        Ok(step_metric_from_info(step, step_count))
    }

    fn step_up(&mut self) -> Result<(), VolumeError> {
        let endpoint = self.endpoint()?;
        unsafe { endpoint.volume.VolumeStepUp(std::ptr::null()) }
            .map_err(|e| VolumeError::native("VolumeStepUp", e))
    }

    fn step_down(&mut self) -> Result<(), VolumeError> {
        let endpoint = self.endpoint()?;
        unsafe { endpoint.volume.VolumeStepDown(std::ptr::null()) }
            .map_err(|e| VolumeError::native("VolumeStepDown", e))
    }

    fn get_mute(&self) -> Result<bool, VolumeError> {
        let endpoint = self.endpoint()?;
        let muted = unsafe { endpoint.volume.GetMute() }
            .map_err(|e| VolumeError::native("GetMute", e))?;
        Ok(muted.as_bool())
    }

    fn set_mute(&mut self, muted: bool) -> Result<(), VolumeError> {
        let endpoint = self.endpoint()?;
        unsafe { endpoint.volume.SetMute(muted, std::ptr::null()) }
            .map_err(|e| VolumeError::native("SetMute", e))
    }

    fn register_notifications(&mut self, callback: NotificationCallback) -> Result<(), VolumeError> {
        self.endpoint()?;
        self.unregister_notifications();
        let endpoint = self.endpoint()?;

        let volume_callback = VolumeChangeListener::create(callback.clone());
        unsafe { endpoint.volume.RegisterControlChangeNotify(&volume_callback) }
            .map_err(|e| VolumeError::RegistrationFailed(format!("RegisterControlChangeNotify: {}", e)))?;

        let endpoint_watcher = EndpointWatcher::create(endpoint.device_id.clone(), callback);
        let watched = unsafe {
            endpoint
                .enumerator
                .RegisterEndpointNotificationCallback(&endpoint_watcher)
        };
        if let Err(e) = watched {
            unsafe {
                let _ = endpoint.volume.UnregisterControlChangeNotify(&volume_callback);
            }
            return Err(VolumeError::RegistrationFailed(format!(
                "RegisterEndpointNotificationCallback: {}",
                e
            )));
        }

        log::debug!("Registered endpoint notifications for {}", endpoint.device_id);
        self.listener = Some(RegisteredListener {
            volume_callback,
            endpoint_watcher,
        });
        Ok(())
    }

    fn unregister_notifications(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let Some(endpoint) = self.endpoint.as_ref() else {
            return;
        };
        unsafe {
            if let Err(e) = endpoint
                .volume
                .UnregisterControlChangeNotify(&listener.volume_callback)
            {
                log::warn!("UnregisterControlChangeNotify failed: {}", e);
            }
            if let Err(e) = endpoint
                .enumerator
                .UnregisterEndpointNotificationCallback(&listener.endpoint_watcher)
            {
                log::warn!("UnregisterEndpointNotificationCallback failed: {}", e);
            }
        }
        log::debug!("Unregistered endpoint notifications");
    }
}

impl Drop for EndpointVolumeBinding {
    fn drop(&mut self) {
        self.unbind();
    }
}
