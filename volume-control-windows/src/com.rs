use std::marker::PhantomData;

use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use volume_control_core::VolumeError;

/// COM initialization for the current thread.
///
/// Enters the multithreaded apartment and calls `CoUninitialize` on drop.
/// If the thread already lives in a single-threaded apartment the existing
/// apartment is reused and nothing is torn down on drop.
///
/// Not `Send`: COM initialization is per thread.
pub struct ComApartment {
    owns_init: bool,
    _not_send: PhantomData<*const ()>,
}

impl ComApartment {
    pub fn enter() -> Result<Self, VolumeError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr == RPC_E_CHANGED_MODE {
            log::debug!("Thread already in a single-threaded apartment; reusing it");
            return Ok(Self {
                owns_init: false,
                _not_send: PhantomData,
            });
        }
        hr.ok().map_err(|e| VolumeError::native("CoInitializeEx", e))?;
        Ok(Self {
            owns_init: true,
            _not_send: PhantomData,
        })
    }
}

impl Drop for ComApartment {
    fn drop(&mut self) {
        if self.owns_init {
            unsafe {
                CoUninitialize();
            }
        }
    }
}
