//! # volume-control-windows
//!
//! Windows endpoint-volume backend for volume-control.
//!
//! Provides:
//! - `EndpointVolumeBinding`: `DeviceBinding` over `IAudioEndpointVolume` on
//!   the default render/console endpoint
//! - `ComApartment`: per-thread COM initialization guard
//! - `endpoint_state`: step normalization and endpoint change classification
//!   (platform independent)
//!
//! ## Platform Requirements
//! - Windows Vista+ (MMDevice API)
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use volume_control_core::{VolumeConfiguration, VolumePlugin};
//! use volume_control_windows::EndpointVolumeBinding;
//!
//! let plugin = VolumePlugin::new(EndpointVolumeBinding::new(), VolumeConfiguration::default());
//! ```

pub mod endpoint_state;

#[cfg(target_os = "windows")]
pub mod com;
#[cfg(target_os = "windows")]
pub mod endpoint_volume;
#[cfg(target_os = "windows")]
mod notification_client;

#[cfg(target_os = "windows")]
pub use com::ComApartment;
#[cfg(target_os = "windows")]
pub use endpoint_volume::EndpointVolumeBinding;
