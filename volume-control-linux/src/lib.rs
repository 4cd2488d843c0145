//! # volume-control-linux
//!
//! ALSA backend for volume-control.
//!
//! Provides:
//! - `AlsaMixerBinding`: `DeviceBinding` over an ALSA simple-mixer element
//!   (card `default`, element `Master` unless configured otherwise)
//! - `AlsaMixerOptions`: card/element selection, loadable with serde
//! - `MixerRange`: raw integer volume range as a step model
//!
//! Notifications come from a watcher thread polling its own mixer handle.
//!
//! ## Usage
//! ```ignore
//! use volume_control_core::{VolumeConfiguration, VolumePlugin};
//! use volume_control_linux::{AlsaMixerBinding, AlsaMixerOptions};
//!
//! let binding = AlsaMixerBinding::new(AlsaMixerOptions::default());
//! let plugin = VolumePlugin::new(binding, VolumeConfiguration::default());
//! ```

pub mod mixer_range;
pub mod mute_switch;
pub mod options;
pub mod readiness;

#[cfg(target_os = "linux")]
pub mod alsa_mixer;
#[cfg(target_os = "linux")]
mod mixer_watch;

pub use mixer_range::MixerRange;
pub use options::AlsaMixerOptions;
pub use readiness::MixerReadiness;

#[cfg(target_os = "linux")]
pub use alsa_mixer::AlsaMixerBinding;
