//! `DeviceBinding` over an ALSA simple-mixer element.

use alsa::mixer::{Mixer, Selem, SelemChannelId, SelemId};
use alsa::poll::{self, Descriptors, Flags};

use volume_control_core::{
    DeviceBinding, NotificationCallback, StepMetric, VolumeError, VolumeLevel,
};

use crate::mixer_range::MixerRange;
use crate::mixer_watch::MixerWatch;
use crate::mute_switch::{switch_write, SwitchWrite};
use crate::options::AlsaMixerOptions;
use crate::readiness::MixerReadiness;

/// Name and index of the resolved simple-mixer element.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ElementName {
    name: String,
    index: u32,
}

impl ElementName {
    fn id(&self) -> SelemId {
        SelemId::new(&self.name, self.index)
    }
}

struct BoundMixer {
    mixer: Mixer,
    element: ElementName,
    range: MixerRange,
}

/// ALSA simple-mixer binding.
///
/// The raw integer volume range is the step model: one raw unit is one step.
/// Mute is the element's playback switch (switch off means muted).
pub struct AlsaMixerBinding {
    options: AlsaMixerOptions,
    bound: Option<BoundMixer>,
    watch: Option<MixerWatch>,
}

impl AlsaMixerBinding {
    pub fn new(options: AlsaMixerOptions) -> Self {
        Self {
            options,
            bound: None,
            watch: None,
        }
    }

    pub fn options(&self) -> &AlsaMixerOptions {
        &self.options
    }

    /// Name of the element in use, once bound.
    pub fn element_name(&self) -> Option<&str> {
        self.bound.as_ref().map(|bound| bound.element.name.as_str())
    }

    fn resolve_element(mixer: &Mixer, preferred: &str) -> Option<ElementName> {
        if let Some(selem) = mixer.find_selem(&SelemId::new(preferred, 0)) {
            if selem.has_playback_volume() {
                return Some(ElementName {
                    name: preferred.to_string(),
                    index: 0,
                });
            }
        }

        mixer
            .iter()
            .filter_map(Selem::new)
            .filter(|selem| selem.has_playback_volume())
            .find_map(|selem| {
                let id = selem.get_id();
                let name = id.get_name().ok()?.to_string();
                log::info!("Mixer element {} not found, using {}", preferred, name);
                Some(ElementName {
                    name,
                    index: id.get_index(),
                })
            })
    }

    /// Run `op` against the bound element, refreshing the mixer's cached
    /// values first.
    fn with_selem<T>(
        &self,
        call: &str,
        op: impl FnOnce(&Selem<'_>, MixerRange) -> alsa::Result<T>,
    ) -> Result<T, VolumeError> {
        let bound = self.bound.as_ref().ok_or(VolumeError::DeviceUnavailable)?;
        Self::refresh(&bound.mixer)?;
        let selem = bound
            .mixer
            .find_selem(&bound.element.id())
            .ok_or_else(|| VolumeError::native(call, format!("element {} vanished", bound.element.name)))?;
        op(&selem, bound.range).map_err(|e| VolumeError::native(call, e))
    }

    /// Apply queued control events without blocking.
    fn refresh(mixer: &Mixer) -> Result<(), VolumeError> {
        let mut fds = Descriptors::get(mixer)
            .map_err(|e| VolumeError::native("snd_mixer_poll_descriptors", e))?;
        let ready = poll::poll(&mut fds, 0).map_err(|e| VolumeError::native("poll", e))?;
        let readiness = if ready == 0 {
            MixerReadiness::Idle
        } else {
            let revents = mixer
                .revents(&fds)
                .map_err(|e| VolumeError::native("snd_mixer_poll_descriptors_revents", e))?;
            MixerReadiness::classify(
                ready,
                revents.contains(Flags::IN),
                revents.intersects(Flags::ERR | Flags::HUP),
            )
        };

        match readiness {
            MixerReadiness::Idle => Ok(()),
            MixerReadiness::Pending => mixer
                .handle_events()
                .map(|_| ())
                .map_err(|e| VolumeError::native("snd_mixer_handle_events", e)),
            MixerReadiness::Gone => Err(VolumeError::native("poll", "mixer device went away")),
        }
    }

    fn read_raw(&self) -> Result<i64, VolumeError> {
        self.with_selem("snd_mixer_selem_get_playback_volume", |selem, _| {
            selem.get_playback_volume(SelemChannelId::FrontLeft)
        })
    }

    fn nudge(&mut self, delta: i64) -> Result<(), VolumeError> {
        let raw = self.read_raw()?;
        self.with_selem("snd_mixer_selem_set_playback_volume_all", |selem, range| {
            selem.set_playback_volume_all(range.clamp(raw + delta))
        })
    }
}

impl DeviceBinding for AlsaMixerBinding {
    fn bind(&mut self) -> Result<(), VolumeError> {
        if self.bound.is_some() {
            return Ok(());
        }
        self.options.validate().map_err(VolumeError::InvalidArgument)?;

        let mixer = Mixer::new(&self.options.card, false).map_err(|e| {
            log::warn!("Failed to open mixer {}: {}", self.options.card, e);
            VolumeError::DeviceUnavailable
        })?;
        let element = Self::resolve_element(&mixer, &self.options.element).ok_or_else(|| {
            log::warn!("Mixer {} has no playback volume element", self.options.card);
            VolumeError::DeviceUnavailable
        })?;
        let (min, max) = mixer
            .find_selem(&element.id())
            .map(|selem| selem.get_playback_volume_range())
            .ok_or(VolumeError::DeviceUnavailable)?;

        log::info!(
            "Bound ALSA mixer {} element {} (range {}..={})",
            self.options.card,
            element.name,
            min,
            max
        );
        self.bound = Some(BoundMixer {
            mixer,
            element,
            range: MixerRange::new(min, max),
        });
        Ok(())
    }

    fn unbind(&mut self) {
        if self.bound.is_none() {
            return;
        }
        self.unregister_notifications();
        self.bound = None;
        log::info!("Released ALSA mixer {}", self.options.card);
    }

    fn is_bound(&self) -> bool {
        self.bound.is_some()
    }

    fn read_level(&self) -> Result<VolumeLevel, VolumeError> {
        let raw = self.read_raw()?;
        let range = self.bound.as_ref().ok_or(VolumeError::DeviceUnavailable)?.range;
        Ok(range.level(raw))
    }

    fn write_level(&mut self, level: VolumeLevel) -> Result<(), VolumeError> {
        self.with_selem("snd_mixer_selem_set_playback_volume_all", |selem, range| {
            selem.set_playback_volume_all(range.raw_for(level))
        })
    }

    fn read_step_metric(&self) -> Result<Option<StepMetric>, VolumeError> {
        let raw = self.read_raw()?;
        let range = self.bound.as_ref().ok_or(VolumeError::DeviceUnavailable)?.range;
        Ok(range.is_usable().then(|| range.metric(raw)))
    }

    fn step_up(&mut self) -> Result<(), VolumeError> {
        self.nudge(1)
    }

    fn step_down(&mut self) -> Result<(), VolumeError> {
        self.nudge(-1)
    }

    fn get_mute(&self) -> Result<bool, VolumeError> {
        self.with_selem("snd_mixer_selem_get_playback_switch", |selem, _| {
            if !selem.has_playback_switch() {
                return Ok(false);
            }
            selem
                .get_playback_switch(SelemChannelId::FrontLeft)
                .map(|switch| switch == 0)
        })
    }

    fn set_mute(&mut self, muted: bool) -> Result<(), VolumeError> {
        let has_switch = self.with_selem("snd_mixer_selem_has_playback_switch", |selem, _| {
            Ok(selem.has_playback_switch())
        })?;
        match switch_write(has_switch, muted) {
            SwitchWrite::Set(value) => {
                self.with_selem("snd_mixer_selem_set_playback_switch_all", |selem, _| {
                    selem.set_playback_switch_all(value)
                })
            }
            SwitchWrite::Skip => Ok(()),
            SwitchWrite::Unsupported => Err(VolumeError::native(
                "snd_mixer_selem_set_playback_switch_all",
                "element has no playback switch",
            )),
        }
    }

    fn register_notifications(&mut self, callback: NotificationCallback) -> Result<(), VolumeError> {
        if self.bound.is_none() {
            return Err(VolumeError::DeviceUnavailable);
        }
        self.unregister_notifications();
        self.watch = Some(MixerWatch::start(&self.options.card, callback)?);
        log::debug!("Watching ALSA mixer {}", self.options.card);
        Ok(())
    }

    fn unregister_notifications(&mut self) {
        if let Some(watch) = self.watch.take() {
            watch.stop();
        }
    }
}

impl Drop for AlsaMixerBinding {
    fn drop(&mut self) {
        self.unbind();
    }
}
