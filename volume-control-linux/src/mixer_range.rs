use volume_control_core::{StepMetric, VolumeLevel};

/// Raw playback volume range of a mixer element, `min..=max`.
///
/// Every raw value is one step, so the range doubles as the step model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MixerRange {
    pub min: i64,
    pub max: i64,
}

impl MixerRange {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Number of steps above `min`; zero for a degenerate range.
    pub fn step_count(&self) -> u32 {
        u32::try_from(self.max.saturating_sub(self.min).max(0)).unwrap_or(u32::MAX)
    }

    pub fn is_usable(&self) -> bool {
        self.step_count() > 0
    }

    pub fn clamp(&self, raw: i64) -> i64 {
        raw.clamp(self.min, self.max.max(self.min))
    }

    pub fn metric(&self, raw: i64) -> StepMetric {
        let current = u32::try_from(self.clamp(raw) - self.min).unwrap_or(u32::MAX);
        StepMetric::new(current, self.step_count())
    }

    pub fn level(&self, raw: i64) -> VolumeLevel {
        self.metric(raw).level()
    }

    /// Raw value closest to `level`.
    pub fn raw_for(&self, level: VolumeLevel) -> i64 {
        self.min + i64::from(level.to_step(self.step_count()))
    }
}
