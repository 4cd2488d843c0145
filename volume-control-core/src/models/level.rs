use serde::{Deserialize, Serialize};

use super::error::VolumeError;

/// Scalar delta used as one "step" on hardware without discrete steps.
pub const APPROXIMATE_STEP_DELTA: f32 = 1.0 / 50.0;

/// Normalized output volume, 0.0 (silence) to 1.0 (maximum).
///
/// The inner value is always within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(into = "f32", try_from = "f32")]
pub struct VolumeLevel(f32);

impl VolumeLevel {
    pub const SILENT: Self = Self(0.0);
    pub const MAX: Self = Self(1.0);

    /// Clamp `value` into range. NaN is rejected.
    pub fn saturating(value: f32) -> Result<Self, VolumeError> {
        if value.is_nan() {
            return Err(VolumeError::InvalidArgument("volume is NaN".into()));
        }
        Ok(Self(value.clamp(0.0, 1.0)))
    }

    /// Level of `current_step` out of `step_count`.
    pub fn from_steps(current_step: u32, step_count: u32) -> Self {
        if step_count == 0 {
            return Self::SILENT;
        }
        Self((current_step as f32 / step_count as f32).clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_audible(self) -> bool {
        self.0 > 0.0
    }

    /// `min(1.0, self + step)`.
    pub fn raised_by(self, step: f32) -> Self {
        Self((self.0 + step).min(1.0).max(0.0))
    }

    /// `max(0.0, self - step)`.
    pub fn lowered_by(self, step: f32) -> Self {
        Self((self.0 - step).max(0.0).min(1.0))
    }

    /// Closest step position for this level on hardware with `step_count` steps.
    pub fn to_step(self, step_count: u32) -> u32 {
        ((self.0 * step_count as f32).round() as u32).min(step_count)
    }
}

impl From<VolumeLevel> for f32 {
    fn from(level: VolumeLevel) -> Self {
        level.0
    }
}

impl TryFrom<f32> for VolumeLevel {
    type Error = VolumeError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::saturating(value)
    }
}

/// Position on step-based hardware.
///
/// `current_step` ranges over `0..=step_count`; `step_count` is the highest
/// reachable step, not the number of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMetric {
    pub current_step: u32,
    pub step_count: u32,
}

impl StepMetric {
    pub fn new(current_step: u32, step_count: u32) -> Self {
        Self {
            current_step: current_step.min(step_count),
            step_count,
        }
    }

    pub fn level(&self) -> VolumeLevel {
        VolumeLevel::from_steps(self.current_step, self.step_count)
    }

    pub fn is_at_max(&self) -> bool {
        self.current_step >= self.step_count
    }

    pub fn is_at_min(&self) -> bool {
        self.current_step == 0
    }

    /// Native step calls needed to reach `step_count`.
    pub fn steps_to_max(&self) -> u32 {
        self.step_count.saturating_sub(self.current_step)
    }

    /// Native step calls needed to reach 0.
    pub fn steps_to_min(&self) -> u32 {
        self.current_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn saturating_clamps_out_of_range() {
        assert_eq!(VolumeLevel::saturating(1.7).unwrap(), VolumeLevel::MAX);
        assert_eq!(VolumeLevel::saturating(-0.2).unwrap(), VolumeLevel::SILENT);
        assert_relative_eq!(VolumeLevel::saturating(0.3).unwrap().value(), 0.3);
    }

    #[test]
    fn saturating_rejects_nan() {
        assert!(matches!(
            VolumeLevel::saturating(f32::NAN),
            Err(VolumeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn raise_and_lower_saturate() {
        let level = VolumeLevel::saturating(0.9).unwrap();
        assert_eq!(level.raised_by(0.6), VolumeLevel::MAX);
        assert_eq!(level.lowered_by(5.0), VolumeLevel::SILENT);
        assert_relative_eq!(level.lowered_by(0.15).value(), 0.75, epsilon = 1e-6);
    }

    #[test]
    fn steps_convert_both_ways() {
        assert_relative_eq!(VolumeLevel::from_steps(20, 50).value(), 0.4);
        assert_eq!(VolumeLevel::saturating(0.4).unwrap().to_step(50), 20);
        assert_eq!(VolumeLevel::MAX.to_step(50), 50);
        assert_eq!(VolumeLevel::from_steps(3, 0), VolumeLevel::SILENT);
    }

    #[test]
    fn step_metric_walk_lengths() {
        let metric = StepMetric::new(12, 50);
        assert_eq!(metric.steps_to_max(), 38);
        assert_eq!(metric.steps_to_min(), 12);
        assert!(!metric.is_at_max());
        assert!(StepMetric::new(60, 50).is_at_max());
    }

    #[test]
    fn serializes_as_plain_number() {
        let level = VolumeLevel::saturating(0.25).unwrap();
        assert_eq!(serde_json::to_string(&level).unwrap(), "0.25");
        let parsed: VolumeLevel = serde_json::from_str("3.0").unwrap();
        assert_eq!(parsed, VolumeLevel::MAX);
    }
}
