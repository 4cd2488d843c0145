use serde::{Deserialize, Serialize};

/// Default relative step for raise/lower when the caller gives none.
pub const DEFAULT_VOLUME_STEP: f32 = 0.15;

/// Configuration for a volume controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VolumeConfiguration {
    /// Step used by `raise_volume`/`lower_volume` when none is given (default: 0.15).
    pub default_step: f32,

    /// Deliver the current level as soon as a subscription opens (default: false).
    pub emit_on_start: bool,

    /// Drop a `VolumeChanged` equal to the previously delivered one (default: false).
    pub dedupe_events: bool,

    /// Longest step walk `set_max_volume`/`set_min_volume` will issue before
    /// writing the boundary level directly (default: 256).
    pub max_step_walk: u32,
}

impl VolumeConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !self.default_step.is_finite() || self.default_step <= 0.0 || self.default_step > 1.0 {
            return Err(format!("default step must be in (0, 1]: {}", self.default_step));
        }
        if self.max_step_walk == 0 {
            return Err("max step walk must be positive".into());
        }
        Ok(())
    }
}

impl Default for VolumeConfiguration {
    fn default() -> Self {
        Self {
            default_step: DEFAULT_VOLUME_STEP,
            emit_on_start: false,
            dedupe_events: false,
            max_step_walk: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(VolumeConfiguration::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_step() {
        for step in [0.0, -0.1, 1.5, f32::NAN] {
            let config = VolumeConfiguration {
                default_step: step,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "step {} accepted", step);
        }
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: VolumeConfiguration =
            serde_json::from_str(r#"{"dedupeEvents": true}"#).unwrap();
        assert!(config.dedupe_events);
        assert_eq!(config.default_step, DEFAULT_VOLUME_STEP);
        assert_eq!(config.max_step_walk, 256);
    }
}
