use serde::{Deserialize, Serialize};

/// Which ALSA mixer element to drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlsaMixerOptions {
    /// ALSA device name passed to `snd_mixer_attach` (default: `"default"`).
    pub card: String,

    /// Preferred simple-mixer element (default: `"Master"`). When the card
    /// has no such element the first one with a playback volume is used.
    pub element: String,
}

impl AlsaMixerOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.card.trim().is_empty() {
            return Err("mixer card name is empty".into());
        }
        if self.element.trim().is_empty() {
            return Err("mixer element name is empty".into());
        }
        Ok(())
    }
}

impl Default for AlsaMixerOptions {
    fn default() -> Self {
        Self {
            card: "default".into(),
            element: "Master".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_master_on_default_card() {
        let options = AlsaMixerOptions::default();
        assert_eq!(options.card, "default");
        assert_eq!(options.element, "Master");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_default_card() {
        let options: AlsaMixerOptions = serde_json::from_str(r#"{"element": "PCM"}"#).unwrap();
        assert_eq!(options.card, "default");
        assert_eq!(options.element, "PCM");
    }

    #[test]
    fn blank_names_are_rejected() {
        let options = AlsaMixerOptions {
            card: " ".into(),
            ..Default::default()
        };
        assert!(options.validate().is_err());
    }
}
