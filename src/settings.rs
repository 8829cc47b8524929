//! Player settings and preferences
//!
//! Stored as JSON. Native builds read and write a file; on the web the host
//! keeps the JSON (LocalStorage) and hands it over through the facade.

use serde::{Deserialize, Serialize};

use crate::consts::DIALOGUE_CHAR_MS;
use crate::error::ConfigError;

/// Typewriter speed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TextSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl TextSpeed {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSpeed::Slow => "Slow",
            TextSpeed::Normal => "Normal",
            TextSpeed::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "slow" => Some(TextSpeed::Slow),
            "normal" | "default" => Some(TextSpeed::Normal),
            "fast" => Some(TextSpeed::Fast),
            _ => None,
        }
    }

    /// Milliseconds per revealed character
    pub fn char_ms(&self) -> u32 {
        match self {
            TextSpeed::Slow => 80,
            TextSpeed::Normal => DIALOGUE_CHAR_MS,
            TextSpeed::Fast => 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Dialogue typewriter speed
    pub text_speed: TextSpeed,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Looping tracks volume (0.0 - 1.0)
    pub music_volume: f32,
    /// One-shot effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
    /// Mute when the window loses focus
    pub mute_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_speed: TextSpeed::Normal,
            master_volume: 1.0,
            music_volume: 1.0,
            sfx_volume: 1.0,
            muted: false,
            mute_on_blur: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.clamp_volumes();
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn clamp_volumes(&mut self) {
        for volume in [
            &mut self.master_volume,
            &mut self.music_volume,
            &mut self.sfx_volume,
        ] {
            *volume = if volume.is_finite() {
                volume.clamp(0.0, 1.0)
            } else {
                1.0
            };
        }
    }

    /// Multiplier for looping tracks
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Multiplier for one-shot effects
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Per-character reveal time the session should use, if not the level's own
    pub fn char_ms_override(&self) -> Option<u32> {
        match self.text_speed {
            TextSpeed::Normal => None,
            speed => Some(speed.char_ms()),
        }
    }

    /// Load settings from a file, falling back to defaults if it is missing
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => {
                log::info!("Loaded settings from {}", path.display());
                Self::from_json(&json)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_speed_names() {
        for speed in [TextSpeed::Slow, TextSpeed::Normal, TextSpeed::Fast] {
            assert_eq!(TextSpeed::from_str(speed.as_str()), Some(speed));
        }
        assert_eq!(TextSpeed::from_str("ludicrous"), None);
        assert!(TextSpeed::Slow.char_ms() > TextSpeed::Fast.char_ms());
    }

    #[test]
    fn test_normal_speed_keeps_level_timing() {
        let mut settings = Settings::default();
        assert_eq!(settings.char_ms_override(), None);
        settings.text_speed = TextSpeed::Fast;
        assert_eq!(settings.char_ms_override(), Some(25));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"music_volume": 3.0, "muted": true}"#).unwrap();
        assert_eq!(settings.music_volume, 1.0);
        assert!(settings.muted);
        assert_eq!(settings.text_speed, TextSpeed::Normal);
        assert_eq!(settings.effective_music_volume(), 0.0);
    }

    #[test]
    fn test_effective_volumes() {
        let settings = Settings {
            master_volume: 0.5,
            sfx_volume: 0.5,
            ..Settings::default()
        };
        assert_eq!(settings.effective_sfx_volume(), 0.25);
        assert_eq!(settings.effective_music_volume(), 0.5);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("cube-trail-settings-missing.json");
        let _ = std::fs::remove_file(&path);
        assert_eq!(Settings::load(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "cube-trail-settings-{}.json",
            std::process::id()
        ));
        let settings = Settings {
            text_speed: TextSpeed::Slow,
            sfx_volume: 0.3,
            ..Settings::default()
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
        let _ = std::fs::remove_file(&path);
    }
}
