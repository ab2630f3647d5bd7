//! Control tuning and preferences
//!
//! Persisted separately from career progress as a small JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Control sensitivity presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControlPreset {
    Fine,
    #[default]
    Standard,
    Fast,
}

impl ControlPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlPreset::Fine => "Fine",
            ControlPreset::Standard => "Standard",
            ControlPreset::Fast => "Fast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fine" | "slow" => Some(ControlPreset::Fine),
            "standard" | "normal" => Some(ControlPreset::Standard),
            "fast" => Some(ControlPreset::Fast),
            _ => None,
        }
    }

    /// Multiplier applied to both magnitude and rotation speed
    pub fn speed_scale(&self) -> f32 {
        match self {
            ControlPreset::Fine => 0.5,
            ControlPreset::Standard => 1.0,
            ControlPreset::Fast => 2.0,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Control sensitivity preset
    pub preset: ControlPreset,

    // === Vector control ===
    /// Length change per second while growing/shrinking (units/s)
    pub magnitude_speed: f32,
    /// Rotation per second around a world axis (degrees/s)
    pub rotation_speed_deg: f32,
    /// Speed multiplier while the precision modifier is held
    pub precision_multiplier: f32,
    /// Below this length a grow input restarts the vector
    pub min_length: f32,
    /// Length a vector restarts at (pointing +y)
    pub regrow_length: f32,
    /// Length a shrink input bottoms out at
    pub shrink_floor: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            preset: ControlPreset::Standard,

            magnitude_speed: 2.5,
            rotation_speed_deg: 90.0,
            precision_multiplier: 0.25,
            min_length: 0.01,
            regrow_length: 0.1,
            shrink_floor: 0.001,
        }
    }
}

impl Settings {
    /// Create settings from a preset
    pub fn from_preset(preset: ControlPreset) -> Self {
        Self {
            preset,
            ..Self::default()
        }
    }

    /// Effective magnitude speed (respects preset and precision mode)
    pub fn effective_magnitude_speed(&self, precision: bool) -> f32 {
        self.magnitude_speed * self.speed_multiplier(precision)
    }

    /// Effective rotation speed in radians/s (respects preset and precision mode)
    pub fn effective_rotation_speed(&self, precision: bool) -> f32 {
        self.rotation_speed_deg.to_radians() * self.speed_multiplier(precision)
    }

    fn speed_multiplier(&self, precision: bool) -> f32 {
        let precision = if precision {
            self.precision_multiplier
        } else {
            1.0
        };
        self.preset.speed_scale() * precision
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_quarters_speed() {
        let settings = Settings::default();
        assert!((settings.effective_magnitude_speed(false) - 2.5).abs() < 1e-6);
        assert!((settings.effective_magnitude_speed(true) - 0.625).abs() < 1e-6);
        let rot = settings.effective_rotation_speed(false);
        assert!((rot - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!((settings.effective_rotation_speed(true) - rot * 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_preset_scales_speed() {
        let fast = Settings::from_preset(ControlPreset::Fast);
        assert!((fast.effective_magnitude_speed(false) - 5.0).abs() < 1e-6);
        assert_eq!(ControlPreset::from_str("normal"), Some(ControlPreset::Standard));
        assert_eq!(ControlPreset::from_str("warp"), None);
    }

    #[test]
    fn test_preset_names_parse_back() {
        for preset in [ControlPreset::Fine, ControlPreset::Standard, ControlPreset::Fast] {
            assert_eq!(ControlPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(ControlPreset::default().as_str(), "Standard");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = serde_json::from_str(r#"{ "magnitude_speed": 4.0 }"#).unwrap();
        assert_eq!(settings.magnitude_speed, 4.0);
        assert_eq!(settings.precision_multiplier, 0.25);
        assert_eq!(settings.preset, ControlPreset::Standard);
    }

    #[test]
    fn test_load_missing_or_malformed_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(missing.magnitude_speed, 2.5);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert_eq!(Settings::load(&bad).rotation_speed_deg, 90.0);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::from_preset(ControlPreset::Fine);
        settings.precision_multiplier = 0.1;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path);
        assert_eq!(loaded.preset, ControlPreset::Fine);
        assert!((loaded.precision_multiplier - 0.1).abs() < 1e-6);
    }
}
