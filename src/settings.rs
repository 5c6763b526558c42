//! Presentation settings and preferences
//!
//! Nothing here touches gameplay; a session plays the same under any settings.

use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles drawn for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 256,
            QualityPreset::High => 512,
        }
    }

    /// Trail length multiplier (1.0 = full)
    pub fn trail_quality(&self) -> f32 {
        match self {
            QualityPreset::Low => 0.25,
            QualityPreset::Medium => 0.6,
            QualityPreset::High => 1.0,
        }
    }

    /// Whether street lamps are drawn
    pub fn lamps_enabled(&self) -> bool {
        !matches!(self, QualityPreset::Low)
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Camera shake on crashes and near-misses
    pub screen_shake: bool,
    /// Vehicle light trail
    pub trails: bool,
    /// Particle effects (sparks, debris, exhaust)
    pub particles: bool,
    /// Near-miss screen flash
    pub flash: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Accessibility ===
    /// Reduced motion (minimize shake, flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,

            screen_shake: true,
            trails: true,
            particles: true,
            flash: true,

            master_volume: 0.8,
            sfx_volume: 1.0,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let settings: Settings = serde_json::from_str(json)?;
        log::info!("Loaded settings (quality {})", settings.quality.as_str());
        Ok(settings)
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset disables the trail for performance
        if preset == QualityPreset::Low {
            self.trails = false;
        }
    }

    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective flash (respects reduced_motion)
    pub fn effective_flash(&self) -> bool {
        self.flash && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Number of trail points drawn out of `available`
    pub fn trail_points(&self, available: usize) -> usize {
        if !self.trails {
            return 0;
        }
        ((available as f32) * self.quality.trail_quality()).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reduced_motion_overrides() {
        let settings = Settings {
            reduced_motion: true,
            ..Default::default()
        };
        assert!(!settings.effective_screen_shake());
        assert!(!settings.effective_flash());
        assert!(settings.trails);
    }

    #[test]
    fn test_low_preset() {
        let settings = Settings::from_preset(QualityPreset::Low);
        assert_eq!(settings.quality, QualityPreset::Low);
        assert!(!settings.trails);
        assert_eq!(settings.trail_points(24), 0);
        assert_eq!(settings.max_particles(), 64);
    }

    #[test]
    fn test_particles_off() {
        let settings = Settings {
            particles: false,
            ..Default::default()
        };
        assert_eq!(settings.max_particles(), 0);
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(r#"{"quality":"High","sfx_volume":0.5}"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert_eq!(settings.sfx_volume, 0.5);
        assert!(settings.screen_shake);
        assert!(Settings::from_json("{").is_err());
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(QualityPreset::from_name("MED"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_name("ultra"), None);
    }
}
