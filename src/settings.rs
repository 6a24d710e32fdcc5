//! Game tuning
//!
//! Defaults come from `crate::consts`. Any subset of fields may be supplied
//! as JSON; missing fields keep their defaults. Persisted separately from the
//! progress save in LocalStorage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Avatar movement and interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    pub move_speed: f32,
    pub world_half_extent: f32,
    pub jump_impulse: f32,
    pub gravity: f32,
    pub look_sensitivity: f32,
    pub pitch_limit: f32,
    pub trigger_radius: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            move_speed: MOVE_SPEED,
            world_half_extent: WORLD_HALF_EXTENT,
            jump_impulse: JUMP_IMPULSE,
            gravity: GRAVITY,
            look_sensitivity: LOOK_SENSITIVITY,
            pitch_limit: PITCH_LIMIT,
            trigger_radius: TRIGGER_RADIUS,
        }
    }
}

/// Third-person camera rig
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub distance: f32,
    pub height: f32,
    pub pitch_bob: f32,
    pub target_height: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            distance: CAMERA_DISTANCE,
            height: CAMERA_HEIGHT,
            pitch_bob: CAMERA_PITCH_BOB,
            target_height: CAMERA_TARGET_HEIGHT,
        }
    }
}

/// Objective placement and rewards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub min_separation: f32,
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub attempt_cap: u32,
    pub relax_factor: f32,
    pub min_relaxed_separation: f32,
    pub base_reward: u32,
    pub reward_increment: u32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            min_separation: MIN_SEPARATION,
            inner_radius: INNER_RADIUS,
            outer_radius: OUTER_RADIUS,
            attempt_cap: PLACEMENT_ATTEMPT_CAP,
            relax_factor: SEPARATION_RELAX_FACTOR,
            min_relaxed_separation: MIN_RELAXED_SEPARATION,
            base_reward: BASE_REWARD,
            reward_increment: REWARD_INCREMENT,
        }
    }
}

impl LayoutSettings {
    /// Coins paid by the objective at `index` in unlock order
    #[inline]
    pub fn reward_for(&self, index: usize) -> u32 {
        let step = u32::try_from(index).unwrap_or(u32::MAX);
        self.base_reward
            .saturating_add(step.saturating_mul(self.reward_increment))
    }
}

/// Question resolution and experience awards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    pub max_attempts: u32,
    pub xp_correct: u32,
    pub xp_exhausted: u32,
    pub objective_count: usize,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            xp_correct: XP_CORRECT,
            xp_exhausted: XP_EXHAUSTED,
            objective_count: OBJECTIVE_COUNT,
        }
    }
}

/// All tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub movement: MovementSettings,
    pub camera: CameraSettings,
    pub layout: LayoutSettings,
    pub progression: ProgressionSettings,
}

impl Settings {
    /// Parse settings from JSON and validate them
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot work with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let layout = &self.layout;
        if !(layout.inner_radius >= 0.0 && layout.outer_radius >= layout.inner_radius) {
            return Err(SettingsError::Invalid(format!(
                "layout radii must satisfy 0 <= inner ({}) <= outer ({})",
                layout.inner_radius, layout.outer_radius
            )));
        }
        if !(layout.relax_factor > 0.0 && layout.relax_factor < 1.0) {
            return Err(SettingsError::Invalid(format!(
                "relax_factor must be in (0, 1), got {}",
                layout.relax_factor
            )));
        }
        if layout.attempt_cap == 0 {
            return Err(SettingsError::Invalid("attempt_cap must be positive".into()));
        }
        if self.progression.max_attempts == 0 {
            return Err(SettingsError::Invalid("max_attempts must be positive".into()));
        }
        if self.movement.world_half_extent <= 0.0 {
            return Err(SettingsError::Invalid(
                "world_half_extent must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "treasure_trail_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_design_values() {
        let s = Settings::default();
        assert_eq!(s.movement.move_speed, 0.3);
        assert_eq!(s.movement.world_half_extent, 180.0);
        assert_eq!(s.camera.distance, 12.0);
        assert_eq!(s.layout.min_separation, 25.0);
        assert_eq!(s.progression.max_attempts, 3);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_reward_schedule() {
        let layout = LayoutSettings::default();
        assert_eq!(layout.reward_for(0), 75);
        assert_eq!(layout.reward_for(1), 110);
        assert_eq!(layout.reward_for(7), 75 + 7 * 35);
    }

    #[test]
    fn test_reward_saturates() {
        let layout = LayoutSettings {
            base_reward: u32::MAX - 10,
            reward_increment: u32::MAX / 2,
            ..LayoutSettings::default()
        };
        assert_eq!(layout.reward_for(0), u32::MAX - 10);
        assert_eq!(layout.reward_for(3), u32::MAX);
        assert_eq!(layout.reward_for(usize::MAX), u32::MAX);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s = Settings::from_json(r#"{ "movement": { "move_speed": 0.5 } }"#).unwrap();
        assert_eq!(s.movement.move_speed, 0.5);
        assert_eq!(s.movement.trigger_radius, TRIGGER_RADIUS);
        assert_eq!(s.layout, LayoutSettings::default());
    }

    #[test]
    fn test_json_roundtrip() {
        let s = Settings::default();
        let json = s.to_json().unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), s);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = Settings::from_json(r#"{ "layout": { "relax_factor": 1.5 } }"#);
        assert!(matches!(err, Err(SettingsError::Invalid(_))));

        let err = Settings::from_json(r#"{ "layout": { "inner_radius": 200.0 } }"#);
        assert!(matches!(err, Err(SettingsError::Invalid(_))));

        let err = Settings::from_json("not json");
        assert!(matches!(err, Err(SettingsError::Parse(_))));
    }
}
