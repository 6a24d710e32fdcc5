//! Save record format
//!
//! `{ player: {x, y, coins, xp, level, completedBoxes[]}, completedBoxes: [id...], level }`
//! plus an optional `version`. Records without a version are treated as
//! version 0 and load unchanged.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::PersistError;
use crate::sim::{GameState, ObjectiveId};

/// Version written by this build
pub const SAVE_VERSION: u32 = 1;

/// Persisted player fields. Missing fields keep their fresh-game values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedPlayer {
    pub x: f32,
    /// Ground-plane z (named `y` in the save format)
    pub y: f32,
    pub coins: u32,
    pub xp: u32,
    pub level: u32,
    pub completed_boxes: Vec<ObjectiveId>,
}

impl Default for SavedPlayer {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            coins: 0,
            xp: 0,
            level: 1,
            completed_boxes: Vec::new(),
        }
    }
}

fn default_level() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRecord {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub player: SavedPlayer,
    pub completed_boxes: Vec<ObjectiveId>,
    #[serde(default = "default_level")]
    pub level: u32,
}

impl SaveRecord {
    /// Capture the persistent part of a snapshot
    pub fn from_state(state: &GameState) -> Self {
        let player = &state.player;
        Self {
            version: SAVE_VERSION,
            player: SavedPlayer {
                x: player.position.x,
                y: player.position.y,
                coins: player.coins,
                xp: player.xp,
                level: player.level,
                completed_boxes: player.completed.clone(),
            },
            completed_boxes: state
                .objectives
                .iter()
                .filter(|o| o.completed)
                .map(|o| o.id.clone())
                .collect(),
            level: player.level,
        }
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse and validate a stored record
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        let record: SaveRecord = serde_json::from_str(json)?;
        record.validate()?;
        Ok(record)
    }

    pub fn validate(&self) -> Result<(), PersistError> {
        if self.version > SAVE_VERSION {
            return Err(PersistError::UnsupportedVersion {
                found: self.version,
            });
        }
        if self.player.level == 0 {
            return Err(PersistError::Invalid("player level must be at least 1".into()));
        }
        if !self.player.x.is_finite() || !self.player.y.is_finite() {
            return Err(PersistError::Invalid("player position is not finite".into()));
        }
        Ok(())
    }

    /// Overlay this record onto a freshly initialized snapshot.
    ///
    /// Completion is restored along the unlock chain: objectives are marked
    /// completed (and unlocked) in layout order while their ids appear in the
    /// record, and the objective after the last completed one is unlocked.
    /// Ids past the first gap, or unknown to this layout, are ignored.
    pub fn apply_to(&self, fresh: &GameState) -> GameState {
        let mut next = fresh.clone();

        next.player.position = Vec2::new(self.player.x, self.player.y);
        next.player.coins = self.player.coins;
        next.player.xp = self.player.xp;
        next.player.level = self.player.level;

        let mut restored = Vec::new();
        for obj in next.objectives.iter_mut() {
            if !self.completed_boxes.contains(&obj.id) {
                obj.unlocked = true;
                break;
            }
            obj.completed = true;
            obj.unlocked = true;
            restored.push(obj.id.clone());
        }

        let skipped = self.completed_boxes.len().saturating_sub(restored.len());
        if skipped > 0 {
            log::warn!(
                "Ignored {} saved completion(s) outside this layout's unlock chain",
                skipped
            );
        }

        next.player.completed = restored;
        next.open = None;
        next.attempts = 0;
        next
    }
}
