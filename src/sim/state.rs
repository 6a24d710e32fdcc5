//! Progression snapshot types
//!
//! A `GameState` is the unit of event processing: every event consumes one
//! snapshot and produces the next. It is also what the presentation layer
//! and the movement loop read each frame.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::questions::Question;

/// Stable identifier of a treasure box ("box_1", "box_2", ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectiveId(String);

impl ObjectiveId {
    /// Id of the objective at `index` in layout order
    pub fn for_index(index: usize) -> Self {
        Self(format!("box_{}", index + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectiveId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The player's persistent stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    /// Ground-plane position (x, z)
    pub position: Vec2,
    pub coins: u32,
    pub xp: u32,
    pub level: u32,
    /// Terminally resolved objectives, in resolution order
    pub completed: Vec<ObjectiveId>,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            coins: 0,
            xp: 0,
            level: 1,
            completed: Vec::new(),
        }
    }
}

/// A treasure box gating one question
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Objective {
    pub id: ObjectiveId,
    /// Ground-plane position (x, z)
    pub position: Vec2,
    pub question: Question,
    pub unlocked: bool,
    pub completed: bool,
    /// Coins paid on a correct answer
    pub reward: u32,
}

impl Objective {
    /// Unlocked and not yet resolved
    #[inline]
    pub fn is_open_for_play(&self) -> bool {
        self.unlocked && !self.completed
    }
}

/// Complete progression snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameState {
    pub player: Player,
    /// Objectives in layout (and unlock) order
    pub objectives: Vec<Objective>,
    /// Objective whose question is currently shown
    pub open: Option<ObjectiveId>,
    /// Answers given to the open question
    pub attempts: u32,
    pub hints_enabled: bool,
}

impl GameState {
    /// Fresh snapshot over an already placed set of objectives
    pub fn from_objectives(objectives: Vec<Objective>) -> Self {
        Self {
            player: Player::default(),
            objectives,
            open: None,
            attempts: 0,
            hints_enabled: true,
        }
    }

    pub fn objective_index(&self, id: &ObjectiveId) -> Option<usize> {
        self.objectives.iter().position(|o| &o.id == id)
    }

    pub fn objective(&self, id: &ObjectiveId) -> Option<&Objective> {
        self.objectives.iter().find(|o| &o.id == id)
    }

    pub fn open_objective(&self) -> Option<&Objective> {
        self.open.as_ref().and_then(|id| self.objective(id))
    }

    /// Question shown to the player, if any
    pub fn current_question(&self) -> Option<&Question> {
        self.open_objective().map(|o| &o.question)
    }

    pub fn attempts_left(&self, max_attempts: u32) -> u32 {
        max_attempts.saturating_sub(self.attempts)
    }

    pub fn completed_count(&self) -> usize {
        self.objectives.iter().filter(|o| o.completed).count()
    }

    /// Every objective resolved (the run is over)
    pub fn all_completed(&self) -> bool {
        !self.objectives.is_empty() && self.objectives.iter().all(|o| o.completed)
    }

    /// The next objective to head for
    pub fn next_objective(&self) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.is_open_for_play())
    }

    /// Objective the hint marker points at (only when hints are on)
    pub fn hint_target(&self) -> Option<&Objective> {
        if self.hints_enabled {
            self.next_objective()
        } else {
            None
        }
    }

    /// Structural invariants every reachable snapshot satisfies
    pub fn check_invariants(&self) -> Result<(), String> {
        if let Some(first) = self.objectives.first() {
            if !first.unlocked {
                return Err(format!("{} must always be unlocked", first.id));
            }
        }
        for (i, obj) in self.objectives.iter().enumerate() {
            if obj.completed && !obj.unlocked {
                return Err(format!("{} is completed but locked", obj.id));
            }
            if i > 0 && obj.unlocked && !self.objectives[i - 1].completed {
                return Err(format!(
                    "{} is unlocked before {} was resolved",
                    obj.id,
                    self.objectives[i - 1].id
                ));
            }
        }
        for (i, id) in self.player.completed.iter().enumerate() {
            if self.player.completed[..i].contains(id) {
                return Err(format!("{} recorded as completed twice", id));
            }
            if !self.objective(id).is_some_and(|o| o.completed) {
                return Err(format!("{} recorded as completed but is not", id));
            }
        }
        if self.player.completed.len() != self.completed_count() {
            return Err("player completion list out of sync with objectives".into());
        }
        if let Some(open) = &self.open {
            match self.objective(open) {
                Some(o) if o.unlocked => {}
                _ => return Err(format!("open question refers to unavailable {}", open)),
            }
        }
        Ok(())
    }
}
