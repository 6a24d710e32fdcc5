//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (layout order)
//! - Whole-snapshot replacement, never in-place mutation of a published state
//! - No rendering or platform dependencies

pub mod layout;
pub mod movement;
pub mod progression;
pub mod state;

pub use layout::{Layout, generate_layout};
pub use movement::{Avatar, CameraRig, InputState, Look, MovementLoop, TickOutput};
pub use progression::{AnswerOutcome, GameEvent, Progression, Transition, initialize, step};
pub use state::{GameState, Objective, ObjectiveId, Player};
