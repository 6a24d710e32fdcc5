//! Treasure Trail - a third-person quiz treasure hunt
//!
//! Core modules:
//! - `sim`: Pure game logic (layout, progression state machine, movement loop)
//! - `questions`: Static quiz catalog and sampling
//! - `persistence`: Save/load of player progress behind a storage port
//! - `settings`: Data-driven tuning for movement, camera, layout and rewards

pub mod persistence;
pub mod questions;
pub mod settings;
pub mod sim;

pub use questions::{Difficulty, Question, QuestionBank, Subject};
pub use settings::Settings;

use glam::Vec2;

/// Game design constants
pub mod consts {
    /// Ground-plane displacement per held direction per tick
    pub const MOVE_SPEED: f32 = 0.3;
    /// Square world boundary (hard wall at ±this on both axes)
    pub const WORLD_HALF_EXTENT: f32 = 180.0;
    /// Initial upward velocity of a jump (units/tick)
    pub const JUMP_IMPULSE: f32 = 0.4;
    /// Downward acceleration while airborne (units/tick²)
    pub const GRAVITY: f32 = 0.02;
    /// Radians of look rotation per pixel of pointer motion
    pub const LOOK_SENSITIVITY: f32 = 0.002;
    /// Pitch clamp (±60°)
    pub const PITCH_LIMIT: f32 = std::f32::consts::FRAC_PI_3;
    /// Distance at which an unlocked objective opens its question
    pub const TRIGGER_RADIUS: f32 = 5.0;

    /// Third-person camera rig
    pub const CAMERA_DISTANCE: f32 = 12.0;
    pub const CAMERA_HEIGHT: f32 = 8.0;
    pub const CAMERA_PITCH_BOB: f32 = 5.0;
    /// Camera looks at this height above the avatar's feet
    pub const CAMERA_TARGET_HEIGHT: f32 = 2.0;

    /// Objective layout (annulus around the spawn point)
    pub const MIN_SEPARATION: f32 = 25.0;
    pub const INNER_RADIUS: f32 = 30.0;
    pub const OUTER_RADIUS: f32 = 150.0;
    /// Draws per objective before the separation is relaxed
    pub const PLACEMENT_ATTEMPT_CAP: u32 = 500;
    pub const SEPARATION_RELAX_FACTOR: f32 = 0.5;
    /// Below this the separation constraint is dropped entirely
    pub const MIN_RELAXED_SEPARATION: f32 = 0.5;

    /// Rewards: objective i pays BASE_REWARD + i * REWARD_INCREMENT coins
    pub const BASE_REWARD: u32 = 75;
    pub const REWARD_INCREMENT: u32 = 35;
    pub const MAX_ATTEMPTS: u32 = 3;
    pub const XP_CORRECT: u32 = 100;
    pub const XP_EXHAUSTED: u32 = 25;

    /// Questions drawn per run
    pub const OBJECTIVE_COUNT: usize = 8;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
