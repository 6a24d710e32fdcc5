//! Per-frame movement and interaction loop
//!
//! Each tick reads the buffered input and the latest published snapshot,
//! integrates the avatar, places the camera and returns the events the
//! progression should apply. The loop never mutates the snapshot; the
//! ground-plane position is always taken from it, so a reset or restore
//! moves the avatar on the next frame.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::progression::GameEvent;
use super::state::{GameState, Objective};
use crate::normalize_angle;
use crate::settings::{CameraSettings, MovementSettings};

/// Input buffered between frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Jump pressed since the last tick (consumed by the tick)
    pub jump: bool,
    /// Pointer motion since the last tick (pixels)
    pub look_delta: Vec2,
}

impl InputState {
    /// Update held keys. Returns false for keys the game does not use.
    pub fn key_down(&mut self, key: &str) -> bool {
        if matches!(key, " " | "space") {
            self.jump = true;
            return true;
        }
        self.set_direction(key, true)
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        if matches!(key, " " | "space") {
            return true;
        }
        self.set_direction(key, false)
    }

    fn set_direction(&mut self, key: &str, held: bool) -> bool {
        match key {
            "w" | "arrowup" => self.forward = held,
            "s" | "arrowdown" => self.backward = held,
            "a" | "arrowleft" => self.left = held,
            "d" | "arrowright" => self.right = held,
            _ => return false,
        }
        true
    }

    /// Accumulate pointer motion (only while the pointer is locked)
    pub fn add_look(&mut self, dx: f32, dy: f32) {
        self.look_delta += Vec2::new(dx, dy);
    }

    /// Release every held key (focus lost)
    pub fn release_all(&mut self) {
        *self = Self::default();
    }
}

/// Accumulated view direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Look {
    pub yaw: f32,
    /// Clamped; no roll
    pub pitch: f32,
}

impl Look {
    pub fn apply_delta(&mut self, delta: Vec2, sensitivity: f32, pitch_limit: f32) {
        self.yaw = normalize_angle(self.yaw + delta.x * sensitivity);
        self.pitch = (self.pitch + delta.y * sensitivity).clamp(-pitch_limit, pitch_limit);
    }

    /// Ground-plane forward and right unit vectors (x, z)
    #[inline]
    pub fn basis(&self) -> (Vec2, Vec2) {
        let (sin, cos) = self.yaw.sin_cos();
        (Vec2::new(-sin, -cos), Vec2::new(cos, -sin))
    }

    /// Turn so that forward points along `direction`
    pub fn face(&mut self, direction: Vec2) {
        if direction.length_squared() > f32::EPSILON {
            self.yaw = (-direction.x).atan2(-direction.y);
        }
    }
}

/// Vertical state of the avatar (not persisted)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Avatar {
    /// Height above the ground
    pub height: f32,
    pub vertical_velocity: f32,
    pub airborne: bool,
}

impl Avatar {
    /// Start a jump. Returns false while already airborne.
    pub fn jump(&mut self, impulse: f32) -> bool {
        if self.airborne {
            return false;
        }
        self.vertical_velocity = impulse;
        self.airborne = true;
        true
    }

    /// Advance one tick of the jump arc
    pub fn integrate(&mut self, gravity: f32) {
        if !self.airborne {
            return;
        }
        self.height += self.vertical_velocity;
        self.vertical_velocity -= gravity;
        if self.height <= 0.0 {
            self.height = 0.0;
            self.vertical_velocity = 0.0;
            self.airborne = false;
        }
    }
}

/// Third-person camera placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub eye: Vec3,
    pub target: Vec3,
}

impl CameraRig {
    /// Camera behind the avatar, opposite to the look direction
    pub fn follow(ground: Vec2, height: f32, look: &Look, settings: &CameraSettings) -> Self {
        let (forward, _) = look.basis();
        let behind = ground - forward * settings.distance;
        Self {
            eye: Vec3::new(
                behind.x,
                height + settings.height + look.pitch.sin() * settings.pitch_bob,
                behind.y,
            ),
            target: Vec3::new(ground.x, height + settings.target_height, ground.y),
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    /// At most one `MovePlayer` followed by at most one `Interact`
    pub events: Vec<GameEvent>,
    /// Camera placed for this tick's position and look
    pub camera: CameraRig,
    /// Ground-plane position changed this tick
    pub moved: bool,
}

/// Displacement for the held directions. Diagonals are not normalized.
pub fn ground_displacement(input: &InputState, look: &Look, speed: f32) -> Vec2 {
    let (forward, right) = look.basis();
    let mut delta = Vec2::ZERO;
    if input.forward {
        delta += forward * speed;
    }
    if input.backward {
        delta -= forward * speed;
    }
    if input.left {
        delta -= right * speed;
    }
    if input.right {
        delta += right * speed;
    }
    delta
}

/// Pin a position inside the square world boundary
#[inline]
pub fn clamp_to_world(pos: Vec2, half_extent: f32) -> Vec2 {
    pos.clamp(Vec2::splat(-half_extent), Vec2::splat(half_extent))
}

/// First playable objective (layout order) strictly within `radius`
pub fn objective_in_reach<'a>(state: &'a GameState, pos: Vec2, radius: f32) -> Option<&'a Objective> {
    state
        .objectives
        .iter()
        .filter(|o| o.is_open_for_play())
        .find(|o| o.position.distance(pos) < radius)
}

/// The frame-driven simulation of the avatar
#[derive(Debug, Clone)]
pub struct MovementLoop {
    pub input: InputState,
    look: Look,
    avatar: Avatar,
    camera: CameraRig,
    movement: MovementSettings,
    camera_settings: CameraSettings,
}

impl MovementLoop {
    pub fn new(movement: MovementSettings, camera_settings: CameraSettings) -> Self {
        let look = Look::default();
        let camera = CameraRig::follow(Vec2::ZERO, 0.0, &look, &camera_settings);
        Self {
            input: InputState::default(),
            look,
            avatar: Avatar::default(),
            camera,
            movement,
            camera_settings,
        }
    }

    pub fn look(&self) -> &Look {
        &self.look
    }

    pub fn look_mut(&mut self) -> &mut Look {
        &mut self.look
    }

    pub fn avatar(&self) -> &Avatar {
        &self.avatar
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    /// Advance one frame against the latest snapshot
    pub fn tick(&mut self, snapshot: &GameState) -> TickOutput {
        let look_delta = std::mem::take(&mut self.input.look_delta);
        self.look.apply_delta(
            look_delta,
            self.movement.look_sensitivity,
            self.movement.pitch_limit,
        );

        let start = snapshot.player.position;
        let displacement = ground_displacement(&self.input, &self.look, self.movement.move_speed);
        let pos = clamp_to_world(start + displacement, self.movement.world_half_extent);

        if std::mem::take(&mut self.input.jump) {
            self.avatar.jump(self.movement.jump_impulse);
        }
        self.avatar.integrate(self.movement.gravity);

        self.camera = CameraRig::follow(pos, self.avatar.height, &self.look, &self.camera_settings);

        let mut out = TickOutput {
            camera: self.camera,
            ..TickOutput::default()
        };
        if pos != start {
            out.moved = true;
            out.events.push(GameEvent::MovePlayer { x: pos.x, z: pos.y });
            if let Some(objective) = objective_in_reach(snapshot, pos, self.movement.trigger_radius) {
                out.events.push(GameEvent::Interact(objective.id.clone()));
            }
        }
        out
    }
}
