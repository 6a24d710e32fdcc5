//! Objective placement
//!
//! Rejection sampling inside an annulus around the spawn point. Each
//! objective gets at most `attempt_cap` draws at the current separation;
//! when they run out the separation is relaxed for the rest of the layout.
//! Once it falls below `min_relaxed_separation`, or a relaxation step fails
//! to shrink it, the constraint is dropped. At separation 0 every candidate
//! is accepted, so generation terminates for any settings.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::state::{Objective, ObjectiveId};
use crate::polar_to_cartesian;
use crate::questions::Question;
use crate::settings::LayoutSettings;

/// Result of placing a set of objectives
#[derive(Debug, Clone)]
pub struct Layout {
    pub objectives: Vec<Objective>,
    /// True if the separation had to be relaxed for at least one objective
    pub relaxed: bool,
    /// Separation in force when the last objective was placed
    pub effective_separation: f32,
}

/// Place one objective per question; objective 0 starts unlocked
pub fn generate_layout<R: Rng + ?Sized>(
    questions: Vec<Question>,
    rng: &mut R,
    settings: &LayoutSettings,
) -> Layout {
    let mut positions: Vec<Vec2> = Vec::with_capacity(questions.len());
    let mut separation = settings.min_separation;
    let mut relaxed = false;

    for index in 0..questions.len() {
        let pos = loop {
            if let Some(p) = sample_position(rng, &positions, separation, settings) {
                break p;
            }
            let next = separation * settings.relax_factor;
            // NaN fails both comparisons
            let next = if next < separation && next >= settings.min_relaxed_separation {
                next
            } else {
                0.0
            };
            log::warn!(
                "Placement of objective {} exhausted {} attempts; separation {} -> {}",
                index,
                settings.attempt_cap,
                separation,
                next
            );
            separation = next;
            relaxed = true;
        };
        positions.push(pos);
    }

    let objectives = questions
        .into_iter()
        .zip(positions)
        .enumerate()
        .map(|(index, (question, position))| Objective {
            id: ObjectiveId::for_index(index),
            position,
            question,
            unlocked: index == 0,
            completed: false,
            reward: settings.reward_for(index),
        })
        .collect();

    Layout {
        objectives,
        relaxed,
        effective_separation: separation,
    }
}

/// Up to `attempt_cap` draws; `None` if every candidate was too close.
/// A separation of 0 accepts the first draw.
fn sample_position<R: Rng + ?Sized>(
    rng: &mut R,
    placed: &[Vec2],
    separation: f32,
    settings: &LayoutSettings,
) -> Option<Vec2> {
    let span = settings.outer_radius - settings.inner_radius;
    for _ in 0..settings.attempt_cap.max(1) {
        let theta = rng.random::<f32>() * TAU;
        let r = settings.inner_radius + rng.random::<f32>() * span;
        let candidate = polar_to_cartesian(r, theta);
        if separation <= 0.0 || placed.iter().all(|p| p.distance(candidate) >= separation) {
            return Some(candidate);
        }
    }
    None
}
