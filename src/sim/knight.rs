//! The player's knight

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// The knight walking the field floor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knight {
    /// Position in field units
    pub pos: Vec2,
    /// Velocity in field units per second
    pub speed: Vec2,
    /// Horizontal intent (-1, 0, 1), written by steering
    pub move_x: i8,
    /// Depth intent (-1, 0, 1), written by steering
    pub move_y: i8,
}

impl Knight {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.pos.y
    }

    /// Set both move intents at once
    pub fn steer(&mut self, move_x: i8, move_y: i8) {
        self.move_x = move_x;
        self.move_y = move_y;
    }

    /// Move by the current speed, then ease speed toward the intent
    ///
    /// Position is unbounded; the field edge is a presentation concern.
    pub fn update(&mut self, delta_ms: f64) {
        let dt = (delta_ms / 1000.0) as f32;
        self.pos += self.speed * dt;

        let target = Vec2::new(self.move_x as f32, self.move_y as f32) * KNIGHT_MAX_SPEED;
        self.speed = (self.speed * KNIGHT_INERTIA + target) / (KNIGHT_INERTIA + 1.0);
    }
}
