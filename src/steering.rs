//! Steering: turning input into knight move intents
//!
//! The simulation only reads `Knight::move_x` / `move_y`. Something has to
//! write them before every `update_tick`: the keyboard translation for real
//! play, or the autopilot for demo/idle mode.

use crate::consts::COLLISION_Y_THRESHOLD;
use crate::sim::{Knight, Level};

/// Arrow keys held this frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl KeyState {
    /// Intents for these keys; up wins over down and left over right
    pub fn intents(&self) -> (i8, i8) {
        let move_x = if self.left {
            -1
        } else if self.right {
            1
        } else {
            0
        };
        let move_y = if self.up {
            -1
        } else if self.down {
            1
        } else {
            0
        };
        (move_x, move_y)
    }

    pub fn apply(&self, knight: &mut Knight) {
        let (move_x, move_y) = self.intents();
        knight.steer(move_x, move_y);
    }
}

/// Distance under which the autopilot stops pushing on an axis
const AUTOPILOT_DEADZONE: f32 = 0.4;

/// Chases the fruit that will land first
#[derive(Debug, Clone, Copy, Default)]
pub struct Autopilot;

impl Autopilot {
    pub fn steer(&self, level: &mut Level) {
        let target = level
            .fruits()
            .iter()
            .filter(|f| f.is_falling())
            .min_by(|a, b| a.z().total_cmp(&b.z()))
            // Where the fruit will be once it is low enough to catch
            .map(|f| (f.x(), f.y() + (f.z() - COLLISION_Y_THRESHOLD).max(0.0)));

        let knight = &mut level.knight;
        let Some((catch_x, catch_y)) = target else {
            knight.steer(0, 0);
            return;
        };

        let axis = |delta: f32| -> i8 {
            if delta > AUTOPILOT_DEADZONE {
                1
            } else if delta < -AUTOPILOT_DEADZONE {
                -1
            } else {
                0
            }
        };
        knight.steer(axis(catch_x - knight.x()), axis(catch_y - knight.y()));
    }
}
