//! Fruit Knight - a knight catches falling fruit before it hits the ground
//!
//! Core modules:
//! - `sim`: Deterministic simulation (knight, fruit, spawning, collisions, game loop)
//! - `events`: Notifications out, actions out, store broadcasts in
//! - `clock`: Wall-clock source for the tick budget
//! - `config`: Level configuration
//! - `store`: In-memory score/lives store (the UI-side reducer)
//! - `steering`: Keyboard and autopilot steering for the knight

pub mod clock;
pub mod config;
pub mod events;
pub mod sim;
pub mod steering;
pub mod store;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, LevelConfig};
pub use events::{Dispatch, EventBus, GameAction, GameEvent, Scoreboard, StateChange};
pub use store::ScoreStore;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation step (ms)
    pub const TICK_DURATION_MS: f64 = 16.0;
    /// Tick count after which `update_tick` may stop early
    pub const MAX_TICKS_PER_UPDATE: u32 = 50;
    /// Wall-clock budget for a single `update_tick` call (ms)
    pub const MAX_PROCESS_TIME_MS: f64 = 500.0;

    /// Knight top speed (units/s)
    pub const KNIGHT_MAX_SPEED: f32 = 27.0;
    /// Weight of the previous speed in the speed blend
    pub const KNIGHT_INERTIA: f32 = 15.0;

    /// Fruit fall speed, shared by y and z (units/s)
    pub const FRUIT_FALLING_SPEED: f32 = 7.5;
    /// Fraction of each field axis excluded from spawning, per side
    pub const SPAWN_MARGIN: f32 = 0.05;
    /// Spawn height range [min, min + span)
    pub const SPAWN_HEIGHT_MIN: f32 = 20.0;
    pub const SPAWN_HEIGHT_SPAN: f32 = 5.0;

    /// Random part of the spawn interval (ms)
    pub const SPAWN_RAND_TIME_MS: f64 = 1800.0;
    /// Base spawn interval at difficulty 0 (ms)
    pub const SPAWN_BASE_TIME_MS: f64 = 3700.0;

    /// Horizontal catch distance
    pub const COLLISION_X_THRESHOLD: f32 = 1.3;
    /// Depth catch distance; twice this is the catch height
    pub const COLLISION_Y_THRESHOLD: f32 = 2.8;

    /// Points for each collected fruit
    pub const POINTS_PER_FRUIT: u32 = 50;
    /// Score that wins the level
    pub const WIN_SCORE: i64 = 250;
}
