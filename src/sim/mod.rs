//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, audio or input dependencies

pub mod collision;
pub mod counters;
pub mod fruit;
pub mod game_loop;
pub mod generator;
pub mod knight;
pub mod level;

pub use collision::CollisionDetector;
pub use counters::{LivesCounter, PointsCounter};
pub use fruit::{Fruit, FruitError, FruitKind, FruitSnapshot, FruitState};
pub use game_loop::{GameLoop, GameLoopError, GamePhase};
pub use generator::{FruitsGenerator, GeneratorStep};
pub use knight::Knight;
pub use level::Level;
