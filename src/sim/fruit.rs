//! Falling fruit
//!
//! A fruit spawns high above a random floor spot and falls toward it while
//! also sliding toward the viewer, y and z moving at the same rate. It ends
//! either caught by the knight (collected) or on the floor (dropped).

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LevelConfig;
use crate::consts::*;
use crate::events::{EventBus, GameEvent};

/// Catalog of things that fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FruitKind {
    Peach,
    Bread,
    Cookie,
    Onion,
    Apple,
    Cheese,
    PieLemon,
    Avocado,
    Lemon,
    MelonWater,
    Brownie,
    MelonHoneydew,
}

impl FruitKind {
    pub const ALL: [FruitKind; 12] = [
        FruitKind::Peach,
        FruitKind::Bread,
        FruitKind::Cookie,
        FruitKind::Onion,
        FruitKind::Apple,
        FruitKind::Cheese,
        FruitKind::PieLemon,
        FruitKind::Avocado,
        FruitKind::Lemon,
        FruitKind::MelonWater,
        FruitKind::Brownie,
        FruitKind::MelonHoneydew,
    ];

    /// Uniform pick from the catalog
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

/// Fruit lifecycle; `Collected` and `Dropped` are terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FruitState {
    Falling,
    Collected,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FruitError {
    #[error("fruit {id} is {state:?}, only falling fruit can be resolved")]
    NotFalling { id: u32, state: FruitState },
}

/// Copy of a fruit's observable state, carried by notifications
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FruitSnapshot {
    pub id: u32,
    pub kind: FruitKind,
    pub state: FruitState,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fruit {
    id: u32,
    kind: FruitKind,
    state: FruitState,
    x: f32,
    y: f32,
    z: f32,
}

impl Fruit {
    /// Spawn a fruit of `kind` at a random spot inside the field margins
    ///
    /// The spawn y is pushed back by the spawn height so that the fruit lands
    /// on the picked spot when z reaches 0.
    pub fn start_falling<R: Rng + ?Sized>(
        id: u32,
        kind: FruitKind,
        config: &LevelConfig,
        rng: &mut R,
        events: &mut EventBus,
    ) -> Self {
        let spread = 1.0 - SPAWN_MARGIN * 2.0;
        let x = config.size_x * (SPAWN_MARGIN + rng.random::<f32>() * spread - 0.5);
        let y = config.size_y * (SPAWN_MARGIN + rng.random::<f32>() * spread - 0.5);
        let z = SPAWN_HEIGHT_MIN + rng.random::<f32>() * SPAWN_HEIGHT_SPAN;

        let fruit = Self::with_position(id, kind, x, y - z, z);
        events.emit(GameEvent::FruitSpawned(fruit.snapshot()));
        fruit
    }

    /// Place a falling fruit directly, no randomness and no notification
    pub fn with_position(id: u32, kind: FruitKind, x: f32, y: f32, z: f32) -> Self {
        Self {
            id,
            kind,
            state: FruitState::Falling,
            x,
            y,
            z,
        }
    }

    /// Mark as caught by the knight
    pub fn collect(&mut self, events: &mut EventBus) -> Result<(), FruitError> {
        self.resolve(FruitState::Collected)?;
        events.emit(GameEvent::FruitCollected(self.snapshot()));
        Ok(())
    }

    /// Mark as fallen to the floor
    pub fn drop_to_floor(&mut self, events: &mut EventBus) -> Result<(), FruitError> {
        self.resolve(FruitState::Dropped)?;
        events.emit(GameEvent::FruitDropped(self.snapshot()));
        Ok(())
    }

    fn resolve(&mut self, to: FruitState) -> Result<(), FruitError> {
        if self.state != FruitState::Falling {
            return Err(FruitError::NotFalling {
                id: self.id,
                state: self.state,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Fall for `delta_ms`; terminal fruit stays where it is
    pub fn update(&mut self, delta_ms: f64) {
        if !self.is_falling() {
            return;
        }
        let step = (delta_ms / 1000.0) as f32 * FRUIT_FALLING_SPEED;
        self.y += step;
        self.z -= step;
    }

    pub fn snapshot(&self) -> FruitSnapshot {
        FruitSnapshot {
            id: self.id,
            kind: self.kind,
            state: self.state,
            x: self.x,
            y: self.y,
            z: self.z,
        }
    }

    #[inline]
    pub fn is_falling(&self) -> bool {
        self.state == FruitState::Falling
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub(super) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    pub fn kind(&self) -> FruitKind {
        self.kind
    }

    pub fn state(&self) -> FruitState {
        self.state
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn z(&self) -> f32 {
        self.z
    }
}
