//! Score and lives bookkeeping
//!
//! Both counters resolve fruit each step and report the outcome to the store
//! through `Dispatch`. The store owns the real numbers: the counters only learn
//! the result from its `StateChange` broadcast and use that to detect the end
//! of the run.

use super::collision::CollisionDetector;
use super::fruit::FruitError;
use super::level::Level;
use crate::consts::{POINTS_PER_FRUIT, WIN_SCORE};
use crate::events::{Dispatch, EventBus, GameAction, Scoreboard, StateChange};

#[derive(Debug, Clone)]
pub struct PointsCounter {
    /// Last score seen from the store
    score: i64,
}

impl PointsCounter {
    pub fn new(initial: Scoreboard) -> Self {
        Self {
            score: initial.score,
        }
    }

    /// Collect every fruit the knight touches; returns how many
    pub fn update(
        &mut self,
        level: &mut Level,
        dispatch: &mut dyn Dispatch,
        events: &mut EventBus,
    ) -> Result<usize, FruitError> {
        let caught = CollisionDetector::new(level.fruits(), &level.knight).collision_indices();

        let mut collected = 0;
        for index in caught {
            let Some(fruit) = level.fruit_at_mut(index) else {
                continue;
            };
            fruit.collect(events)?;
            collected += 1;
            log::debug!("Scored: {}", POINTS_PER_FRUIT);
            dispatch.dispatch(GameAction::AddScore {
                points: POINTS_PER_FRUIT,
            });
        }
        Ok(collected)
    }

    /// Returns true when this broadcast is the one that wins the level
    pub fn observe(&mut self, change: &StateChange) -> bool {
        self.score = change.new_state.score;
        if !matches!(change.action, GameAction::AddScore { .. }) {
            return false;
        }
        let won = change.old_state.score < WIN_SCORE && change.new_state.score >= WIN_SCORE;
        if won {
            log::info!("Level won with score {}", change.new_state.score);
        }
        won
    }

    pub fn score(&self) -> i64 {
        self.score
    }
}

#[derive(Debug, Clone)]
pub struct LivesCounter {
    /// Last lives count seen from the store
    lives: i32,
}

impl LivesCounter {
    pub fn new(initial: Scoreboard) -> Self {
        Self {
            lives: initial.lives,
        }
    }

    /// Drop every fruit that hit the floor; returns how many
    pub fn update(
        &mut self,
        level: &mut Level,
        dispatch: &mut dyn Dispatch,
        events: &mut EventBus,
    ) -> Result<usize, FruitError> {
        let fallen = CollisionDetector::new(level.fruits(), &level.knight).fall_indices();

        let mut dropped = 0;
        for index in fallen {
            let Some(fruit) = level.fruit_at_mut(index) else {
                continue;
            };
            fruit.drop_to_floor(events)?;
            dropped += 1;
            log::debug!("Lost a life");
            dispatch.dispatch(GameAction::TakeLife);
        }
        Ok(dropped)
    }

    /// Returns true when this broadcast leaves no lives
    pub fn observe(&mut self, change: &StateChange) -> bool {
        self.lives = change.new_state.lives;
        if change.action != GameAction::TakeLife {
            return false;
        }
        let out = change.new_state.lives <= 0;
        if out {
            log::info!("Lives count dropped to {}", change.new_state.lives);
        }
        out
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }
}
