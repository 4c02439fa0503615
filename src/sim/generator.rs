//! Fruit spawn scheduler with a difficulty ramp
//!
//! Two independent countdowns run every update:
//! - spawn: fires when it drops below zero, then re-arms with
//!   `random(0, RAND) + base_time`
//! - difficulty: fires when it runs out, bumps the level and shortens
//!   `base_time` as `BASE * 10 / (10 + level)`, which approaches zero but never
//!   reaches it

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// What one generator update asks the level to do
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeneratorStep {
    /// Spawn one fruit this update
    pub spawn: bool,
    /// New difficulty level and spawn base time, if the ramp advanced
    pub difficulty_up: Option<(u32, f64)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FruitsGenerator {
    /// Ms until the next spawn
    next_fruit_at: f64,
    /// Ms until the next difficulty step
    next_difficulty_in: f64,
    difficulty: u32,
    /// Current base spawn interval (ms)
    base_time: f64,
}

impl Default for FruitsGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FruitsGenerator {
    pub fn new() -> Self {
        Self {
            next_fruit_at: 0.0,
            next_difficulty_in: SPAWN_BASE_TIME_MS * 5.0,
            difficulty: 0,
            base_time: SPAWN_BASE_TIME_MS,
        }
    }

    /// Spawn base time for a given difficulty level
    pub fn base_time_for(difficulty: u32) -> f64 {
        SPAWN_BASE_TIME_MS * 10.0 / (10.0 + difficulty as f64)
    }

    pub fn update<R: Rng + ?Sized>(&mut self, delta_ms: f64, rng: &mut R) -> GeneratorStep {
        let mut step = GeneratorStep::default();

        self.next_fruit_at -= delta_ms;
        if self.next_fruit_at < 0.0 {
            self.next_fruit_at += rng.random::<f64>() * SPAWN_RAND_TIME_MS + self.base_time;
            step.spawn = true;
        }

        self.next_difficulty_in -= delta_ms;
        if self.next_difficulty_in <= 0.0 {
            self.difficulty += 1;
            self.next_difficulty_in = SPAWN_BASE_TIME_MS * (5 + self.difficulty) as f64;
            self.base_time = Self::base_time_for(self.difficulty);
            log::info!(
                "Difficulty level {} (spawn base time {:.0} ms)",
                self.difficulty + 1,
                self.base_time
            );
            step.difficulty_up = Some((self.difficulty, self.base_time));
        }

        step
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn base_time(&self) -> f64 {
        self.base_time
    }

    pub fn next_fruit_at(&self) -> f64 {
        self.next_fruit_at
    }

    pub fn next_difficulty_in(&self) -> f64 {
        self.next_difficulty_in
    }
}
