//! Catch and floor detection
//!
//! Pure queries over the live fruit list; nothing here changes fruit state.

use super::fruit::Fruit;
use super::knight::Knight;
use crate::consts::{COLLISION_X_THRESHOLD, COLLISION_Y_THRESHOLD};

/// Borrowed view over the knight and the active fruit
#[derive(Debug, Clone, Copy)]
pub struct CollisionDetector<'a> {
    fruits: &'a [Fruit],
    knight: &'a Knight,
}

impl<'a> CollisionDetector<'a> {
    pub fn new(fruits: &'a [Fruit], knight: &'a Knight) -> Self {
        Self { fruits, knight }
    }

    /// Falling fruit low enough and close enough for the knight to catch
    pub fn check_for_collisions(&self) -> Vec<&'a Fruit> {
        self.resolve(self.collision_indices())
    }

    /// Falling fruit that went through the floor plane
    pub fn check_for_falls(&self) -> Vec<&'a Fruit> {
        self.resolve(self.fall_indices())
    }

    /// Positions in the fruit slice of `check_for_collisions` hits
    pub fn collision_indices(&self) -> Vec<usize> {
        let knight = self.knight;
        self.matching(|fruit| {
            fruit.z() <= COLLISION_Y_THRESHOLD * 2.0
                && (knight.x() - fruit.x()).abs() < COLLISION_X_THRESHOLD
                && (knight.y() - fruit.y()).abs() < COLLISION_Y_THRESHOLD
        })
    }

    /// Positions in the fruit slice of `check_for_falls` hits
    pub fn fall_indices(&self) -> Vec<usize> {
        self.matching(|fruit| fruit.z() < 0.0)
    }

    fn matching(&self, hit: impl Fn(&Fruit) -> bool) -> Vec<usize> {
        self.fruits
            .iter()
            .enumerate()
            .filter(|(_, fruit)| fruit.is_falling() && hit(*fruit))
            .map(|(i, _)| i)
            .collect()
    }

    fn resolve(&self, indices: Vec<usize>) -> Vec<&'a Fruit> {
        let fruits = self.fruits;
        indices.into_iter().map(|i| &fruits[i]).collect()
    }
}
