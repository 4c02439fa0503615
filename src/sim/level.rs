//! The play field: knight, active fruit and the spawn scheduler

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::fruit::{Fruit, FruitKind};
use super::generator::FruitsGenerator;
use super::knight::Knight;
use crate::config::LevelConfig;
use crate::events::{EventBus, GameEvent};

#[derive(Debug, Clone)]
pub struct Level {
    config: LevelConfig,
    pub knight: Knight,
    /// Active fruit in spawn order
    fruits: Vec<Fruit>,
    generator: FruitsGenerator,
    rng: Pcg32,
    next_id: u32,
}

impl Level {
    pub fn new(config: LevelConfig) -> Self {
        let rng = Pcg32::seed_from_u64(config.seed);
        Self {
            config,
            knight: Knight::new(),
            fruits: Vec::new(),
            generator: FruitsGenerator::new(),
            rng,
            next_id: 1,
        }
    }

    /// Advance everything by one step
    ///
    /// Fruit resolved during the previous step is removed at the end, so
    /// observers get one full step to react to the resolution.
    pub fn update(&mut self, delta_ms: f64, events: &mut EventBus) {
        self.knight.update(delta_ms);
        for fruit in &mut self.fruits {
            fruit.update(delta_ms);
        }

        let step = self.generator.update(delta_ms, &mut self.rng);
        if step.spawn {
            let kind = FruitKind::random(&mut self.rng);
            self.spawn_fruit(kind, events);
        }
        if let Some((level, base_time_ms)) = step.difficulty_up {
            events.emit(GameEvent::DifficultyIncreased {
                level,
                base_time_ms,
            });
        }

        self.fruits.retain(Fruit::is_falling);
    }

    fn spawn_fruit(&mut self, kind: FruitKind, events: &mut EventBus) {
        let id = self.next_entity_id();
        let fruit = Fruit::start_falling(id, kind, &self.config, &mut self.rng, events);
        log::debug!("Fruit {} spawned: {:?}", id, kind);
        self.fruits.push(fruit);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Insert a fruit placed by the host (scripted levels, tests)
    ///
    /// The fruit is renumbered from the level's own ids so every active fruit
    /// stays unique; returns the id it was given.
    pub fn push_fruit(&mut self, mut fruit: Fruit) -> u32 {
        let id = self.next_entity_id();
        fruit.set_id(id);
        self.fruits.push(fruit);
        id
    }

    pub fn fruits(&self) -> &[Fruit] {
        &self.fruits
    }

    pub fn fruit_mut(&mut self, id: u32) -> Option<&mut Fruit> {
        self.fruits.iter_mut().find(|f| f.id() == id)
    }

    /// Fruit at `index` in `fruits()`
    pub fn fruit_at_mut(&mut self, index: usize) -> Option<&mut Fruit> {
        self.fruits.get_mut(index)
    }

    pub fn config(&self) -> &LevelConfig {
        &self.config
    }

    pub fn generator(&self) -> &FruitsGenerator {
        &self.generator
    }
}
