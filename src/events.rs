//! Messages crossing the simulation boundary
//!
//! Three directions:
//! - `GameEvent`: notifications for rendering/audio/UI, fanned out by `EventBus`
//! - `GameAction`: commands to the external score/lives store, sent through `Dispatch`
//! - `StateChange`: the store's broadcast after it applied an action

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::sim::FruitSnapshot;

/// Score and lives as owned by the external store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub score: i64,
    pub lives: i32,
}

impl Scoreboard {
    pub fn new(score: i64, lives: i32) -> Self {
        Self { score, lives }
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self { score: 0, lives: 3 }
    }
}

/// Command sent to the score/lives store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameAction {
    AddScore { points: u32 },
    TakeLife,
}

impl GameAction {
    /// Wire name of the action
    pub fn action_type(&self) -> &'static str {
        match self {
            GameAction::AddScore { .. } => "addScore",
            GameAction::TakeLife => "takeLife",
        }
    }
}

/// Outbound sink for store commands
///
/// The simulation never assumes a dispatched action was applied; the outcome
/// comes back as a `StateChange`.
pub trait Dispatch {
    fn dispatch(&mut self, action: GameAction);
}

impl<F: FnMut(GameAction)> Dispatch for F {
    fn dispatch(&mut self, action: GameAction) {
        self(action)
    }
}

/// Broadcast from the store after applying an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateChange {
    pub action: GameAction,
    pub old_state: Scoreboard,
    pub new_state: Scoreboard,
}

/// Why a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Score reached the win threshold
    Won,
    /// Lives ran out
    OutOfLives,
    /// Ended by the host
    Aborted,
}

/// Notification for presentation collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started,
    FruitSpawned(FruitSnapshot),
    FruitCollected(FruitSnapshot),
    FruitDropped(FruitSnapshot),
    DifficultyIncreased { level: u32, base_time_ms: f64 },
    Tick { seq: u64, duration_ms: f64 },
    GameOver { reason: GameOverReason },
}

/// Fan-out of `GameEvent`s to any number of subscribers
///
/// Each subscriber owns a receiving end; dropped receivers are pruned on the
/// next emit. Emitting never blocks.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<GameEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
