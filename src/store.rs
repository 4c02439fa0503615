//! In-memory score/lives store
//!
//! Mirrors what the UI side does with dispatched actions: apply them to its
//! own state and broadcast `{ action, old_state, new_state }` back. Hosts
//! without a UI framework (the headless binary, tests) use this directly.

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::events::{GameAction, Scoreboard, StateChange};

#[derive(Debug, Clone, Default)]
pub struct ScoreStore {
    state: Scoreboard,
    subscribers: Vec<Sender<StateChange>>,
}

impl ScoreStore {
    pub fn new(initial: Scoreboard) -> Self {
        Self {
            state: initial,
            subscribers: Vec::new(),
        }
    }

    /// Receive the broadcast of every action applied from now on
    pub fn subscribe(&mut self) -> Receiver<StateChange> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Apply one action, broadcast it and return the broadcast
    pub fn apply(&mut self, action: GameAction) -> StateChange {
        let old_state = self.state;
        match action {
            GameAction::AddScore { points } => {
                self.state.score += points as i64;
                log::debug!("Add score: {}", points);
            }
            GameAction::TakeLife => {
                self.state.lives -= 1;
                log::debug!("Life lost. Remaining: {}", self.state.lives);
            }
        }
        let change = StateChange {
            action,
            old_state,
            new_state: self.state,
        };
        self.subscribers.retain(|tx| tx.send(change).is_ok());
        change
    }

    pub fn apply_all(&mut self, actions: impl IntoIterator<Item = GameAction>) -> Vec<StateChange> {
        actions.into_iter().map(|action| self.apply(action)).collect()
    }

    pub fn state(&self) -> Scoreboard {
        self.state
    }
}
