//! Fixed timestep game loop
//!
//! The host calls `update_tick(now)` once per frame with any cadence. Elapsed
//! wall time is cut into whole 16 ms ticks; the leftover carries into the next
//! call. Each tick runs, in order: level, points, lives, tick notification.

use crossbeam_channel::Receiver;
use thiserror::Error;

use super::counters::{LivesCounter, PointsCounter};
use super::fruit::FruitError;
use super::level::Level;
use crate::clock::{Clock, SystemClock};
use crate::config::LevelConfig;
use crate::consts::*;
use crate::events::{Dispatch, EventBus, GameEvent, GameOverReason, Scoreboard, StateChange};

/// Lifecycle of one run; `Ended` is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Built, not ticking yet
    Initialized,
    /// Ticking
    Playing,
    /// Run over, ticks are ignored
    Ended,
}

#[derive(Debug, Error)]
pub enum GameLoopError {
    #[error("game loop can only start once (currently {0:?})")]
    AlreadyStarted(GamePhase),
    #[error("time scale must be positive and finite, got {0}")]
    InvalidTimeScale(f64),
    #[error(transparent)]
    Fruit(#[from] FruitError),
}

pub struct GameLoop {
    level: Level,
    points: PointsCounter,
    lives: LivesCounter,
    dispatch: Box<dyn Dispatch>,
    events: EventBus,
    clock: Box<dyn Clock>,
    /// Store broadcasts drained before each update
    changes: Option<Receiver<StateChange>>,
    phase: GamePhase,
    tick_no: u64,
    /// Simulated ms advanced since start
    time_passed: f64,
    /// Wall ms not yet turned into ticks
    time_rest: f64,
    last_tick_at: f64,
    time_scale: f64,
}

impl GameLoop {
    /// Build a loop timed by the system clock
    ///
    /// `initial` is the store's state at construction; `dispatch` receives
    /// every score/life action.
    pub fn new(config: LevelConfig, initial: Scoreboard, dispatch: impl Dispatch + 'static) -> Self {
        Self::with_clock(config, initial, dispatch, SystemClock::new())
    }

    pub fn with_clock(
        config: LevelConfig,
        initial: Scoreboard,
        dispatch: impl Dispatch + 'static,
        clock: impl Clock + 'static,
    ) -> Self {
        Self {
            level: Level::new(config),
            points: PointsCounter::new(initial),
            lives: LivesCounter::new(initial),
            dispatch: Box::new(dispatch),
            events: EventBus::new(),
            clock: Box::new(clock),
            changes: None,
            phase: GamePhase::Initialized,
            tick_no: 0,
            time_passed: 0.0,
            time_rest: 0.0,
            last_tick_at: 0.0,
            time_scale: 1.0,
        }
    }

    /// Observe the store's broadcast channel
    ///
    /// Pending changes are drained at the top of every `update_tick`.
    pub fn with_broadcast(mut self, changes: Receiver<StateChange>) -> Self {
        self.changes = Some(changes);
        self
    }

    /// Receive every notification emitted from now on
    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        self.events.subscribe()
    }

    /// Start ticking, anchored at the clock's current time
    pub fn start(&mut self) -> Result<(), GameLoopError> {
        let now = self.clock.now_ms();
        self.start_at(now)
    }

    /// Start ticking, anchored at `now`
    pub fn start_at(&mut self, now: f64) -> Result<(), GameLoopError> {
        if self.phase != GamePhase::Initialized {
            return Err(GameLoopError::AlreadyStarted(self.phase));
        }
        self.last_tick_at = now;
        self.phase = GamePhase::Playing;
        log::info!("Game started");
        self.events.emit(GameEvent::Started);
        Ok(())
    }

    /// `update_tick` at the clock's current time
    pub fn update(&mut self) -> Result<f64, GameLoopError> {
        let now = self.clock.now_ms();
        self.update_tick(now)
    }

    /// Run every whole tick that fits in the time since the last call
    ///
    /// Returns the simulated ms advanced. After 50 ticks the call keeps going
    /// only while it has spent less than 500 ms of wall time and more than 50
    /// ticks are still owed; whatever is left stays in the carried remainder.
    pub fn update_tick(&mut self, now: f64) -> Result<f64, GameLoopError> {
        self.poll_broadcasts();
        if self.phase != GamePhase::Playing {
            return Ok(0.0);
        }

        let dt = now - self.last_tick_at;
        self.last_tick_at = now;

        let tick_duration = TICK_DURATION_MS / self.time_scale;
        let owed = ((dt + self.time_rest) / tick_duration).floor();
        if owed < 0.0 {
            return Ok(0.0);
        }
        self.time_rest += dt;

        let max_ticks = MAX_TICKS_PER_UPDATE as u64;
        let mut remaining = owed as u64;
        let mut processed = 0u64;
        let process_start = self.clock.now_ms();

        while remaining > 0 && self.phase == GamePhase::Playing {
            if processed >= max_ticks {
                let in_budget = self.clock.now_ms() - process_start < MAX_PROCESS_TIME_MS;
                if !(in_budget && remaining > max_ticks) {
                    log::warn!(
                        "Tick budget exhausted after {} ticks, {} deferred",
                        processed,
                        remaining
                    );
                    break;
                }
            }

            // Booked before running: tick_no, time_passed and time_rest agree even on error
            self.time_rest -= tick_duration;
            remaining -= 1;
            processed += 1;
            self.tick(TICK_DURATION_MS)?;
        }

        Ok(processed as f64 * TICK_DURATION_MS)
    }

    fn tick(&mut self, dt: f64) -> Result<(), GameLoopError> {
        self.tick_no += 1;
        self.time_passed += dt;

        self.level.update(dt, &mut self.events);
        self.points
            .update(&mut self.level, self.dispatch.as_mut(), &mut self.events)?;
        self.lives
            .update(&mut self.level, self.dispatch.as_mut(), &mut self.events)?;

        self.events.emit(GameEvent::Tick {
            seq: self.tick_no,
            duration_ms: dt,
        });
        Ok(())
    }

    /// Observe every broadcast waiting on the registered channel
    pub fn poll_broadcasts(&mut self) {
        let Some(changes) = self.changes.take() else {
            return;
        };
        for change in changes.try_iter() {
            self.observe(&change);
        }
        self.changes = Some(changes);
    }

    /// Feed a store broadcast to the counters; may end the run
    pub fn observe(&mut self, change: &StateChange) {
        let won = self.points.observe(change);
        let out = self.lives.observe(change);
        if out {
            self.game_over(GameOverReason::OutOfLives);
        } else if won {
            self.game_over(GameOverReason::Won);
        }
    }

    /// End the run; later calls are ignored
    pub fn game_over(&mut self, reason: GameOverReason) {
        if self.phase == GamePhase::Ended {
            return;
        }
        self.phase = GamePhase::Ended;
        log::info!("Game over: {:?}", reason);
        self.events.emit(GameEvent::GameOver { reason });
    }

    /// Speed up (>1) or slow down (<1) simulated time against wall time
    pub fn set_time_scale(&mut self, scale: f64) -> Result<(), GameLoopError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(GameLoopError::InvalidTimeScale(scale));
        }
        self.time_scale = scale;
        Ok(())
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn tick_no(&self) -> u64 {
        self.tick_no
    }

    pub fn time_passed(&self) -> f64 {
        self.time_passed
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Last store state observed
    pub fn scoreboard(&self) -> Scoreboard {
        Scoreboard::new(self.points.score(), self.lives.lives())
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;
    use proptest::prelude::*;

    use super::*;
    use crate::clock::testing::ManualClock;
    use crate::events::GameAction;
    use crate::sim::fruit::{Fruit, FruitKind};
    use crate::store::ScoreStore;

    fn quiet_loop(clock: ManualClock) -> GameLoop {
        GameLoop::with_clock(
            LevelConfig::default(),
            Scoreboard::default(),
            |_: GameAction| {},
            clock,
        )
    }

    /// Drive `update_tick(now)` until the carried backlog is gone
    fn flush(game: &mut GameLoop, now: f64) {
        while game.update_tick(now).unwrap() > 0.0 {}
    }

    fn game_overs(rx: &Receiver<GameEvent>) -> usize {
        rx.try_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }

    #[test]
    fn test_ticks_ignored_until_started() {
        let mut game = quiet_loop(ManualClock::new());
        assert_eq!(game.phase(), GamePhase::Initialized);
        assert_eq!(game.update_tick(1_000.0).unwrap(), 0.0);
        assert_eq!(game.tick_no(), 0);
    }

    #[test]
    fn test_start_only_once() {
        let mut game = quiet_loop(ManualClock::new());
        let rx = game.subscribe();
        game.start_at(0.0).unwrap();
        assert_eq!(rx.try_recv(), Ok(GameEvent::Started));

        assert!(matches!(
            game.start_at(5.0),
            Err(GameLoopError::AlreadyStarted(GamePhase::Playing))
        ));
    }

    #[test]
    fn test_start_uses_clock_anchor() {
        let clock = ManualClock::new();
        clock.set(1_000.0);
        let mut game = quiet_loop(clock.clone());
        game.start().unwrap();

        clock.set(1_000.0 + TICK_DURATION_MS * 3.0);
        assert_eq!(game.update().unwrap(), TICK_DURATION_MS * 3.0);
        assert_eq!(game.tick_no(), 3);
    }

    #[test]
    fn test_remainder_carries_over() {
        let mut game = quiet_loop(ManualClock::new());
        game.start_at(0.0).unwrap();

        assert_eq!(game.update_tick(10.0).unwrap(), 0.0);
        assert_eq!(game.update_tick(20.0).unwrap(), TICK_DURATION_MS);
        assert_eq!(game.update_tick(30.0).unwrap(), 0.0);
        assert_eq!(game.update_tick(32.0).unwrap(), TICK_DURATION_MS);
        assert_eq!(game.time_passed(), 32.0);
    }

    #[test]
    fn test_tick_notifications_in_order() {
        let mut game = quiet_loop(ManualClock::new());
        let rx = game.subscribe();
        game.start_at(0.0).unwrap();
        game.update_tick(TICK_DURATION_MS * 4.0).unwrap();

        let seqs: Vec<u64> = rx
            .try_iter()
            .filter_map(|e| match e {
                GameEvent::Tick { seq, duration_ms } => {
                    assert_eq!(duration_ms, TICK_DURATION_MS);
                    Some(seq)
                }
                _ => None,
            })
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_time_scale() {
        let mut game = quiet_loop(ManualClock::new());
        game.start_at(0.0).unwrap();
        game.set_time_scale(2.0).unwrap();

        // Twice as many fixed ticks for the same wall time
        assert_eq!(game.update_tick(160.0).unwrap(), 320.0);
        assert_eq!(game.tick_no(), 20);

        assert!(game.set_time_scale(0.0).is_err());
        assert!(game.set_time_scale(f64::NAN).is_err());
        assert_eq!(game.time_scale(), 2.0);
    }

    #[test]
    fn test_clock_going_backwards_is_ignored() {
        let mut game = quiet_loop(ManualClock::new());
        game.start_at(1_000.0).unwrap();
        assert_eq!(game.update_tick(900.0).unwrap(), 0.0);
        assert_eq!(game.tick_no(), 0);
    }

    #[test]
    fn test_slow_burst_stops_at_tick_cap() {
        // Every clock read costs 600 ms, so the budget is spent at the first check
        let mut game = quiet_loop(ManualClock::stepping(600.0));
        game.start_at(0.0).unwrap();

        let owed = 625.0;
        let advanced = game.update_tick(owed * TICK_DURATION_MS).unwrap();
        assert_eq!(advanced, MAX_TICKS_PER_UPDATE as f64 * TICK_DURATION_MS);

        // The deficit is still owed to the next call
        let advanced = game.update_tick(owed * TICK_DURATION_MS).unwrap();
        assert_eq!(advanced, MAX_TICKS_PER_UPDATE as f64 * TICK_DURATION_MS);
        assert_eq!(game.tick_no(), 2 * MAX_TICKS_PER_UPDATE as u64);
    }

    #[test]
    fn test_fast_burst_catches_up_to_cap() {
        let mut game = quiet_loop(ManualClock::new());
        game.start_at(0.0).unwrap();

        let advanced = game.update_tick(625.0 * TICK_DURATION_MS).unwrap();
        assert_eq!(advanced, 575.0 * TICK_DURATION_MS);

        let advanced = game.update_tick(625.0 * TICK_DURATION_MS).unwrap();
        assert_eq!(advanced, 50.0 * TICK_DURATION_MS);
        assert_eq!(game.time_passed(), 625.0 * TICK_DURATION_MS);
    }

    #[test]
    fn test_game_over_stops_ticking() {
        let mut game = quiet_loop(ManualClock::new());
        let rx = game.subscribe();
        game.start_at(0.0).unwrap();
        game.game_over(GameOverReason::Aborted);
        game.game_over(GameOverReason::Aborted);

        assert_eq!(game.phase(), GamePhase::Ended);
        assert_eq!(game.update_tick(1_000.0).unwrap(), 0.0);
        assert_eq!(game_overs(&rx), 1);
        assert!(game.start_at(0.0).is_err());
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            let mut game = quiet_loop(ManualClock::new());
            game.start_at(0.0).unwrap();
            let mut now = 0.0;
            for frame in 0..600 {
                game.level_mut()
                    .knight
                    .steer(if frame % 120 < 60 { 1 } else { -1 }, 0);
                now += 16.7;
                game.update_tick(now).unwrap();
            }
            (game.level().knight.clone(), game.level().fruits().to_vec())
        };
        assert_eq!(run(), run());
    }

    /// Three fruit hit the floor on consecutive ticks; the store takes a life
    /// for each and the third broadcast ends the run.
    #[test]
    fn test_running_out_of_lives_ends_once() {
        let (tx, actions) = unbounded();
        let dispatch = move |action: GameAction| {
            let _ = tx.send(action);
        };
        let initial = Scoreboard::new(0, 3);
        let mut store = ScoreStore::new(initial);
        let mut game =
            GameLoop::with_clock(LevelConfig::default(), initial, dispatch, ManualClock::new());
        let rx = game.subscribe();

        for (id, z) in [(900, 0.1), (901, 0.2), (902, 0.3)] {
            let fruit = Fruit::with_position(id, FruitKind::Avocado, 10.0, 0.0, z);
            game.level_mut().push_fruit(fruit);
        }
        game.start_at(0.0).unwrap();

        for tick in 1..=3 {
            game.update_tick(tick as f64 * TICK_DURATION_MS).unwrap();
            let taken: Vec<_> = actions.try_iter().collect();
            assert_eq!(taken, vec![GameAction::TakeLife]);

            for change in store.apply_all(taken) {
                game.observe(&change);
            }
            if tick < 3 {
                assert_eq!(game.phase(), GamePhase::Playing);
            }
        }

        assert_eq!(store.state().lives, 0);
        assert_eq!(game.scoreboard().lives, 0);
        assert_eq!(game.phase(), GamePhase::Ended);
        assert_eq!(game_overs(&rx), 1);

        // Further broadcasts do not end the run again
        let change = store.apply(GameAction::TakeLife);
        game.observe(&change);
        assert_eq!(game_overs(&rx), 0);
    }

    #[test]
    fn test_registered_broadcast_is_drained_on_update() {
        let (tx, actions) = unbounded();
        let dispatch = move |action: GameAction| {
            let _ = tx.send(action);
        };
        let initial = Scoreboard::new(0, 3);
        let mut store = ScoreStore::new(initial);
        let mut game =
            GameLoop::with_clock(LevelConfig::default(), initial, dispatch, ManualClock::new())
                .with_broadcast(store.subscribe());
        let rx = game.subscribe();

        for z in [0.1, 0.2, 0.3] {
            let fruit = Fruit::with_position(0, FruitKind::Onion, 10.0, 0.0, z);
            game.level_mut().push_fruit(fruit);
        }
        game.start_at(0.0).unwrap();

        for tick in 1..=3 {
            game.update_tick(tick as f64 * TICK_DURATION_MS).unwrap();
            store.apply_all(actions.try_iter());
        }
        assert_eq!(store.state().lives, 0);
        // The last broadcast is still queued
        assert_eq!(game.phase(), GamePhase::Playing);

        assert_eq!(game.update_tick(4.0 * TICK_DURATION_MS).unwrap(), 0.0);
        assert_eq!(game.phase(), GamePhase::Ended);
        assert_eq!(game.tick_no(), 3);
        assert_eq!(game.scoreboard(), Scoreboard::new(0, 0));
        assert_eq!(game_overs(&rx), 1);
    }

    /// Five catches of 50 points; only the broadcast reaching 250 wins.
    #[test]
    fn test_reaching_win_score_ends_run() {
        let (tx, actions) = unbounded();
        let dispatch = move |action: GameAction| {
            let _ = tx.send(action);
        };
        let initial = Scoreboard::new(0, 3);
        let mut store = ScoreStore::new(initial);
        let mut game =
            GameLoop::with_clock(LevelConfig::default(), initial, dispatch, ManualClock::new());
        let rx = game.subscribe();
        game.start_at(0.0).unwrap();

        for catch in 1..=5u32 {
            let knight = game.level().knight.pos;
            let fruit =
                Fruit::with_position(1_000 + catch, FruitKind::Cookie, knight.x, knight.y, 1.0);
            game.level_mut().push_fruit(fruit);

            game.update_tick(catch as f64 * TICK_DURATION_MS).unwrap();
            let scored: Vec<_> = actions.try_iter().collect();
            assert_eq!(
                scored,
                vec![GameAction::AddScore {
                    points: POINTS_PER_FRUIT
                }]
            );

            for change in store.apply_all(scored) {
                game.observe(&change);
            }
            if catch < 5 {
                assert_eq!(
                    game.phase(),
                    GamePhase::Playing,
                    "ended at {}",
                    store.state().score
                );
            }
        }

        assert_eq!(store.state().score, WIN_SCORE);
        assert_eq!(game.phase(), GamePhase::Ended);
        let reasons: Vec<_> = rx
            .try_iter()
            .filter_map(|e| match e {
                GameEvent::GameOver { reason } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(reasons, vec![GameOverReason::Won]);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_frame_split_does_not_change_sim_time(
            frames in prop::collection::vec(0u32..120, 1..80),
        ) {
            let total: f64 = frames.iter().map(|&f| f as f64).sum();

            let mut one = quiet_loop(ManualClock::new());
            one.start_at(0.0).unwrap();
            one.update_tick(total).unwrap();
            flush(&mut one, total);

            let mut many = quiet_loop(ManualClock::new());
            many.start_at(0.0).unwrap();
            let mut now = 0.0;
            for &frame in &frames {
                now += frame as f64;
                many.update_tick(now).unwrap();
            }
            flush(&mut many, now);

            prop_assert!((one.time_passed() - many.time_passed()).abs() <= TICK_DURATION_MS);
            for game in [&one, &many] {
                prop_assert_eq!(game.time_passed(), game.tick_no() as f64 * TICK_DURATION_MS);
                prop_assert_eq!(game.time_passed() + game.time_rest, total);
            }
            prop_assert!(one.time_passed() <= total);
            prop_assert!(total - one.time_passed() < TICK_DURATION_MS);
        }

        #[test]
        fn prop_budget_caps_burst(owed in 1u64..3_000, slow in any::<bool>()) {
            // A slow clock spends the whole wall budget between two reads
            let step = if slow { MAX_PROCESS_TIME_MS + 100.0 } else { 0.0 };
            let mut game = quiet_loop(ManualClock::stepping(step));
            game.start_at(0.0).unwrap();

            let advanced = game.update_tick(owed as f64 * TICK_DURATION_MS).unwrap();
            let ticks = (advanced / TICK_DURATION_MS) as u64;
            let cap = MAX_TICKS_PER_UPDATE as u64;

            // Whatever was not run is still owed
            prop_assert_eq!(ticks, game.tick_no());
            prop_assert_eq!(game.time_rest, (owed - ticks) as f64 * TICK_DURATION_MS);

            prop_assert!(ticks <= owed);
            if owed <= cap {
                prop_assert_eq!(ticks, owed);
            } else if slow {
                prop_assert_eq!(ticks, cap);
            } else {
                // Past the cap only while more than `cap` ticks are still owed
                prop_assert!(ticks >= cap);
                prop_assert!(owed - ticks <= cap);
            }
        }
    }
}
