//! Fruit Knight headless runner
//!
//! Plays one level with the autopilot at a simulated 60 fps and reports the
//! outcome. Usage: `fruit-knight [seed] [level.json]`

use crossbeam_channel::unbounded;

use fruit_knight::events::{GameAction, GameEvent, Scoreboard};
use fruit_knight::sim::{GameLoop, GamePhase};
use fruit_knight::steering::Autopilot;
use fruit_knight::{LevelConfig, ScoreStore};

/// Simulated frame interval (ms)
const FRAME_MS: f64 = 1000.0 / 60.0;
/// Give up after this much simulated time (ms)
const MAX_RUN_MS: f64 = 10.0 * 60.0 * 1000.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse::<u64>()?,
        None => 12345,
    };
    let mut config = match args.next() {
        Some(path) => LevelConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => LevelConfig::default(),
    };
    config.seed = seed;
    log::info!("Fruit Knight (headless) starting with seed {}", seed);

    let initial = Scoreboard::default();
    let mut store = ScoreStore::new(initial);
    let (tx, actions) = unbounded::<GameAction>();
    let mut game = GameLoop::new(config, initial, move |action: GameAction| {
        let _ = tx.send(action);
    })
    .with_broadcast(store.subscribe());
    let events = game.subscribe();

    game.start_at(0.0)?;
    let mut now = 0.0;
    let (mut spawned, mut collected, mut dropped) = (0u32, 0u32, 0u32);
    let mut outcome = None;

    while game.phase() == GamePhase::Playing && now < MAX_RUN_MS {
        Autopilot.steer(game.level_mut());

        now += FRAME_MS;
        game.update_tick(now)?;
        store.apply_all(actions.try_iter());
        game.poll_broadcasts();
        for event in events.try_iter() {
            match event {
                GameEvent::FruitSpawned(_) => spawned += 1,
                GameEvent::FruitCollected(_) => collected += 1,
                GameEvent::FruitDropped(_) => dropped += 1,
                GameEvent::GameOver { reason } => outcome = Some(reason),
                _ => {}
            }
        }
    }

    let state = store.state();
    println!(
        "outcome: {:?} after {:.1}s simulated ({} ticks)",
        outcome,
        game.time_passed() / 1000.0,
        game.tick_no()
    );
    println!(
        "fruit: {} spawned, {} collected, {} dropped; score {}, lives {}",
        spawned, collected, dropped, state.score, state.lives
    );
    Ok(())
}
