//! Droplet Collection headless runner
//!
//! Loads a level (path argument, or the built-in demo), lets the autopilot play it and
//! reports how the game ended.

#[cfg(not(target_arch = "wasm32"))]
use droplet_collection::{GamePhase, LevelConfig, Manager, TickInput, tick};

/// Give up after this many ticks (about five minutes at 60 Hz)
#[cfg(not(target_arch = "wasm32"))]
const MAX_TICKS: u64 = 60 * 60 * 5;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Droplet Collection (headless) starting...");

    if let Err(e) = run(std::env::args().nth(1)) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The web shell drives the library directly
}

#[cfg(not(target_arch = "wasm32"))]
fn run(path: Option<String>) -> Result<(), droplet_collection::ConfigError> {
    let level = match path {
        Some(path) => LevelConfig::load(path)?,
        None => {
            log::info!("No level given, playing the demo level");
            LevelConfig::demo()
        }
    };
    let mut manager = Manager::new(level)?;

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    while !manager.phase().is_terminal() && manager.time_ticks() < MAX_TICKS {
        tick(&mut manager, &input);
        if manager.time_ticks() % 600 == 0 {
            log::debug!(
                "tick {}: {} movable, phase {:?}",
                manager.time_ticks(),
                manager.movable().len(),
                manager.phase()
            );
        }
    }

    match manager.phase() {
        GamePhase::GameClear => log::info!("Level cleared in {} ticks", manager.time_ticks()),
        GamePhase::GameOver => log::info!("Ball lost after {} ticks", manager.time_ticks()),
        phase => log::warn!(
            "Stopped after {} ticks still in {:?}",
            manager.time_ticks(),
            phase
        ),
    }
    Ok(())
}
