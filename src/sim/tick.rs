//! Fixed timestep simulation tick
//!
//! One tick advances every entity, resolves collisions pair by pair, applies what the
//! collisions asked for (game over, new entities), reaps the dead and checks for a win.

use super::collision::{self, CollisionContext};
use super::entity::Shape;
use super::state::{GamePhase, Manager, World};
use super::{ball, droplet};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Target paddle x (from mouse/touch position)
    pub paddle_x: Option<f64>,
    /// Launch ball (click/tap/space)
    pub launch: bool,
    /// Idle/demo mode - autopilot plays the game
    pub idle_mode: bool,
}

/// Apply one frame of input, then advance the simulation by one tick
pub fn tick(manager: &mut Manager, input: &TickInput) {
    let mut input = input.clone();
    if input.idle_mode {
        autopilot(manager, &mut input);
    }

    // Play is frozen, but rings and afterglows still run out
    if manager.phase.is_terminal() {
        manager.update_visuals();
        return;
    }

    match input.paddle_x {
        Some(x) => manager.move_paddle(x),
        // Keep the resting ball pinned in case something nudged it
        None if manager.phase == GamePhase::Standby => {
            if let Some(x) = manager.racket().map(|r| r.x) {
                manager.move_paddle(x);
            }
        }
        None => {}
    }
    if input.launch {
        manager.launch();
    }

    manager.simulate();
    manager.update_visuals();
}

/// Launch on serve and follow the ball, swaying a little off center so it does not
/// bounce straight up forever
fn autopilot(manager: &Manager, input: &mut TickInput) {
    if manager.phase == GamePhase::Standby {
        input.launch = true;
    }
    let (Some(ball), Some(racket)) = (manager.ball(), manager.racket()) else {
        return;
    };
    let sway = (manager.time_ticks as f64 * 0.07).sin() * racket.half_width * 0.5;
    input.paddle_x = Some(ball.position().x + sway);
}

impl Manager {
    /// Run one simulation step
    pub fn simulate(&mut self) {
        self.time_ticks += 1;
        self.advance();

        let World {
            fixed,
            movable,
            rng,
            ..
        } = &mut self.world;
        let mut ctx = CollisionContext::new(&self.registry, rng);

        // Movable pairs, each once
        for i in 0..movable.len() {
            let (head, tail) = movable.split_at_mut(i + 1);
            let this = &mut head[i];
            for other in tail.iter_mut() {
                if !this.is_alive() {
                    break;
                }
                if other.is_alive() {
                    collision::dispatch(this, other, &mut ctx);
                }
            }
        }

        // Movable against fixed
        for this in movable.iter_mut() {
            for other in fixed.iter_mut() {
                if !this.is_alive() {
                    break;
                }
                collision::dispatch(this, other, &mut ctx);
            }
        }

        let CollisionContext {
            spawned, game_over, ..
        } = ctx;

        if game_over {
            log::info!("Game over after {} ticks", self.time_ticks);
            self.phase = GamePhase::GameOver;
        }
        for proto in spawned {
            self.world.attach(proto);
        }
        self.world.reap();

        if self.phase == GamePhase::Playing && self.is_cleared() {
            log::info!("Level cleared after {} ticks", self.time_ticks);
            self.phase = GamePhase::GameClear;
            self.world.remove_ball();
        }
    }

    /// Per-kind motion for every entity, fixed first
    fn advance(&mut self) {
        for entity in &mut self.world.fixed {
            entity.roll_collisions();
        }
        for entity in &mut self.world.movable {
            entity.roll_collisions();
            match &mut entity.shape {
                Shape::Ball(state) => ball::advance(&mut entity.body, state),
                Shape::Droplet(_) | Shape::Splitter(_) => droplet::advance(&mut entity.body),
                _ => {}
            }
            entity.body.translate();
        }
    }
}
