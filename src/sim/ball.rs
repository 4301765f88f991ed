//! The player's ball

use super::collision::{decompose_velocities, inelastic_collision, separate};
use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, Vector2Ext, approx_ge};
use crate::consts::{BALL_MIN_VY, BALL_SPEED_PERIOD, COORD_MAX};
use crate::error::ConfigError;
use crate::level::{BallConfig, ranged};

pub const NAME: &str = "Ball";

#[derive(Debug, Clone)]
pub struct Ball {
    /// Configured speed the velocity is periodically renormalized to
    pub speed: f64,
    ticks: u32,
}

impl Ball {
    pub fn new(speed: f64) -> Self {
        Self { speed, ticks: 0 }
    }
}

pub fn load(reg: &mut ClassRegistry, config: &BallConfig) -> Result<Prototype, ConfigError> {
    let radius = ranged(NAME, "radius", config.radius, 0.0, COORD_MAX)?;
    let speed = ranged(NAME, "speed", config.speed, 0.0, COORD_MAX)?;
    let mut body = Body::globule(Vector2::ZERO, radius, 1.0);
    if let Some(weight) = config.weight {
        body.weight = ranged(NAME, "weight", weight, 0.0, COORD_MAX)?;
    }
    Ok(Prototype {
        name: NAME.to_string(),
        kind: kinds::ensure_ball(reg),
        movable: true,
        body,
        shape: Shape::Ball(Ball::new(speed)),
        image: config.image.clone(),
    })
}

/// Send the ball straight up at its configured speed
pub fn launch(body: &mut Body, ball: &Ball) {
    body.velocity = Vector2::new(0.0, -ball.speed);
}

/// Renormalize speed every `BALL_SPEED_PERIOD` ticks
pub fn advance(body: &mut Body, ball: &mut Ball) {
    ball.ticks += 1;
    if ball.ticks == BALL_SPEED_PERIOD {
        if !body.velocity.is_near_zero() {
            body.velocity = body.velocity.with_length(ball.speed);
        }
        ball.ticks = 0;
    }
}

/// Ball against a moving body
///
/// The other body gets the generic inelastic response. The ball itself always leaves
/// the contact outward and never with less than `BALL_MIN_VY` vertical speed.
pub fn collide_with_globule(this: &mut Entity, other: &mut Entity) -> bool {
    let distance = this.body.distance_to(&other.body);
    if !approx_ge(distance, 0.0) {
        return false;
    }

    let (norm, mut va, mut vb) = decompose_velocities(&this.body, &other.body);
    if !this.collided_last_tick(other) {
        let incoming = va.x;
        inelastic_collision(&this.body, &other.body, &mut va, &mut vb);
        va.x = incoming.abs();
    } else {
        separate(&this.body, &other.body, distance, &mut va, &mut vb);
    }
    this.body.velocity = norm.compose(va);
    other.body.velocity = norm.compose(vb);
    clamp_vertical_speed(&mut this.body);
    true
}

/// Keep |vy| >= `BALL_MIN_VY` so the ball always comes back down
pub fn clamp_vertical_speed(body: &mut Body) {
    let vy = body.velocity.y;
    if vy.abs() < BALL_MIN_VY {
        body.velocity.y = if vy > 0.0 { BALL_MIN_VY } else { -BALL_MIN_VY };
        log::debug!("Raised ball vertical speed from {} to {}", vy, body.velocity.y);
    }
}
