//! The paddle

use std::f64::consts::FRAC_PI_2;

use super::collision::CollisionContext;
use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, Vector2Ext};
use crate::consts::{COORD_MAX, RACKET_CURVE_MAX, RACKET_MARGIN};
use crate::error::ConfigError;
use crate::level::{RacketConfig, ranged};

pub const NAME: &str = "Racket";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Racket {
    /// Center x
    pub x: f64,
    /// Top edge y
    pub y: f64,
    pub half_width: f64,
    /// Travel range of the center
    pub left: f64,
    pub right: f64,
}

impl Racket {
    /// Move the center, clamped to the travel range
    pub fn move_to(&mut self, x: f64) {
        self.x = x.clamp(self.left, self.right);
    }

    /// Horizontal reach of the hit test measured from the center
    pub fn reach(&self) -> f64 {
        self.half_width + RACKET_MARGIN
    }
}

pub fn load(reg: &mut ClassRegistry, config: &RacketConfig) -> Result<Prototype, ConfigError> {
    let x_min = ranged(NAME, "x_min", config.x_min, 0.0, COORD_MAX)?;
    let x_max = ranged(NAME, "x_max", config.x_max, 0.0, COORD_MAX)?;
    let y = ranged(NAME, "y", config.y, 0.0, COORD_MAX)?;
    let width = ranged(NAME, "width", config.width, 0.0, COORD_MAX)?;
    if x_max < x_min {
        return Err(ConfigError::InvalidRegion {
            reason: format!("x_max {} is less than x_min {}", x_max, x_min),
        });
    }
    let half_width = width / 2.0;
    let (left, right) = (x_min + half_width, x_max - half_width);
    if left > right {
        return Err(ConfigError::InvalidRegion {
            reason: format!(
                "paddle width {} does not fit between {} and {}",
                width, x_min, x_max
            ),
        });
    }

    let racket = Racket {
        x: (x_min + x_max) / 2.0,
        y,
        half_width,
        left,
        right,
    };
    Ok(Prototype {
        name: NAME.to_string(),
        kind: kinds::ensure_racket(reg),
        movable: false,
        body: Body::circle(Vector2::new(racket.x, racket.y), half_width),
        shape: Shape::Racket(racket),
        image: config.image.clone(),
    })
}

/// Ball reaching the paddle line
///
/// Within reach, the ball leaves at its configured speed, angled away from vertical in
/// proportion to how far off center it landed. Out of reach, it stops and the game is
/// over. Either way the contact is handled once, on the first tick the ball crosses.
pub fn collide_with_ball(
    this: &mut Entity,
    other: &mut Entity,
    ctx: &mut CollisionContext,
) -> bool {
    let Shape::Racket(racket) = &this.shape else {
        log::error!("racket rule on non-racket '{}'", this.name());
        return false;
    };
    let p = other.body.position;
    if racket.y - p.y >= other.body.radius {
        return false;
    }
    if this.collided_last_tick(other) {
        return true;
    }

    let offset = racket.x - p.x;
    let reach = racket.reach();
    if offset.abs() < reach {
        let speed = other
            .shape
            .ball()
            .map_or_else(|| other.body.velocity.length(), |ball| ball.speed);
        let arg = -FRAC_PI_2 - RACKET_CURVE_MAX * (offset / reach);
        other.body.velocity = Vector2::from_polar(speed, arg);
    } else {
        log::info!("Ball missed the paddle by {}", offset.abs() - reach);
        other.body.velocity = Vector2::ZERO;
        ctx.game_over = true;
    }
    true
}
