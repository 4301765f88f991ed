//! Rectangular playfield walls

use super::collision::collide_with_line;
use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::Vector2;
use crate::consts::COORD_MAX;
use crate::error::ConfigError;
use crate::level::{FieldConfig, ranged};

pub const NAME: &str = "Field";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Field {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: x,
            right: x + width,
            top: y,
            bottom: y + height,
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Walls as (inward normal, penetration of `body`), bottom last
    fn walls(&self, body: &Body) -> [(Vector2, f64); 4] {
        let p = body.position;
        let r = body.radius;
        [
            (Vector2::new(1.0, 0.0), r + self.left - p.x),
            (Vector2::new(-1.0, 0.0), r - self.right + p.x),
            (Vector2::new(0.0, 1.0), r + self.top - p.y),
            (Vector2::new(0.0, -1.0), r - self.bottom + p.y),
        ]
    }
}

pub fn load(reg: &mut ClassRegistry, config: &FieldConfig) -> Result<Prototype, ConfigError> {
    let x = ranged(NAME, "x", config.x, 0.0, COORD_MAX)?;
    let y = ranged(NAME, "y", config.y, 0.0, COORD_MAX)?;
    let width = ranged(NAME, "width", config.width, 0.0, COORD_MAX)?;
    let height = ranged(NAME, "height", config.height, 0.0, COORD_MAX)?;
    let field = Field::new(x, y, width, height);
    Ok(Prototype {
        name: NAME.to_string(),
        kind: kinds::ensure_field(reg),
        movable: false,
        body: Body::circle(Vector2::new(x + width / 2.0, y + height / 2.0), 0.0),
        shape: Shape::Field(field),
        image: config.image.clone(),
    })
}

fn collide_with_walls(this: &Entity, other: &mut Entity, walls: usize) -> bool {
    let Shape::Field(field) = &this.shape else {
        log::error!("field rule on non-field '{}'", this.name());
        return false;
    };
    let mut hit = false;
    for (norm, distance) in field.walls(&other.body).into_iter().take(walls) {
        hit |= collide_with_line(&mut other.body, norm, distance);
    }
    hit
}

/// All four walls
pub fn collide_with_globule(this: &mut Entity, other: &mut Entity) -> bool {
    collide_with_walls(this, other, 4)
}

/// The ball leaves through the bottom, so only left, right and top stop it
pub fn collide_with_ball(this: &mut Entity, other: &mut Entity) -> bool {
    collide_with_walls(this, other, 3)
}
