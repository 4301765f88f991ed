//! Droplets: grouped bodies that merge with their own group

use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::{collide_globules, weight_fractions};
use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, approx_ge};
use crate::consts::{
    COORD_MAX, DROPLET_EFFECT_RADIUS, DROPLET_EFFECT_TICKS, DROPLET_INIT_SPEED_MAX,
    DROPLET_VISCOSITY,
};
use crate::error::ConfigError;
use crate::level::{Color, ObjectConfig};

#[derive(Debug, Clone)]
pub struct Droplet {
    pub group: u8,
    pub bg_color: Color,
    pub line_color: Color,
    pub effect_color: Color,
    /// Merge ring step, `None` when idle
    effect: Option<u32>,
}

impl Droplet {
    pub fn new(group: u8) -> Self {
        Self {
            group,
            bg_color: Color::default(),
            line_color: Color::default(),
            effect_color: Color::default(),
            effect: None,
        }
    }

    /// Restart the merge ring
    pub fn start_effect(&mut self) {
        self.effect = Some(0);
    }

    pub fn is_effect_active(&self) -> bool {
        self.effect.is_some()
    }

    /// Merge ring progress in [0, 1], `None` when idle
    pub fn effect_progress(&self) -> Option<f64> {
        self.effect
            .map(|step| step as f64 / DROPLET_EFFECT_TICKS as f64)
    }

    /// Radius of the merge ring around a droplet of radius `radius`
    pub fn effect_radius(&self, radius: f64) -> Option<f64> {
        self.effect_progress()
            .map(|progress| radius + DROPLET_EFFECT_RADIUS * progress)
    }

    /// Step the merge ring; it shows `DROPLET_EFFECT_TICKS + 1` frames then goes idle
    pub fn update_effect(&mut self) {
        self.effect = match self.effect {
            Some(step) if step < DROPLET_EFFECT_TICKS => Some(step + 1),
            _ => None,
        };
    }
}

/// Build the droplet payload and body shared by droplets, splitters and splitter parts
pub fn load_parts(
    config: &ObjectConfig,
    rng: &mut Pcg32,
) -> Result<(Body, Droplet), ConfigError> {
    let x = config.number("x", config.x, 0.0, COORD_MAX)?;
    let y = config.number("y", config.y, 0.0, COORD_MAX)?;
    let radius = config.number("radius", config.radius, 0.0, COORD_MAX)?;
    let restitution = config.number("restitution", config.restitution, 0.0, 1.0)?;
    let group = config.number("group", config.group, 0.0, 255.0)?;

    let mut body = Body::globule(Vector2::new(x, y), radius, restitution);
    if let Some(weight) = config.optional_number("weight", config.weight, 0.0, COORD_MAX)? {
        body.weight = weight;
    }
    let vx = config.optional_number("vx", config.vx, -255.0, 255.0)?;
    let vy = config.optional_number("vy", config.vy, -255.0, 255.0)?;
    body.velocity = match (vx, vy) {
        (Some(vx), Some(vy)) => Vector2::new(vx, vy),
        _ => random_velocity(rng),
    };

    let mut droplet = Droplet::new(group as u8);
    droplet.bg_color = config.bg_color.unwrap_or_default();
    droplet.line_color = config.line_color.unwrap_or_default();
    droplet.effect_color = config.effect_color.unwrap_or_default();
    Ok((body, droplet))
}

pub fn load(
    reg: &mut ClassRegistry,
    config: &ObjectConfig,
    rng: &mut Pcg32,
) -> Result<Prototype, ConfigError> {
    let (body, droplet) = load_parts(config, rng)?;
    Ok(Prototype {
        name: config.name.clone(),
        kind: kinds::ensure_droplet(reg),
        movable: true,
        body,
        shape: Shape::Droplet(droplet),
        image: config.image.clone(),
    })
}

/// Uniform in [-max, max]² with max = `DROPLET_INIT_SPEED_MAX`
pub fn random_velocity(rng: &mut Pcg32) -> Vector2 {
    let max = DROPLET_INIT_SPEED_MAX;
    Vector2::new(rng.random_range(-max..=max), rng.random_range(-max..=max))
}

/// `norm` scaled by a speed uniform in [0, max)
pub fn random_outward_velocity(rng: &mut Pcg32, norm: Vector2) -> Vector2 {
    norm * rng.random_range(0.0..DROPLET_INIT_SPEED_MAX)
}

/// Viscous damping proportional to radius
pub fn advance(body: &mut Body) {
    let mut k = DROPLET_VISCOSITY * body.radius;
    if k > 1.0 {
        log::warn!(
            "Viscous damping exceeds 1.0 (k = {}, radius = {})",
            k,
            body.radius
        );
        k = 1.0;
    }
    body.velocity -= body.velocity * k;
}

/// Same group: `this` absorbs `other`. Different groups: generic collision.
pub fn collide_with_droplet(this: &mut Entity, other: &mut Entity) -> bool {
    let (Some(a), Some(b)) = (this.shape.droplet(), other.shape.droplet()) else {
        log::error!(
            "droplet rule on non-droplet '{}' <=> '{}'",
            this.name(),
            other.name()
        );
        return false;
    };
    if a.group != b.group {
        return collide_globules(this, other);
    }
    if !approx_ge(this.body.distance_to(&other.body), 0.0) {
        return false;
    }

    merge(&mut this.body, &other.body);
    if let Some(droplet) = this.shape.droplet_mut() {
        droplet.start_effect();
    }
    other.kill();
    log::debug!("'{}' absorbed '{}'", this.name(), other.name());
    true
}

/// Mass-weighted average of position and velocity, area-preserving radius
pub fn merge(into: &mut Body, from: &Body) {
    let sum = into.weight + from.weight;
    let (wa, wb) = weight_fractions(into, from);
    into.position = into.position * wa + from.position * wb;
    into.velocity = into.velocity * wa + from.velocity * wb;
    into.radius = (into.radius * into.radius + from.radius * from.radius).sqrt();
    into.weight = sum;
}
