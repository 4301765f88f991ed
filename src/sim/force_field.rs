//! Radial force fields

use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, Vector2Ext, approx_ge};
use crate::consts::COORD_MAX;
use crate::error::ConfigError;
use crate::level::ObjectConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceField {
    pub force: f64,
}

pub fn load(reg: &mut ClassRegistry, config: &ObjectConfig) -> Result<Prototype, ConfigError> {
    let x = config.number("x", config.x, 0.0, COORD_MAX)?;
    let y = config.number("y", config.y, 0.0, COORD_MAX)?;
    let radius = config.number("radius", config.radius, 0.0, COORD_MAX)?;
    let force = config.number("force", config.force, 0.0, 255.0)?;
    Ok(Prototype {
        name: config.name.clone(),
        kind: kinds::ensure_force_field(reg),
        movable: false,
        body: Body::circle(Vector2::new(x, y), radius),
        shape: Shape::ForceField(ForceField { force }),
        image: config.image.clone(),
    })
}

/// Push an overlapping body outward, harder the deeper it is. Never counts as contact.
pub fn collide_with_globule(this: &mut Entity, other: &mut Entity) -> bool {
    let Shape::ForceField(field) = &this.shape else {
        log::error!("force field rule on non-force-field '{}'", this.name());
        return false;
    };
    let distance = this.body.distance_to(&other.body);
    if approx_ge(distance, 0.0) {
        let norm = (other.body.position - this.body.position).unit();
        let ratio = distance / (this.body.radius + other.body.radius);
        other.body.velocity += norm * (field.force * ratio * ratio);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::ObjectIdPool;

    fn setup() -> (Entity, Entity) {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let config = ObjectConfig {
            x: Some(0.0),
            y: Some(0.0),
            radius: Some(30.0),
            force: Some(2.0),
            ..ObjectConfig::named("fountain", Some("ForceField"))
        };
        let field = Entity::new(pool.acquire("fountain"), load(&mut reg, &config).unwrap());
        let mut body_proto = load(&mut reg, &config).unwrap();
        body_proto.shape = Shape::Globule;
        body_proto.movable = true;
        body_proto.body = Body::globule(Vector2::new(0.0, 20.0), 10.0, 1.0);
        let body = Entity::new(pool.acquire("body"), body_proto);
        (field, body)
    }

    #[test]
    fn test_push_scales_with_depth_squared() {
        let (mut field, mut body) = setup();
        // Depth 20 of a possible 40: ratio 0.5, push 2 * 0.25
        assert!(!collide_with_globule(&mut field, &mut body));
        assert!((body.velocity() - Vector2::new(0.0, 0.5)).length() < 1e-12);
    }

    #[test]
    fn test_outside_is_untouched() {
        let (mut field, mut body) = setup();
        body.body.position = Vector2::new(0.0, 41.0);
        assert!(!collide_with_globule(&mut field, &mut body));
        assert_eq!(body.velocity(), Vector2::ZERO);
    }
}
