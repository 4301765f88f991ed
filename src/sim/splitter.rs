//! Splitters: droplets that burst into their parts when the ball hits them
//!
//! A splitter carries its parts as prototypes laid out evenly around a random bearing.
//! The parts stay private to the splitter until the ball releases them. Once the
//! splitter has merged with a droplet of its own group it loses this ability and behaves
//! like a plain droplet.

use std::f64::consts::{PI, TAU};

use rand::Rng;
use rand_pcg::Pcg32;

use super::ball;
use super::collision::{CollisionContext, decompose_velocities};
use super::droplet::{self, Droplet};
use super::entity::{Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, Vector2Ext, approx_ge};
use crate::error::ConfigError;
use crate::level::{LevelConfig, ObjectConfig};

/// A part waiting inside its splitter
#[derive(Debug, Clone)]
pub struct Fragment {
    /// Offset from the splitter center
    pub rel_pos: Vector2,
    pub proto: Prototype,
}

#[derive(Debug, Clone)]
pub struct Splitter {
    pub droplet: Droplet,
    /// Set after a same-group merge; disables splitting for good
    pub merged: bool,
    pub parts: Vec<Fragment>,
}

impl Splitter {
    pub fn is_armed(&self) -> bool {
        !self.merged
    }

    /// Where the parts are drawn while the splitter is still armed
    pub fn part_positions(&self, center: Vector2) -> Vec<Vector2> {
        if self.merged {
            return Vec::new();
        }
        self.parts.iter().map(|f| center + f.rel_pos).collect()
    }
}

pub fn load(
    reg: &mut ClassRegistry,
    level: &LevelConfig,
    config: &ObjectConfig,
    rng: &mut Pcg32,
) -> Result<Prototype, ConfigError> {
    let (body, droplet) = droplet::load_parts(config, rng)?;
    let kind = kinds::ensure_splitter(reg);

    let mut protos = Vec::with_capacity(config.parts.len());
    for part in &config.parts {
        let part_config = level.object(part).ok_or_else(|| ConfigError::UnknownPart {
            object: config.name.clone(),
            part: part.clone(),
        })?;
        log::debug!("Building '{}' as a part of splitter '{}'", part, config.name);
        protos.push(droplet::load(reg, part_config, rng)?);
    }

    Ok(Prototype {
        name: config.name.clone(),
        kind,
        movable: true,
        shape: Shape::Splitter(Splitter {
            droplet,
            merged: false,
            parts: layout(body.radius, protos, rng),
        }),
        body,
        image: config.image.clone(),
    })
}

/// Spread parts evenly around a random bearing, each touching the splitter rim from
/// inside and moving outward at a random speed
pub fn layout(radius: f64, protos: Vec<Prototype>, rng: &mut Pcg32) -> Vec<Fragment> {
    if protos.is_empty() {
        return Vec::new();
    }
    let step = TAU / protos.len() as f64;
    let mut norm = Vector2::from_polar(1.0, rng.random_range(-PI..PI));

    protos
        .into_iter()
        .map(|mut proto| {
            let rel_pos = norm * (radius - proto.body.radius);
            proto.body.velocity = droplet::random_outward_velocity(rng, norm);
            norm = norm.rotated(step);
            Fragment { rel_pos, proto }
        })
        .collect()
}

/// Armed splitter hit by the ball: bounce the ball and burst
pub fn collide_with_ball(
    this: &mut Entity,
    other: &mut Entity,
    ctx: &mut CollisionContext,
) -> bool {
    let Shape::Splitter(splitter) = &this.shape else {
        log::error!("splitter rule on non-splitter '{}'", this.name());
        return false;
    };
    if splitter.merged {
        return ball::collide_with_globule(other, this);
    }
    if !approx_ge(this.body.distance_to(&other.body), 0.0) {
        return false;
    }

    let (norm, _, mut vb) = decompose_velocities(&this.body, &other.body);
    vb.x = -vb.x;
    other.body.velocity = norm.compose(vb);

    let center = this.body.position;
    for fragment in &splitter.parts {
        let mut proto = fragment.proto.clone();
        proto.body.position = center + fragment.rel_pos;
        ctx.spawned.push(proto);
    }
    log::debug!(
        "Splitter '{}' released {} parts",
        this.name(),
        splitter.parts.len()
    );
    this.kill();
    true
}

/// Droplet merge rule; a same-group merge disarms the splitter
pub fn collide_with_droplet(this: &mut Entity, other: &mut Entity) -> bool {
    let same_group = match (this.shape.droplet(), other.shape.droplet()) {
        (Some(a), Some(b)) => a.group == b.group,
        _ => false,
    };
    let collided = droplet::collide_with_droplet(this, other);
    if collided && same_group {
        if let Shape::Splitter(splitter) = &mut this.shape {
            splitter.merged = true;
        }
    }
    collided
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::BallConfig;
    use crate::sim::entity::ObjectIdPool;
    use rand::SeedableRng;

    fn level() -> LevelConfig {
        let mut level = LevelConfig::demo();
        for obj in &mut level.objects {
            obj.vx = Some(0.0);
            obj.vy = Some(0.0);
        }
        level
    }

    fn build(reg: &mut ClassRegistry, pool: &mut ObjectIdPool, rng: &mut Pcg32) -> Entity {
        let level = level();
        let config = level.object("blue-splitter").unwrap();
        Entity::new(pool.acquire(&config.name), load(reg, &level, config, rng).unwrap())
    }

    fn ball_at(reg: &mut ClassRegistry, pool: &mut ObjectIdPool, position: Vector2) -> Entity {
        let config = BallConfig {
            radius: 8.0,
            speed: 5.0,
            weight: None,
            image: None,
        };
        let mut ball = Entity::new(pool.acquire("ball"), ball::load(reg, &config).unwrap());
        ball.body.position = position;
        ball.body.velocity = Vector2::new(0.0, -5.0);
        ball
    }

    #[test]
    fn test_parts_are_spread_evenly_inside_rim() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let entity = build(&mut reg, &mut pool, &mut rng);
        let Shape::Splitter(splitter) = &entity.shape else {
            panic!("not a splitter");
        };
        assert_eq!(splitter.parts.len(), 2);
        let (a, b) = (&splitter.parts[0], &splitter.parts[1]);
        assert!((a.rel_pos.length() - 12.0).abs() < 1e-9);
        assert!((a.rel_pos + b.rel_pos).length() < 1e-9);
        assert!(a.proto.body.velocity.dot(a.rel_pos) >= 0.0);
        assert_eq!(splitter.part_positions(entity.position()).len(), 2);
    }

    #[test]
    fn test_unknown_part_is_config_error() {
        let mut reg = ClassRegistry::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut level = level();
        let config = ObjectConfig {
            parts: vec!["nowhere".to_string()],
            ..level.object("blue-splitter").unwrap().clone()
        };
        level.objects.clear();
        assert!(matches!(
            load(&mut reg, &level, &config, &mut rng),
            Err(ConfigError::UnknownPart { .. })
        ));
    }

    #[test]
    fn test_ball_bursts_armed_splitter() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut splitter = build(&mut reg, &mut pool, &mut rng);
        let mut ball = ball_at(&mut reg, &mut pool, splitter.position() + Vector2::new(0.0, 27.0));

        let mut ctx = CollisionContext::new(&reg, &mut rng);
        assert!(collide_with_ball(&mut splitter, &mut ball, &mut ctx));
        assert!(!splitter.is_alive());
        assert_eq!(ctx.spawned.len(), 2);
        assert!((ball.velocity() - Vector2::new(0.0, 5.0)).length() < 1e-9);
        for proto in &ctx.spawned {
            let offset = proto.body.position - splitter.position();
            assert!((offset.length() - 12.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_merged_splitter_acts_like_droplet() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut splitter = build(&mut reg, &mut pool, &mut rng);

        let level = level();
        let mut blue = Entity::new(
            pool.acquire("blue-1"),
            droplet::load(&mut reg, level.object("blue-1").unwrap(), &mut rng).unwrap(),
        );
        blue.body.position = splitter.position() + Vector2::new(30.0, 0.0);
        assert!(collide_with_droplet(&mut splitter, &mut blue));
        assert!(!blue.is_alive());
        let Shape::Splitter(state) = &splitter.shape else {
            panic!("not a splitter");
        };
        assert!(!state.is_armed());
        assert!(state.part_positions(splitter.position()).is_empty());

        let mut ball = ball_at(&mut reg, &mut pool, splitter.position() + Vector2::new(0.0, 30.0));
        let mut ctx = CollisionContext::new(&reg, &mut rng);
        assert!(collide_with_ball(&mut splitter, &mut ball, &mut ctx));
        assert!(splitter.is_alive());
        assert!(ctx.spawned.is_empty());
        assert!(ball.velocity().y > 0.0);
    }
}
