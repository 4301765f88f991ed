//! Flickers: bounce pads that kick bodies away at a fixed speed

use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, approx_ge};
use crate::consts::{COORD_MAX, FLICKER_EFFECT_MOTION, FLICKER_EFFECT_TICKS};
use crate::error::ConfigError;
use crate::level::ObjectConfig;

#[derive(Debug, Clone)]
pub struct Flicker {
    /// Speed given to bodies it kicks
    pub speed: f64,
    /// Afterglow step, `None` when idle
    effect: Option<u32>,
    /// Render offset while the afterglow runs
    jitter: Vector2,
}

impl Flicker {
    pub fn new(speed: f64) -> Self {
        Self {
            speed,
            effect: None,
            jitter: Vector2::ZERO,
        }
    }

    pub fn start_effect(&mut self) {
        self.effect = Some(0);
    }

    pub fn is_effect_active(&self) -> bool {
        self.effect.is_some()
    }

    pub fn jitter(&self) -> Vector2 {
        self.jitter
    }

    /// Pick a fresh jitter offset and step the afterglow
    pub fn update_effect(&mut self, rng: &mut Pcg32) {
        let Some(step) = self.effect else {
            self.jitter = Vector2::ZERO;
            return;
        };
        let m = FLICKER_EFFECT_MOTION;
        self.jitter = Vector2::new(rng.random_range(-m..=m), rng.random_range(-m..=m));
        self.effect = (step + 1 < FLICKER_EFFECT_TICKS).then_some(step + 1);
    }
}

pub fn load(reg: &mut ClassRegistry, config: &ObjectConfig) -> Result<Prototype, ConfigError> {
    let x = config.number("x", config.x, 0.0, COORD_MAX)?;
    let y = config.number("y", config.y, 0.0, COORD_MAX)?;
    let radius = config.number("radius", config.radius, 0.0, COORD_MAX)?;
    let speed = config.number("speed", config.speed, 1.0, 255.0)?;
    Ok(Prototype {
        name: config.name.clone(),
        kind: kinds::ensure_flicker(reg),
        movable: false,
        body: Body::circle(Vector2::new(x, y), radius),
        shape: Shape::Flicker(Flicker::new(speed)),
        image: config.image.clone(),
    })
}

fn kick(this: &mut Entity, other: &mut Entity, speed: impl FnOnce(&Flicker) -> f64) -> bool {
    if !approx_ge(this.body.distance_to(&other.body), 0.0) {
        return false;
    }
    if this.collided_last_tick(other) {
        return true;
    }
    let norm = this.body.norm_to(&other.body);
    let Shape::Flicker(flicker) = &mut this.shape else {
        log::error!("flicker rule on non-flicker '{}'", this.name());
        return false;
    };
    other.body.velocity = norm * speed(flicker);
    flicker.start_effect();
    true
}

/// Kick a body at the flicker's speed
pub fn collide_with_globule(this: &mut Entity, other: &mut Entity) -> bool {
    kick(this, other, |flicker| flicker.speed)
}

/// Kick the ball at the ball's own speed
pub fn collide_with_ball(this: &mut Entity, other: &mut Entity) -> bool {
    let ball_speed = other.shape.ball().map(|ball| ball.speed);
    kick(this, other, |flicker| ball_speed.unwrap_or(flicker.speed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::BallConfig;
    use crate::sim::ball;
    use crate::sim::entity::ObjectIdPool;
    use rand::SeedableRng;

    fn setup(reg: &mut ClassRegistry, pool: &mut ObjectIdPool) -> (Entity, Entity) {
        let config = ObjectConfig {
            x: Some(100.0),
            y: Some(100.0),
            radius: Some(10.0),
            speed: Some(7.0),
            ..ObjectConfig::named("flicker", Some("Flicker"))
        };
        let flicker = Entity::new(pool.acquire("flicker"), load(reg, &config).unwrap());
        let ball_config = BallConfig {
            radius: 5.0,
            speed: 4.0,
            weight: None,
            image: None,
        };
        let mut ball = Entity::new(pool.acquire("ball"), ball::load(reg, &ball_config).unwrap());
        ball.body.position = Vector2::new(114.0, 100.0);
        ball.body.velocity = Vector2::new(-1.0, 0.0);
        (flicker, ball)
    }

    #[test]
    fn test_globule_kicked_at_flicker_speed() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let (mut flicker, mut body) = setup(&mut reg, &mut pool);
        assert!(collide_with_globule(&mut flicker, &mut body));
        assert_eq!(body.velocity(), Vector2::new(7.0, 0.0));
        let Shape::Flicker(state) = &flicker.shape else {
            panic!("not a flicker");
        };
        assert!(state.is_effect_active());
    }

    #[test]
    fn test_ball_keeps_its_own_speed() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let (mut flicker, mut ball) = setup(&mut reg, &mut pool);
        assert!(collide_with_ball(&mut flicker, &mut ball));
        assert_eq!(ball.velocity(), Vector2::new(4.0, 0.0));
    }

    #[test]
    fn test_repeat_contact_is_not_kicked_again() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let (mut flicker, mut ball) = setup(&mut reg, &mut pool);
        flicker.mark_collided(&mut ball);
        flicker.roll_collisions();
        ball.roll_collisions();
        assert!(collide_with_ball(&mut flicker, &mut ball));
        assert_eq!(ball.velocity(), Vector2::new(-1.0, 0.0));
    }

    #[test]
    fn test_low_speed_rejected() {
        let mut reg = ClassRegistry::new();
        let config = ObjectConfig {
            x: Some(0.0),
            y: Some(0.0),
            radius: Some(10.0),
            speed: Some(0.5),
            ..ObjectConfig::named("flicker", Some("Flicker"))
        };
        assert!(matches!(
            load(&mut reg, &config),
            Err(ConfigError::OutOfRange { key: "speed", .. })
        ));
    }

    #[test]
    fn test_afterglow_jitters_then_settles() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut flicker = Flicker::new(3.0);
        flicker.start_effect();
        for _ in 0..FLICKER_EFFECT_TICKS {
            assert!(flicker.is_effect_active());
            flicker.update_effect(&mut rng);
            let j = flicker.jitter();
            assert!(j.x.abs() <= FLICKER_EFFECT_MOTION && j.y.abs() <= FLICKER_EFFECT_MOTION);
        }
        assert!(!flicker.is_effect_active());
        flicker.update_effect(&mut rng);
        assert_eq!(flicker.jitter(), Vector2::ZERO);
    }
}
