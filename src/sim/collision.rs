//! Collision dispatch and the generic body-body response
//!
//! `dispatch` asks the registry which rule covers a pair, calls it with the arguments in
//! the rule's (self, other) order, and records the contact on both sides when the rule
//! reports one. Rules can only touch the two entities they are handed; anything else
//! they cause (new entities, game over) goes through `CollisionContext`.

use rand_pcg::Pcg32;

use super::entity::{Body, Entity, Prototype};
use super::registry::{ClassRegistry, Resolution, RuleId};
use super::vector::{Vector2, Vector2Ext, approx_eq, approx_ge, approx_lt, approx_zero};
use super::{ball, droplet, field, flicker, force_field, polygon, racket, splitter};

/// Side effects collected while resolving one tick's collisions
pub struct CollisionContext<'a> {
    pub registry: &'a ClassRegistry,
    pub rng: &'a mut Pcg32,
    /// Entities to attach once the collision phase is over
    pub spawned: Vec<Prototype>,
    /// Set when the ball slips past the paddle
    pub game_over: bool,
}

impl<'a> CollisionContext<'a> {
    pub fn new(registry: &'a ClassRegistry, rng: &'a mut Pcg32) -> Self {
        Self {
            registry,
            rng,
            spawned: Vec::new(),
            game_over: false,
        }
    }
}

/// Resolve and apply the collision rule for `this` against `other`
pub fn dispatch(this: &mut Entity, other: &mut Entity, ctx: &mut CollisionContext) {
    if !this.is_alive() || !other.is_alive() {
        log::error!(
            "dispatch on dead entity: '{}' ({}) <=> '{}' ({})",
            this.name(),
            this.is_alive(),
            other.name(),
            other.is_alive()
        );
        return;
    }
    let registry = ctx.registry;
    if !registry.is_registered(this.kind()) || !registry.is_registered(other.kind()) {
        log::error!(
            "dispatch on unregistered kind: '{}' <=> '{}'",
            registry.name(this.kind()),
            registry.name(other.kind())
        );
        return;
    }

    let hit = match registry.resolve(this.kind(), other.kind()) {
        Resolution::Ignore => return,
        Resolution::Unmatched => {
            log::error!(
                "No collision rule for '{}' <=> '{}'",
                registry.name(this.kind()),
                registry.name(other.kind())
            );
            return;
        }
        Resolution::Apply {
            rule,
            reversed: false,
        } => apply(rule, this, other, ctx),
        Resolution::Apply {
            rule,
            reversed: true,
        } => apply(rule, other, this, ctx),
    };

    if hit {
        this.mark_collided(other);
    }
}

fn apply(rule: RuleId, this: &mut Entity, other: &mut Entity, ctx: &mut CollisionContext) -> bool {
    match rule {
        RuleId::GlobuleGlobule => collide_globules(this, other),
        RuleId::BallGlobule => ball::collide_with_globule(this, other),
        RuleId::DropletDroplet => droplet::collide_with_droplet(this, other),
        RuleId::SplitterBall => splitter::collide_with_ball(this, other, ctx),
        RuleId::SplitterDroplet => splitter::collide_with_droplet(this, other),
        RuleId::FieldGlobule => field::collide_with_globule(this, other),
        RuleId::FieldBall => field::collide_with_ball(this, other),
        RuleId::RacketBall => racket::collide_with_ball(this, other, ctx),
        RuleId::PolygonGlobule => polygon::collide_with_globule(this, other, ctx.registry),
        RuleId::FlickerGlobule => flicker::collide_with_globule(this, other),
        RuleId::FlickerBall => flicker::collide_with_ball(this, other),
        RuleId::ForceFieldGlobule => force_field::collide_with_globule(this, other),
    }
}

/// Contact normal (from `other` toward `this`) and both velocities split against it
pub fn decompose_velocities(this: &Body, other: &Body) -> (Vector2, Vector2, Vector2) {
    let norm = this.norm_from(other);
    (norm, norm.decompose(this.velocity), norm.decompose(other.velocity))
}

/// Shares of the combined weight of `a` and `b`; even split when both weigh nothing
pub fn weight_fractions(a: &Body, b: &Body) -> (f64, f64) {
    let total = a.weight + b.weight;
    if approx_zero(total) {
        return (0.5, 0.5);
    }
    (a.weight / total, b.weight / total)
}

/// 1D inelastic collision of the along-normal components (`x`) of `va` and `vb`
pub fn inelastic_collision(a: &Body, b: &Body, va: &mut Vector2, vb: &mut Vector2) {
    let e = (a.restitution + b.restitution) / 2.0;
    let (wa, wb) = weight_fractions(a, b);
    let p = wa * va.x + wb * vb.x;
    let dv = e * (vb.x - va.x);
    va.x = p + wb * dv;
    vb.x = p - wa * dv;
}

/// Push still-overlapping bodies apart when a resolved normal speed is zero
pub fn separate(a: &Body, b: &Body, distance: f64, va: &mut Vector2, vb: &mut Vector2) {
    if approx_zero(va.x) {
        va.x = distance * a.restitution;
    }
    if approx_zero(vb.x) {
        vb.x = -distance * b.restitution;
    }
}

/// Generic moving body against moving body
pub fn collide_globules(this: &mut Entity, other: &mut Entity) -> bool {
    let distance = this.body.distance_to(&other.body);
    if !approx_ge(distance, 0.0) {
        return false;
    }

    let (norm, mut va, mut vb) = decompose_velocities(&this.body, &other.body);
    if !this.collided_last_tick(other) {
        inelastic_collision(&this.body, &other.body, &mut va, &mut vb);
    } else {
        separate(&this.body, &other.body, distance, &mut va, &mut vb);
    }
    this.body.velocity = norm.compose(va);
    other.body.velocity = norm.compose(vb);
    true
}

/// Body against a wall with inward unit normal `norm`, penetrating by `distance`
///
/// Approaching bodies are reflected with their restitution. Bodies sliding along or
/// resting against the wall get a push proportional to the penetration instead.
pub fn collide_with_line(body: &mut Body, norm: Vector2, distance: f64) -> bool {
    if distance <= 0.0 {
        return false;
    }
    let ip = norm.dot(body.velocity);
    if approx_lt(ip, 0.0) {
        body.velocity = body.velocity.wall_reflection(norm, body.restitution);
    } else if approx_eq(ip, 0.0) {
        body.velocity += norm * (distance * body.restitution);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{ObjectConfig, RacketConfig};
    use crate::sim::entity::{ObjectIdPool, Shape};
    use crate::sim::kinds;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn globule(reg: &mut ClassRegistry, pool: &mut ObjectIdPool, x: f64, r: f64, vx: f64) -> Entity {
        let kind = kinds::ensure_globule(reg);
        let mut body = Body::globule(Vector2::new(x, 0.0), r, 1.0);
        body.velocity = Vector2::new(vx, 0.0);
        Entity::new(
            pool.acquire("globule"),
            Prototype {
                name: "globule".to_string(),
                kind,
                movable: true,
                body,
                shape: Shape::Globule,
                image: None,
            },
        )
    }

    #[test]
    fn test_equal_elastic_bodies_swap_velocities() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut a = globule(&mut reg, &mut pool, 0.0, 2.0, 1.0);
        let mut b = globule(&mut reg, &mut pool, 3.9, 2.0, -1.0);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ctx = CollisionContext::new(&reg, &mut rng);

        dispatch(&mut a, &mut b, &mut ctx);
        assert!((a.velocity() - Vector2::new(-1.0, 0.0)).length() < 1e-12);
        assert!((b.velocity() - Vector2::new(1.0, 0.0)).length() < 1e-12);
        assert!(!a.collided_last_tick(&b));

        a.roll_collisions();
        b.roll_collisions();
        assert!(a.collided_last_tick(&b));
        assert!(b.collided_last_tick(&a));
    }

    #[test]
    fn test_separated_bodies_do_not_collide() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut a = globule(&mut reg, &mut pool, 0.0, 2.0, 1.0);
        let mut b = globule(&mut reg, &mut pool, 10.0, 2.0, -1.0);
        assert!(!collide_globules(&mut a, &mut b));
        assert_eq!(a.velocity(), Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_resting_overlap_is_pushed_apart() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut a = globule(&mut reg, &mut pool, 0.0, 2.0, 0.0);
        let mut b = globule(&mut reg, &mut pool, 3.0, 2.0, 0.0);
        a.mark_collided(&mut b);
        a.roll_collisions();
        b.roll_collisions();

        assert!(collide_globules(&mut a, &mut b));
        // norm points from b to a, so a moves left and b right by the 1.0 overlap
        assert!((a.velocity() - Vector2::new(-1.0, 0.0)).length() < 1e-12);
        assert!((b.velocity() - Vector2::new(1.0, 0.0)).length() < 1e-12);
    }

    #[test]
    fn test_dispatch_skips_dead_entities() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let mut a = globule(&mut reg, &mut pool, 0.0, 2.0, 1.0);
        let mut b = globule(&mut reg, &mut pool, 3.0, 2.0, -1.0);
        b.kill();
        let mut rng = Pcg32::seed_from_u64(1);
        let mut ctx = CollisionContext::new(&reg, &mut rng);
        dispatch(&mut a, &mut b, &mut ctx);
        assert_eq!(a.velocity(), Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_line_pushes_resting_body_out() {
        let mut body = Body::globule(Vector2::new(1.0, 5.0), 2.0, 0.5);
        assert!(collide_with_line(&mut body, Vector2::new(1.0, 0.0), 1.0));
        assert_eq!(body.velocity, Vector2::new(0.5, 0.0));
        assert!(!collide_with_line(&mut body, Vector2::new(1.0, 0.0), 0.0));
    }

    #[test]
    fn test_weightless_bodies_share_evenly() {
        let a = Body::globule(Vector2::ZERO, 0.0, 1.0);
        let b = Body::globule(Vector2::new(0.5, 0.0), 0.0, 1.0);
        assert_eq!(weight_fractions(&a, &b), (0.5, 0.5));

        let mut va = Vector2::new(2.0, 0.0);
        let mut vb = Vector2::new(-2.0, 0.0);
        inelastic_collision(&a, &b, &mut va, &mut vb);
        assert_eq!(va, Vector2::new(-2.0, 0.0));
        assert_eq!(vb, Vector2::new(2.0, 0.0));
    }

    #[test]
    fn test_dispatch_never_collide_rule_is_ignored() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let racket = racket::load(
            &mut reg,
            &RacketConfig {
                x_min: 0.0,
                x_max: 100.0,
                y: 50.0,
                width: 20.0,
                image: None,
            },
        )
        .unwrap();
        let mut racket = Entity::new(pool.acquire("racket"), racket);
        let config = ObjectConfig {
            x: Some(50.0),
            y: Some(50.0),
            radius: Some(5.0),
            restitution: Some(1.0),
            group: Some(1.0),
            vx: Some(1.0),
            vy: Some(1.0),
            ..ObjectConfig::named("drop", Some("Droplet"))
        };
        let mut rng = Pcg32::seed_from_u64(1);
        let drop = droplet::load(&mut reg, &config, &mut rng).unwrap();
        let mut drop = Entity::new(pool.acquire("drop"), drop);
        assert_eq!(reg.resolve(drop.kind(), racket.kind()), Resolution::Ignore);

        let mut ctx = CollisionContext::new(&reg, &mut rng);
        dispatch(&mut drop, &mut racket, &mut ctx);
        assert_eq!(drop.velocity(), Vector2::new(1.0, 1.0));
        drop.roll_collisions();
        racket.roll_collisions();
        assert!(!drop.collided_last_tick(&racket));
        assert!(!racket.collided_last_tick(&drop));
    }

    #[test]
    fn test_dispatch_without_rule_changes_nothing() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        // Two circles of a kind nobody wrote a rule for
        let (kind, _) = reg.register("Pebble", None);
        let pebble = |pool: &mut ObjectIdPool, x: f64, vx: f64| {
            let mut body = Body::globule(Vector2::new(x, 0.0), 2.0, 1.0);
            body.velocity = Vector2::new(vx, 0.0);
            Entity::new(
                pool.acquire("pebble"),
                Prototype {
                    name: "pebble".to_string(),
                    kind,
                    movable: true,
                    body,
                    shape: Shape::Globule,
                    image: None,
                },
            )
        };
        let mut a = pebble(&mut pool, 0.0, 1.0);
        let mut b = pebble(&mut pool, 3.0, -1.0);
        assert_eq!(reg.resolve(a.kind(), b.kind()), Resolution::Unmatched);

        let mut rng = Pcg32::seed_from_u64(1);
        let mut ctx = CollisionContext::new(&reg, &mut rng);
        dispatch(&mut a, &mut b, &mut ctx);
        assert_eq!(a.velocity(), Vector2::new(1.0, 0.0));
        assert_eq!(b.velocity(), Vector2::new(-1.0, 0.0));
        a.roll_collisions();
        b.roll_collisions();
        assert!(!a.collided_last_tick(&b));
        assert!(!b.collided_last_tick(&a));
    }

    #[test]
    fn test_dispatch_force_field_push_is_not_a_contact() {
        let mut reg = ClassRegistry::new();
        let mut pool = ObjectIdPool::new();
        let config = ObjectConfig {
            x: Some(0.0),
            y: Some(0.0),
            radius: Some(10.0),
            force: Some(2.0),
            ..ObjectConfig::named("fountain", Some("ForceField"))
        };
        let fountain = force_field::load(&mut reg, &config).unwrap();
        let mut fountain = Entity::new(pool.acquire("fountain"), fountain);
        let mut body = globule(&mut reg, &mut pool, 5.0, 5.0, 0.0);

        let mut rng = Pcg32::seed_from_u64(1);
        let mut ctx = CollisionContext::new(&reg, &mut rng);
        dispatch(&mut body, &mut fountain, &mut ctx);
        assert!(body.velocity().x > 0.0);
        body.roll_collisions();
        fountain.roll_collisions();
        assert!(!body.collided_last_tick(&fountain));
        assert!(!fountain.collided_last_tick(&body));
    }

    proptest! {
        #[test]
        fn prop_inelastic_collision_conserves_momentum(
            ma in 0.1f64..100.0, mb in 0.1f64..100.0,
            ea in 0.0f64..=1.0, eb in 0.0f64..=1.0,
            ua in -50.0f64..50.0, ub in -50.0f64..50.0,
        ) {
            let a = Body { weight: ma, restitution: ea, ..Default::default() };
            let b = Body { weight: mb, restitution: eb, ..Default::default() };
            let mut va = Vector2::new(ua, 3.0);
            let mut vb = Vector2::new(ub, -7.0);
            inelastic_collision(&a, &b, &mut va, &mut vb);

            let (wa, wb) = (ma / (ma + mb), mb / (ma + mb));
            let before = wa * ua + wb * ub;
            let after = wa * va.x + wb * vb.x;
            prop_assert!((before - after).abs() < 1e-9);
            prop_assert_eq!(va.y, 3.0);
            prop_assert_eq!(vb.y, -7.0);
        }
    }
}
