//! Entities and their identity pool
//!
//! An entity is plain data: identity, kind, liveness, collision bookkeeping, the circle
//! body every kind carries, and a kind-specific `Shape` payload. Behavior lives in free
//! functions in the per-kind modules and is selected by matching on `Shape`.

use serde::{Deserialize, Serialize};

use super::ball::Ball;
use super::droplet::Droplet;
use super::field::Field;
use super::flicker::Flicker;
use super::force_field::ForceField;
use super::polygon::Polygon;
use super::racket::Racket;
use super::registry::{ClassRegistry, KindId};
use super::splitter::Splitter;
use super::vector::{Vector2, Vector2Ext};
use crate::consts::MAX_OBJECTS;

/// Bit set over object identities
pub type ObjectMask = u128;

/// One slot of the 128-entry identity pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(u8);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn bit(self) -> ObjectMask {
        1 << self.0
    }
}

/// Hands out the lowest free identity and takes it back on release
#[derive(Debug, Clone, Default)]
pub struct ObjectIdPool {
    used: ObjectMask,
}

impl ObjectIdPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Panics
    ///
    /// When all 128 identities are live.
    pub fn acquire(&mut self, name: &str) -> ObjectId {
        let free = !self.used;
        if free == 0 {
            log::error!("No object identity left for '{}' ({} live)", name, MAX_OBJECTS);
            panic!("object identity pool exhausted: cannot attach '{name}'");
        }
        let id = ObjectId(free.trailing_zeros() as u8);
        self.used |= id.bit();
        id
    }

    pub fn release(&mut self, id: ObjectId) {
        self.used &= !id.bit();
    }

    pub fn in_use(&self) -> usize {
        self.used.count_ones() as usize
    }
}

/// Circle geometry plus the physical properties of a moving body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub position: Vector2,
    pub radius: f64,
    pub velocity: Vector2,
    /// In [0, 1]
    pub restitution: f64,
    pub weight: f64,
}

impl Default for Body {
    fn default() -> Self {
        Self {
            position: Vector2::ZERO,
            radius: 0.0,
            velocity: Vector2::ZERO,
            restitution: 1.0,
            weight: 0.0,
        }
    }
}

impl Body {
    /// Static circle
    pub fn circle(position: Vector2, radius: f64) -> Self {
        Self {
            position,
            radius,
            ..Default::default()
        }
    }

    /// Moving body weighted by area (radius²)
    pub fn globule(position: Vector2, radius: f64, restitution: f64) -> Self {
        Self {
            position,
            radius,
            restitution,
            weight: radius * radius,
            ..Default::default()
        }
    }

    /// Sum of radii minus center distance: >= 0 while touching or overlapping
    pub fn distance_to(&self, other: &Body) -> f64 {
        self.radius + other.radius - self.position.distance(other.position)
    }

    /// Unit vector from this center toward `other`'s
    pub fn norm_to(&self, other: &Body) -> Vector2 {
        (other.position - self.position).unit()
    }

    /// Unit vector from `other`'s center toward this one
    pub fn norm_from(&self, other: &Body) -> Vector2 {
        (self.position - other.position).unit()
    }

    pub fn translate(&mut self) {
        self.position += self.velocity;
    }
}

/// Kind-specific state
#[derive(Debug, Clone)]
pub enum Shape {
    /// Plain moving body with no extra behavior
    Globule,
    Ball(Ball),
    Droplet(Droplet),
    Splitter(Splitter),
    Field(Field),
    Racket(Racket),
    Polygon(Polygon),
    Flicker(Flicker),
    ForceField(ForceField),
}

impl Shape {
    /// Droplet state, including a splitter's own droplet state
    pub fn droplet(&self) -> Option<&Droplet> {
        match self {
            Shape::Droplet(d) => Some(d),
            Shape::Splitter(s) => Some(&s.droplet),
            _ => None,
        }
    }

    pub fn droplet_mut(&mut self) -> Option<&mut Droplet> {
        match self {
            Shape::Droplet(d) => Some(d),
            Shape::Splitter(s) => Some(&mut s.droplet),
            _ => None,
        }
    }

    pub fn ball(&self) -> Option<&Ball> {
        match self {
            Shape::Ball(b) => Some(b),
            _ => None,
        }
    }
}

/// Everything needed to attach an entity except its identity
#[derive(Debug, Clone)]
pub struct Prototype {
    pub name: String,
    pub kind: KindId,
    pub movable: bool,
    pub body: Body,
    pub shape: Shape,
    pub image: Option<String>,
}

/// A simulated object owned by the manager
#[derive(Debug, Clone)]
pub struct Entity {
    id: ObjectId,
    kind: KindId,
    name: String,
    movable: bool,
    alive: bool,
    prev_collided: ObjectMask,
    curr_collided: ObjectMask,
    pub body: Body,
    pub shape: Shape,
    image: Option<String>,
}

impl Entity {
    pub fn new(id: ObjectId, proto: Prototype) -> Self {
        Self {
            id,
            kind: proto.kind,
            name: proto.name,
            movable: proto.movable,
            alive: true,
            prev_collided: 0,
            curr_collided: 0,
            body: proto.body,
            shape: proto.shape,
            image: proto.image,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> KindId {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of this entity's kind
    pub fn class_name<'r>(&self, registry: &'r ClassRegistry) -> &'r str {
        registry.name(self.kind)
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn kill(&mut self) {
        self.alive = false;
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn position(&self) -> Vector2 {
        self.body.position
    }

    pub fn radius(&self) -> f64 {
        self.body.radius
    }

    pub fn velocity(&self) -> Vector2 {
        self.body.velocity
    }

    /// Whether this entity and `other` were in contact during the previous tick
    pub fn collided_last_tick(&self, other: &Entity) -> bool {
        self.prev_collided & other.id.bit() != 0
    }

    /// Record contact in both entities' current-tick sets
    pub fn mark_collided(&mut self, other: &mut Entity) {
        self.curr_collided |= other.id.bit();
        other.curr_collided |= self.id.bit();
    }

    /// Current-tick contacts become previous-tick contacts
    pub fn roll_collisions(&mut self) {
        self.prev_collided = self.curr_collided;
        self.curr_collided = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pool_reuses_lowest_free_slot() {
        let mut pool = ObjectIdPool::new();
        let a = pool.acquire("a");
        let b = pool.acquire("b");
        let c = pool.acquire("c");
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        pool.release(b);
        assert_eq!(pool.in_use(), 2);
        assert_eq!(pool.acquire("d"), b);
    }

    #[test]
    #[should_panic(expected = "object identity pool exhausted")]
    fn test_129th_object_is_fatal() {
        let mut pool = ObjectIdPool::new();
        for i in 0..=MAX_OBJECTS {
            pool.acquire(&format!("obj{i}"));
        }
    }

    #[test]
    fn test_touching_circles_have_zero_distance() {
        let a = Body::circle(Vector2::new(0.0, 0.0), 3.0);
        let b = Body::circle(Vector2::new(5.0, 0.0), 2.0);
        assert_eq!(a.distance_to(&b), 0.0);
        assert_eq!(a.norm_to(&b), Vector2::new(1.0, 0.0));
        assert_eq!(a.norm_from(&b), Vector2::new(-1.0, 0.0));
    }

    #[test]
    fn test_globule_weight_is_area() {
        let body = Body::globule(Vector2::ZERO, 4.0, 0.5);
        assert_eq!(body.weight, 16.0);
        assert_eq!(body.restitution, 0.5);
    }

    proptest! {
        #[test]
        fn prop_distance_sign_matches_overlap(
            ax in -100.0f64..100.0, ay in -100.0f64..100.0,
            bx in -100.0f64..100.0, by in -100.0f64..100.0,
            ra in 0.0f64..50.0, rb in 0.0f64..50.0,
        ) {
            let a = Body::circle(Vector2::new(ax, ay), ra);
            let b = Body::circle(Vector2::new(bx, by), rb);
            let gap = Vector2::new(ax, ay).distance(Vector2::new(bx, by));
            prop_assert_eq!(a.distance_to(&b) >= 0.0, gap <= ra + rb);
            prop_assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-9);
        }
    }
}
