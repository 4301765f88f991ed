//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - One step per tick, no wall clock
//! - Seeded RNG only
//! - Stable iteration order (attachment order within each partition)
//! - No rendering or platform dependencies

pub mod ball;
pub mod collision;
pub mod droplet;
pub mod entity;
pub mod field;
pub mod flicker;
pub mod force_field;
pub mod kinds;
pub mod polygon;
pub mod racket;
pub mod registry;
pub mod splitter;
pub mod state;
pub mod tick;
pub mod vector;

pub use collision::{CollisionContext, dispatch};
pub use entity::{Body, Entity, ObjectId, Prototype, Shape};
pub use registry::{ClassRegistry, KindId, Resolution, RuleId};
pub use state::{GamePhase, Manager};
pub use tick::{TickInput, tick};
pub use vector::{Vector2, Vector2Ext};
