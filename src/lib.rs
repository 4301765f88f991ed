//! Droplet Collection - entity and collision engine
//!
//! Core modules:
//! - `sim`: Per-tick simulation (vector algebra, kind registry, collision dispatch, entities)
//! - `level`: Level description consumed by entity construction
//! - `error`: Configuration errors surfaced while loading a level

pub mod error;
pub mod level;
pub mod sim;

pub use error::ConfigError;
pub use level::LevelConfig;
pub use sim::{GamePhase, Manager, TickInput, tick};

/// Game tuning constants
pub mod consts {
    /// Tolerance used by every floating point comparison in the physics
    pub const EPSILON: f64 = 1e-6;

    /// Capacity of the kind bit space
    pub const MAX_KINDS: usize = 32;
    /// Capacity of the live object identity pool
    pub const MAX_OBJECTS: usize = 128;

    /// Ball speed is renormalized every this many ticks
    pub const BALL_SPEED_PERIOD: u32 = 20;
    /// Minimum |vy| after a ball bounces off a body, so the ball always comes back down
    pub const BALL_MIN_VY: f64 = 2.0;
    /// Gap between the resting ball and the paddle top
    pub const BALL_REST_GAP: f64 = 0.5;

    /// Extra horizontal reach of the paddle hit test
    pub const RACKET_MARGIN: f64 = 5.0;
    /// Maximum deflection from vertical when the ball hits the paddle edge (radians)
    pub const RACKET_CURVE_MAX: f64 = 80.0 * (std::f64::consts::PI / 180.0);

    /// Viscous damping per unit radius
    pub const DROPLET_VISCOSITY: f64 = 1e-3;
    /// Bound of random droplet velocity components
    pub const DROPLET_INIT_SPEED_MAX: f64 = 3.0;
    /// Length of the merge ring effect (ticks)
    pub const DROPLET_EFFECT_TICKS: u32 = 20;
    /// Radius the merge ring grows by over the effect
    pub const DROPLET_EFFECT_RADIUS: f64 = 10.0;

    /// Length of the flicker afterglow (ticks)
    pub const FLICKER_EFFECT_TICKS: u32 = 20;
    /// Jitter amplitude of a triggered flicker (pixels per axis)
    pub const FLICKER_EFFECT_MOTION: f64 = 2.0;

    /// Coordinate bound accepted from level files
    pub const COORD_MAX: f64 = 65535.0;
}
