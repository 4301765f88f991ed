//! 2D vector algebra
//!
//! `Vector2` is glam's `DVec2`. `Vector2Ext` adds the decompositions the collision
//! rules are written in: a velocity is split into the component along a unit normal
//! and the component along that normal rotated by -90°, adjusted, then recomposed.
//!
//! Every comparison the physics makes goes through the `approx_*` helpers so that
//! contact tests at exactly touching distances don't flicker between ticks.

use glam::DVec2;

use crate::consts::EPSILON;

pub type Vector2 = DVec2;

/// |x| < ε
#[inline]
pub fn approx_zero(x: f64) -> bool {
    x.abs() < EPSILON
}

#[inline]
pub fn approx_eq(lhs: f64, rhs: f64) -> bool {
    approx_zero(lhs - rhs)
}

/// lhs < rhs and not within ε of it
#[inline]
pub fn approx_lt(lhs: f64, rhs: f64) -> bool {
    lhs < rhs && !approx_eq(lhs, rhs)
}

/// lhs < rhs or within ε of it
#[inline]
pub fn approx_le(lhs: f64, rhs: f64) -> bool {
    lhs < rhs || approx_eq(lhs, rhs)
}

#[inline]
pub fn approx_gt(lhs: f64, rhs: f64) -> bool {
    lhs > rhs && !approx_eq(lhs, rhs)
}

#[inline]
pub fn approx_ge(lhs: f64, rhs: f64) -> bool {
    lhs > rhs || approx_eq(lhs, rhs)
}

/// min <= n <= max with ε tolerance at both ends
#[inline]
pub fn approx_between(n: f64, min: f64, max: f64) -> bool {
    approx_ge(n, min) && approx_le(n, max)
}

/// Operations on `Vector2` beyond what glam provides
pub trait Vector2Ext: Sized {
    /// Vector of length `size` at polar angle `arg`
    fn from_polar(size: f64, arg: f64) -> Self;

    /// |v|² within ε of zero
    fn is_near_zero(self) -> bool;
    /// |v|² within ε of one
    fn is_near_unit(self) -> bool;

    /// Unit vector in the same direction. Warns (and yields zero for an exact zero
    /// vector) instead of failing when the vector is too short to have a direction.
    fn unit(self) -> Self;
    /// Same direction, new length. Warns on a near-zero vector.
    fn with_length(self, size: f64) -> Self;

    /// Polar angle, `atan2(y, x)`
    fn arg(self) -> f64;
    /// Same length, new polar angle
    fn with_arg(self, arg: f64) -> Self;

    /// Rotate counter-clockwise by `arg` radians
    fn rotated(self, arg: f64) -> Self;
    /// Rotate by +90°
    fn rotated_p90(self) -> Self;
    /// Rotate by -90°
    fn rotated_n90(self) -> Self;

    /// With `self` a unit normal, split `v` into (along normal, along normal rotated -90°)
    fn decompose(self, v: Self) -> Self;
    /// Inverse of `decompose`
    fn compose(self, parts: Self) -> Self;
    /// Reflect off a wall with unit normal `norm`, keeping `rest` of the normal speed
    fn wall_reflection(self, norm: Self, rest: f64) -> Self;

    /// 2D cross product
    fn exterior(self, rhs: Self) -> f64;
    /// Distance from this point to the line through `transit` along `orientation`
    fn distance_to_line(self, orientation: Self, transit: Self) -> f64;
    /// Vector from this point to its foot of perpendicular on the line
    fn vector_to_line(self, orientation: Self, transit: Self) -> Self;

    /// Intersection of the lines (orientation1 through transit1) and
    /// (orientation2 through transit2)
    fn intersection(orientation1: Self, transit1: Self, orientation2: Self, transit2: Self)
    -> Self;
}

impl Vector2Ext for DVec2 {
    #[inline]
    fn from_polar(size: f64, arg: f64) -> Self {
        DVec2::new(arg.cos(), arg.sin()) * size
    }

    #[inline]
    fn is_near_zero(self) -> bool {
        approx_zero(self.length_squared())
    }

    #[inline]
    fn is_near_unit(self) -> bool {
        approx_eq(self.length_squared(), 1.0)
    }

    fn unit(self) -> Self {
        self.with_length(1.0)
    }

    fn with_length(self, size: f64) -> Self {
        if self.is_near_zero() {
            log::warn!("with_length({}) on near-zero vector {:?}", size, self);
        }
        self.normalize_or_zero() * size
    }

    #[inline]
    fn arg(self) -> f64 {
        self.y.atan2(self.x)
    }

    fn with_arg(self, arg: f64) -> Self {
        Self::from_polar(self.length(), arg)
    }

    fn rotated(self, arg: f64) -> Self {
        let (sin, cos) = arg.sin_cos();
        DVec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    #[inline]
    fn rotated_p90(self) -> Self {
        DVec2::new(-self.y, self.x)
    }

    #[inline]
    fn rotated_n90(self) -> Self {
        DVec2::new(self.y, -self.x)
    }

    fn decompose(self, v: Self) -> Self {
        if !self.is_near_unit() {
            log::warn!("decompose() against non-unit normal {:?}", self);
        }
        DVec2::new(v.dot(self), v.exterior(self))
    }

    fn compose(self, parts: Self) -> Self {
        if !self.is_near_unit() {
            log::warn!("compose() against non-unit normal {:?}", self);
        }
        self * parts.x + self.rotated_n90() * parts.y
    }

    fn wall_reflection(self, norm: Self, rest: f64) -> Self {
        let mut v = norm.decompose(self);
        v.x = -rest * v.x;
        norm.compose(v)
    }

    #[inline]
    fn exterior(self, rhs: Self) -> f64 {
        self.x * rhs.y - self.y * rhs.x
    }

    fn distance_to_line(self, orientation: Self, transit: Self) -> f64 {
        orientation.unit().exterior(transit - self).abs()
    }

    fn vector_to_line(self, orientation: Self, transit: Self) -> Self {
        let v = transit - self;
        v - orientation * (orientation.dot(v) / orientation.length_squared())
    }

    fn intersection(
        orientation1: Self,
        transit1: Self,
        orientation2: Self,
        transit2: Self,
    ) -> Self {
        (orientation2 * orientation1.exterior(transit1)
            - orientation1 * orientation2.exterior(transit2))
            / orientation1.exterior(orientation2)
    }
}
