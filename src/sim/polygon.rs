//! Static convex polygons
//!
//! The polygon is stored as a closed list of segments in world coordinates. The entity
//! body holds its bounding circle (centroid of the vertices, farthest vertex distance),
//! which rejects far bodies before any per-segment work.

use super::entity::{Body, Entity, Prototype, Shape};
use super::kinds;
use super::registry::ClassRegistry;
use super::vector::{Vector2, Vector2Ext, approx_between, approx_ge, approx_le};
use crate::consts::COORD_MAX;
use crate::error::ConfigError;
use crate::level::{ObjectConfig, ranged};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Start point
    pub bp: Vector2,
    /// End point
    pub ep: Vector2,
    /// Normal of the segment, pointing from the rest of the polygon toward it
    pub norm: Vector2,
}

#[derive(Debug, Clone)]
pub struct Polygon {
    pub origin: Vector2,
    pub segments: Vec<Segment>,
    pub show_outline: bool,
}

impl Polygon {
    /// Build from points relative to `origin`; `None` unless the points form a convex
    /// polygon
    pub fn from_points(points: &[Vector2], origin: Vector2) -> Option<Self> {
        let n = points.len();
        if n < 3 {
            return None;
        }

        let mut segments = Vec::with_capacity(n);
        let mut p1 = points[n - 2];
        let mut p2 = points[n - 1];
        let mut n0 = Vector2::ZERO;
        for (i, &p3) in points.iter().enumerate() {
            let n1 = p3.vector_to_line(p2 - p1, p1);
            let n2 = p1.vector_to_line(p3 - p2, p2);
            log::debug!("Polygon: p1 {} p2 {} p3 {} n0 {} n1 {} n2 {}", p1, p2, p3, n0, n1, n2);
            if i > 0 && approx_le(n0.dot(n1), 0.0) {
                log::warn!("Polygon: edge normals disagree at point {}", i);
                return None;
            }
            segments.push(Segment {
                bp: p2 + origin,
                ep: p3 + origin,
                norm: n2,
            });
            n0 = n2;
            p1 = p2;
            p2 = p3;
        }

        Some(Self {
            origin,
            segments,
            show_outline: false,
        })
    }

    /// Centroid of the vertices and the largest vertex distance from it
    pub fn bounding_circle(&self) -> (Vector2, f64) {
        let sum: Vector2 = self.segments.iter().map(|s| s.bp).sum();
        let center = sum / self.segments.len() as f64;
        let radius = self
            .segments
            .iter()
            .map(|s| center.distance_squared(s.bp))
            .fold(0.0, f64::max)
            .sqrt();
        (center, radius)
    }
}

pub fn load(reg: &mut ClassRegistry, config: &ObjectConfig) -> Result<Prototype, ConfigError> {
    let x = config.number("x", config.x, 0.0, COORD_MAX)?;
    let y = config.number("y", config.y, 0.0, COORD_MAX)?;
    if config.points.len() % 2 == 1 {
        return Err(ConfigError::OddPointList {
            object: config.name.clone(),
            len: config.points.len(),
        });
    }
    for &value in &config.points {
        ranged(&config.name, "points", value, 0.0, COORD_MAX)?;
    }
    let points: Vec<Vector2> = config
        .points
        .chunks_exact(2)
        .map(|xy| Vector2::new(xy[0], xy[1]))
        .collect();
    if points.len() < 3 {
        return Err(ConfigError::TooFewPoints {
            object: config.name.clone(),
            count: points.len(),
        });
    }

    let mut polygon = Polygon::from_points(&points, Vector2::new(x, y)).ok_or_else(|| {
        ConfigError::NonConvexPolygon {
            object: config.name.clone(),
        }
    })?;
    polygon.show_outline = config.show_outline;
    let (center, radius) = polygon.bounding_circle();
    log::debug!("Polygon '{}': center {}, radius {}", config.name, center, radius);

    Ok(Prototype {
        name: config.name.clone(),
        kind: kinds::ensure_polygon(reg),
        movable: false,
        body: Body::circle(center, radius),
        shape: Shape::Polygon(polygon),
        image: config.image.clone(),
    })
}

/// Body against the polygon
///
/// After the bounding circle check, the first segment that the line from the body to
/// the centroid crosses and that the body touches decides the response.
pub fn collide_with_globule(
    this: &mut Entity,
    other: &mut Entity,
    registry: &ClassRegistry,
) -> bool {
    let Shape::Polygon(polygon) = &this.shape else {
        log::error!("polygon rule on non-polygon '{}'", this.name());
        return false;
    };
    let pos = other.body.position;
    let orien = this.body.position - pos;
    if !approx_le(orien.length(), this.body.radius + other.body.radius) {
        return false;
    }

    let repeated = this.collided_last_tick(other);
    for segment in &polygon.segments {
        let h = orien.exterior(segment.bp - pos) / orien.exterior(segment.bp - segment.ep);
        if approx_between(h, 0.0, 1.0) && collide_with_segment(other, segment, repeated, registry)
        {
            return true;
        }
    }
    false
}

fn collide_with_segment(
    other: &mut Entity,
    segment: &Segment,
    repeated: bool,
    registry: &ClassRegistry,
) -> bool {
    let pos = other.body.position;
    let dcp = pos.vector_to_line(segment.bp - segment.ep, segment.bp);
    let cp = pos + dcp;
    if !approx_le((cp - segment.bp).dot(cp - segment.ep), 0.0) {
        return false;
    }
    let distance = other.body.radius - dcp.length();
    if !approx_ge(distance, 0.0) {
        return false;
    }

    let norm = dcp.unit();
    let rest = other.body.restitution;
    if !repeated {
        other.body.velocity = other.body.velocity.wall_reflection(norm, rest);
    } else if !registry.is_a(other.kind(), kinds::BALL) {
        other.body.velocity += norm.compose(Vector2::new(-rest * distance, 0.0));
    }
    true
}
