//! Geometric helpers for raycasting and world topology.
//!
//! All functions are pure and operate on plain `geo` coordinates.

use geo::algorithm::Distance;
use geo::{Coord, Euclidean, Line, Point};

/// 2D point / vector used throughout the simulation.
pub type Vec2 = Coord<f32>;

const EPSILON: f32 = 1e-9;

/// Creates a vector.
#[inline]
pub fn vec2(x: f32, y: f32) -> Vec2 {
    Coord { x, y }
}

/// Unit vector pointing along `heading`.
///
/// Heading 0 points along +y; positive angles turn clockwise toward +x.
#[inline]
pub fn heading_vector(heading: f32) -> Vec2 {
    vec2(heading.sin(), heading.cos())
}

/// Unit vector pointing to the left of `heading`.
#[inline]
pub fn left_vector(heading: f32) -> Vec2 {
    vec2(-heading.cos(), heading.sin())
}

#[inline]
fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

#[inline]
fn dot(a: Vec2, b: Vec2) -> f32 {
    a.x * b.x + a.y * b.y
}

/// Length of a vector.
#[inline]
pub fn length(v: Vec2) -> f32 {
    dot(v, v).sqrt()
}

/// Intersection of segment `p0 → p1` with segment `q0 → q1`.
///
/// Returns the normalized offset `t ∈ [0, 1]` along the first segment, or
/// `None` if they do not cross. Parallel, collinear and zero-length segments
/// never report a hit.
pub fn segment_intersection(p0: Vec2, p1: Vec2, q0: Vec2, q1: Vec2) -> Option<f32> {
    let r = p1 - p0;
    let s = q1 - q0;
    let denom = cross(r, s);
    if denom.abs() < EPSILON {
        return None;
    }

    let qp = q0 - p0;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;

    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then_some(t)
}

/// Intersection of segment `start → end` with a circle.
///
/// Solves the quadratic for the segment parameter and returns the smallest
/// root in `[0, 1]`, or `None` if the segment misses the circle or has zero
/// length.
pub fn ray_circle_intersection(start: Vec2, end: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let d = end - start;
    let f = start - center;

    let a = dot(d, d);
    if a < EPSILON {
        return None;
    }
    let b = 2.0 * dot(f, d);
    let c = dot(f, f) - radius * radius;

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let t1 = (-b - root) / (2.0 * a);
    let t2 = (-b + root) / (2.0 * a);

    [t1, t2]
        .into_iter()
        .filter(|t| (0.0..=1.0).contains(t))
        .reduce(f32::min)
}

/// Calculates the minimum distance between a line segment and a point.
pub fn line_point_distance(line_start: Vec2, line_end: Vec2, point: Vec2) -> f32 {
    let p = Point::from(point);
    let line = Line::new(line_start, line_end);
    Euclidean.distance(&p, &line)
}

/// Corners of a rectangle `width` wide and `height` long centered on
/// `center` and rotated so its length runs along `heading`.
pub fn rectangle_corners(center: Vec2, width: f32, height: f32, heading: f32) -> [Vec2; 4] {
    let forward = heading_vector(heading) * (height * 0.5);
    let left = left_vector(heading) * (width * 0.5);

    [
        center + forward + left,
        center + forward - left,
        center - forward - left,
        center - forward + left,
    ]
}

/// Wraps a position around a world of the given size centered on the origin.
pub fn wrap_around(v: Vec2, width: f32, height: f32) -> Vec2 {
    let half_w = width * 0.5;
    let half_h = height * 0.5;
    vec2(
        (v.x + half_w).rem_euclid(width) - half_w,
        (v.y + half_h).rem_euclid(height) - half_h,
    )
}
