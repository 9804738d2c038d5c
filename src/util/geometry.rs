//! Minimal vector math used by routing and placement.
//!
//! Regions live in the x/y plane; the waypoint graph may use all three axes.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    #[serde(default)]
    pub z: f32,
}

impl Vec3 {
    /// The origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    /// Construct a vector.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Construct a point in the x/y plane.
    pub const fn xy(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// True if every coordinate is finite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f32 {
        self.x.mul_add(other.x, self.y.mul_add(other.y, self.z * other.z))
    }

    /// Euclidean length.
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f32::EPSILON {
            return Self::ZERO;
        }
        self * (1.0 / len)
    }

    /// Linear interpolation toward `other`; `t` is not clamped.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Closest point to `point` on the finite segment `start..end`.
///
/// The projection is clamped to the segment, so the result never lies beyond
/// either endpoint. A degenerate segment yields `start`.
pub fn closest_point_on_segment(point: Vec3, start: Vec3, end: Vec3) -> Vec3 {
    let direction = end - start;
    let length = direction.length();
    let direction = direction.normalized();
    let projected = (point - start).dot(direction).clamp(0.0, length);
    start + direction * projected
}

/// Total length of a polyline.
pub fn polyline_length(points: &[Vec3]) -> f32 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Point at `progress` (0..=1) along a polyline, with the index of the
/// segment it falls on.
pub fn point_along(points: &[Vec3], progress: f32) -> Option<(Vec3, usize)> {
    let first = *points.first()?;
    let total = polyline_length(points);
    if points.len() == 1 || total <= f32::EPSILON {
        return Some((first, 0));
    }

    let mut remaining = progress.clamp(0.0, 1.0) * total;
    for (i, w) in points.windows(2).enumerate() {
        let seg = w[0].distance(w[1]);
        if remaining <= seg {
            let t = if seg <= f32::EPSILON { 0.0 } else { remaining / seg };
            return Some((w[0].lerp(w[1], t), i));
        }
        remaining -= seg;
    }
    points.last().map(|p| (*p, points.len() - 2))
}

/// Axis-aligned rectangle in the x/y plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x.
    pub x: f32,
    /// Minimum y.
    pub y: f32,
    /// Extent along x.
    pub width: f32,
    /// Extent along y.
    pub height: f32,
}

impl Rect {
    /// Construct a rectangle from its minimum corner and size.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Inclusive containment test on x/y.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Point at normalized coordinates `(u, v)` inside the rectangle.
    pub fn at(&self, u: f32, v: f32) -> Vec3 {
        Vec3::xy(self.width.mul_add(u, self.x), self.height.mul_add(v, self.y))
    }

    /// Normalized coordinates of `p` relative to the rectangle.
    pub fn normalize(&self, p: Vec3) -> (f32, f32) {
        let u = if self.width > 0.0 { (p.x - self.x) / self.width } else { 0.0 };
        let v = if self.height > 0.0 { (p.y - self.y) / self.height } else { 0.0 };
        (u, v)
    }

    /// True if the rectangle has finite coordinates and positive area.
    pub fn is_valid(&self) -> bool {
        self.width > 0.0
            && self.height > 0.0
            && self.width.is_finite()
            && self.height.is_finite()
            && self.x.is_finite()
            && self.y.is_finite()
    }
}
