//! Geometric primitives shared by the layout policies

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

/// A 2D point in view-plane coordinates (x = right, y = up)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: Point2) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Round both coordinates to a fixed number of decimal places.
    ///
    /// Used to stabilize side/order comparisons against floating noise
    /// when classifying leader ends.
    pub fn rounded(&self, decimals: u32) -> Point2 {
        let f = 10f64.powi(decimals as i32);
        Point2::new((self.x * f).round() / f, (self.y * f).round() / f)
    }

    /// Lift into 3D at z = 0
    pub fn to_3d(&self) -> Point3 {
        Point3::new(self.x, self.y, 0.0)
    }
}

impl Add for Point2 {
    type Output = Point2;
    fn add(self, rhs: Point2) -> Point2 {
        Point2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2 {
    type Output = Point2;
    fn sub(self, rhs: Point2) -> Point2 {
        Point2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Div<f64> for Point2 {
    type Output = Point2;
    fn div(self, rhs: f64) -> Point2 {
        Point2::new(self.x / rhs, self.y / rhs)
    }
}

/// A 3D point or vector in model coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Drop the z component
    pub fn to_2d(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    pub fn dot(&self, other: Point3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Euclidean length when interpreted as a vector
    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    /// True when every component is within `tol` of zero
    pub fn is_zero(&self, tol: f64) -> bool {
        self.x.abs() <= tol && self.y.abs() <= tol && self.z.abs() <= tol
    }
}

impl Add for Point3 {
    type Output = Point3;
    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Point3;
    fn mul(self, rhs: f64) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Point3 {
    type Output = Point3;
    fn div(self, rhs: f64) -> Point3 {
        Point3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

/// An affine frame with an orthonormal basis, mapping frame-local
/// coordinates to world (model) coordinates.
///
/// The inverse mapping relies on the basis being orthonormal, so the
/// rotational part inverts by transposition. This matches the crop-box
/// transform contract of the host: right/up/normal are unit vectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub origin: Point3,
    pub basis_x: Point3,
    pub basis_y: Point3,
    pub basis_z: Point3,
}

impl Transform {
    /// The identity frame at the world origin
    pub fn identity() -> Self {
        Self {
            origin: Point3::default(),
            basis_x: Point3::new(1.0, 0.0, 0.0),
            basis_y: Point3::new(0.0, 1.0, 0.0),
            basis_z: Point3::new(0.0, 0.0, 1.0),
        }
    }

    /// A frame translated from the identity
    pub fn translation(origin: Point3) -> Self {
        Self {
            origin,
            ..Self::identity()
        }
    }

    /// Map a frame-local point into world coordinates
    pub fn apply_point(&self, p: Point3) -> Point3 {
        self.origin + self.apply_vector(p)
    }

    /// Map a frame-local vector into world coordinates (no translation)
    pub fn apply_vector(&self, v: Point3) -> Point3 {
        self.basis_x * v.x + self.basis_y * v.y + self.basis_z * v.z
    }

    /// Map a world point into frame-local coordinates
    pub fn invert_point(&self, p: Point3) -> Point3 {
        let d = p - self.origin;
        Point3::new(d.dot(self.basis_x), d.dot(self.basis_y), d.dot(self.basis_z))
    }

    /// Map a world vector into frame-local coordinates
    pub fn invert_vector(&self, v: Point3) -> Point3 {
        Point3::new(v.dot(self.basis_x), v.dot(self.basis_y), v.dot(self.basis_z))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Orientation of the ordered triple (a, b, c): positive = counter-clockwise
fn orient(a: Point2, b: Point2, c: Point2) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn on_segment(a: Point2, b: Point2, p: Point2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Test whether segments `a1-a2` and `b1-b2` intersect, including
/// collinear overlap and shared endpoints.
pub fn segments_intersect(a1: Point2, a2: Point2, b1: Point2, b2: Point2) -> bool {
    let d1 = orient(b1, b2, a1);
    let d2 = orient(b1, b2, a2);
    let d3 = orient(a1, a2, b1);
    let d4 = orient(a1, a2, b2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    // Collinear cases: an endpoint lying on the other segment
    (d1 == 0.0 && on_segment(b1, b2, a1))
        || (d2 == 0.0 && on_segment(b1, b2, a2))
        || (d3 == 0.0 && on_segment(a1, a2, b1))
        || (d4 == 0.0 && on_segment(a1, a2, b2))
}

/// Ray-casting point-in-polygon test.
///
/// Points exactly on an edge may fall on either side; callers that care
/// about boundary points should not (the spatial-tag containment check
/// only needs to catch anchors that clearly left their region).
pub fn point_in_polygon(point: Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y)
            && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
