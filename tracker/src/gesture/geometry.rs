//! Planar geometry helpers over normalized frame coordinates.

/// A 2-D point in normalized frame space (x, y in [0, 1], origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Euclidean distance between two 2-D points.
pub fn distance(a: &Point2, b: &Point2) -> f32 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    (dx * dx + dy * dy).sqrt()
}

/// Midpoint of two points.
pub fn centroid(a: &Point2, b: &Point2) -> Point2 {
    Point2 {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Linear interpolation from `a` towards `b` by factor `t`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
