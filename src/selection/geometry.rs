//! Control points and path segments.

use std::fmt;

/// Integer pixel coordinate of a control point or path pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to `other`.
    #[inline]
    pub fn distance_sq(self, other: Point) -> i64 {
        let dx = self.x as i64 - other.x as i64;
        let dy = self.y as i64 - other.y as i64;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A directed piece of the selection path.
///
/// Straight segments hold just their two endpoints; snapped segments hold
/// every pixel along the way. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolyLine {
    points: Vec<Point>,
}

impl PolyLine {
    /// Straight segment from `start` to `end`.
    pub fn new(start: Point, end: Point) -> Self {
        Self {
            points: vec![start, end],
        }
    }

    /// Segment through `points` in order. Returns `None` if `points` is empty.
    pub fn from_points(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self { points })
        }
    }

    #[inline]
    pub fn start(&self) -> Point {
        self.points[0]
    }

    #[inline]
    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Bounding box as `(min_x, min_y, max_x, max_y)`, inclusive.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        self.points.iter().fold(
            (i32::MAX, i32::MAX, i32::MIN, i32::MIN),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        )
    }

    /// Every pixel the segment passes through, in order.
    ///
    /// Consecutive stored points are joined with Bresenham lines, so the
    /// result is 8-connected.
    pub fn pixels(&self) -> Vec<Point> {
        let mut out = vec![self.start()];
        for pair in self.points.windows(2) {
            bresenham(pair[0], pair[1], &mut out);
        }
        out
    }
}

/// Append the pixels of the line `from -> to`, excluding `from`.
pub(crate) fn bresenham(from: Point, to: Point, out: &mut Vec<Point>) {
    let dx = (to.x as i64 - from.x as i64).abs();
    let dy = -(to.y as i64 - from.y as i64).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (from.x, from.y);

    while x != to.x || y != to.y {
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
        out.push(Point::new(x, y));
    }
}
