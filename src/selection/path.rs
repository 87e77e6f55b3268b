//! The geometric description of a selection boundary.
//!
//! `segments[0]` starts at the anchor and every segment ends where the next
//! one starts. A finished path stores its closing segment last, so that
//! segment ends back at the anchor and the predecessor of segment 0 is the
//! last segment.

use super::geometry::{Point, PolyLine};
use super::history::Reconnection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPath {
    start: Option<Point>,
    segments: Vec<PolyLine>,
}

impl SelectionPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closed polygon through `points` joined by straight segments.
    /// Needs at least two points.
    pub fn from_control_points(points: &[Point]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let mut segments: Vec<PolyLine> = points
            .windows(2)
            .map(|pair| PolyLine::new(pair[0], pair[1]))
            .collect();
        segments.push(PolyLine::new(points[points.len() - 1], points[0]));
        Some(Self {
            start: Some(points[0]),
            segments,
        })
    }

    /// Anchor where the path begins, if any point was placed.
    #[inline]
    pub fn start(&self) -> Option<Point> {
        self.start
    }

    #[inline]
    pub fn segments(&self) -> &[PolyLine] {
        &self.segments
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// End of the last segment, or the anchor if there are no segments.
    pub fn last_point(&self) -> Option<Point> {
        self.segments.last().map(PolyLine::end).or(self.start)
    }

    /// The control points: the start of every segment, plus the end of the
    /// last one when the path is still open.
    pub fn control_points(&self) -> Vec<Point> {
        let mut points: Vec<Point> = self.segments.iter().map(PolyLine::start).collect();
        match (self.segments.last(), self.start) {
            (Some(last), Some(start)) if last.end() != start => points.push(last.end()),
            (None, Some(start)) => points.push(start),
            _ => {}
        }
        points
    }

    /// Index of the segment that starts at `index`'s predecessor control
    /// point, wrapping to the last segment for index 0.
    pub(crate) fn predecessor(&self, index: usize) -> usize {
        if index == 0 {
            self.segments.len() - 1
        } else {
            index - 1
        }
    }

    /// The anchor and the two segments adjacent to control point `index`.
    pub(crate) fn reconnection(&self, index: usize) -> Option<Reconnection> {
        let outgoing = self.segments.get(index)?.clone();
        let incoming = self.segments.get(self.predecessor(index))?.clone();
        Some(Reconnection {
            start: self.start?,
            incoming,
            outgoing,
        })
    }

    pub(crate) fn set_anchor(&mut self, point: Point) {
        self.segments.clear();
        self.start = Some(point);
    }

    pub(crate) fn push(&mut self, segment: PolyLine) {
        debug_assert_eq!(self.last_point(), Some(segment.start()));
        self.segments.push(segment);
    }

    pub(crate) fn pop(&mut self) -> Option<PolyLine> {
        self.segments.pop()
    }

    /// Replace the two segments around control point `index` and the anchor.
    /// Two element writes; the rest of the path is untouched.
    pub(crate) fn reconnect(&mut self, index: usize, with: Reconnection) {
        let previous = self.predecessor(index);
        self.segments[previous] = with.incoming;
        self.segments[index] = with.outgoing;
        self.start = Some(with.start);
        debug_assert!(self.is_connected());
    }

    pub(crate) fn clear(&mut self) {
        self.start = None;
        self.segments.clear();
    }

    /// Whether the closure invariant holds between consecutive segments.
    pub fn is_connected(&self) -> bool {
        let anchored = match (self.start, self.segments.first()) {
            (Some(start), Some(first)) => first.start() == start,
            (_, None) => true,
            (None, Some(_)) => false,
        };
        anchored
            && self
                .segments
                .windows(2)
                .all(|pair| pair[0].end() == pair[1].start())
    }

    /// Whether the last segment ends back at the anchor.
    pub fn is_closed(&self) -> bool {
        match (self.start, self.segments.last()) {
            (Some(start), Some(last)) => last.end() == start,
            _ => false,
        }
    }

    /// Bounding box over all segments, `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> Option<(i32, i32, i32, i32)> {
        self.segments
            .iter()
            .map(PolyLine::bounds)
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> SelectionPath {
        let corners = [(0, 0), (10, 0), (10, 10), (0, 10)].map(|(x, y)| Point::new(x, y));
        let mut path = SelectionPath::new();
        path.set_anchor(corners[0]);
        for pair in corners.windows(2) {
            path.push(PolyLine::new(pair[0], pair[1]));
        }
        path.push(PolyLine::new(corners[3], corners[0]));
        path
    }

    #[test]
    fn test_closed_square() {
        let path = square();
        assert_eq!(path.len(), 4);
        assert!(path.is_connected());
        assert!(path.is_closed());
        assert_eq!(path.control_points().len(), 4);
        assert_eq!(path.bounds(), Some((0, 0, 10, 10)));
    }

    #[test]
    fn test_open_control_points() {
        let mut path = SelectionPath::new();
        path.set_anchor(Point::new(1, 1));
        assert_eq!(path.control_points(), vec![Point::new(1, 1)]);

        path.push(PolyLine::new(Point::new(1, 1), Point::new(4, 1)));
        assert_eq!(
            path.control_points(),
            vec![Point::new(1, 1), Point::new(4, 1)]
        );
        assert_eq!(path.last_point(), Some(Point::new(4, 1)));
    }

    #[test]
    fn test_from_control_points() {
        let corners = [Point::new(0, 0), Point::new(10, 0), Point::new(10, 10), Point::new(0, 10)];
        let path = SelectionPath::from_control_points(&corners).unwrap();

        assert_eq!(path, square());
        assert!(SelectionPath::from_control_points(&corners[..1]).is_none());
    }

    #[test]
    fn test_predecessor_wraps() {
        let path = square();
        assert_eq!(path.predecessor(0), 3);
        assert_eq!(path.predecessor(2), 1);
    }
}
