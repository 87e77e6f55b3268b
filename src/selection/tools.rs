//! Segment strategies used by the selection model.

use crate::error::Result;

use super::geometry::{Point, PolyLine};
use super::task::SegmentTask;

/// How a new segment comes into being.
pub enum SegmentJob {
    /// The segment is available immediately.
    Ready(PolyLine),
    /// The segment is computed in the background; the model is `Processing`
    /// until the task settles.
    Pending(SegmentTask),
}

/// Strategy that turns two control points into a path segment.
pub trait SegmentTool: Send {
    /// Short name for logs and UI.
    fn name(&self) -> &str;

    /// Check that `point` can be used as a control point. Called for the
    /// anchor; later points are checked by `begin_segment`.
    fn validate(&self, _point: Point) -> Result<()> {
        Ok(())
    }

    /// Preview segment from `from` to `to`. Must not block on heavy work.
    fn live_wire(&self, from: Point, to: Point) -> PolyLine;

    /// Start producing the committed segment from `from` to `to`.
    fn begin_segment(&self, from: Point, to: Point) -> Result<SegmentJob>;
}

/// Connects each new point to the previous one with a straight line.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointToPoint;

impl SegmentTool for PointToPoint {
    fn name(&self) -> &str {
        "point-to-point"
    }

    fn live_wire(&self, from: Point, to: Point) -> PolyLine {
        PolyLine::new(from, to)
    }

    fn begin_segment(&self, from: Point, to: Point) -> Result<SegmentJob> {
        Ok(SegmentJob::Ready(self.live_wire(from, to)))
    }
}
