//! Intelligent scissors: segments that snap to image edges.
//!
//! Each image pixel is a graph vertex joined to its 8 neighbors. Stepping onto
//! a pixel costs its edge weight, scaled by 5 for orthogonal steps and 7 for
//! diagonal ones, and a segment is the least-cost path between two control
//! points. Paths are computed on the rayon pool so the selection model stays
//! responsive while `Processing`.

pub mod weights;

use std::sync::Arc;

use ndarray::{Array2, ArrayView3};
use tracing::debug;

use crate::config::SelectorConfig;
use crate::error::{Error, Result};
use crate::graph::{find_path, Graph, SearchControl, SearchOutcome};
use crate::selection::{Point, PolyLine, SegmentJob, SegmentTask, SegmentTool};

pub use weights::{gradient_magnitude, pixel_costs, Weight};

const ORTHOGONAL_STEP: i64 = 5;
const DIAGONAL_STEP: i64 = 7;

const NEIGHBORS: [(i32, i32, i64); 8] = [
    (1, 0, ORTHOGONAL_STEP),
    (1, 1, DIAGONAL_STEP),
    (0, 1, ORTHOGONAL_STEP),
    (-1, 1, DIAGONAL_STEP),
    (-1, 0, ORTHOGONAL_STEP),
    (-1, -1, DIAGONAL_STEP),
    (0, -1, ORTHOGONAL_STEP),
    (1, -1, DIAGONAL_STEP),
];

/// Pixel-adjacency graph weighted by per-pixel costs.
#[derive(Debug, Clone)]
pub struct CostMap {
    costs: Array2<u32>,
}

impl CostMap {
    /// Build from an image with 1, 3, or 4 channels.
    pub fn from_image(image: ArrayView3<u8>, weight: Weight) -> Result<Self> {
        Ok(Self {
            costs: pixel_costs(image, weight)?,
        })
    }

    /// Use precomputed costs (height, width).
    pub fn from_costs(costs: Array2<u32>) -> Self {
        Self { costs }
    }

    pub fn width(&self) -> usize {
        self.costs.ncols()
    }

    pub fn height(&self) -> usize {
        self.costs.nrows()
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= 0 && p.y >= 0 && (p.x as usize) < self.width() && (p.y as usize) < self.height()
    }

    #[inline]
    fn cost(&self, p: Point) -> i64 {
        self.costs[[p.y as usize, p.x as usize]] as i64
    }

    fn check(&self, p: Point) -> Result<()> {
        if self.contains(p) {
            Ok(())
        } else {
            Err(Error::InvalidArgument(format!(
                "point {p} outside {}x{} image",
                self.width(),
                self.height()
            )))
        }
    }
}

impl Graph for CostMap {
    type Vertex = Point;

    fn vertex_count(&self) -> usize {
        self.costs.len()
    }

    fn neighbors(&self, vertex: Point, out: &mut Vec<(Point, i64)>) {
        for &(dx, dy, step) in &NEIGHBORS {
            let next = Point::new(vertex.x + dx, vertex.y + dy);
            if self.contains(next) {
                out.push((next, step * self.cost(next)));
            }
        }
    }
}

/// Least-cost pixel path from `from` to `to`, computed synchronously.
pub fn scissors_path(costs: &CostMap, from: Point, to: Point) -> Result<PolyLine> {
    costs.check(from)?;
    costs.check(to)?;
    match find_path(costs, from, to, SearchControl::none()) {
        SearchOutcome::Found(points) => PolyLine::from_points(points)
            .ok_or_else(|| Error::InvalidArgument("empty path".into())),
        SearchOutcome::Unreachable | SearchOutcome::Cancelled => Err(Error::InvalidArgument(
            format!("no path from {from} to {to}"),
        )),
    }
}

/// Segment tool that snaps each segment to the strongest nearby edges.
#[derive(Debug, Clone)]
pub struct ScissorsTool {
    costs: Arc<CostMap>,
    weight: Weight,
    progress_interval: usize,
}

impl ScissorsTool {
    pub fn new(image: ArrayView3<u8>, weight: Weight) -> Result<Self> {
        Self::with_config(image, &SelectorConfig::default().with_weight(weight))
    }

    pub fn with_config(image: ArrayView3<u8>, config: &SelectorConfig) -> Result<Self> {
        let costs = CostMap::from_image(image, config.weight)?;
        debug!(
            weight = %config.weight,
            width = costs.width(),
            height = costs.height(),
            "scissors cost map ready"
        );
        Ok(Self {
            costs: Arc::new(costs),
            weight: config.weight,
            progress_interval: config.progress_interval,
        })
    }

    pub fn from_cost_map(costs: CostMap, config: &SelectorConfig) -> Self {
        Self {
            costs: Arc::new(costs),
            weight: config.weight,
            progress_interval: config.progress_interval,
        }
    }

    pub fn weight(&self) -> Weight {
        self.weight
    }

    pub fn cost_map(&self) -> &CostMap {
        &self.costs
    }
}

impl SegmentTool for ScissorsTool {
    fn name(&self) -> &str {
        self.weight.as_str()
    }

    /// Straight preview; snapping a live wire on every cursor move is too slow.
    fn live_wire(&self, from: Point, to: Point) -> PolyLine {
        PolyLine::new(from, to)
    }

    fn validate(&self, point: Point) -> Result<()> {
        self.costs.check(point)
    }

    fn begin_segment(&self, from: Point, to: Point) -> Result<SegmentJob> {
        self.costs.check(from)?;
        self.costs.check(to)?;

        let costs = Arc::clone(&self.costs);
        let interval = self.progress_interval;
        let task = SegmentTask::spawn(move |ctx| {
            let control = SearchControl::none()
                .with_cancel(ctx.cancel_flag())
                .with_check_interval(interval)
                .with_progress(|percent| ctx.report(percent));
            match find_path(costs.as_ref(), from, to, control) {
                SearchOutcome::Found(points) => PolyLine::from_points(points),
                SearchOutcome::Unreachable | SearchOutcome::Cancelled => None,
            }
        });
        Ok(SegmentJob::Pending(task))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{SelectionModel, SelectionState};
    use ndarray::Array3;

    /// Uniform costs everywhere except a cheap horizontal corridor at `row`.
    fn corridor(width: usize, height: usize, row: usize) -> CostMap {
        let mut costs = Array2::<u32>::from_elem((height, width), 100);
        for x in 0..width {
            costs[[row, x]] = 1;
        }
        CostMap::from_costs(costs)
    }

    #[test]
    fn test_path_follows_corridor() {
        let map = corridor(20, 9, 4);
        let path = scissors_path(&map, Point::new(0, 3), Point::new(19, 3)).unwrap();

        assert_eq!(path.start(), Point::new(0, 3));
        assert_eq!(path.end(), Point::new(19, 3));
        let on_corridor = path.points().iter().filter(|p| p.y == 4).count();
        assert!(on_corridor >= 15);
        for pair in path.points().windows(2) {
            assert!(pair[0].distance_sq(pair[1]) <= 2);
        }
    }

    #[test]
    fn test_point_outside_rejected() {
        let map = corridor(5, 5, 2);
        assert!(matches!(
            scissors_path(&map, Point::new(0, 0), Point::new(5, 0)),
            Err(Error::InvalidArgument(_))
        ));

        let tool = ScissorsTool::from_cost_map(map, &SelectorConfig::default());
        assert!(matches!(
            tool.begin_segment(Point::new(-1, 0), Point::new(1, 1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_scissors_model_round_trip() {
        let mut image = Array3::<u8>::zeros((16, 16, 3));
        for y in 4..12 {
            for x in 4..12 {
                for c in 0..3 {
                    image[[y, x, c]] = 255;
                }
            }
        }
        let tool = ScissorsTool::new(image.view(), Weight::CrossGradMono).unwrap();
        let mut model = SelectionModel::new(tool);

        model.add_point(Point::new(4, 4)).unwrap();
        for p in [Point::new(11, 4), Point::new(11, 11), Point::new(4, 11)] {
            model.add_point(p).unwrap();
            assert_eq!(model.state(), SelectionState::Processing);
            assert_eq!(model.wait_for_segment(), SelectionState::Selecting);
        }
        model.finish().unwrap();
        assert_eq!(model.wait_for_segment(), SelectionState::Selected);

        assert_eq!(model.segments().len(), 4);
        assert!(model.path().is_connected());
        assert!(model.path().is_closed());
        assert!(model.segments()[0].points().len() > 2);
    }

    #[test]
    fn test_cancelled_search_discards() {
        let map = corridor(64, 64, 10);
        let config = SelectorConfig::default().with_progress_interval(1);
        let tool = ScissorsTool::from_cost_map(map, &config);
        let mut model = SelectionModel::with_config(tool, &config);

        model.add_point(Point::new(0, 0)).unwrap();
        model.add_point(Point::new(63, 63)).unwrap();
        let discarded = model.cancel_processing();

        assert_eq!(model.state(), SelectionState::Selecting);
        assert_eq!(model.segments().len(), if discarded { 0 } else { 1 });
    }

    #[test]
    fn test_anchor_outside_image_rejected() {
        let tool = ScissorsTool::from_cost_map(corridor(8, 8, 3), &SelectorConfig::default());
        let mut model = SelectionModel::new(tool);

        assert!(matches!(
            model.add_point(Point::new(8, 2)),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(model.state(), SelectionState::NoSelection);
        assert_eq!(model.start(), None);

        model.add_point(Point::new(7, 2)).unwrap();
        assert_eq!(model.state(), SelectionState::Selecting);
    }

    #[test]
    fn test_two_channel_image_rejected() {
        let image = Array3::<u8>::zeros((6, 6, 2));
        assert!(matches!(
            ScissorsTool::new(image.view(), Weight::CrossGradMono),
            Err(Error::InvalidArgument(_))
        ));
        assert!(CostMap::from_image(image.view(), Weight::ColorBand).is_err());
    }
}
