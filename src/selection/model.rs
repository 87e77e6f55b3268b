//! Selection state machine.
//!
//! Owns the selection path, the undo history and the active segment tool,
//! and decides which mutations are legal in which [`SelectionState`]. Every
//! committed change is announced to listeners: first a
//! [`SelectionEvent::Selection`] carrying the new path, then a
//! [`SelectionEvent::State`] if the state changed.

use std::io::Write;

use ndarray::ArrayView3;
use tracing::{debug, trace};

use crate::config::SelectorConfig;
use crate::error::{Error, Result};

use super::events::{EventKind, ListenerId, Listeners, SelectionEvent};
use super::geometry::{Point, PolyLine};
use super::history::{Edit, History, Reconnection};
use super::mask;
use super::path::SelectionPath;
use super::task::{SegmentTask, TaskStatus};
use super::tools::{PointToPoint, SegmentJob, SegmentTool};
use super::SelectionState;

/// A segment being computed in the background.
struct Pending {
    task: SegmentTask,
    /// Whether committing it finishes the selection.
    closing: bool,
}

/// An in-progress or finished selection, traced with a [`SegmentTool`].
pub struct SelectionModel {
    path: SelectionPath,
    state: SelectionState,
    tool: Box<dyn SegmentTool>,
    history: History<Edit>,
    pending: Option<Pending>,
    listeners: Listeners,
}

impl SelectionModel {
    pub fn new(tool: impl SegmentTool + 'static) -> Self {
        Self::with_config(tool, &SelectorConfig::default())
    }

    pub fn with_config(tool: impl SegmentTool + 'static, config: &SelectorConfig) -> Self {
        Self {
            path: SelectionPath::new(),
            state: SelectionState::NoSelection,
            tool: Box::new(tool),
            history: History::new(config.history_limit),
            pending: None,
            listeners: Listeners::default(),
        }
    }

    /// A model that connects points with straight lines.
    pub fn point_to_point() -> Self {
        Self::new(PointToPoint)
    }

    // ------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------

    #[inline]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    #[inline]
    pub fn path(&self) -> &SelectionPath {
        &self.path
    }

    #[inline]
    pub fn segments(&self) -> &[PolyLine] {
        self.path.segments()
    }

    #[inline]
    pub fn start(&self) -> Option<Point> {
        self.path.start()
    }

    /// The point a new segment would start from.
    pub fn last_point(&self) -> Option<Point> {
        self.path.last_point()
    }

    pub fn control_points(&self) -> Vec<Point> {
        self.path.control_points()
    }

    pub fn tool_name(&self) -> &str {
        self.tool.name()
    }

    pub fn can_undo(&self) -> bool {
        self.state != SelectionState::Processing && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.state != SelectionState::Processing && self.history.can_redo()
    }

    /// Index of the control point closest to `p` within `max_distance_sq`.
    pub fn closest_point(&self, p: Point, max_distance_sq: i64) -> Option<usize> {
        self.control_points()
            .into_iter()
            .enumerate()
            .map(|(i, point)| (i, point.distance_sq(p)))
            .filter(|&(_, d)| d <= max_distance_sq)
            .min_by_key(|&(_, d)| d)
            .map(|(i, _)| i)
    }

    pub fn subscribe<F>(&mut self, kind: Option<EventKind>, callback: F) -> ListenerId
    where
        F: FnMut(&SelectionEvent<'_>) + Send + 'static,
    {
        self.listeners.subscribe(kind, callback)
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.unsubscribe(id)
    }

    /// Preview segment from the last point to `p`. Does not mutate anything.
    pub fn live_wire(&self, p: Point) -> Result<PolyLine> {
        let from = self
            .last_point()
            .ok_or_else(|| Error::illegal_state("live wire", self.state))?;
        Ok(self.tool.live_wire(from, p))
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Swap the segment tool, keeping the current selection.
    pub fn set_tool(&mut self, tool: impl SegmentTool + 'static) -> Result<()> {
        self.require_not_processing("set tool")?;
        debug!(from = self.tool.name(), to = tool.name(), "switching segment tool");
        self.tool = Box::new(tool);
        Ok(())
    }

    /// Place a control point: sets the anchor, or appends a segment to it.
    pub fn add_point(&mut self, p: Point) -> Result<()> {
        match self.state {
            SelectionState::NoSelection => {
                self.tool.validate(p)?;
                self.path.set_anchor(p);
                self.record(Edit::Anchor(p));
                self.emit_selection();
                self.set_state(SelectionState::Selecting);
                Ok(())
            }
            SelectionState::Selecting => self.begin_segment(p, false),
            state => Err(Error::illegal_state("add point", state)),
        }
    }

    /// Close the path back to its anchor. Needs at least one segment.
    pub fn finish(&mut self) -> Result<()> {
        if self.state != SelectionState::Selecting || self.path.is_empty() {
            return Err(Error::illegal_state("finish", self.state));
        }
        let start = self
            .path
            .start()
            .ok_or_else(|| Error::illegal_state("finish", self.state))?;
        self.begin_segment(start, true)
    }

    /// Move control point `index` of a finished path to `new_pos`, rewiring
    /// the segment that ends there and the one that starts there.
    pub fn move_point(&mut self, index: usize, new_pos: Point) -> Result<()> {
        if !self.state.is_finished() {
            return Err(Error::illegal_state("move point", self.state));
        }
        let before = self
            .path
            .reconnection(index)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid segment index {index}")))?;

        let after = Reconnection {
            start: if index == 0 { new_pos } else { before.start },
            incoming: self.tool.live_wire(before.incoming.start(), new_pos),
            outgoing: self.tool.live_wire(new_pos, before.outgoing.end()),
        };
        self.path.reconnect(index, after.clone());
        self.record(Edit::Move {
            index,
            before,
            after,
        });
        self.emit_selection();
        Ok(())
    }

    /// Revert the most recent edit. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool> {
        self.require_not_processing("undo")?;
        let Some(edit) = self.history.undo() else {
            return Ok(false);
        };
        trace!(?edit, "undo");
        let state = edit.revert(&mut self.path);
        self.emit_selection();
        self.set_state(state);
        Ok(true)
    }

    /// Re-apply the most recently undone edit.
    pub fn redo(&mut self) -> Result<bool> {
        self.require_not_processing("redo")?;
        let Some(edit) = self.history.redo() else {
            return Ok(false);
        };
        trace!(?edit, "redo");
        let state = edit.apply(&mut self.path);
        self.emit_selection();
        self.set_state(state);
        Ok(true)
    }

    /// Discard the path, its history and any in-flight segment.
    pub fn reset(&mut self) {
        if let Some(mut pending) = self.pending.take() {
            pending.task.cancel();
        }
        self.path.clear();
        self.history.clear();
        self.emit_selection();
        self.set_state(SelectionState::NoSelection);
    }

    /// Abandon the segment being computed.
    ///
    /// Returns true if it was discarded. If the computation finished first,
    /// its segment is committed instead and false is returned.
    pub fn cancel_processing(&mut self) -> bool {
        let Some(mut pending) = self.pending.take() else {
            return false;
        };
        match pending.task.cancel() {
            TaskStatus::Completed(segment) => {
                self.commit(segment, pending.closing);
                false
            }
            TaskStatus::Cancelled | TaskStatus::Running(_) => {
                self.set_state(SelectionState::Selecting);
                true
            }
        }
    }

    /// Collect the outcome of a background segment, if it is ready, and
    /// forward progress reports. Never blocks.
    pub fn poll(&mut self) -> SelectionState {
        if let Some(mut pending) = self.pending.take() {
            match pending.task.poll() {
                TaskStatus::Running(progress) => {
                    self.pending = Some(pending);
                    if let Some(percent) = progress {
                        self.listeners.emit(&SelectionEvent::Progress(percent));
                    }
                }
                status => self.settle(status, pending.closing),
            }
        }
        self.state
    }

    /// Block until the background segment, if any, is committed or discarded.
    pub fn wait_for_segment(&mut self) -> SelectionState {
        if let Some(mut pending) = self.pending.take() {
            let status = pending.task.wait();
            self.settle(status, pending.closing);
        }
        self.state
    }

    /// Encode the pixels of `image` enclosed by the finished path as PNG.
    pub fn save_selection<W: Write>(&self, image: ArrayView3<u8>, writer: W) -> Result<()> {
        if !self.state.is_finished() {
            return Err(Error::illegal_state("save selection", self.state));
        }
        let rgba = mask::extract_selection(image, &self.path)?;
        mask::write_png(rgba.view(), writer)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn begin_segment(&mut self, to: Point, closing: bool) -> Result<()> {
        let from = self
            .last_point()
            .ok_or_else(|| Error::illegal_state("add point", self.state))?;
        match self.tool.begin_segment(from, to)? {
            SegmentJob::Ready(segment) => self.commit(segment, closing),
            SegmentJob::Pending(task) => {
                debug!(tool = self.tool.name(), %from, %to, "segment computing in background");
                self.pending = Some(Pending { task, closing });
                self.set_state(SelectionState::Processing);
            }
        }
        Ok(())
    }

    fn settle(&mut self, status: TaskStatus, closing: bool) {
        match status {
            TaskStatus::Completed(segment) => self.commit(segment, closing),
            TaskStatus::Cancelled | TaskStatus::Running(_) => {
                self.set_state(SelectionState::Selecting)
            }
        }
    }

    fn commit(&mut self, segment: PolyLine, closing: bool) {
        self.path.push(segment.clone());
        let (edit, state) = if closing {
            (Edit::Close(segment), SelectionState::Selected)
        } else {
            (Edit::Append(segment), SelectionState::Selecting)
        };
        self.record(edit);
        self.emit_selection();
        self.set_state(state);
    }

    fn record(&mut self, edit: Edit) {
        trace!(?edit, "edit committed");
        self.history.record(edit);
    }

    fn require_not_processing(&self, operation: &'static str) -> Result<()> {
        if self.state == SelectionState::Processing {
            Err(Error::illegal_state(operation, self.state))
        } else {
            Ok(())
        }
    }

    fn emit_selection(&mut self) {
        self.listeners
            .emit(&SelectionEvent::Selection(self.path.segments()));
    }

    fn set_state(&mut self, new: SelectionState) {
        let old = self.state;
        if old == new {
            return;
        }
        self.state = new;
        debug!(%old, %new, "selection state changed");
        self.listeners.emit(&SelectionEvent::State { old, new });
    }
}

impl Default for SelectionModel {
    fn default() -> Self {
        Self::point_to_point()
    }
}

impl std::fmt::Debug for SelectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionModel")
            .field("state", &self.state)
            .field("tool", &self.tool.name())
            .field("path", &self.path)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
