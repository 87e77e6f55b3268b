//! Graph primitives used by boundary snapping.
//!
//! - **Indexed min priority queue**: binary heap plus key index, with
//!   in-place priority updates
//! - **Shortest path**: Dijkstra search driven by the queue, with cancellation
//!   and progress hooks

pub mod min_queue;
pub mod shortest_path;

pub use min_queue::IndexedMinPriorityQueue;
pub use shortest_path::{find_path, Graph, SearchControl, SearchOutcome};
