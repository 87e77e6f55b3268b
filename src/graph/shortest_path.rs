//! Single-pair shortest path search (Dijkstra) over an abstract graph.
//!
//! The search is the only place the crate relaxes distances through an
//! [`IndexedMinPriorityQueue`]: vertices are seeded and relaxed with
//! `add_or_update` and settled with `remove`.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use super::min_queue::IndexedMinPriorityQueue;

/// A directed graph with non-negative integer edge weights.
pub trait Graph {
    type Vertex: Copy + Eq + Hash;

    /// Number of vertices, used only to estimate progress.
    fn vertex_count(&self) -> usize;

    /// Push every outgoing edge of `vertex` as `(neighbor, weight)` onto `out`.
    fn neighbors(&self, vertex: Self::Vertex, out: &mut Vec<(Self::Vertex, i64)>);
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<V> {
    /// Vertices from source to target inclusive.
    Found(Vec<V>),
    /// The target cannot be reached from the source.
    Unreachable,
    /// The cancellation flag was raised before the target was settled.
    Cancelled,
}

/// Cancellation and progress hooks for a running search.
pub struct SearchControl<'a> {
    cancel: Option<&'a AtomicBool>,
    progress: Option<Box<dyn FnMut(u8) + 'a>>,
    check_interval: usize,
}

impl<'a> SearchControl<'a> {
    /// No cancellation, no progress reports.
    pub fn none() -> Self {
        Self {
            cancel: None,
            progress: None,
            check_interval: 4096,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_progress(mut self, progress: impl FnMut(u8) + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Settled vertices between two cancellation checks / progress reports.
    pub fn with_check_interval(mut self, interval: usize) -> Self {
        self.check_interval = interval.max(1);
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|flag| flag.load(Ordering::Acquire))
    }

    fn report(&mut self, percent: u8) {
        if let Some(progress) = self.progress.as_mut() {
            progress(percent);
        }
    }
}

/// Find a least-cost path from `source` to `target`.
pub fn find_path<G: Graph>(
    graph: &G,
    source: G::Vertex,
    target: G::Vertex,
    mut control: SearchControl<'_>,
) -> SearchOutcome<G::Vertex> {
    let mut frontier = IndexedMinPriorityQueue::new();
    let mut distance: HashMap<G::Vertex, i64> = HashMap::new();
    let mut previous: HashMap<G::Vertex, G::Vertex> = HashMap::new();
    let mut settled: HashSet<G::Vertex> = HashSet::new();
    let mut edges = Vec::with_capacity(8);
    let total = graph.vertex_count().max(1);

    distance.insert(source, 0);
    frontier.add_or_update(source, 0);

    while let Ok(vertex) = frontier.remove() {
        settled.insert(vertex);

        if vertex == target {
            control.report(100);
            debug!(settled = settled.len(), "shortest path found");
            return SearchOutcome::Found(trace_back(&previous, source, target));
        }

        if settled.len() % control.check_interval == 0 {
            if control.cancelled() {
                debug!(settled = settled.len(), "shortest path search cancelled");
                return SearchOutcome::Cancelled;
            }
            let percent = (settled.len() * 100 / total).min(99) as u8;
            control.report(percent);
        }

        let base = distance.get(&vertex).copied().unwrap_or(0);
        edges.clear();
        graph.neighbors(vertex, &mut edges);
        for &(next, weight) in &edges {
            if settled.contains(&next) {
                continue;
            }
            let candidate = base + weight;
            let improved = distance.get(&next).map_or(true, |&known| candidate < known);
            if improved {
                distance.insert(next, candidate);
                previous.insert(next, vertex);
                frontier.add_or_update(next, candidate);
            }
        }
    }

    if control.cancelled() {
        return SearchOutcome::Cancelled;
    }
    SearchOutcome::Unreachable
}

fn trace_back<V: Copy + Eq + Hash>(previous: &HashMap<V, V>, source: V, target: V) -> Vec<V> {
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        match previous.get(&current) {
            Some(&prev) => {
                path.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
