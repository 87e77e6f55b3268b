//! Indexed min priority queue.
//!
//! A binary min-heap of `(key, priority)` entries paired with a hash map from
//! each key to its position in the heap. The map makes priority updates
//! O(log n) without removing and reinserting the key.
//!
//! Invariants maintained after every public operation:
//! - `heap[i].priority >= heap[(i - 1) / 2].priority` for all `i > 0`
//! - `index[heap[i].key] == i` for all `i`, and `index.len() == heap.len()`

use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{Error, Result};

/// Pairs a key with its priority. Never handed out of the queue.
#[derive(Debug, Clone)]
struct Entry<K> {
    key: K,
    priority: i64,
}

/// A min priority queue of distinct keys with mutable integer priorities.
#[derive(Debug, Clone)]
pub struct IndexedMinPriorityQueue<K> {
    heap: Vec<Entry<K>>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> IndexedMinPriorityQueue<K> {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create an empty queue with room for `capacity` keys.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether `key` is currently queued.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Current priority of `key`, if it is queued.
    pub fn priority_of(&self, key: &K) -> Option<i64> {
        self.index.get(key).map(|&i| self.heap[i].priority)
    }

    /// Key with the smallest priority. This is the key `remove()` would return.
    pub fn peek_min(&self) -> Result<&K> {
        self.heap
            .first()
            .map(|entry| &entry.key)
            .ok_or(Error::EmptyCollection)
    }

    /// Smallest priority in the queue.
    pub fn min_priority(&self) -> Result<i64> {
        self.heap
            .first()
            .map(|entry| entry.priority)
            .ok_or(Error::EmptyCollection)
    }

    /// Insert `key` with `priority`, or change its priority if already queued.
    pub fn add_or_update(&mut self, key: K, priority: i64) {
        match self.index.get(&key) {
            Some(&i) => self.update(i, priority),
            None => self.add(key, priority),
        }
        debug_assert!(self.check_invariant());
    }

    /// Remove and return a key with the smallest priority.
    ///
    /// When several keys share the smallest priority, which one comes out
    /// depends on the heap layout.
    pub fn remove(&mut self) -> Result<K> {
        if self.heap.is_empty() {
            return Err(Error::EmptyCollection);
        }
        let last = self.heap.len() - 1;
        self.swap(0, last);
        let removed = self.heap.pop().ok_or(Error::EmptyCollection)?;
        self.index.remove(&removed.key);
        if !self.heap.is_empty() {
            self.bubble_down(0);
        }
        debug_assert!(self.check_invariant());
        Ok(removed.key)
    }

    /// Remove every key.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    fn add(&mut self, key: K, priority: i64) {
        let i = self.heap.len();
        self.index.insert(key.clone(), i);
        self.heap.push(Entry { key, priority });
        self.bubble_up(i);
    }

    fn update(&mut self, i: usize, priority: i64) {
        self.heap[i].priority = priority;
        // Only one of the two moves the entry.
        let i = self.bubble_up(i);
        self.bubble_down(i);
    }

    /// Swap entries `i` and `j`, keeping the index map in step.
    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.heap.swap(i, j);
        if let Some(pos) = self.index.get_mut(&self.heap[i].key) {
            *pos = i;
        }
        if let Some(pos) = self.index.get_mut(&self.heap[j].key) {
            *pos = j;
        }
    }

    /// Move entry `i` toward the root while it is smaller than its parent.
    /// Returns its final position.
    fn bubble_up(&mut self, mut i: usize) -> usize {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.heap[i].priority >= self.heap[parent].priority {
                break;
            }
            self.swap(i, parent);
            i = parent;
        }
        i
    }

    /// Move entry `i` toward the leaves while a child is strictly smaller.
    /// On equal children the left one is taken.
    fn bubble_down(&mut self, mut i: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * i + 1;
            if left >= len {
                return;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && self.heap[right].priority < self.heap[left].priority {
                child = right;
            }
            if self.heap[i].priority <= self.heap[child].priority {
                return;
            }
            self.swap(i, child);
            i = child;
        }
    }

    fn check_invariant(&self) -> bool {
        if self.index.len() != self.heap.len() {
            return false;
        }
        self.heap.iter().enumerate().all(|(i, entry)| {
            let ordered = i == 0 || entry.priority >= self.heap[(i - 1) / 2].priority;
            ordered && self.index.get(&entry.key) == Some(&i)
        })
    }
}

impl<K: Eq + Hash + Clone> Default for IndexedMinPriorityQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_queue() {
        let mut queue: IndexedMinPriorityQueue<char> = IndexedMinPriorityQueue::new();

        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(matches!(queue.peek_min(), Err(Error::EmptyCollection)));
        assert!(matches!(queue.min_priority(), Err(Error::EmptyCollection)));
        assert!(matches!(queue.remove(), Err(Error::EmptyCollection)));
    }

    #[test]
    fn test_add_update_remove_sequence() {
        let mut queue = IndexedMinPriorityQueue::new();
        queue.add_or_update('A', 5);
        queue.add_or_update('B', 1);
        queue.add_or_update('C', 3);

        assert_eq!(queue.min_priority().unwrap(), 1);
        assert_eq!(queue.remove().unwrap(), 'B');

        queue.add_or_update('A', 0);
        assert_eq!(queue.remove().unwrap(), 'A');
        assert_eq!(queue.remove().unwrap(), 'C');

        assert!(queue.is_empty());
        assert!(matches!(queue.remove(), Err(Error::EmptyCollection)));
    }

    #[test]
    fn test_update_keeps_size() {
        let mut queue = IndexedMinPriorityQueue::new();
        for (key, priority) in [(1, 10), (2, 20), (3, 30), (4, 40)] {
            queue.add_or_update(key, priority);
        }

        queue.add_or_update(4, -5);
        queue.add_or_update(1, 50);

        assert_eq!(queue.len(), 4);
        assert_eq!(queue.peek_min().unwrap(), &4);
        assert_eq!(queue.priority_of(&1), Some(50));
        assert!(queue.contains(&3));
    }

    #[test]
    fn test_drain_is_sorted_with_duplicates() {
        let mut queue = IndexedMinPriorityQueue::new();
        let priorities = [7, -3, 7, 0, 12, -3, 5, 5, 1];
        for (key, &priority) in priorities.iter().enumerate() {
            queue.add_or_update(key, priority);
        }

        let mut drained = Vec::new();
        while let Ok(key) = queue.remove() {
            drained.push(priorities[key]);
        }

        let mut expected = priorities.to_vec();
        expected.sort();
        assert_eq!(drained, expected);
    }

    #[test]
    fn test_clear() {
        let mut queue = IndexedMinPriorityQueue::new();
        queue.add_or_update("a", 1);
        queue.add_or_update("b", 2);
        queue.clear();

        assert!(queue.is_empty());
        assert!(!queue.contains(&"a"));
        queue.add_or_update("a", 3);
        assert_eq!(queue.peek_min().unwrap(), &"a");
    }

    #[derive(Debug, Clone)]
    enum Op {
        AddOrUpdate(u8, i64),
        Remove,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u8..32, -100i64..100).prop_map(|(k, p)| Op::AddOrUpdate(k, p)),
            1 => Just(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn invariant_holds_after_every_op(ops in prop::collection::vec(op(), 1..200)) {
            let mut queue = IndexedMinPriorityQueue::new();
            let mut model: HashMap<u8, i64> = HashMap::new();

            for op in ops {
                match op {
                    Op::AddOrUpdate(key, priority) => {
                        queue.add_or_update(key, priority);
                        model.insert(key, priority);
                    }
                    Op::Remove => {
                        let expected_min = model.values().min().copied();
                        match queue.remove() {
                            Ok(key) => {
                                let priority = model.remove(&key);
                                prop_assert_eq!(priority, expected_min);
                            }
                            Err(Error::EmptyCollection) => prop_assert!(model.is_empty()),
                            Err(other) => prop_assert!(false, "unexpected error {}", other),
                        }
                    }
                }
                prop_assert!(queue.check_invariant());
                prop_assert_eq!(queue.len(), model.len());
                prop_assert_eq!(queue.min_priority().ok(), model.values().min().copied());
            }
        }
    }
}
