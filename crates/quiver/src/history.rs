//! Linear undo/redo history of whole-graph snapshots.
//!
//! Every entry is a full identity-preserving clone of the
//! [`DiagramGraph`], not a diff. Pushing after an undo discards the redo
//! branch; history is strictly linear.

use std::collections::VecDeque;

use log::debug;

use crate::{error::QuiverError, structure::DiagramGraph};

/// Bounded stack of graph snapshots with a cursor on the current state.
#[derive(Debug, Clone)]
pub struct SnapshotStack {
    history: VecDeque<DiagramGraph>,
    cursor: usize,
    capacity: usize,
}

impl SnapshotStack {
    /// Creates an empty stack holding at most `capacity` snapshots (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Records a new current state.
    ///
    /// Entries after the cursor are dropped. When the stack is full the
    /// oldest snapshot is evicted.
    pub fn push(&mut self, snapshot: DiagramGraph) {
        if !self.history.is_empty() {
            self.history.truncate(self.cursor + 1);
        }
        self.history.push_back(snapshot);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.cursor = self.history.len() - 1;
        debug!(cursor = self.cursor, len = self.history.len(); "Snapshot pushed");
    }

    /// Steps back one snapshot and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::EmptyHistory`] when already at the oldest snapshot.
    pub fn undo(&mut self) -> Result<&DiagramGraph, QuiverError> {
        if self.cursor == 0 {
            return Err(QuiverError::EmptyHistory);
        }
        self.cursor -= 1;
        debug!(cursor = self.cursor; "Undo");
        Ok(&self.history[self.cursor])
    }

    /// Steps forward one snapshot and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::NoFutureHistory`] when already at the newest snapshot.
    pub fn redo(&mut self) -> Result<&DiagramGraph, QuiverError> {
        if self.cursor + 1 >= self.history.len() {
            return Err(QuiverError::NoFutureHistory);
        }
        self.cursor += 1;
        debug!(cursor = self.cursor; "Redo");
        Ok(&self.history[self.cursor])
    }

    /// The snapshot at the cursor, if any has been pushed.
    pub fn current(&self) -> Option<&DiagramGraph> {
        self.history.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the current snapshot.
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use quiver_core::{geometry::Point, shape::ShapeKind};

    use super::*;

    fn snapshots_strategy() -> impl Strategy<Value = Vec<Vec<(f32, f32)>>> {
        prop::collection::vec(
            prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 0..5),
            1..12,
        )
    }

    fn build(positions: &[(f32, f32)]) -> DiagramGraph {
        let mut graph = DiagramGraph::new();
        let ids: Vec<_> = positions
            .iter()
            .map(|&(x, y)| graph.add_node(ShapeKind::Diamond, Point::new(x, y)))
            .collect();
        for pair in ids.windows(2) {
            graph.add_connector(pair[0], pair[1]).unwrap();
        }
        graph
    }

    /// Undoing k-1 times and redoing k-1 times returns to the last pushed state.
    fn check_undo_redo_symmetry(snapshots: Vec<Vec<(f32, f32)>>) -> Result<(), TestCaseError> {
        let mut stack = SnapshotStack::new(snapshots.len());
        for positions in &snapshots {
            stack.push(build(positions));
        }
        let last = build(snapshots.last().expect("strategy yields at least one snapshot"));
        let steps = snapshots.len() - 1;

        for _ in 0..steps {
            stack.undo().map_err(|err| TestCaseError::fail(err.to_string()))?;
        }
        prop_assert!(!stack.can_undo());
        prop_assert_eq!(stack.current(), Some(&build(&snapshots[0])));

        for _ in 0..steps {
            stack.redo().map_err(|err| TestCaseError::fail(err.to_string()))?;
        }
        prop_assert!(!stack.can_redo());
        prop_assert_eq!(stack.current(), Some(&last));
        Ok(())
    }

    proptest! {
        #[test]
        fn undo_redo_symmetry(snapshots in snapshots_strategy()) {
            check_undo_redo_symmetry(snapshots)?;
        }
    }
}
