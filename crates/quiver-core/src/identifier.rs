//! Entity identifiers for diagram graphs.
//!
//! Every shape node, connector and text label in a diagram graph is addressed
//! by an [`EntityId`]. Ids are allocated by an [`IdGenerator`] owned by the
//! graph, so two graphs never share allocation state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a diagram entity (node, connector or label).
///
/// Ids are unique across all entity kinds of one graph and are never reused
/// within an editing session.
///
/// # Examples
///
/// ```
/// use quiver_core::identifier::EntityId;
///
/// let id = EntityId::new(7);
/// assert_eq!(id.value(), 7);
/// assert_eq!(id.to_string(), "#7");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// The largest id a stored document may use.
    ///
    /// Ids above this are rejected on load so that a graph always has room
    /// to allocate after its stored ids.
    pub const MAX_STORED: EntityId = EntityId(i64::MAX as u64);

    /// Wraps a raw id value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw id value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Monotonic id allocator scoped to a single graph.
///
/// Allocation starts at 1; 0 is never handed out. The counter saturates at
/// `u64::MAX` instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    /// Creates a generator whose first allocation is `#1`.
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocates the next id.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Returns the id the next call to [`IdGenerator::next_id`] would allocate.
    pub fn peek(&self) -> EntityId {
        EntityId(self.next)
    }

    /// Ensures `id` will never be allocated by this generator.
    ///
    /// Used when entities with externally chosen ids are inserted.
    pub fn reserve(&mut self, id: EntityId) {
        self.next = self.next.max(id.0.saturating_add(1));
    }

    /// Advances this generator to whichever of the two generators is further ahead.
    pub fn catch_up(&mut self, other: &IdGenerator) {
        self.next = self.next.max(other.next);
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_starts_at_one() {
        let mut ids = IdGenerator::new();
        assert_eq!(ids.peek(), EntityId::new(1));
        assert_eq!(ids.next_id(), EntityId::new(1));
        assert_eq!(ids.next_id(), EntityId::new(2));
    }

    #[test]
    fn test_generators_are_independent() {
        let mut first = IdGenerator::new();
        let mut second = IdGenerator::new();
        first.next_id();
        first.next_id();

        assert_eq!(second.next_id(), EntityId::new(1));
        assert_eq!(first.next_id(), EntityId::new(3));
    }

    #[test]
    fn test_reserve_skips_taken_ids() {
        let mut ids = IdGenerator::new();
        ids.reserve(EntityId::new(10));
        assert_eq!(ids.next_id(), EntityId::new(11));

        // Reserving an older id never moves the generator backwards.
        ids.reserve(EntityId::new(3));
        assert_eq!(ids.next_id(), EntityId::new(12));
    }

    #[test]
    fn test_reserve_largest_id_saturates() {
        let mut ids = IdGenerator::new();
        ids.reserve(EntityId::new(u64::MAX));
        assert_eq!(ids.peek(), EntityId::new(u64::MAX));
        assert_eq!(ids.next_id(), EntityId::new(u64::MAX));
        assert_eq!(ids.peek(), EntityId::new(u64::MAX));

        let mut ids = IdGenerator::new();
        ids.reserve(EntityId::MAX_STORED);
        assert!(ids.next_id() > EntityId::MAX_STORED);
    }

    #[test]
    fn test_catch_up() {
        let mut behind = IdGenerator::new();
        let mut ahead = IdGenerator::new();
        for _ in 0..5 {
            ahead.next_id();
        }

        behind.catch_up(&ahead);
        assert_eq!(behind.peek(), EntityId::new(6));

        ahead.catch_up(&IdGenerator::new());
        assert_eq!(ahead.peek(), EntityId::new(6));
    }

    #[test]
    fn test_entity_id_ordering_and_display() {
        assert!(EntityId::new(2) < EntityId::new(10));
        assert_eq!(format!("{}", EntityId::from(42)), "#42");
    }
}
