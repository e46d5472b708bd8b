//! The mutable diagram graph and its entities.
//!
//! A [`DiagramGraph`] exclusively owns every [`ShapeNode`], [`Connector`] and
//! [`TextLabel`] of a diagram. Entities refer to each other only by
//! [`EntityId`](quiver_core::identifier::EntityId): a connector stores the ids
//! of its two endpoint nodes, and each node keeps a derived set of the
//! connectors touching it. That back-reference set is recomputed from the
//! connector list whenever the graph is cloned, so it can never drift from the
//! connectors that actually exist. Nodes can also be collected into a
//! [`NodeGroup`], which the editor selects and drags as one unit.

mod entity;
mod graph;

pub use entity::{Connector, NodeGroup, ShapeNode, TextLabel};
pub use graph::{CloneMode, DiagramGraph};
