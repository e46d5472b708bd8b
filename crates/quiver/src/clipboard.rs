//! Copy and paste of subgraphs.
//!
//! Copying extracts the selected nodes and labels together with every
//! connector whose two endpoints are both selected. Pasting merges that
//! subgraph back under fresh ids, translated by a fixed offset and raised
//! slightly above the originals.

use std::collections::BTreeSet;

use log::debug;

use quiver_core::{geometry::Point, identifier::EntityId};

use crate::structure::DiagramGraph;

/// Z raise applied to pasted nodes.
const PASTE_Z_RAISE: f32 = 0.1;

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    contents: Option<DiagramGraph>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the clipboard with the selected part of `graph`.
    ///
    /// Returns false, leaving the clipboard unchanged, if the selection holds
    /// nothing that can be copied.
    pub fn copy(&mut self, graph: &DiagramGraph, selection: &BTreeSet<EntityId>) -> bool {
        let subgraph = graph.extract(selection);
        if subgraph.is_empty() {
            return false;
        }
        debug!(
            nodes = subgraph.node_count(),
            connectors = subgraph.connector_count(),
            labels = subgraph.label_count();
            "Copied to clipboard"
        );
        self.contents = Some(subgraph);
        true
    }

    /// Pastes the clipboard into `graph` and returns the ids of everything pasted.
    ///
    /// The clipboard keeps its contents, so repeated pastes land at the same
    /// offset from the copied entities.
    pub fn paste(&self, graph: &mut DiagramGraph, offset: Point) -> BTreeSet<EntityId> {
        let Some(contents) = &self.contents else {
            return BTreeSet::new();
        };
        let pasted: BTreeSet<EntityId> = graph
            .merge_from(contents, offset, PASTE_Z_RAISE)
            .into_values()
            .collect();
        debug!(entities = pasted.len(); "Pasted from clipboard");
        pasted
    }

    /// The copied subgraph, with the ids it had when copied.
    pub fn contents(&self) -> Option<&DiagramGraph> {
        self.contents.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_none()
    }
}
