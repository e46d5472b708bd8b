//! The diagram graph: an id-indexed arena of nodes, connectors and labels.
//!
//! # Architecture
//!
//! - Nodes and labels live in insertion-ordered maps keyed by [`EntityId`].
//! - Connectors live in an ordered list and store only the ids of their
//!   endpoint nodes.
//! - Each node carries the derived set of connector ids touching it.
//! - One [`IdGenerator`] per graph hands out ids for all three entity kinds
//!   and for node groups.
//! - Groups hold only node ids. A node is in at most one group and a group
//!   never has fewer than two members.
//!
//! Every mutating operation validates before it applies, so a rejected
//! operation leaves the graph untouched. Operations that change a node's
//! position do not reroute on their own; [`DiagramGraph::reroute_node`] must be
//! called once the move is final for the current event. Operations that change
//! connectivity or boundaries reroute immediately.

use std::collections::{BTreeSet, HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, trace};

use quiver_core::{
    color::Color,
    geometry::{Point, Polygon},
    identifier::{EntityId, IdGenerator},
    shape::ShapeKind,
};

use super::entity::{Connector, NodeGroup, ShapeNode, TextLabel};
use crate::{error::QuiverError, routing};

/// Stacking offset applied by bring-to-front and send-to-back.
const Z_STEP: f32 = 0.1;

/// Whether a clone keeps the ids of the source graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneMode {
    /// Allocate new ids; the clone's generator starts from scratch.
    FreshIds,
    /// Keep every id and the generator state, so prior references stay valid.
    PreserveIds,
}

/// Aggregate owning all entities of one diagram.
///
/// # Examples
///
/// ```
/// use quiver::{geometry::Point, shape::ShapeKind, structure::DiagramGraph};
///
/// let mut graph = DiagramGraph::new();
/// let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
/// let b = graph.add_node(ShapeKind::Circle, Point::new(300.0, 0.0));
/// let line = graph.add_connector(a, b).unwrap();
///
/// assert!(graph.node(b).unwrap().connector_ids().contains(&line));
///
/// graph.remove_node(a);
/// assert_eq!(graph.connector_count(), 0);
/// assert!(graph.node(b).unwrap().connector_ids().is_empty());
/// ```
#[derive(Debug, Default, PartialEq)]
pub struct DiagramGraph {
    nodes: IndexMap<EntityId, ShapeNode>,
    connectors: Vec<Connector>,
    labels: IndexMap<EntityId, TextLabel>,
    groups: IndexMap<EntityId, NodeGroup>,
    ids: IdGenerator,
}

impl Clone for DiagramGraph {
    /// Identity-preserving clone; see [`DiagramGraph::clone_graph`].
    fn clone(&self) -> Self {
        self.clone_graph(CloneMode::PreserveIds)
    }
}

impl DiagramGraph {
    /// Creates an empty graph with its own id generator.
    pub fn new() -> Self {
        Self::default()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn node(&self, id: EntityId) -> Option<&ShapeNode> {
        self.nodes.get(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ShapeNode> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connector(&self, id: EntityId) -> Option<&Connector> {
        self.connectors.iter().find(|connector| connector.id() == id)
    }

    /// Connectors in creation order.
    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    pub fn label(&self, id: EntityId) -> Option<&TextLabel> {
        self.labels.get(&id)
    }

    /// Labels in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &TextLabel> {
        self.labels.values()
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connectors.is_empty() && self.labels.is_empty()
    }

    /// Returns true if any entity kind uses `id`.
    pub fn contains(&self, id: EntityId) -> bool {
        self.nodes.contains_key(&id) || self.labels.contains_key(&id) || self.connector(id).is_some()
    }

    pub fn group(&self, id: EntityId) -> Option<&NodeGroup> {
        self.groups.get(&id)
    }

    /// Groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &NodeGroup> {
        self.groups.values()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// The group `node_id` belongs to, if any.
    pub fn group_of(&self, node_id: EntityId) -> Option<EntityId> {
        self.groups
            .values()
            .find(|group| group.contains(node_id))
            .map(NodeGroup::id)
    }

    /// The generator this graph allocates ids from.
    pub fn id_generator(&self) -> &IdGenerator {
        &self.ids
    }

    /// Nodes from the top of the stack down: higher z first, newer first on ties.
    pub fn nodes_topmost_first(&self) -> Vec<&ShapeNode> {
        let mut nodes: Vec<&ShapeNode> = self.nodes.values().rev().collect();
        nodes.sort_by(|a, b| b.z_value().total_cmp(&a.z_value()));
        nodes
    }

    /// Finds the topmost node whose outline contains the scene point.
    pub fn node_at(&self, point: Point) -> Option<EntityId> {
        self.nodes_topmost_first()
            .into_iter()
            .find(|node| node.contains(point))
            .map(ShapeNode::id)
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Inserts a node of the given kind with its template boundary.
    pub fn add_node(&mut self, kind: ShapeKind, position: Point) -> EntityId {
        let id = self.ids.next_id();
        self.nodes.insert(id, ShapeNode::new(id, kind, position));
        debug!(node_id:% = id, kind:% = kind, position:?; "Node added");
        id
    }

    /// Inserts a node that already carries its id, reserving that id.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::InvalidReference`] if the id is already in use.
    pub(crate) fn insert_node(&mut self, node: ShapeNode) -> Result<(), QuiverError> {
        let id = node.id();
        if self.contains(id) || self.groups.contains_key(&id) {
            return Err(QuiverError::invalid_reference(id, "id is already in use"));
        }
        self.ids.reserve(id);
        let mut node = node;
        node.connector_ids_mut().clear();
        self.nodes.insert(id, node);
        debug!(node_id:% = id; "Node inserted");
        Ok(())
    }

    /// Connects `start` to `end` and routes the new connector.
    ///
    /// Duplicate connectors between the same ordered pair are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::InvalidReference`] if either node is missing or
    /// both ids are the same node. The graph is unchanged in that case.
    pub fn add_connector(&mut self, start: EntityId, end: EntityId) -> Result<EntityId, QuiverError> {
        if start == end {
            return Err(QuiverError::invalid_reference(
                start,
                "a connector cannot start and end at the same node",
            ));
        }
        for endpoint in [start, end] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(QuiverError::invalid_reference(endpoint, "no such node"));
            }
        }

        let id = self.ids.next_id();
        self.connectors
            .push(Connector::new(id, start, end, Color::default()));
        for endpoint in [start, end] {
            if let Some(node) = self.nodes.get_mut(&endpoint) {
                node.connector_ids_mut().insert(id);
            }
        }
        self.reroute_connector(self.connectors.len() - 1);

        debug!(connector_id:% = id, start:% = start, end:% = end; "Connector added");
        self.debug_check();
        Ok(id)
    }

    /// Inserts a text label with the default font and color.
    pub fn add_label(&mut self, text: impl Into<String>, position: Point) -> EntityId {
        let id = self.ids.next_id();
        self.labels
            .insert(id, TextLabel::new(id, text.into(), position));
        debug!(label_id:% = id, position:?; "Label added");
        id
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Removes a node and every connector touching it.
    ///
    /// Returns false if there is no such node.
    pub fn remove_node(&mut self, id: EntityId) -> bool {
        if self.nodes.shift_remove(&id).is_none() {
            return false;
        }

        let (removed, kept): (Vec<Connector>, Vec<Connector>) = std::mem::take(&mut self.connectors)
            .into_iter()
            .partition(|connector| connector.touches(id));
        self.connectors = kept;
        for connector in &removed {
            self.detach_connector(connector);
        }
        self.leave_group(id);

        debug!(node_id:% = id, cascaded = removed.len(); "Node removed");
        self.debug_check();
        true
    }

    /// Removes a connector and unregisters it from both endpoints.
    ///
    /// Returns false if there is no such connector.
    pub fn remove_connector(&mut self, id: EntityId) -> bool {
        let Some(index) = self.connectors.iter().position(|c| c.id() == id) else {
            return false;
        };
        let connector = self.connectors.remove(index);
        self.detach_connector(&connector);

        debug!(connector_id:% = id; "Connector removed");
        self.debug_check();
        true
    }

    /// Removes a label. Returns false if there is no such label.
    pub fn remove_label(&mut self, id: EntityId) -> bool {
        let removed = self.labels.shift_remove(&id).is_some();
        if removed {
            debug!(label_id:% = id; "Label removed");
        }
        removed
    }

    /// Removes a mixed set of entities: connectors first, then nodes (with
    /// their cascades), then labels.
    ///
    /// Returns how many of the given ids were removed.
    pub fn remove_entities(&mut self, ids: &BTreeSet<EntityId>) -> usize {
        let connector_ids: Vec<EntityId> = self
            .connectors
            .iter()
            .map(Connector::id)
            .filter(|id| ids.contains(id))
            .collect();
        let connectors = connector_ids
            .into_iter()
            .filter(|id| self.remove_connector(*id))
            .count();
        let nodes = ids.iter().filter(|id| self.remove_node(**id)).count();
        let labels = ids.iter().filter(|id| self.remove_label(**id)).count();
        connectors + nodes + labels
    }

    /// Drops `node_id` from its group, dissolving the group if fewer than two
    /// members remain.
    fn leave_group(&mut self, node_id: EntityId) {
        let Some(group_id) = self.group_of(node_id) else {
            return;
        };
        let Some(group) = self.groups.get_mut(&group_id) else {
            return;
        };
        group.members_mut().remove(&node_id);
        if group.members().len() < 2 {
            self.groups.shift_remove(&group_id);
            debug!(group_id:% = group_id; "Group dissolved after member removal");
        }
    }

    fn detach_connector(&mut self, connector: &Connector) {
        for endpoint in [connector.start(), connector.end()] {
            if let Some(node) = self.nodes.get_mut(&endpoint) {
                node.connector_ids_mut().remove(&connector.id());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// Moves a node without rerouting its connectors.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownEntity`] if there is no such node.
    pub fn apply_move(&mut self, id: EntityId, position: Point) -> Result<(), QuiverError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))?;
        node.set_position(position);
        trace!(node_id:% = id, position:?; "Node moved");
        Ok(())
    }

    /// Moves a label.
    pub fn move_label(&mut self, id: EntityId, position: Point) -> Result<(), QuiverError> {
        let label = self
            .labels
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))?;
        label.set_position(position);
        Ok(())
    }

    /// Replaces a node's boundary polygon and reroutes its connectors.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::DegenerateGeometry`] for polygons with fewer
    /// than two edges or non-finite points, and
    /// [`QuiverError::UnknownEntity`] if there is no such node.
    pub fn set_boundary(&mut self, id: EntityId, boundary: Polygon) -> Result<(), QuiverError> {
        if boundary.is_degenerate() || !boundary.points().iter().all(|p| p.is_finite()) {
            return Err(QuiverError::DegenerateGeometry(format!(
                "boundary of node {id} needs at least two finite edges"
            )));
        }
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))?;
        node.set_boundary(boundary);
        self.reroute_node(id);
        debug!(node_id:% = id; "Node boundary replaced");
        Ok(())
    }

    /// Recomputes the cached line of every connector attached to `id`.
    pub fn reroute_node(&mut self, id: EntityId) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        let attached = node.connector_ids().clone();
        for index in 0..self.connectors.len() {
            if attached.contains(&self.connectors[index].id()) {
                self.reroute_connector(index);
            }
        }
    }

    /// Recomputes the cached line of every connector.
    pub fn reroute_all(&mut self) {
        for index in 0..self.connectors.len() {
            self.reroute_connector(index);
        }
    }

    fn reroute_connector(&mut self, index: usize) {
        let connector = &self.connectors[index];
        let (Some(start), Some(end)) = (
            self.nodes.get(&connector.start()),
            self.nodes.get(&connector.end()),
        ) else {
            return;
        };
        let line = routing::route(connector, start, end);
        self.connectors[index].set_cached_line(line);
    }

    // -------------------------------------------------------------------------
    // Style and stacking
    // -------------------------------------------------------------------------

    pub fn set_node_fill(&mut self, id: EntityId, color: Color) -> Result<(), QuiverError> {
        self.nodes
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))?
            .set_fill_color(color);
        Ok(())
    }

    pub fn set_connector_color(&mut self, id: EntityId, color: Color) -> Result<(), QuiverError> {
        self.connectors
            .iter_mut()
            .find(|connector| connector.id() == id)
            .ok_or(QuiverError::UnknownEntity(id))?
            .set_color(color);
        Ok(())
    }

    pub fn set_label_text(&mut self, id: EntityId, text: impl Into<String>) -> Result<(), QuiverError> {
        self.label_mut(id)?.set_text(text.into());
        Ok(())
    }

    pub fn set_label_color(&mut self, id: EntityId, color: Color) -> Result<(), QuiverError> {
        self.label_mut(id)?.set_color(color);
        Ok(())
    }

    pub fn set_label_font(&mut self, id: EntityId, font: impl Into<String>) -> Result<(), QuiverError> {
        self.label_mut(id)?.set_font(font.into());
        Ok(())
    }

    fn label_mut(&mut self, id: EntityId) -> Result<&mut TextLabel, QuiverError> {
        self.labels
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))
    }

    pub fn set_node_z(&mut self, id: EntityId, z_value: f32) -> Result<(), QuiverError> {
        self.nodes
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))?
            .set_z_value(z_value);
        Ok(())
    }

    /// Raises a node just above every node it overlaps.
    ///
    /// The new z value starts at 0 and climbs to 0.1 above each overlapping
    /// node at or above it. Returns the new z value.
    pub fn bring_to_front(&mut self, id: EntityId) -> Result<f32, QuiverError> {
        let z_value = self
            .overlapping_z_values(id)?
            .into_iter()
            .fold(0.0, |z, other| if other >= z { other + Z_STEP } else { z });
        self.set_node_z(id, z_value)?;
        debug!(node_id:% = id, z_value; "Node brought to front");
        Ok(z_value)
    }

    /// Lowers a node just below every node it overlaps. Returns the new z value.
    pub fn send_to_back(&mut self, id: EntityId) -> Result<f32, QuiverError> {
        let z_value = self
            .overlapping_z_values(id)?
            .into_iter()
            .fold(0.0, |z, other| if other <= z { other - Z_STEP } else { z });
        self.set_node_z(id, z_value)?;
        debug!(node_id:% = id, z_value; "Node sent to back");
        Ok(z_value)
    }

    /// Z values of the nodes whose bounds overlap `id`, topmost first.
    fn overlapping_z_values(&self, id: EntityId) -> Result<Vec<f32>, QuiverError> {
        let bounds = self
            .nodes
            .get(&id)
            .ok_or(QuiverError::UnknownEntity(id))?
            .scene_bounds();
        Ok(self
            .nodes_topmost_first()
            .into_iter()
            .filter(|other| other.id() != id && other.scene_bounds().intersects(&bounds))
            .map(ShapeNode::z_value)
            .collect())
    }

    /// Sets the move-enabled flag of one node.
    pub fn set_move_enabled(&mut self, id: EntityId, enabled: bool) -> Result<(), QuiverError> {
        self.nodes
            .get_mut(&id)
            .ok_or(QuiverError::UnknownEntity(id))?
            .set_move_enabled(enabled);
        Ok(())
    }

    /// Re-enables free movement on every node.
    pub fn enable_all_moves(&mut self) {
        for node in self.nodes.values_mut() {
            node.set_move_enabled(true);
        }
    }

    // -------------------------------------------------------------------------
    // Grouping
    // -------------------------------------------------------------------------

    /// Collects the given nodes into a new group.
    ///
    /// Groups do not nest: any group a member already belongs to is merged
    /// into the new one and its remaining members join too.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::InvalidReference`] if an id is not a node, or
    /// [`QuiverError::GroupTooSmall`] if fewer than two nodes would end up in
    /// the group. The graph is unchanged in either case.
    pub fn create_group(&mut self, node_ids: &BTreeSet<EntityId>) -> Result<EntityId, QuiverError> {
        if let Some(missing) = node_ids.iter().find(|id| !self.nodes.contains_key(*id)) {
            return Err(QuiverError::invalid_reference(*missing, "only nodes can be grouped"));
        }

        let absorbed: BTreeSet<EntityId> = node_ids.iter().filter_map(|id| self.group_of(*id)).collect();
        let mut members = node_ids.clone();
        for group_id in &absorbed {
            if let Some(group) = self.groups.get(group_id) {
                members.extend(group.members().iter().copied());
            }
        }
        if members.len() < 2 {
            return Err(QuiverError::GroupTooSmall(members.len()));
        }

        for group_id in &absorbed {
            self.groups.shift_remove(group_id);
        }
        let id = self.ids.next_id();
        let count = members.len();
        self.groups.insert(id, NodeGroup::new(id, members));

        debug!(group_id:% = id, members = count, absorbed = absorbed.len(); "Group created");
        self.debug_check();
        Ok(id)
    }

    /// Dissolves a group, leaving its members in place.
    ///
    /// Returns false if there is no such group.
    pub fn dissolve_group(&mut self, id: EntityId) -> bool {
        let removed = self.groups.shift_remove(&id).is_some();
        if removed {
            debug!(group_id:% = id; "Group dissolved");
        }
        removed
    }

    // -------------------------------------------------------------------------
    // Cloning
    // -------------------------------------------------------------------------

    /// Produces a structurally isomorphic, fully independent copy.
    ///
    /// Nodes and labels are copied first while recording an old-id to new-id
    /// map; connectors are then copied with their endpoints translated through
    /// that map, and connectors whose endpoints cannot be translated are left
    /// out. Back-references are re-derived from the copied connectors rather
    /// than copied. Groups are copied last, restricted to translated members.
    pub fn clone_graph(&self, mode: CloneMode) -> DiagramGraph {
        let mut clone = DiagramGraph::new();
        self.copy_into(&mut clone, mode, Point::default(), 0.0);
        if mode == CloneMode::PreserveIds {
            clone.ids.catch_up(&self.ids);
        }
        clone
    }

    /// Copies every entity of `other` into this graph under fresh ids.
    ///
    /// Nodes and labels are translated by `offset` and nodes are raised by
    /// `z_raise`. Returns the map from `other`'s ids to the new ids.
    pub fn merge_from(
        &mut self,
        other: &DiagramGraph,
        offset: Point,
        z_raise: f32,
    ) -> HashMap<EntityId, EntityId> {
        let id_map = other.copy_into(self, CloneMode::FreshIds, offset, z_raise);
        debug!(entities = id_map.len(); "Graph merged");
        id_map
    }

    /// Returns an identity-preserving subgraph: the selected nodes and labels
    /// plus every connector whose two endpoints are both selected.
    ///
    /// Groups are kept with their unselected members left out, as long as two
    /// members remain.
    pub fn extract(&self, selection: &BTreeSet<EntityId>) -> DiagramGraph {
        let mut subgraph = DiagramGraph::new();
        for node in self.nodes.values().filter(|n| selection.contains(&n.id())) {
            subgraph.ids.reserve(node.id());
            subgraph.nodes.insert(node.id(), node.with_id(node.id()));
        }
        for label in self.labels.values().filter(|l| selection.contains(&l.id())) {
            subgraph.ids.reserve(label.id());
            subgraph.labels.insert(label.id(), label.clone());
        }
        for connector in &self.connectors {
            if subgraph.nodes.contains_key(&connector.start())
                && subgraph.nodes.contains_key(&connector.end())
            {
                subgraph.ids.reserve(connector.id());
                subgraph.connectors.push(connector.clone());
            }
        }
        for group in self.groups.values() {
            let members: BTreeSet<EntityId> = group
                .members()
                .iter()
                .copied()
                .filter(|id| subgraph.nodes.contains_key(id))
                .collect();
            if members.len() >= 2 {
                subgraph.ids.reserve(group.id());
                subgraph.groups.insert(group.id(), NodeGroup::new(group.id(), members));
            }
        }
        subgraph.rebuild_back_references();
        subgraph
    }

    fn copy_into(
        &self,
        target: &mut DiagramGraph,
        mode: CloneMode,
        offset: Point,
        z_raise: f32,
    ) -> HashMap<EntityId, EntityId> {
        let mut id_map = HashMap::new();
        let allocate = |target: &mut DiagramGraph, old: EntityId| match mode {
            CloneMode::FreshIds => target.ids.next_id(),
            CloneMode::PreserveIds => {
                target.ids.reserve(old);
                old
            }
        };

        for node in self.nodes.values() {
            let new_id = allocate(target, node.id());
            let mut copy = node.with_id(new_id);
            copy.set_position(node.position().add_point(offset));
            copy.set_z_value(node.z_value() + z_raise);
            target.nodes.insert(new_id, copy);
            id_map.insert(node.id(), new_id);
        }
        for label in self.labels.values() {
            let new_id = allocate(target, label.id());
            let mut copy = label.with_id(new_id);
            copy.set_position(label.position().add_point(offset));
            target.labels.insert(new_id, copy);
            id_map.insert(label.id(), new_id);
        }

        let first_new_connector = target.connectors.len();
        for connector in &self.connectors {
            let (Some(&start), Some(&end)) =
                (id_map.get(&connector.start()), id_map.get(&connector.end()))
            else {
                trace!(connector_id:% = connector.id(); "Skipped dangling connector while cloning");
                continue;
            };
            let new_id = allocate(target, connector.id());
            target
                .connectors
                .push(connector.with_endpoints(new_id, start, end));
            id_map.insert(connector.id(), new_id);
        }

        // Group ids stay out of `id_map`, which only names entities.
        for group in self.groups.values() {
            let members: BTreeSet<EntityId> = group
                .members()
                .iter()
                .filter_map(|id| id_map.get(id).copied())
                .collect();
            if members.len() < 2 {
                continue;
            }
            let new_id = allocate(target, group.id());
            target.groups.insert(new_id, NodeGroup::new(new_id, members));
        }

        target.rebuild_back_references();
        for index in first_new_connector..target.connectors.len() {
            target.reroute_connector(index);
        }
        target.debug_check();
        id_map
    }

    /// Advances this graph's id generator past everything `other` has allocated.
    pub fn catch_up_ids(&mut self, other: &IdGenerator) {
        self.ids.catch_up(other);
    }

    // -------------------------------------------------------------------------
    // Integrity
    // -------------------------------------------------------------------------

    /// Re-derives every node's connector set from the connector list.
    pub fn rebuild_back_references(&mut self) {
        for node in self.nodes.values_mut() {
            node.connector_ids_mut().clear();
        }
        for connector in &self.connectors {
            for endpoint in [connector.start(), connector.end()] {
                if let Some(node) = self.nodes.get_mut(&endpoint) {
                    node.connector_ids_mut().insert(connector.id());
                }
            }
        }
    }

    /// Checks the relational invariants of the graph.
    ///
    /// - every connector joins two distinct live nodes;
    /// - ids are unique across nodes, connectors and labels;
    /// - each node's connector set is exactly the set of connectors touching it;
    /// - every group has at least two live member nodes, no node is in two
    ///   groups and group ids are unique among all ids.
    pub fn is_consistent(&self) -> bool {
        let mut expected: HashMap<EntityId, BTreeSet<EntityId>> = self
            .nodes
            .keys()
            .map(|id| (*id, BTreeSet::new()))
            .collect();
        let mut seen: HashSet<EntityId> = self.nodes.keys().copied().collect();

        for label in self.labels.keys() {
            if !seen.insert(*label) {
                return false;
            }
        }
        for connector in &self.connectors {
            if connector.start() == connector.end() || !seen.insert(connector.id()) {
                return false;
            }
            for endpoint in [connector.start(), connector.end()] {
                match expected.get_mut(&endpoint) {
                    Some(set) => {
                        set.insert(connector.id());
                    }
                    None => return false,
                }
            }
        }

        let mut grouped: HashSet<EntityId> = HashSet::new();
        for group in self.groups.values() {
            if group.members().len() < 2 || !seen.insert(group.id()) {
                return false;
            }
            for member in group.members() {
                if !self.nodes.contains_key(member) || !grouped.insert(*member) {
                    return false;
                }
            }
        }

        self.nodes
            .values()
            .all(|node| expected.get(&node.id()) == Some(node.connector_ids()))
    }

    pub(crate) fn debug_check(&self) {
        debug_assert!(self.is_consistent(), "diagram graph invariants violated");
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn two_connected_nodes() -> (DiagramGraph, EntityId, EntityId, EntityId) {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = graph.add_node(ShapeKind::Circle, Point::new(300.0, 0.0));
        let c = graph.add_connector(a, b).unwrap();
        (graph, a, b, c)
    }

    #[test]
    fn test_ids_are_shared_across_kinds() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(ShapeKind::Rectangle, Point::default());
        let label = graph.add_label("note", Point::default());
        let b = graph.add_node(ShapeKind::Io, Point::new(400.0, 0.0));
        let c = graph.add_connector(a, b).unwrap();

        assert_eq!(
            [a, label, b, c].map(EntityId::value),
            [1, 2, 3, 4]
        );
    }

    #[test]
    fn test_add_connector_registers_both_endpoints() {
        let (graph, a, b, c) = two_connected_nodes();
        assert!(graph.node(a).unwrap().connector_ids().contains(&c));
        assert!(graph.node(b).unwrap().connector_ids().contains(&c));
        assert!(graph.is_consistent());

        let line = graph.connector(c).unwrap().cached_line();
        assert_approx_eq!(f32, line.start().x(), 100.0, epsilon = 0.001);
        assert_approx_eq!(f32, line.end().x(), 200.0, epsilon = 0.001);
    }

    #[test]
    fn test_add_connector_rejects_invalid_references() {
        let (mut graph, a, _, _) = two_connected_nodes();
        let missing = EntityId::new(99);

        assert!(matches!(
            graph.add_connector(a, a),
            Err(QuiverError::InvalidReference { id, .. }) if id == a
        ));
        assert!(matches!(
            graph.add_connector(a, missing),
            Err(QuiverError::InvalidReference { id, .. }) if id == missing
        ));
        assert_eq!(graph.connector_count(), 1);
        // Rejected attempts do not consume ids.
        assert_eq!(graph.id_generator().peek(), EntityId::new(4));
    }

    #[test]
    fn test_duplicate_connectors_are_allowed() {
        let (mut graph, a, b, _) = two_connected_nodes();
        graph.add_connector(a, b).unwrap();
        graph.add_connector(b, a).unwrap();
        assert_eq!(graph.connector_count(), 3);
        assert_eq!(graph.node(a).unwrap().connector_ids().len(), 3);
    }

    #[test]
    fn test_remove_node_cascades() {
        let (mut graph, a, b, c) = two_connected_nodes();
        assert!(graph.remove_node(a));

        assert!(graph.node(a).is_none());
        assert!(graph.connector(c).is_none());
        assert!(graph.node(b).unwrap().connector_ids().is_empty());
        assert!(graph.is_consistent());

        assert!(!graph.remove_node(a));
    }

    #[test]
    fn test_remove_connector_updates_endpoints() {
        let (mut graph, a, b, c) = two_connected_nodes();
        assert!(graph.remove_connector(c));
        assert!(graph.node(a).unwrap().connector_ids().is_empty());
        assert!(graph.node(b).unwrap().connector_ids().is_empty());
        assert!(!graph.remove_connector(c));
    }

    #[test]
    fn test_remove_entities_mixed_selection() {
        let (mut graph, a, b, c) = two_connected_nodes();
        let label = graph.add_label("x", Point::default());
        let selection = BTreeSet::from([c, a, label]);

        assert_eq!(graph.remove_entities(&selection), 3);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.node(b).is_some());
        assert_eq!(graph.label_count(), 0);
    }

    #[test]
    fn test_apply_move_does_not_reroute() {
        let (mut graph, _, b, c) = two_connected_nodes();
        let before = graph.connector(c).unwrap().cached_line();

        graph.apply_move(b, Point::new(500.0, 0.0)).unwrap();
        assert_eq!(graph.connector(c).unwrap().cached_line(), before);

        graph.reroute_node(b);
        let after = graph.connector(c).unwrap().cached_line();
        assert_approx_eq!(f32, after.end().x(), 400.0, epsilon = 0.001);
    }

    #[test]
    fn test_apply_move_unknown_node() {
        let mut graph = DiagramGraph::new();
        assert!(matches!(
            graph.apply_move(EntityId::new(1), Point::default()),
            Err(QuiverError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_set_boundary_rejects_degenerate() {
        let (mut graph, a, _, _) = two_connected_nodes();
        let line = Polygon::new([Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        assert!(matches!(
            graph.set_boundary(a, line),
            Err(QuiverError::DegenerateGeometry(_))
        ));
        assert_eq!(graph.node(a).unwrap().boundary().edge_count(), 4);
    }

    #[test]
    fn test_set_boundary_reroutes() {
        let (mut graph, a, _, c) = two_connected_nodes();
        let wider = graph.node(a).unwrap().boundary().scale(1.5, 1.0);
        graph.set_boundary(a, wider).unwrap();

        let line = graph.connector(c).unwrap().cached_line();
        assert_approx_eq!(f32, line.start().x(), 150.0, epsilon = 0.001);
    }

    #[test]
    fn test_node_at_prefers_topmost() {
        let mut graph = DiagramGraph::new();
        let below = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let above = graph.add_node(ShapeKind::Rectangle, Point::new(50.0, 0.0));

        assert_eq!(graph.node_at(Point::new(25.0, 0.0)), Some(above));
        graph.send_to_back(above).unwrap();
        assert_eq!(graph.node_at(Point::new(25.0, 0.0)), Some(below));
        assert_eq!(graph.node_at(Point::new(1000.0, 0.0)), None);
    }

    #[test]
    fn test_bring_to_front_and_send_to_back() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = graph.add_node(ShapeKind::Rectangle, Point::new(50.0, 0.0));
        let far = graph.add_node(ShapeKind::Rectangle, Point::new(1000.0, 0.0));
        graph.set_node_z(far, 7.0).unwrap();

        let z = graph.bring_to_front(a).unwrap();
        assert_approx_eq!(f32, z, 0.1);
        let z = graph.bring_to_front(b).unwrap();
        assert_approx_eq!(f32, z, 0.2);
        let z = graph.send_to_back(b).unwrap();
        assert_approx_eq!(f32, z, 0.0);

        // Without overlapping nodes the z value resets to 0.
        assert_eq!(graph.bring_to_front(far).unwrap(), 0.0);
    }

    #[test]
    fn test_clone_preserving_ids() {
        let (graph, a, b, c) = two_connected_nodes();
        let clone = graph.clone_graph(CloneMode::PreserveIds);

        assert_eq!(clone, graph);
        assert_eq!(clone.connector(c).unwrap().start(), a);
        assert_eq!(clone.connector(c).unwrap().end(), b);
        assert_eq!(clone.id_generator(), graph.id_generator());
    }

    #[test]
    fn test_clone_with_fresh_ids_is_independent() {
        let mut graph = DiagramGraph::new();
        graph.add_label("first", Point::default());
        let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = graph.add_node(ShapeKind::Circle, Point::new(300.0, 0.0));
        graph.add_connector(a, b).unwrap();

        let mut clone = graph.clone_graph(CloneMode::FreshIds);
        assert_eq!(clone.node_count(), 2);
        assert_eq!(clone.connector_count(), 1);
        assert_eq!(clone.label_count(), 1);
        assert!(clone.is_consistent());

        // Nodes are copied before labels, so ids are reassigned.
        assert_eq!(clone.nodes().next().unwrap().id(), EntityId::new(1));

        let cloned_node = clone.nodes().next().unwrap().id();
        clone.remove_node(cloned_node);
        assert_eq!(graph.connector_count(), 1);
        assert_eq!(clone.connector_count(), 0);
    }

    #[test]
    fn test_merge_from_offsets_and_rewires() {
        let (source, a, b, _) = two_connected_nodes();
        let mut target = DiagramGraph::new();
        target.add_node(ShapeKind::Diamond, Point::new(-500.0, 0.0));

        let id_map = target.merge_from(&source, Point::new(20.0, 20.0), 0.1);
        let new_a = id_map[&a];
        let new_b = id_map[&b];

        assert_eq!(target.node_count(), 3);
        assert_eq!(target.node(new_a).unwrap().position(), Point::new(20.0, 20.0));
        assert_approx_eq!(f32, target.node(new_b).unwrap().z_value(), 0.1);
        let connector = &target.connectors()[0];
        assert_eq!((connector.start(), connector.end()), (new_a, new_b));
        assert!(target.is_consistent());
    }

    #[test]
    fn test_extract_keeps_only_internal_connectors() {
        let (mut graph, a, b, c) = two_connected_nodes();
        let d = graph.add_node(ShapeKind::Triangle, Point::new(0.0, 400.0));
        graph.add_connector(a, d).unwrap();

        let subgraph = graph.extract(&BTreeSet::from([a, b]));
        assert_eq!(subgraph.node_count(), 2);
        assert_eq!(subgraph.connector_count(), 1);
        assert_eq!(subgraph.connectors()[0].id(), c);
        assert_eq!(subgraph.node(a).unwrap().connector_ids().len(), 1);
        assert!(subgraph.is_consistent());
    }

    #[test]
    fn test_insert_node_rejects_taken_id() {
        let (mut graph, a, _, _) = two_connected_nodes();
        let node = ShapeNode::new(a, ShapeKind::Circle, Point::default());
        assert!(graph.insert_node(node).is_err());

        let node = ShapeNode::new(EntityId::new(40), ShapeKind::Circle, Point::default());
        graph.insert_node(node).unwrap();
        assert_eq!(graph.add_label("after", Point::default()), EntityId::new(41));
    }

    #[test]
    fn test_create_group_validates_members() {
        let (mut graph, a, b, line) = two_connected_nodes();

        let err = graph.create_group(&BTreeSet::from([a, line])).unwrap_err();
        assert!(matches!(err, QuiverError::InvalidReference { id, .. } if id == line));
        assert!(matches!(
            graph.create_group(&BTreeSet::from([a])),
            Err(QuiverError::GroupTooSmall(1))
        ));
        assert_eq!(graph.group_count(), 0);

        let group = graph.create_group(&BTreeSet::from([a, b])).unwrap();
        assert_eq!(group, EntityId::new(4));
        assert_eq!(graph.group_of(a), Some(group));
        assert_eq!(graph.group_of(b), Some(group));
        assert!(!graph.contains(group));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_create_group_absorbs_existing_groups() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = graph.add_node(ShapeKind::Rectangle, Point::new(200.0, 0.0));
        let c = graph.add_node(ShapeKind::Rectangle, Point::new(400.0, 0.0));
        let first = graph.create_group(&BTreeSet::from([a, b])).unwrap();

        // Only `b` is named, but `a` follows it out of the old group.
        let merged = graph.create_group(&BTreeSet::from([b, c])).unwrap();
        assert!(graph.group(first).is_none());
        assert_eq!(graph.group_count(), 1);
        assert_eq!(graph.group(merged).unwrap().members(), &BTreeSet::from([a, b, c]));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_removing_members_dissolves_small_groups() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = graph.add_node(ShapeKind::Rectangle, Point::new(200.0, 0.0));
        let c = graph.add_node(ShapeKind::Rectangle, Point::new(400.0, 0.0));
        let group = graph.create_group(&BTreeSet::from([a, b, c])).unwrap();

        graph.remove_node(a);
        assert_eq!(graph.group(group).unwrap().members(), &BTreeSet::from([b, c]));

        graph.remove_node(b);
        assert!(graph.group(group).is_none());
        assert_eq!(graph.group_of(c), None);
        assert!(graph.is_consistent());

        assert!(!graph.dissolve_group(group));
    }

    #[test]
    fn test_groups_survive_clone_and_extract() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = graph.add_node(ShapeKind::Rectangle, Point::new(200.0, 0.0));
        let c = graph.add_node(ShapeKind::Rectangle, Point::new(400.0, 0.0));
        graph.create_group(&BTreeSet::from([a, b, c])).unwrap();

        let clone = graph.clone_graph(CloneMode::FreshIds);
        let copied = clone.groups().next().unwrap();
        assert_eq!(copied.members().len(), 3);
        assert!(copied.members().iter().all(|id| clone.node(*id).is_some()));
        assert!(clone.is_consistent());

        let pair = graph.extract(&BTreeSet::from([a, b]));
        assert_eq!(pair.groups().next().unwrap().members(), &BTreeSet::from([a, b]));

        let single = graph.extract(&BTreeSet::from([c]));
        assert_eq!(single.group_count(), 0);
    }

    #[test]
    fn test_merge_does_not_map_group_ids() {
        let (mut source, a, b, _) = two_connected_nodes();
        let group = source.create_group(&BTreeSet::from([a, b])).unwrap();

        let mut target = DiagramGraph::new();
        let id_map = target.merge_from(&source, Point::new(10.0, 10.0), 0.0);
        assert_eq!(id_map.len(), 3);
        assert!(!id_map.contains_key(&group));
        assert_eq!(target.group_count(), 1);
        assert!(target.is_consistent());
    }
}
