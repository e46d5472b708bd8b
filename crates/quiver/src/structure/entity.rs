//! Entities owned by a [`DiagramGraph`](super::DiagramGraph).

use std::collections::BTreeSet;

use quiver_core::{
    color::Color,
    geometry::{Bounds, Point, Polygon, Segment, Size},
    identifier::EntityId,
    shape::{ShapeKind, boundary_template},
};

pub(crate) const DEFAULT_LABEL_FONT: &str = "16px sans-serif";

/// A positioned polygonal shape.
///
/// The boundary polygon is stored in node-local coordinates and translated by
/// [`ShapeNode::position`] into scene space.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeNode {
    id: EntityId,
    kind: ShapeKind,
    boundary: Polygon,
    position: Point,
    fill_color: Color,
    z_value: f32,
    /// Connectors whose start or end is this node. Derived from the graph's
    /// connector list, never the ownership path.
    connector_ids: BTreeSet<EntityId>,
    move_enabled: bool,
}

impl ShapeNode {
    pub(crate) fn new(id: EntityId, kind: ShapeKind, position: Point) -> Self {
        Self {
            id,
            kind,
            boundary: boundary_template(kind),
            position,
            fill_color: Color::white(),
            z_value: 0.0,
            connector_ids: BTreeSet::new(),
            move_enabled: true,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Boundary polygon in node-local coordinates.
    pub fn boundary(&self) -> &Polygon {
        &self.boundary
    }

    /// Scene-space translation of the boundary.
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn fill_color(&self) -> Color {
        self.fill_color
    }

    /// Stacking order; larger values are drawn on top.
    pub fn z_value(&self) -> f32 {
        self.z_value
    }

    /// Ids of the connectors attached to this node, in ascending order.
    pub fn connector_ids(&self) -> &BTreeSet<EntityId> {
        &self.connector_ids
    }

    /// False while the node is axis-locked by a drag alignment latch.
    pub fn move_enabled(&self) -> bool {
        self.move_enabled
    }

    /// Returns the boundary polygon in scene coordinates.
    pub fn scene_boundary(&self) -> Polygon {
        self.boundary.translate(self.position)
    }

    /// Scene-space bounding box of the boundary.
    ///
    /// An empty boundary yields a zero-sized box at the node position.
    pub fn scene_bounds(&self) -> Bounds {
        self.boundary
            .bounds()
            .map(|bounds| bounds.translate(self.position))
            .unwrap_or_else(|| Bounds::new_from_center(self.position, Size::default()))
    }

    /// Center of the scene-space bounding box.
    ///
    /// Differs from [`ShapeNode::position`] for asymmetric shapes and after
    /// one-sided resizes.
    pub fn bounding_center(&self) -> Point {
        self.scene_bounds().center()
    }

    /// Converts a scene-space point into this node's local coordinates.
    pub fn to_local(&self, scene_point: Point) -> Point {
        scene_point.sub_point(self.position)
    }

    /// Returns true if the scene-space point lies inside or on the boundary.
    pub fn contains(&self, scene_point: Point) -> bool {
        self.boundary.contains(self.to_local(scene_point))
    }

    /// Returns a copy with a different id and no attached connectors.
    pub(crate) fn with_id(&self, id: EntityId) -> Self {
        Self {
            id,
            connector_ids: BTreeSet::new(),
            ..self.clone()
        }
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_boundary(&mut self, boundary: Polygon) {
        self.boundary = boundary;
    }

    pub(crate) fn set_fill_color(&mut self, color: Color) {
        self.fill_color = color;
    }

    pub(crate) fn set_z_value(&mut self, z_value: f32) {
        self.z_value = z_value;
    }

    pub(crate) fn set_move_enabled(&mut self, enabled: bool) {
        self.move_enabled = enabled;
    }

    pub(crate) fn connector_ids_mut(&mut self) -> &mut BTreeSet<EntityId> {
        &mut self.connector_ids
    }
}

/// A directed edge between two shape nodes.
///
/// Connectors hold no reference to their nodes besides the two ids. The
/// cached line is the last routed geometry and is recomputed whenever either
/// endpoint moves or changes shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Connector {
    id: EntityId,
    start: EntityId,
    end: EntityId,
    color: Color,
    cached_line: Segment,
}

impl Connector {
    pub(crate) fn new(id: EntityId, start: EntityId, end: EntityId, color: Color) -> Self {
        Self {
            id,
            start,
            end,
            color,
            cached_line: Segment::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Id of the node the connector starts at.
    pub fn start(&self) -> EntityId {
        self.start
    }

    /// Id of the node the connector points to.
    pub fn end(&self) -> EntityId {
        self.end
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// Last routed geometry, clipped to both endpoint boundaries.
    pub fn cached_line(&self) -> Segment {
        self.cached_line
    }

    /// Returns true if either endpoint is `node`.
    pub fn touches(&self, node: EntityId) -> bool {
        self.start == node || self.end == node
    }

    pub(crate) fn with_endpoints(&self, id: EntityId, start: EntityId, end: EntityId) -> Self {
        Self {
            id,
            start,
            end,
            ..self.clone()
        }
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub(crate) fn set_cached_line(&mut self, line: Segment) {
        self.cached_line = line;
    }
}

/// A free-standing text annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    id: EntityId,
    text: String,
    position: Point,
    font: String,
    color: Color,
}

impl TextLabel {
    pub(crate) fn new(id: EntityId, text: String, position: Point) -> Self {
        Self {
            id,
            text,
            position,
            font: DEFAULT_LABEL_FONT.to_string(),
            color: Color::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Scene position of the label's anchor (the start of its baseline).
    pub fn position(&self) -> Point {
        self.position
    }

    /// CSS font shorthand, e.g. `"16px sans-serif"`.
    pub fn font(&self) -> &str {
        &self.font
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub(crate) fn with_id(&self, id: EntityId) -> Self {
        Self { id, ..self.clone() }
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn set_font(&mut self, font: String) {
        self.font = font;
    }

    pub(crate) fn set_color(&mut self, color: Color) {
        self.color = color;
    }
}

/// A set of nodes that is selected and dragged as one unit.
///
/// Groups are flat: a node belongs to at most one group, and a group always
/// has at least two members.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGroup {
    id: EntityId,
    members: BTreeSet<EntityId>,
}

impl NodeGroup {
    pub(crate) fn new(id: EntityId, members: BTreeSet<EntityId>) -> Self {
        Self { id, members }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Ids of the member nodes.
    pub fn members(&self) -> &BTreeSet<EntityId> {
        &self.members
    }

    pub fn contains(&self, node_id: EntityId) -> bool {
        self.members.contains(&node_id)
    }

    pub(crate) fn members_mut(&mut self) -> &mut BTreeSet<EntityId> {
        &mut self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_node_uses_template() {
        let node = ShapeNode::new(EntityId::new(1), ShapeKind::Diamond, Point::new(10.0, 20.0));
        assert_eq!(node.boundary(), &boundary_template(ShapeKind::Diamond));
        assert_eq!(node.fill_color(), Color::white());
        assert!(node.move_enabled());
        assert!(node.connector_ids().is_empty());
    }

    #[test]
    fn test_node_scene_geometry() {
        let node = ShapeNode::new(EntityId::new(1), ShapeKind::Rectangle, Point::new(50.0, 0.0));
        let bounds = node.scene_bounds();
        assert_eq!(bounds.min_point(), Point::new(-50.0, -100.0));
        assert_eq!(bounds.max_point(), Point::new(150.0, 100.0));
        assert_eq!(node.bounding_center(), Point::new(50.0, 0.0));

        assert!(node.contains(Point::new(140.0, 90.0)));
        assert!(!node.contains(Point::new(160.0, 0.0)));
    }

    #[test]
    fn test_node_with_id_drops_back_references() {
        let mut node = ShapeNode::new(EntityId::new(1), ShapeKind::Circle, Point::default());
        node.connector_ids_mut().insert(EntityId::new(9));

        let copy = node.with_id(EntityId::new(4));
        assert_eq!(copy.id(), EntityId::new(4));
        assert!(copy.connector_ids().is_empty());
        assert_eq!(copy.boundary(), node.boundary());
    }

    #[test]
    fn test_connector_touches() {
        let connector = Connector::new(
            EntityId::new(3),
            EntityId::new(1),
            EntityId::new(2),
            Color::default(),
        );
        assert!(connector.touches(EntityId::new(1)));
        assert!(connector.touches(EntityId::new(2)));
        assert!(!connector.touches(EntityId::new(3)));
    }
}
