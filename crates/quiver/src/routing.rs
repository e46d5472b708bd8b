//! Boundary-clipped connector geometry.
//!
//! A connector is drawn along the line between the positions of its two
//! nodes, cut back so that it starts and ends on the node outlines instead of
//! crossing the shape interiors.
//!
//! Each outline is walked edge by edge in point order and the **first** edge
//! with a bounded intersection wins. Shapes are assumed to be convex or close
//! to it, so at most one edge faces the other node; no search for the closest
//! or outermost hit is made. When no edge intersects (overlapping nodes, a
//! node inside the other, a degenerate polygon or coincident positions) the
//! endpoint falls back to the node position.

use log::trace;

use quiver_core::geometry::{Point, Segment};

use crate::structure::{Connector, ShapeNode};

/// Computes the visible segment of `connector` between its two nodes.
///
/// `start` and `end` must be the nodes the connector refers to.
pub fn route(connector: &Connector, start: &ShapeNode, end: &ShapeNode) -> Segment {
    debug_assert_eq!(connector.start(), start.id());
    debug_assert_eq!(connector.end(), end.id());

    let center_line = Segment::new(start.position(), end.position());
    let from = boundary_crossing(start, center_line).unwrap_or(start.position());
    let to = boundary_crossing(end, center_line).unwrap_or(end.position());

    trace!(
        connector_id:% = connector.id(),
        from:?,
        to:?;
        "Routed connector"
    );
    Segment::new(from, to)
}

/// Finds where `line` crosses the scene-space outline of `node`.
///
/// Returns the intersection with the first edge, in polygon point order, that
/// `line` crosses within both segments; `None` if there is none.
pub fn boundary_crossing(node: &ShapeNode, line: Segment) -> Option<Point> {
    if node.boundary().is_degenerate() || line.is_degenerate() {
        return None;
    }

    let offset = node.position();
    node.boundary()
        .edges()
        .map(|edge| edge.translate(offset))
        .find_map(|edge| edge.bounded_intersection(line))
}
