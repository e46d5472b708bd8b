//! Drag-time alignment guides and sticky axis locking.
//!
//! While a single node is dragged, the [`AlignmentEngine`] compares its
//! position with every other node on each pointer move:
//!
//! - positions equal on an axis within the guide tolerance produce a
//!   full-span [`GuideLine`] through that coordinate;
//! - positions within the coarser sticky tolerance on an axis *latch* that
//!   axis: the dragged node snaps to the other node's coordinate and keeps it
//!   while the pointer stays within the sticky tolerance of where it was when
//!   the latch engaged.
//!
//! Candidates are evaluated topmost first and the first node that qualifies
//! on an axis takes the latch; once an axis is latched no other candidate is
//! considered for it. This is a local greedy heuristic, not a layout solver.
//!
//! Guide lines are transient: they are rebuilt on every move and cleared when
//! the drag ends.

use log::{debug, trace};

use quiver_core::{
    geometry::{Point, Segment, Size},
    identifier::EntityId,
};

use crate::{config::AlignmentConfig, error::QuiverError, structure::DiagramGraph};

/// Which axes of two points coincide within a tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Neither,
    /// Same x coordinate; shown as a vertical guide.
    X,
    /// Same y coordinate; shown as a horizontal guide.
    Y,
    Both,
}

impl Alignment {
    /// Compares two points axis by axis.
    ///
    /// # Examples
    ///
    /// ```
    /// # use quiver::{align::Alignment, geometry::Point};
    /// let a = Point::new(100.0, 100.0);
    /// assert_eq!(Alignment::between(a, Point::new(100.05, 300.0), 0.1), Alignment::X);
    /// assert_eq!(Alignment::between(a, Point::new(0.0, 0.0), 0.1), Alignment::Neither);
    /// ```
    pub fn between(a: Point, b: Point, tolerance: f32) -> Self {
        let x = close_enough(a.x(), b.x(), tolerance);
        let y = close_enough(a.y(), b.y(), tolerance);
        match (x, y) {
            (false, false) => Self::Neither,
            (true, false) => Self::X,
            (false, true) => Self::Y,
            (true, true) => Self::Both,
        }
    }

    pub fn x(self) -> bool {
        matches!(self, Self::X | Self::Both)
    }

    pub fn y(self) -> bool {
        matches!(self, Self::Y | Self::Both)
    }
}

fn close_enough(a: f32, b: f32, tolerance: f32) -> bool {
    (a - b).abs() < tolerance
}

/// Orientation of a guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideOrientation {
    Horizontal,
    Vertical,
}

/// A transient full-span line marking an exact alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    orientation: GuideOrientation,
    coordinate: f32,
    segment: Segment,
}

impl GuideLine {
    /// Builds a guide spanning a scene of `scene` size centered on the origin.
    fn new(orientation: GuideOrientation, coordinate: f32, scene: Size) -> Self {
        let (half_w, half_h) = (scene.width() / 2.0, scene.height() / 2.0);
        let segment = match orientation {
            GuideOrientation::Horizontal => Segment::new(
                Point::new(-half_w, coordinate),
                Point::new(half_w, coordinate),
            ),
            GuideOrientation::Vertical => Segment::new(
                Point::new(coordinate, -half_h),
                Point::new(coordinate, half_h),
            ),
        };
        Self {
            orientation,
            coordinate,
            segment,
        }
    }

    pub fn orientation(&self) -> GuideOrientation {
        self.orientation
    }

    /// The y of a horizontal guide, or the x of a vertical one.
    pub fn coordinate(&self) -> f32 {
        self.coordinate
    }

    pub fn segment(&self) -> Segment {
        self.segment
    }
}

/// Pointer position captured when an axis latched.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Latch {
    anchor: Point,
}

#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    node_id: EntityId,
    /// Pointer minus node position at drag start.
    grab_offset: Point,
    start_position: Point,
    x_latch: Option<Latch>,
    y_latch: Option<Latch>,
}

/// Per-gesture alignment state for a single dragged node.
#[derive(Debug, Clone)]
pub struct AlignmentEngine {
    guide_tolerance: f32,
    sticky_tolerance: f32,
    scene: Size,
    session: Option<DragSession>,
    guides: Vec<GuideLine>,
}

impl AlignmentEngine {
    pub fn new(config: &AlignmentConfig) -> Self {
        Self {
            guide_tolerance: config.guide_tolerance(),
            sticky_tolerance: config.sticky_tolerance(),
            scene: Size::new(config.scene_width(), config.scene_height()),
            session: None,
            guides: Vec::new(),
        }
    }

    /// Starts dragging `node_id` with the pointer at `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownEntity`] if there is no such node.
    pub fn drag_start(
        &mut self,
        graph: &DiagramGraph,
        node_id: EntityId,
        pointer: Point,
    ) -> Result<(), QuiverError> {
        let node = graph
            .node(node_id)
            .ok_or(QuiverError::UnknownEntity(node_id))?;
        self.guides.clear();
        self.session = Some(DragSession {
            node_id,
            grab_offset: pointer.sub_point(node.position()),
            start_position: node.position(),
            x_latch: None,
            y_latch: None,
        });
        debug!(node_id:% = node_id, pointer:?; "Drag started");
        Ok(())
    }

    /// Handles one pointer move of the active drag.
    ///
    /// 1. Releases every latch whose locked axis the pointer has left by the
    ///    sticky tolerance or more.
    /// 2. Moves the node: unlatched axes follow the pointer, latched axes keep
    ///    their coordinate.
    /// 3. Latches each still-free axis onto the first candidate (topmost
    ///    first) within the sticky tolerance, snapping to its coordinate.
    /// 4. Rebuilds the guide lines for the final position.
    ///
    /// The node's connectors are rerouted afterwards. Without an active drag
    /// this does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownEntity`] if the dragged node has been
    /// removed in the meantime; the drag is abandoned.
    pub fn drag_move(&mut self, graph: &mut DiagramGraph, pointer: Point) -> Result<(), QuiverError> {
        self.guides.clear();
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let node_id = session.node_id;
        if graph.node(node_id).is_none() {
            self.session = None;
            return Err(QuiverError::UnknownEntity(node_id));
        }

        let sticky = self.sticky_tolerance;
        if session
            .x_latch
            .is_some_and(|latch| !close_enough(pointer.x(), latch.anchor.x(), sticky))
        {
            session.x_latch = None;
            debug!(node_id:% = node_id; "Released x latch");
        }
        if session
            .y_latch
            .is_some_and(|latch| !close_enough(pointer.y(), latch.anchor.y(), sticky))
        {
            session.y_latch = None;
            debug!(node_id:% = node_id; "Released y latch");
        }

        let current = graph
            .node(node_id)
            .map(|node| node.position())
            .unwrap_or_default();
        let free = pointer.sub_point(session.grab_offset);
        let mut position = Point::new(
            if session.x_latch.is_some() { current.x() } else { free.x() },
            if session.y_latch.is_some() { current.y() } else { free.y() },
        );

        let candidates: Vec<Point> = graph
            .nodes_topmost_first()
            .into_iter()
            .filter(|node| node.id() != node_id)
            .map(|node| node.position())
            .collect();

        for target in &candidates {
            if session.x_latch.is_none() && close_enough(position.x(), target.x(), sticky) {
                session.x_latch = Some(Latch { anchor: pointer });
                position = position.with_x(target.x());
                debug!(node_id:% = node_id, x = target.x(); "Latched x axis");
            }
            if session.y_latch.is_none() && close_enough(position.y(), target.y(), sticky) {
                session.y_latch = Some(Latch { anchor: pointer });
                position = position.with_y(target.y());
                debug!(node_id:% = node_id, y = target.y(); "Latched y axis");
            }
        }

        for target in &candidates {
            let alignment = Alignment::between(*target, position, self.guide_tolerance);
            if alignment.y() {
                self.guides
                    .push(GuideLine::new(GuideOrientation::Horizontal, target.y(), self.scene));
            }
            if alignment.x() {
                self.guides
                    .push(GuideLine::new(GuideOrientation::Vertical, target.x(), self.scene));
            }
        }

        let latched = session.x_latch.is_some() || session.y_latch.is_some();
        graph.apply_move(node_id, position)?;
        graph.set_move_enabled(node_id, !latched)?;
        graph.reroute_node(node_id);

        trace!(
            node_id:% = node_id,
            position:?,
            guides = self.guides.len();
            "Drag move"
        );
        Ok(())
    }

    /// Ends the active drag, clearing latches and guides and re-enabling
    /// free movement on every node.
    ///
    /// Returns the dragged node if its position changed during the gesture.
    pub fn drag_end(&mut self, graph: &mut DiagramGraph) -> Option<EntityId> {
        self.guides.clear();
        graph.enable_all_moves();
        let session = self.session.take()?;
        let moved = graph
            .node(session.node_id)
            .is_some_and(|node| node.position() != session.start_position);
        debug!(node_id:% = session.node_id, moved; "Drag ended");
        moved.then_some(session.node_id)
    }

    /// Guide lines of the latest move.
    pub fn guides(&self) -> &[GuideLine] {
        &self.guides
    }

    /// The node being dragged, if any.
    pub fn dragged_node(&self) -> Option<EntityId> {
        self.session.as_ref().map(|session| session.node_id)
    }

    /// Returns true while the x axis of the dragged node is locked.
    pub fn is_x_latched(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.x_latch.is_some())
    }

    /// Returns true while the y axis of the dragged node is locked.
    pub fn is_y_latched(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.y_latch.is_some())
    }
}
