//! Editor modes and the pointer gesture state machine.
//!
//! The [`EditorMode`] decides what a pointer press starts; the
//! [`GestureState`] tracks the gesture in progress until the matching
//! release. Transitions are driven by the editor's `pointer_down`,
//! `pointer_move` and `pointer_up` handlers:
//!
//! ```text
//! Idle ── press on a resize handle ──> Resizing ─────── release ──> Idle
//! Idle ── press on a node ───────────> Dragging ─────── release ──> Idle
//! Idle ── press in InsertLine mode ──> ConnectingLine ─ release ──> Idle
//! Idle ── press in InsertText mode ──> EditingText ──── commit ───> Idle
//! ```

use quiver_core::{
    geometry::{Point, Polygon, Segment},
    identifier::EntityId,
    shape::{ResizeHandle, ShapeKind},
};

/// What the next pointer press does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    /// Insert a node of the given kind at the pointer.
    InsertItem(ShapeKind),
    /// Draw a connector from the node under the press to the node under the release.
    InsertLine,
    /// Insert a text label at the pointer and start editing it.
    InsertText,
    /// Select, move and resize existing entities.
    #[default]
    MoveItem,
}

/// The gesture in progress.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum GestureState {
    #[default]
    Idle,
    /// Moving the selection.
    Dragging(DragGesture),
    /// Drawing a connector; `preview` runs from the press to the pointer.
    ConnectingLine { preview: Segment },
    /// Editing the text of a label. `original` is the text before editing.
    EditingText { label_id: EntityId, original: String },
    /// Rescaling a node through one of its handles from its `original` boundary.
    Resizing {
        node_id: EntityId,
        handle: ResizeHandle,
        original: Polygon,
    },
}

impl GestureState {
    /// Short name used in log output.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dragging(_) => "dragging",
            Self::ConnectingLine { .. } => "connecting_line",
            Self::EditingText { .. } => "editing_text",
            Self::Resizing { .. } => "resizing",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Pointer drag over the selection.
///
/// A lone selected node is dragged through the alignment engine; any other
/// selection is translated rigidly by the pointer offset.
#[derive(Debug, Clone, PartialEq)]
pub enum DragGesture {
    Aligned { node_id: EntityId },
    Group {
        origin: Point,
        nodes: Vec<(EntityId, Point)>,
        labels: Vec<(EntityId, Point)>,
    },
}
