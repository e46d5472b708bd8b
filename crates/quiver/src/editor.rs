//! The editor facade.
//!
//! [`Editor`] owns one [`DiagramGraph`] together with everything that edits
//! it: the selection, the current [`EditorMode`] and [`GestureState`], the
//! alignment engine, the clipboard and the undo history. UI collaborators
//! feed it pointer events and commands; every completed gesture or command
//! that changed the graph pushes one snapshot.

use std::collections::BTreeSet;

use log::{debug, info, trace};

use quiver_core::{
    color::Color,
    geometry::{Point, Segment},
    identifier::EntityId,
    shape::{ResizeHandle, ShapeKind, resize_boundary},
};

use crate::{
    align::{AlignmentEngine, GuideLine},
    clipboard::Clipboard,
    config::AppConfig,
    document::{self, DiagramDocument, LoadReport},
    error::QuiverError,
    export::svg::Svg,
    gesture::{DragGesture, EditorMode, GestureState},
    history::SnapshotStack,
    structure::DiagramGraph,
};

/// Defaults applied to newly created entities.
#[derive(Debug, Clone)]
struct EntityStyle {
    node_fill: Color,
    connector_color: Color,
    text_color: Color,
    text_font: String,
    background: Option<Color>,
}

impl EntityStyle {
    fn from_config(config: &AppConfig) -> Result<Self, QuiverError> {
        let style = config.style();
        Ok(Self {
            node_fill: style.node_fill_color().map_err(QuiverError::Config)?,
            connector_color: style.connector_color().map_err(QuiverError::Config)?,
            text_color: style.text_color().map_err(QuiverError::Config)?,
            text_font: style.text_font().to_string(),
            background: style.background_color().map_err(QuiverError::Config)?,
        })
    }
}

/// Interactive editing session over one diagram.
///
/// # Examples
///
/// ```
/// use quiver::{Editor, geometry::Point, shape::ShapeKind};
///
/// let mut editor = Editor::default();
/// let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
/// let b = editor.insert_node(ShapeKind::Circle, Point::new(300.0, 0.0));
/// editor.connect(a, b).unwrap();
///
/// editor.select(a);
/// assert_eq!(editor.delete_selection(), 1);
/// assert_eq!(editor.graph().connector_count(), 0);
///
/// assert!(editor.undo());
/// assert_eq!(editor.graph().connector_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Editor {
    graph: DiagramGraph,
    history: SnapshotStack,
    alignment: AlignmentEngine,
    clipboard: Clipboard,
    selection: BTreeSet<EntityId>,
    mode: EditorMode,
    gesture: GestureState,
    style: EntityStyle,
    paste_offset: Point,
}

impl Default for Editor {
    fn default() -> Self {
        let config = AppConfig::default();
        let style = EntityStyle {
            node_fill: Color::white(),
            connector_color: Color::default(),
            text_color: Color::default(),
            text_font: config.style().text_font().to_string(),
            background: None,
        };
        Self::assemble(&config, style, DiagramGraph::new())
    }
}

impl Editor {
    /// Creates an editor over an empty diagram.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::Config`] if the configuration does not validate.
    pub fn new(config: &AppConfig) -> Result<Self, QuiverError> {
        Self::with_graph(config, DiagramGraph::new())
    }

    /// Creates an editor over an existing diagram. The diagram becomes the
    /// first snapshot of the history.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::Config`] if the configuration does not validate.
    pub fn with_graph(config: &AppConfig, graph: DiagramGraph) -> Result<Self, QuiverError> {
        config.validate().map_err(QuiverError::Config)?;
        let style = EntityStyle::from_config(config)?;
        Ok(Self::assemble(config, style, graph))
    }

    /// Creates an editor over a loaded document.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::Config`] if the configuration does not validate.
    pub fn from_document(
        config: &AppConfig,
        document: &DiagramDocument,
    ) -> Result<(Self, LoadReport), QuiverError> {
        let (graph, report) = document::from_document(document);
        Ok((Self::with_graph(config, graph)?, report))
    }

    fn assemble(config: &AppConfig, style: EntityStyle, mut graph: DiagramGraph) -> Self {
        graph.reroute_all();
        let mut history = SnapshotStack::new(config.editor().history_capacity());
        history.push(graph.clone());
        Self {
            graph,
            history,
            alignment: AlignmentEngine::new(config.alignment()),
            clipboard: Clipboard::new(),
            selection: BTreeSet::new(),
            mode: EditorMode::default(),
            gesture: GestureState::default(),
            style,
            paste_offset: config.editor().paste_offset(),
        }
    }

    pub fn graph(&self) -> &DiagramGraph {
        &self.graph
    }

    pub fn history(&self) -> &SnapshotStack {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    /// Switches the mode. Any label being edited is committed first.
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.commit_text();
        debug!(mode:?; "Editor mode changed");
        self.mode = mode;
    }

    pub fn gesture(&self) -> &GestureState {
        &self.gesture
    }

    /// Alignment guides of the latest drag move.
    pub fn guides(&self) -> &[GuideLine] {
        self.alignment.guides()
    }

    pub fn selection(&self) -> &BTreeSet<EntityId> {
        &self.selection
    }

    /// Adds an entity to the selection, along with the rest of its group.
    /// Returns false if there is no such entity or it was already selected.
    pub fn select(&mut self, id: EntityId) -> bool {
        if !self.graph.contains(id) {
            return false;
        }
        let added = self.selection.insert(id);
        let selection = std::mem::take(&mut self.selection);
        self.selection = self.with_group_members(selection);
        added
    }

    /// Replaces the selection, ignoring ids that do not exist. Grouped nodes
    /// bring their whole group.
    pub fn set_selection(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        let ids = ids.into_iter().filter(|id| self.graph.contains(*id)).collect();
        self.selection = self.with_group_members(ids);
    }

    fn with_group_members(&self, mut ids: BTreeSet<EntityId>) -> BTreeSet<EntityId> {
        let groups: Vec<EntityId> = ids.iter().filter_map(|id| self.graph.group_of(*id)).collect();
        for group_id in groups {
            if let Some(group) = self.graph.group(group_id) {
                ids.extend(group.members().iter().copied());
            }
        }
        ids
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The state of the graph as a persistable document.
    pub fn document(&self) -> DiagramDocument {
        document::to_document(&self.graph)
    }

    /// Renders the current graph to an SVG string with the configured background.
    pub fn render_svg(&self) -> String {
        Svg::new("")
            .with_background(self.style.background)
            .render_graph(&self.graph)
            .to_string()
    }

    fn push_snapshot(&mut self, reason: &'static str) {
        self.graph.debug_check();
        self.history.push(self.graph.clone());
        debug!(reason; "Snapshot committed");
    }

    // -------------------------------------------------------------------------
    // Pointer gestures
    // -------------------------------------------------------------------------

    /// Handles a pointer press at the scene position `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownEntity`] if the gesture could not start
    /// on the node under the pointer.
    pub fn pointer_down(&mut self, pointer: Point) -> Result<(), QuiverError> {
        self.commit_text();

        match self.mode {
            EditorMode::InsertItem(kind) => {
                let id = self.insert_node(kind, pointer);
                self.selection = BTreeSet::from([id]);
                self.mode = EditorMode::MoveItem;
            }
            EditorMode::InsertLine => {
                self.gesture = GestureState::ConnectingLine {
                    preview: Segment::new(pointer, pointer),
                };
            }
            EditorMode::InsertText => {
                let id = self.graph.add_label(String::new(), pointer);
                self.graph.set_label_color(id, self.style.text_color)?;
                self.graph.set_label_font(id, self.style.text_font.clone())?;
                self.selection = BTreeSet::from([id]);
                self.gesture = GestureState::EditingText {
                    label_id: id,
                    original: String::new(),
                };
                self.mode = EditorMode::MoveItem;
            }
            EditorMode::MoveItem => self.press_in_move_mode(pointer)?,
        }

        trace!(gesture = self.gesture.name(); "Pointer down");
        Ok(())
    }

    fn press_in_move_mode(&mut self, pointer: Point) -> Result<(), QuiverError> {
        if let Some((node_id, handle)) = self.resize_handle_at(pointer) {
            let original = self
                .graph
                .node(node_id)
                .map(|node| node.boundary().clone())
                .ok_or(QuiverError::UnknownEntity(node_id))?;
            debug!(node_id:% = node_id, handle:?; "Resize started");
            self.gesture = GestureState::Resizing {
                node_id,
                handle,
                original,
            };
            return Ok(());
        }

        let Some(node_id) = self.graph.node_at(pointer) else {
            self.selection.clear();
            return Ok(());
        };
        if !self.selection.contains(&node_id) {
            self.selection = self.with_group_members(BTreeSet::from([node_id]));
        }

        if self.selection.len() == 1 {
            self.alignment.drag_start(&self.graph, node_id, pointer)?;
            self.gesture = GestureState::Dragging(DragGesture::Aligned { node_id });
            return Ok(());
        }

        let nodes = self
            .selection
            .iter()
            .filter_map(|id| self.graph.node(*id))
            .map(|node| (node.id(), node.position()))
            .collect();
        let labels = self
            .selection
            .iter()
            .filter_map(|id| self.graph.label(*id))
            .map(|label| (label.id(), label.position()))
            .collect();
        self.gesture = GestureState::Dragging(DragGesture::Group {
            origin: pointer,
            nodes,
            labels,
        });
        Ok(())
    }

    /// The resize handle under the pointer, if exactly one node is selected.
    fn resize_handle_at(&self, pointer: Point) -> Option<(EntityId, ResizeHandle)> {
        if self.selection.len() != 1 {
            return None;
        }
        let id = *self.selection.first()?;
        let node = self.graph.node(id)?;
        let bounds = node.boundary().bounds()?;
        ResizeHandle::hit_test(bounds, node.to_local(pointer)).map(|handle| (id, handle))
    }

    /// Handles a pointer move to `pointer`.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownEntity`] if the entity being dragged or
    /// resized no longer exists.
    pub fn pointer_move(&mut self, pointer: Point) -> Result<(), QuiverError> {
        match &mut self.gesture {
            GestureState::Idle | GestureState::EditingText { .. } => {}
            GestureState::Dragging(DragGesture::Aligned { .. }) => {
                self.alignment.drag_move(&mut self.graph, pointer)?;
            }
            GestureState::Dragging(DragGesture::Group {
                origin,
                nodes,
                labels,
            }) => {
                let delta = pointer.sub_point(*origin);
                for (id, start) in nodes.iter() {
                    self.graph.apply_move(*id, start.add_point(delta))?;
                }
                for (id, _) in nodes.iter() {
                    self.graph.reroute_node(*id);
                    trace!(node_id:% = id; "Group member moved");
                }
                for (id, start) in labels.iter() {
                    self.graph.move_label(*id, start.add_point(delta))?;
                }
            }
            GestureState::ConnectingLine { preview } => {
                *preview = Segment::new(preview.start(), pointer);
            }
            GestureState::Resizing {
                node_id,
                handle,
                original,
            } => {
                let node = self
                    .graph
                    .node(*node_id)
                    .ok_or(QuiverError::UnknownEntity(*node_id))?;
                match resize_boundary(original, *handle, node.to_local(pointer)) {
                    Some(boundary) => self.graph.set_boundary(*node_id, boundary)?,
                    None => trace!(node_id:% = node_id; "Resize step rejected"),
                }
            }
        }
        Ok(())
    }

    /// Handles a pointer release at `pointer`, completing the active gesture.
    ///
    /// A label being edited stays in [`GestureState::EditingText`] until it is
    /// committed.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::InvalidReference`] only for connector gestures
    /// whose endpoints vanished during the gesture.
    pub fn pointer_up(&mut self, pointer: Point) -> Result<(), QuiverError> {
        if matches!(self.gesture, GestureState::EditingText { .. }) {
            return Ok(());
        }
        let gesture = std::mem::take(&mut self.gesture);
        trace!(gesture = gesture.name(); "Pointer up");

        match gesture {
            GestureState::Idle | GestureState::EditingText { .. } => {}
            GestureState::Dragging(DragGesture::Aligned { .. }) => {
                if self.alignment.drag_end(&mut self.graph).is_some() {
                    self.push_snapshot("drag");
                }
            }
            GestureState::Dragging(DragGesture::Group { nodes, labels, .. }) => {
                let moved = nodes.iter().any(|(id, start)| {
                    self.graph.node(*id).is_some_and(|node| node.position() != *start)
                }) || labels.iter().any(|(id, start)| {
                    self.graph.label(*id).is_some_and(|label| label.position() != *start)
                });
                if moved {
                    self.push_snapshot("group drag");
                }
            }
            GestureState::ConnectingLine { preview } => {
                let line = Segment::new(preview.start(), pointer);
                if line.is_degenerate() {
                    trace!("Connector gesture too short");
                    return Ok(());
                }
                let start = self.graph.node_at(line.start());
                let end = self.graph.node_at(line.end());
                if let (Some(start), Some(end)) = (start, end) {
                    if start != end {
                        self.connect(start, end)?;
                    }
                }
            }
            GestureState::Resizing {
                node_id, original, ..
            } => {
                let changed = self
                    .graph
                    .node(node_id)
                    .is_some_and(|node| node.boundary() != &original);
                if changed {
                    self.push_snapshot("resize");
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------------

    /// Inserts a node with the current fill color.
    pub fn insert_node(&mut self, kind: ShapeKind, position: Point) -> EntityId {
        let id = self.graph.add_node(kind, position);
        // The node was just created, so the fill cannot fail.
        self.graph.set_node_fill(id, self.style.node_fill).ok();
        self.push_snapshot("insert node");
        id
    }

    /// Connects two nodes with the current connector color.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::InvalidReference`] if either node is missing or
    /// both ids are the same.
    pub fn connect(&mut self, start: EntityId, end: EntityId) -> Result<EntityId, QuiverError> {
        let id = self.graph.add_connector(start, end)?;
        self.graph.set_connector_color(id, self.style.connector_color)?;
        self.push_snapshot("connect");
        Ok(id)
    }

    /// Inserts a finished label with the current text style.
    pub fn insert_label(&mut self, text: impl Into<String>, position: Point) -> EntityId {
        let id = self.graph.add_label(text, position);
        self.graph.set_label_color(id, self.style.text_color).ok();
        self.graph.set_label_font(id, self.style.text_font.clone()).ok();
        self.push_snapshot("insert label");
        id
    }

    /// Starts editing an existing label, committing any label already being edited.
    ///
    /// # Errors
    ///
    /// Returns [`QuiverError::UnknownEntity`] if there is no such label.
    pub fn edit_label(&mut self, id: EntityId) -> Result<(), QuiverError> {
        self.commit_text();
        let label = self.graph.label(id).ok_or(QuiverError::UnknownEntity(id))?;
        self.gesture = GestureState::EditingText {
            label_id: id,
            original: label.text().to_string(),
        };
        Ok(())
    }

    /// Replaces the text of the label being edited. Returns false when no
    /// label is being edited.
    pub fn set_editing_text(&mut self, text: impl Into<String>) -> bool {
        let GestureState::EditingText { label_id, .. } = &self.gesture else {
            return false;
        };
        self.graph.set_label_text(*label_id, text).is_ok()
    }

    /// Finishes editing the current label.
    ///
    /// An empty label is removed. Returns true if the edit pushed a snapshot,
    /// which happens when the text differs from what it was before editing.
    pub fn commit_text(&mut self) -> bool {
        let (label_id, original) = match std::mem::take(&mut self.gesture) {
            GestureState::EditingText { label_id, original } => (label_id, original),
            other => {
                self.gesture = other;
                return false;
            }
        };

        let text = self
            .graph
            .label(label_id)
            .map(|label| label.text().to_string())
            .unwrap_or_default();
        if text.is_empty() {
            self.graph.remove_label(label_id);
            self.selection.remove(&label_id);
            debug!(label_id:% = label_id; "Empty label removed");
        }
        if text == original {
            return false;
        }
        self.push_snapshot("edit text");
        true
    }

    /// Deletes every selected entity. Removing a node also removes its
    /// connectors. Returns the number of entities removed.
    pub fn delete_selection(&mut self) -> usize {
        self.commit_text();
        let removed = self.graph.remove_entities(&self.selection);
        self.selection.clear();
        if removed > 0 {
            self.push_snapshot("delete");
        }
        removed
    }

    /// Copies the selection. Returns false if nothing was copied.
    pub fn copy(&mut self) -> bool {
        self.clipboard.copy(&self.graph, &self.selection)
    }

    /// Copies then deletes the selection. Returns false if the selection was
    /// empty.
    ///
    /// Connectors whose endpoints are not selected are not copied, but they
    /// are still deleted.
    pub fn cut(&mut self) -> bool {
        let copied = self.copy();
        let removed = self.delete_selection();
        copied || removed > 0
    }

    /// Pastes the clipboard at the configured offset and selects the pasted
    /// entities. Returns how many entities were pasted.
    pub fn paste(&mut self) -> usize {
        self.commit_text();
        let pasted = self.clipboard.paste(&mut self.graph, self.paste_offset);
        if pasted.is_empty() {
            return 0;
        }
        let count = pasted.len();
        self.selection = pasted;
        self.push_snapshot("paste");
        count
    }

    /// Restores the previous snapshot. Returns false at the start of history.
    pub fn undo(&mut self) -> bool {
        let restored = match self.history.undo() {
            Ok(snapshot) => snapshot.clone(),
            Err(err) => {
                debug!(err:%; "Undo ignored");
                return false;
            }
        };
        self.restore(restored);
        true
    }

    /// Restores the next snapshot. Returns false at the end of history.
    pub fn redo(&mut self) -> bool {
        let restored = match self.history.redo() {
            Ok(snapshot) => snapshot.clone(),
            Err(err) => {
                debug!(err:%; "Redo ignored");
                return false;
            }
        };
        self.restore(restored);
        true
    }

    fn restore(&mut self, mut restored: DiagramGraph) {
        if self.alignment.dragged_node().is_some() {
            self.alignment.drag_end(&mut self.graph);
        }
        self.gesture = GestureState::Idle;
        restored.catch_up_ids(self.graph.id_generator());
        restored.reroute_all();
        self.graph = restored;
        let graph = &self.graph;
        self.selection.retain(|id| graph.contains(*id));
        info!(
            nodes = self.graph.node_count(),
            connectors = self.graph.connector_count(),
            cursor = self.history.cursor();
            "History restored"
        );
    }

    /// Raises the first selected node above every node it overlaps.
    /// Returns false if no node is selected.
    pub fn bring_to_front(&mut self) -> bool {
        let Some(id) = self.first_selected_node() else {
            return false;
        };
        if self.graph.bring_to_front(id).is_err() {
            return false;
        }
        self.push_snapshot("bring to front");
        true
    }

    /// Lowers the first selected node below every node it overlaps.
    /// Returns false if no node is selected.
    pub fn send_to_back(&mut self) -> bool {
        let Some(id) = self.first_selected_node() else {
            return false;
        };
        if self.graph.send_to_back(id).is_err() {
            return false;
        }
        self.push_snapshot("send to back");
        true
    }

    // -------------------------------------------------------------------------
    // Grouping
    // -------------------------------------------------------------------------

    /// Groups the selected nodes so they are selected and dragged as one unit.
    /// Returns the new group, or `None` if fewer than two nodes are selected.
    pub fn group_selection(&mut self) -> Option<EntityId> {
        self.commit_text();
        let nodes: BTreeSet<EntityId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.graph.node(*id).is_some())
            .collect();
        match self.graph.create_group(&nodes) {
            Ok(group_id) => {
                self.push_snapshot("group");
                Some(group_id)
            }
            Err(err) => {
                debug!(err:%; "Group ignored");
                None
            }
        }
    }

    /// Dissolves every group with a selected member, keeping the selection.
    /// Returns how many groups were dissolved.
    pub fn ungroup_selection(&mut self) -> usize {
        self.commit_text();
        let groups: BTreeSet<EntityId> = self
            .selection
            .iter()
            .filter_map(|id| self.graph.group_of(*id))
            .collect();
        let dissolved = groups
            .into_iter()
            .filter(|id| self.graph.dissolve_group(*id))
            .count();
        if dissolved > 0 {
            self.push_snapshot("ungroup");
        }
        dissolved
    }

    fn first_selected_node(&self) -> Option<EntityId> {
        self.selection
            .iter()
            .copied()
            .find(|id| self.graph.node(*id).is_some())
    }

    // -------------------------------------------------------------------------
    // Style
    // -------------------------------------------------------------------------

    /// Fills the selected nodes and makes `color` the fill of new nodes.
    /// Returns true if any node changed.
    pub fn set_fill_color(&mut self, color: Color) -> bool {
        self.style.node_fill = color;
        let targets: Vec<EntityId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.graph.node(*id).is_some_and(|n| n.fill_color() != color))
            .collect();
        for id in &targets {
            self.graph.set_node_fill(*id, color).ok();
        }
        self.finish_style_edit(!targets.is_empty(), "fill color")
    }

    /// Recolors the selected connectors and makes `color` the color of new
    /// connectors. Returns true if any connector changed.
    pub fn set_line_color(&mut self, color: Color) -> bool {
        self.style.connector_color = color;
        let targets: Vec<EntityId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.graph.connector(*id).is_some_and(|c| c.color() != color))
            .collect();
        for id in &targets {
            self.graph.set_connector_color(*id, color).ok();
        }
        self.finish_style_edit(!targets.is_empty(), "line color")
    }

    /// Recolors the selected labels and makes `color` the color of new labels.
    /// Returns true if any label changed.
    pub fn set_text_color(&mut self, color: Color) -> bool {
        self.style.text_color = color;
        let targets: Vec<EntityId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.graph.label(*id).is_some_and(|l| l.color() != color))
            .collect();
        for id in &targets {
            self.graph.set_label_color(*id, color).ok();
        }
        self.finish_style_edit(!targets.is_empty(), "text color")
    }

    /// Sets the font of the selected labels and of new labels.
    /// Returns true if any label changed.
    pub fn set_text_font(&mut self, font: impl Into<String>) -> bool {
        let font = font.into();
        let targets: Vec<EntityId> = self
            .selection
            .iter()
            .copied()
            .filter(|id| self.graph.label(*id).is_some_and(|l| l.font() != font))
            .collect();
        for id in &targets {
            self.graph.set_label_font(*id, font.clone()).ok();
        }
        self.style.text_font = font;
        self.finish_style_edit(!targets.is_empty(), "text font")
    }

    fn finish_style_edit(&mut self, changed: bool, reason: &'static str) -> bool {
        if changed {
            self.push_snapshot(reason);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    fn drag(editor: &mut Editor, from: Point, to: Point) {
        editor.pointer_down(from).unwrap();
        editor.pointer_move(to).unwrap();
        editor.pointer_up(to).unwrap();
    }

    #[test]
    fn test_new_editor_has_initial_snapshot() {
        let editor = Editor::default();
        assert_eq!(editor.history().len(), 1);
        assert!(!editor.history().can_undo());
        assert_eq!(editor.mode(), EditorMode::MoveItem);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config: AppConfig = toml::from_str("[style]\nnode_fill_color = \"nope\"").unwrap();
        assert!(matches!(Editor::new(&config), Err(QuiverError::Config(_))));
    }

    #[test]
    fn test_insert_mode_returns_to_move() {
        let mut editor = Editor::default();
        editor.set_mode(EditorMode::InsertItem(ShapeKind::Diamond));

        editor.pointer_down(Point::new(40.0, 40.0)).unwrap();
        editor.pointer_up(Point::new(40.0, 40.0)).unwrap();

        assert_eq!(editor.mode(), EditorMode::MoveItem);
        assert_eq!(editor.graph().node_count(), 1);
        assert_eq!(editor.selection().len(), 1);
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn test_line_gesture_connects_distinct_nodes() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Circle, Point::new(300.0, 0.0));
        editor.set_mode(EditorMode::InsertLine);

        drag(&mut editor, Point::new(0.0, 0.0), Point::new(300.0, 0.0));
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(50.0, 0.0));
        drag(&mut editor, Point::new(0.0, 0.0), Point::new(1000.0, 0.0));

        assert_eq!(editor.graph().connector_count(), 1);
        let connector = &editor.graph().connectors()[0];
        assert_eq!((connector.start(), connector.end()), (a, b));
        assert!(editor.gesture().is_idle());
    }

    #[test]
    fn test_drag_moves_node_and_pushes_snapshot() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        editor.clear_selection();
        let before = editor.history().len();

        drag(&mut editor, Point::new(10.0, 10.0), Point::new(510.0, 610.0));

        assert_eq!(editor.graph().node(a).unwrap().position(), Point::new(500.0, 600.0));
        assert_eq!(editor.history().len(), before + 1);
        assert!(editor.guides().is_empty());
    }

    #[test]
    fn test_click_without_move_pushes_nothing() {
        let mut editor = Editor::default();
        editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let before = editor.history().len();

        drag(&mut editor, Point::new(10.0, 10.0), Point::new(10.0, 10.0));
        assert_eq!(editor.history().len(), before);

        editor.pointer_down(Point::new(1000.0, 1000.0)).unwrap();
        assert!(editor.selection().is_empty());
    }

    #[test]
    fn test_group_drag_moves_selection_rigidly() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Rectangle, Point::new(400.0, 3.0));
        let label = editor.insert_label("note", Point::new(0.0, 200.0));
        editor.connect(a, b).unwrap();
        editor.set_selection([a, b, label]);

        drag(&mut editor, Point::new(0.0, 0.0), Point::new(20.0, -30.0));

        let graph = editor.graph();
        assert_eq!(graph.node(a).unwrap().position(), Point::new(20.0, -30.0));
        assert_eq!(graph.node(b).unwrap().position(), Point::new(420.0, -27.0));
        assert_eq!(graph.label(label).unwrap().position(), Point::new(20.0, 170.0));
        assert_approx_eq!(f32, graph.connectors()[0].cached_line().start().x(), 120.0, epsilon = 0.01);
    }

    #[test]
    fn test_resize_through_corner_handle() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        editor.set_selection([a]);
        let before = editor.history().len();

        // Bottom-right handle center sits at local (97.5, 97.5).
        editor.pointer_down(Point::new(97.0, 97.0)).unwrap();
        assert_eq!(editor.gesture().name(), "resizing");
        editor.pointer_move(Point::new(150.0, 100.0)).unwrap();
        editor.pointer_up(Point::new(150.0, 100.0)).unwrap();

        let bounds = editor.graph().node(a).unwrap().boundary().bounds().unwrap();
        assert_approx_eq!(f32, bounds.max_x(), 125.0, epsilon = 0.001);
        assert_approx_eq!(f32, bounds.max_y(), 100.0, epsilon = 0.001);
        assert_eq!(editor.history().len(), before + 1);
    }

    #[test]
    fn test_text_editing_lifecycle() {
        let mut editor = Editor::default();
        editor.set_mode(EditorMode::InsertText);
        editor.pointer_down(Point::new(5.0, 5.0)).unwrap();
        editor.pointer_up(Point::new(5.0, 5.0)).unwrap();
        assert_eq!(editor.gesture().name(), "editing_text");

        assert!(editor.set_editing_text("hello"));
        assert!(editor.commit_text());
        assert_eq!(editor.graph().label_count(), 1);
        let history = editor.history().len();

        let id = editor.graph().labels().next().unwrap().id();
        editor.edit_label(id).unwrap();
        assert!(!editor.commit_text());
        assert_eq!(editor.history().len(), history);

        editor.edit_label(id).unwrap();
        editor.set_editing_text("");
        assert!(editor.commit_text());
        assert_eq!(editor.graph().label_count(), 0);
    }

    #[test]
    fn test_abandoned_empty_label_leaves_no_trace() {
        let mut editor = Editor::default();
        editor.set_mode(EditorMode::InsertText);
        editor.pointer_down(Point::new(5.0, 5.0)).unwrap();

        assert!(!editor.commit_text());
        assert_eq!(editor.graph().label_count(), 0);
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_cut_and_paste() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Triangle, Point::new(0.0, 0.0));
        editor.set_selection([a]);

        assert!(editor.cut());
        assert_eq!(editor.graph().node_count(), 0);
        assert_eq!(editor.paste(), 1);

        let pasted = *editor.selection().iter().next().unwrap();
        assert_ne!(pasted, a);
        assert_eq!(editor.graph().node(pasted).unwrap().position(), Point::new(20.0, 20.0));
    }

    #[test]
    fn test_cut_lone_connector_deletes_it() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Rectangle, Point::new(400.0, 0.0));
        let line = editor.connect(a, b).unwrap();
        let snapshots = editor.history().len();
        editor.set_selection([line]);

        assert!(editor.cut());
        assert_eq!(editor.graph().connector_count(), 0);
        assert_eq!(editor.graph().node_count(), 2);
        assert!(editor.clipboard().is_empty());
        assert_eq!(editor.history().len(), snapshots + 1);

        editor.clear_selection();
        assert!(!editor.cut());
        assert_eq!(editor.history().len(), snapshots + 1);
    }

    #[test]
    fn test_grouped_nodes_select_and_drag_together() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Rectangle, Point::new(400.0, 3.0));
        let loose = editor.insert_node(ShapeKind::Circle, Point::new(0.0, 400.0));
        editor.set_selection([a, b]);
        let snapshots = editor.history().len();

        let group = editor.group_selection().unwrap();
        assert_eq!(editor.graph().group_of(a), Some(group));
        assert_eq!(editor.history().len(), snapshots + 1);

        editor.clear_selection();
        drag(&mut editor, Point::new(400.0, 3.0), Point::new(420.0, -27.0));
        assert_eq!(editor.selection(), &BTreeSet::from([a, b]));
        assert_eq!(editor.graph().node(a).unwrap().position(), Point::new(20.0, -30.0));
        assert_eq!(editor.graph().node(b).unwrap().position(), Point::new(420.0, -27.0));
        assert_eq!(editor.graph().node(loose).unwrap().position(), Point::new(0.0, 400.0));

        editor.set_selection([loose]);
        assert_eq!(editor.group_selection(), None);
    }

    #[test]
    fn test_ungroup_and_undo_regroup() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Rectangle, Point::new(400.0, 0.0));
        editor.set_selection([a, b]);
        let group = editor.group_selection().unwrap();

        editor.set_selection([a]);
        assert_eq!(editor.selection().len(), 2);
        assert_eq!(editor.ungroup_selection(), 1);
        assert_eq!(editor.graph().group_count(), 0);
        assert_eq!(editor.ungroup_selection(), 0);

        editor.set_selection([a]);
        assert_eq!(editor.selection(), &BTreeSet::from([a]));

        assert!(editor.undo());
        assert_eq!(editor.graph().group_of(b), Some(group));
    }

    #[test]
    fn test_undo_restores_and_never_reuses_ids() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Rectangle, Point::new(300.0, 0.0));
        assert!(editor.undo());
        assert!(editor.graph().node(b).is_none());

        let c = editor.insert_node(ShapeKind::Circle, Point::new(0.0, 300.0));
        assert_ne!(c, b);
        assert!(!editor.redo());
        assert!(editor.graph().node(a).is_some());
    }

    #[test]
    fn test_history_bounds_are_no_ops() {
        let mut editor = Editor::default();
        assert!(!editor.undo());
        assert!(!editor.redo());
    }

    #[test]
    fn test_z_order_commands() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        let b = editor.insert_node(ShapeKind::Rectangle, Point::new(50.0, 0.0));
        assert!(!editor.bring_to_front());

        editor.set_selection([a]);
        assert!(editor.bring_to_front());
        assert_approx_eq!(f32, editor.graph().node(a).unwrap().z_value(), 0.1);

        assert!(editor.send_to_back());
        assert_approx_eq!(f32, editor.graph().node(a).unwrap().z_value(), -0.1);
        assert_approx_eq!(f32, editor.graph().node(b).unwrap().z_value(), 0.0);
    }

    #[test]
    fn test_style_edits_apply_to_selection_and_defaults() {
        let mut editor = Editor::default();
        let a = editor.insert_node(ShapeKind::Rectangle, Point::new(0.0, 0.0));
        editor.set_selection([a]);
        let red = Color::new("red").unwrap();

        assert!(editor.set_fill_color(red));
        assert!(!editor.set_fill_color(red));
        assert_eq!(editor.graph().node(a).unwrap().fill_color(), red);

        editor.clear_selection();
        let b = editor.insert_node(ShapeKind::Circle, Point::new(400.0, 0.0));
        assert_eq!(editor.graph().node(b).unwrap().fill_color(), red);

        assert!(!editor.set_text_font("12px serif"));
        let label = editor.insert_label("x", Point::default());
        assert_eq!(editor.graph().label(label).unwrap().font(), "12px serif");
    }
}
