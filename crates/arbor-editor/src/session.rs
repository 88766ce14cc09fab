//! The editing session: one diagram, its cached layout, the selection, the
//! drag gesture in flight and the undo history.
//!
//! Every structural or style mutation re-runs layout and ends with exactly
//! one history snapshot. Selection and highlight changes alone are not
//! recorded.

use crate::error::EditError;
use crate::gesture::{DragState, resolve_drop, snap_to_grid};
use crate::history::{History, MAX_HISTORY, Snapshot};
use crate::shortcuts::EditorAction;
use arbor_core::geom::{Bounds, Point};
use arbor_core::id::NodeId;
use arbor_core::layout::{LayoutConfig, TreeLayout, Viewport, layout_tree};
use arbor_core::model::*;
use arbor_core::{document, shape};
use arbor_render::{ExportConfig, ExportError, PaintOptions, export_png, export_svg, hit_test};

pub const NEW_NODE_LABEL: &str = "New Node";

/// Style the toolbar pickers currently show. New children copy it.
#[derive(Debug, Clone, PartialEq)]
pub struct StylePicker {
    pub shape: Shape,
    pub color: Rgb,
    /// `None` lets new children inherit their parent's flow.
    pub orientation: Option<Orientation>,
    pub connection_kind: ConnectionKind,
}

impl Default for StylePicker {
    fn default() -> Self {
        Self {
            shape: Shape::default(),
            color: Rgb::WHITE,
            orientation: None,
            connection_kind: ConnectionKind::Arrow,
        }
    }
}

impl StylePicker {
    fn attrs(&self) -> NodeAttrs {
        NodeAttrs {
            shape: Some(self.shape),
            color: Some(self.color),
            orientation: self.orientation,
            ..NodeAttrs::default()
        }
    }
}

/// Edits returned by the node dialog.
///
/// Numeric fields are the raw text the user typed; they are validated
/// together and a single bad value rejects the whole patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttrsPatch {
    /// Blank labels are ignored.
    pub label: Option<String>,
    pub class_title: Option<String>,
    pub class_lines: Option<Vec<String>>,
    pub color: Option<Rgb>,
    pub justify: Option<Justify>,
    pub font_weight: Option<FontWeight>,
    pub font_size_label: Option<String>,
    pub font_size_record: Option<String>,
    pub node_width: Option<String>,
    pub node_height: Option<String>,
}

fn coerce(
    field: &'static str,
    value: Option<&str>,
    min: u32,
    max: u32,
) -> Result<Option<u32>, EditError> {
    match value {
        None => Ok(None),
        Some(text) => parse_dimension(text, min, max)
            .map(Some)
            .ok_or_else(|| EditError::InvalidNumber {
                field,
                value: text.to_string(),
            }),
    }
}

pub struct EditorSession {
    diagram: Diagram,
    layout: TreeLayout,
    viewport: Viewport,
    config: LayoutConfig,
    pub picker: StylePicker,
    selected: NodeId,
    highlighted: Option<NodeId>,
    drag: DragState,
    history: History,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorSession {
    /// A session over a fresh diagram holding only the root.
    pub fn new() -> Self {
        Self::with_diagram(Diagram::new(), Viewport::default())
    }

    pub fn with_diagram(diagram: Diagram, viewport: Viewport) -> Self {
        let selected = diagram.root_id();
        let history = History::new(
            Snapshot {
                diagram: diagram.clone(),
                selected,
                highlighted: None,
            },
            MAX_HISTORY,
        );
        let mut session = Self {
            diagram,
            layout: TreeLayout::default(),
            viewport,
            config: LayoutConfig::default(),
            picker: StylePicker::default(),
            selected,
            highlighted: None,
            drag: DragState::Idle,
            history,
        };
        session.relayout();
        session
    }

    pub fn with_config(mut self, config: LayoutConfig) -> Self {
        self.config = config;
        self.relayout();
        self
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn selected(&self) -> NodeId {
        self.selected
    }

    pub fn highlighted(&self) -> Option<NodeId> {
        self.highlighted
    }

    pub fn drag_state(&self) -> DragState {
        self.drag
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// The canvas was resized; the root is re-anchored.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.relayout();
    }

    /// What the live canvas should emphasize.
    pub fn paint_options(&self) -> PaintOptions {
        PaintOptions::plain()
            .with_selected(Some(self.selected))
            .with_highlighted(self.highlighted)
            .with_show_selection(true)
    }

    // ─── Layout and history plumbing ─────────────────────────────────────

    /// Recompute every box from the current diagram.
    pub fn relayout(&mut self) {
        self.diagram.sync_class_heights();
        self.layout = layout_tree(
            &self.diagram,
            self.viewport,
            &self.config,
            self.drag.dragged_node(),
        );
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            diagram: self.diagram.clone(),
            selected: self.selected,
            highlighted: self.highlighted,
        }
    }

    fn commit(&mut self) {
        self.relayout();
        self.history.record(self.snapshot());
    }

    fn restore(&mut self, state: Snapshot) {
        self.diagram = state.diagram;
        self.selected = if self.diagram.contains(state.selected) {
            state.selected
        } else {
            self.diagram.root_id()
        };
        self.highlighted = state.highlighted.filter(|id| self.diagram.contains(*id));
        self.drag = DragState::Idle;
        self.relayout();
    }

    fn require(&self, id: NodeId) -> Result<(), EditError> {
        if self.diagram.contains(id) {
            Ok(())
        } else {
            Err(EditError::UnknownNode {
                id: id.as_str().to_string(),
            })
        }
    }

    /// Mutate the selected node's attributes and commit.
    fn edit_selected(&mut self, edit: impl FnOnce(&mut NodeAttrs)) {
        match self.diagram.get_by_id_mut(self.selected) {
            Some(node) => edit(&mut node.attrs),
            None => {
                log::warn!("selected node {} vanished; selecting root", self.selected);
                self.selected = self.diagram.root_id();
                return;
            }
        }
        self.commit();
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Select a node; the pickers take on its style.
    pub fn select(&mut self, id: NodeId) -> Result<(), EditError> {
        let node = self.diagram.get_by_id(id).ok_or_else(|| EditError::UnknownNode {
            id: id.as_str().to_string(),
        })?;
        self.picker.shape = node.attrs.shape();
        self.picker.color = node.attrs.color();
        self.picker.orientation = node.attrs.orientation;
        self.selected = id;
        Ok(())
    }

    /// Select whatever node is under `point`. Clicking the background keeps
    /// the current selection.
    pub fn select_at(&mut self, point: Point) -> Option<NodeId> {
        let hit = hit_test(&self.diagram, &self.layout, point)?;
        self.select(hit).ok()?;
        Some(hit)
    }

    /// Set (or clear) the default "from" end of the next connection.
    pub fn highlight(&mut self, id: Option<NodeId>) -> Result<(), EditError> {
        if let Some(id) = id {
            self.require(id)?;
        }
        self.highlighted = id;
        Ok(())
    }

    // ─── Structure ───────────────────────────────────────────────────────

    /// Append a child to the selected node, styled from the pickers.
    /// Selection stays on the parent.
    pub fn add_child(&mut self) -> NodeId {
        let attrs = self.picker.attrs();
        let parent = self.selected;
        let id = match self.diagram.add_child(parent, NEW_NODE_LABEL, attrs.clone()) {
            Some(id) => id,
            None => {
                log::warn!("selected node {parent} vanished; adding under root");
                self.selected = self.diagram.root_id();
                let root = self.diagram.root;
                let id = self.diagram.fresh_id();
                self.diagram
                    .add_node(root, DiagramNode::new(id, NEW_NODE_LABEL).with_attrs(attrs));
                id
            }
        };
        self.commit();
        id
    }

    /// Remove the selected subtree and every connection touching it, then
    /// select the root. Returns the removed ids.
    pub fn delete_selected(&mut self) -> Result<Vec<NodeId>, EditError> {
        if self.selected == self.diagram.root_id() {
            return Err(EditError::RootNotDeletable);
        }
        let idx = self
            .diagram
            .index_of(self.selected)
            .ok_or_else(|| EditError::UnknownNode {
                id: self.selected.as_str().to_string(),
            })?;
        let removed = self.diagram.remove_subtree(idx);
        self.diagram
            .connections
            .retain(|c| !removed.contains(&c.from) && !removed.contains(&c.to));
        if self.highlighted.is_some_and(|h| removed.contains(&h)) {
            self.highlighted = None;
        }
        self.selected = self.diagram.root_id();
        log::debug!("deleted {} node(s)", removed.len());
        self.commit();
        Ok(removed)
    }

    // ─── Style ───────────────────────────────────────────────────────────

    pub fn set_shape(&mut self, shape: Shape) {
        self.picker.shape = shape;
        self.edit_selected(|attrs| attrs.shape = Some(shape));
    }

    pub fn set_color(&mut self, color: Rgb) {
        self.picker.color = color;
        self.edit_selected(|attrs| attrs.color = Some(color));
    }

    /// Set the selected subtree's flow. On the root this also becomes the
    /// diagram-wide default.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.picker.orientation = Some(orientation);
        if self.selected == self.diagram.root_id() {
            self.diagram.global_orientation = orientation;
        }
        self.edit_selected(|attrs| attrs.orientation = Some(orientation));
    }

    pub fn set_global_orientation(&mut self, orientation: Orientation) {
        self.diagram.global_orientation = orientation;
        self.commit();
    }

    /// Cycle the selected node's effective orientation TB → LR → BT → RL.
    pub fn rotate_orientation(&mut self) {
        let current = self
            .diagram
            .index_of(self.selected)
            .map(|idx| self.diagram.effective_orientation(idx))
            .unwrap_or(self.diagram.global_orientation);
        self.set_orientation(current.rotated());
    }

    /// Flip which end of the edge into the selected node carries the arrow.
    pub fn toggle_reverse_edge(&mut self) {
        self.edit_selected(|attrs| attrs.reverse_edge = !attrs.reverse_edge);
    }

    /// Drop the selected node's manual position so auto-layout owns it again.
    pub fn clear_manual_position(&mut self) {
        self.edit_selected(NodeAttrs::clear_manual_position);
    }

    /// Apply a dialog patch to `id`. Nothing changes unless every numeric
    /// field parses.
    pub fn apply_patch(&mut self, id: NodeId, patch: &AttrsPatch) -> Result<(), EditError> {
        self.require(id)?;
        let width = coerce(
            "node width",
            patch.node_width.as_deref(),
            MIN_NODE_DIMENSION,
            MAX_NODE_DIMENSION,
        )?;
        let height = coerce(
            "node height",
            patch.node_height.as_deref(),
            MIN_NODE_DIMENSION,
            MAX_NODE_DIMENSION,
        )?;
        let label_size = coerce(
            "label font size",
            patch.font_size_label.as_deref(),
            MIN_FONT_SIZE,
            MAX_FONT_SIZE,
        )?;
        let record_size = coerce(
            "record font size",
            patch.font_size_record.as_deref(),
            MIN_FONT_SIZE,
            MAX_FONT_SIZE,
        )?;

        let Some(node) = self.diagram.get_by_id_mut(id) else {
            return Err(EditError::UnknownNode {
                id: id.as_str().to_string(),
            });
        };
        if let Some(label) = patch
            .label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
        {
            node.label = label.to_string();
        }
        let attrs = &mut node.attrs;
        if let Some(title) = &patch.class_title {
            attrs.class_title = Some(title.clone());
        }
        if let Some(lines) = &patch.class_lines {
            attrs.class_lines = lines.clone();
        }
        if let Some(color) = patch.color {
            attrs.color = Some(color);
        }
        if let Some(justify) = patch.justify {
            attrs.justify = Some(justify);
        }
        if let Some(weight) = patch.font_weight {
            attrs.font_weight_label = Some(weight);
        }
        if width.is_some() {
            attrs.node_width = width;
        }
        if height.is_some() {
            attrs.node_height = height;
        }
        if label_size.is_some() {
            attrs.font_size_label = label_size;
        }
        if record_size.is_some() {
            attrs.font_size_record = record_size;
        }
        self.commit();
        Ok(())
    }

    // ─── Connections ─────────────────────────────────────────────────────

    pub fn add_connection(
        &mut self,
        from: NodeId,
        to: NodeId,
        kind: ConnectionKind,
    ) -> Result<(), EditError> {
        self.require(from)?;
        self.require(to)?;
        if from == to {
            return Err(EditError::SelfConnection);
        }
        self.diagram.add_connection(Connection::new(from, to, kind));
        self.commit();
        Ok(())
    }

    pub fn remove_connection(&mut self, index: usize) -> Result<Connection, EditError> {
        let removed = self
            .diagram
            .remove_connection(index)
            .ok_or(EditError::NoConnection { index })?;
        self.commit();
        Ok(removed)
    }

    // ─── Drag gesture ────────────────────────────────────────────────────

    /// Pointer down. Grabs and selects the node under `point`, if any.
    pub fn press(&mut self, point: Point) -> Option<NodeId> {
        let id = self.select_at(point)?;
        let origin = self.layout.bounds_of(id)?.origin();
        self.drag = DragState::start(id, point, origin);
        Some(id)
    }

    /// Pointer motion while pressed: move the grabbed node live.
    pub fn drag_to(&mut self, point: Point) {
        let Some((id, origin)) = self.drag.track(point) else {
            return;
        };
        if let Some(node) = self.diagram.get_by_id_mut(id) {
            node.attrs.manual_x = Some(origin.x);
            node.attrs.manual_y = Some(origin.y);
        }
        self.relayout();
    }

    /// Pointer up. Snaps the dropped node, steps it off other manually
    /// placed boxes and records one snapshot for the whole gesture.
    pub fn release(&mut self) -> Option<NodeId> {
        let state = std::mem::take(&mut self.drag);
        let DragState::Dragging {
            node, moved: true, ..
        } = state
        else {
            return None;
        };
        let node_attrs = &self.diagram.get_by_id(node)?.attrs;
        let size = shape::measure(node_attrs);
        let dropped = self.layout.bounds_of(node)?.origin();
        let snapped = Bounds::at(snap_to_grid(dropped), size);

        let others: Vec<Bounds> = self
            .layout
            .iter()
            .filter(|(id, _)| *id != node)
            .filter(|(id, _)| {
                self.diagram
                    .get_by_id(*id)
                    .is_some_and(|n| n.attrs.has_manual_position())
            })
            .map(|(_, b)| b)
            .collect();
        let resting = resolve_drop(snapped, &others);

        if let Some(n) = self.diagram.get_by_id_mut(node) {
            n.attrs.manual_x = Some(resting.x);
            n.attrs.manual_y = Some(resting.y);
        }
        log::debug!("dropped {node} at ({}, {})", resting.x, resting.y);
        self.commit();
        Some(node)
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        match self.history.undo().cloned() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo().cloned() {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    // ─── Documents and export ────────────────────────────────────────────

    /// Replace the diagram with a parsed document. On error the session is
    /// untouched.
    pub fn load_document(&mut self, text: &str) -> Result<(), EditError> {
        let diagram = document::load_document(text)?;
        self.diagram = diagram;
        self.selected = self.diagram.root_id();
        self.highlighted = None;
        self.drag = DragState::Idle;
        self.relayout();
        self.history.reset(self.snapshot());
        Ok(())
    }

    pub fn save_document(&self) -> Result<String, EditError> {
        Ok(document::save_document(&self.diagram)?)
    }

    pub fn export_svg(&self, config: &ExportConfig) -> String {
        export_svg(&self.diagram, &self.layout, config)
    }

    pub fn export_png(&self, config: &ExportConfig) -> Result<Vec<u8>, ExportError> {
        export_png(&self.diagram, &self.layout, config)
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Run a shortcut action.
    pub fn perform(&mut self, action: EditorAction) -> Result<(), EditError> {
        match action {
            EditorAction::Undo => {
                self.undo();
            }
            EditorAction::Redo => {
                self.redo();
            }
            EditorAction::Delete => {
                self.delete_selected()?;
            }
            EditorAction::AddChild => {
                self.add_child();
            }
            EditorAction::RotateOrientation => self.rotate_orientation(),
            EditorAction::ToggleReverseEdge => self.toggle_reverse_edge(),
            EditorAction::Connect => match self.highlighted {
                Some(from) => {
                    self.add_connection(from, self.selected, self.picker.connection_kind)?
                }
                None => log::debug!("connect: nothing highlighted"),
            },
            EditorAction::Highlight => self.highlighted = Some(self.selected),
            EditorAction::SelectRoot => {
                let root = self.diagram.root_id();
                self.select(root)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_session_selects_root() {
        let s = EditorSession::new();
        assert_eq!(s.selected(), s.diagram().root_id());
        assert_eq!(s.layout().order.len(), 1);
        assert!(!s.history().can_undo());
    }

    #[test]
    fn add_child_uses_picker_style() {
        let mut s = EditorSession::new();
        s.picker.shape = Shape::Hexagon;
        s.picker.color = Rgb::new(1, 2, 3);
        let id = s.add_child();
        let node = s.diagram().get_by_id(id).unwrap();
        assert_eq!(node.label, NEW_NODE_LABEL);
        assert_eq!(node.attrs.shape(), Shape::Hexagon);
        assert_eq!(node.attrs.color(), Rgb::new(1, 2, 3));
        assert_eq!(node.attrs.orientation, None);
        assert!(s.layout().bounds_of(id).is_some());
    }

    #[test]
    fn root_cannot_be_deleted() {
        let mut s = EditorSession::new();
        assert!(matches!(s.delete_selected(), Err(EditError::RootNotDeletable)));
        assert!(!s.history().can_undo());
    }

    #[test]
    fn bad_number_rejects_whole_patch() {
        let mut s = EditorSession::new();
        let root = s.diagram().root_id();
        let patch = AttrsPatch {
            label: Some("Renamed".into()),
            node_width: Some("150".into()),
            node_height: Some("tall".into()),
            ..AttrsPatch::default()
        };
        let err = s.apply_patch(root, &patch).unwrap_err();
        assert!(matches!(err, EditError::InvalidNumber { field: "node height", .. }));
        let node = s.diagram().get_by_id(root).unwrap();
        assert_eq!(node.label, "Root");
        assert_eq!(node.attrs.node_width, None);
    }

    #[test]
    fn patch_numbers_are_rounded_and_clamped() {
        let mut s = EditorSession::new();
        let root = s.diagram().root_id();
        let patch = AttrsPatch {
            label: Some("   ".into()),
            node_width: Some("150.6".into()),
            node_height: Some("2".into()),
            font_size_label: Some("1".into()),
            ..AttrsPatch::default()
        };
        s.apply_patch(root, &patch).unwrap();
        let node = s.diagram().get_by_id(root).unwrap();
        assert_eq!(node.label, "Root");
        assert_eq!(node.attrs.node_width, Some(151));
        assert_eq!(node.attrs.node_height, Some(MIN_NODE_DIMENSION));
        assert_eq!(node.attrs.font_size_label, Some(MIN_FONT_SIZE));
    }

    #[test]
    fn root_orientation_sets_global_default() {
        let mut s = EditorSession::new();
        s.set_orientation(Orientation::LeftRight);
        assert_eq!(s.diagram().global_orientation, Orientation::LeftRight);

        let child = s.add_child();
        s.select(child).unwrap();
        s.set_orientation(Orientation::BottomUp);
        assert_eq!(s.diagram().global_orientation, Orientation::LeftRight);
    }

    #[test]
    fn rotate_cycles_effective_orientation() {
        let mut s = EditorSession::new();
        let child = s.add_child();
        s.select(child).unwrap();
        s.rotate_orientation();
        let attrs = &s.diagram().get_by_id(child).unwrap().attrs;
        assert_eq!(attrs.orientation, Some(Orientation::LeftRight));
    }

    #[test]
    fn self_connection_is_rejected() {
        let mut s = EditorSession::new();
        let root = s.diagram().root_id();
        assert!(matches!(
            s.add_connection(root, root, ConnectionKind::Arrow),
            Err(EditError::SelfConnection)
        ));
    }

    #[test]
    fn connect_shortcut_uses_highlight() {
        let mut s = EditorSession::new();
        let a = s.add_child();
        let b = s.add_child();
        s.select(a).unwrap();
        s.perform(EditorAction::Highlight).unwrap();
        s.select(b).unwrap();
        s.perform(EditorAction::Connect).unwrap();
        assert_eq!(
            s.diagram().connections,
            vec![Connection::new(a, b, ConnectionKind::Arrow)]
        );
    }

    #[test]
    fn failed_load_leaves_session_untouched() {
        let mut s = EditorSession::new();
        s.add_child();
        let before = s.diagram().clone();
        assert!(s.load_document(r#"{"connections": []}"#).is_err());
        assert_eq!(s.diagram(), &before);
        assert!(s.history().can_undo());
    }
}
