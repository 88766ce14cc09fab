//! Core data model for Arbor diagrams.
//!
//! A diagram is a tree of labeled, styled nodes plus a flat list of free
//! connections between any two nodes. The tree lives in a petgraph
//! `StableDiGraph` whose edges go parent → child; edge weights are insertion
//! ordinals so sibling order survives index reuse after deletions.
//!
//! Attributes are a typed record of optional fields. Accessors apply the
//! documented defaults, so a node that never had a value set and one that was
//! loaded without that key behave the same.

use crate::id::NodeId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

// ─── Defaults ────────────────────────────────────────────────────────────

pub const NODE_WIDTH: u32 = 100;
pub const NODE_HEIGHT: u32 = 40;
pub const FONT_SIZE_LABEL: u32 = 10;
pub const FONT_SIZE_RECORD: u32 = 8;
pub const FONT_FAMILY: &str = "Arial";

/// Smallest width/height a node may be given.
pub const MIN_NODE_DIMENSION: u32 = 10;
/// Largest width/height accepted from documents and the edit dialog.
pub const MAX_NODE_DIMENSION: u32 = 4000;
pub const MIN_FONT_SIZE: u32 = 6;
pub const MAX_FONT_SIZE: u32 = 200;

/// Coerce free-form numeric input into an integer dimension.
///
/// Accepts integers and decimals (rounded), surrounding whitespace allowed.
/// Values are clamped into `[min, max]`. Returns `None` for anything that is
/// not a finite number.
pub fn parse_dimension(text: &str, min: u32, max: u32) -> Option<u32> {
    let value: f64 = text.trim().parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.round().clamp(min as f64, max as f64) as u32)
}

// ─── Keyword enums ───────────────────────────────────────────────────────

/// Declares a closed set of keywords with a canonical spelling.
///
/// Parsing is case-insensitive. Deserializing an unknown keyword falls back
/// to the default variant (with a warning) instead of failing the document.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn parse(text: &str) -> Option<Self> {
                let text = text.trim();
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(text))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                Ok(Self::parse(&text).unwrap_or_else(|| {
                    log::warn!(
                        "unknown {} `{}`, using `{}`",
                        stringify!($name),
                        text,
                        Self::default()
                    );
                    Self::default()
                }))
            }
        }
    };
}

keyword_enum! {
    /// The twelve node shapes. Each has its own drawing and border geometry.
    Shape {
        #[default]
        Ellipse => "ellipse",
        Box => "box",
        Class => "class",
        Diamond => "diamond",
        Parallelogram => "parallelogram",
        Triangle => "triangle",
        Hexagon => "hexagon",
        StickFigure => "stick_figure",
        Circle => "circle",
        RBox => "rbox",
        Assembly => "assembly",
        Interface => "interface",
    }
}

keyword_enum! {
    /// Direction a node lays out its own children.
    Orientation {
        #[default]
        TopDown => "TB",
        BottomUp => "BT",
        LeftRight => "LR",
        RightLeft => "RL",
    }
}

keyword_enum! {
    FontWeight {
        Normal => "normal",
        #[default]
        Bold => "bold",
        Italic => "italic",
    }
}

keyword_enum! {
    Justify {
        Left => "left",
        #[default]
        Center => "center",
        Right => "right",
    }
}

keyword_enum! {
    /// How a free connection is stroked.
    ConnectionKind {
        #[default]
        Single => "single",
        Arrow => "arrow",
        Double => "double",
        DoubleArrow => "double_arrow",
        DoubleArrowOneway => "double_arrow_oneway",
    }
}

impl Orientation {
    /// TB and BT pack children in a row; LR and RL in a column.
    pub fn packs_horizontally(self) -> bool {
        matches!(self, Orientation::TopDown | Orientation::BottomUp)
    }

    /// TB → LR → BT → RL → TB.
    pub fn rotated(self) -> Self {
        match self {
            Orientation::TopDown => Orientation::LeftRight,
            Orientation::LeftRight => Orientation::BottomUp,
            Orientation::BottomUp => Orientation::RightLeft,
            Orientation::RightLeft => Orientation::TopDown,
        }
    }
}

// ─── Colors ──────────────────────────────────────────────────────────────

/// Opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Helper to parse a single hex digit.
fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const GRAY: Rgb = Rgb::new(0x80, 0x80, 0x80);
    pub const HIGHLIGHT: Rgb = Rgb::new(0xff, 0x66, 0x00);
    pub const CLASS_TITLE: Rgb = Rgb::new(0xe0, 0xe0, 0xff);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb`, `#rrggbb` (leading `#` optional) or a basic color name.
    pub fn from_hex(text: &str) -> Option<Self> {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "white" => return Some(Self::WHITE),
            "black" => return Some(Self::BLACK),
            "gray" | "grey" => return Some(Self::GRAY),
            "red" => return Some(Self::new(0xff, 0, 0)),
            "green" => return Some(Self::new(0, 0x80, 0)),
            "blue" => return Some(Self::new(0, 0, 0xff)),
            "yellow" => return Some(Self::new(0xff, 0xff, 0)),
            _ => {}
        }

        let hex = text.strip_prefix('#').unwrap_or(text);
        let bytes = hex.as_bytes();
        match bytes.len() {
            3 => Some(Self::new(
                hex_val(bytes[0])? * 17,
                hex_val(bytes[1])? * 17,
                hex_val(bytes[2])? * 17,
            )),
            6 => Some(Self::new(
                hex_val(bytes[0])? << 4 | hex_val(bytes[1])?,
                hex_val(bytes[2])? << 4 | hex_val(bytes[3])?,
                hex_val(bytes[4])? << 4 | hex_val(bytes[5])?,
            )),
            _ => None,
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Per-node attributes. `None` means "use the default" (or, for
/// `orientation`, "inherit from the parent").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeAttrs {
    pub shape: Option<Shape>,
    pub color: Option<Rgb>,
    pub orientation: Option<Orientation>,
    pub node_width: Option<u32>,
    /// Overwritten by layout for `class` nodes (derived from the line count).
    pub node_height: Option<u32>,
    pub font_size_label: Option<u32>,
    pub font_size_record: Option<u32>,
    pub font_weight_label: Option<FontWeight>,
    pub justify: Option<Justify>,
    pub class_title: Option<String>,
    pub class_lines: Vec<String>,
    pub manual_x: Option<f32>,
    pub manual_y: Option<f32>,
    /// Flip the arrowhead of the tree edge coming from this node's parent.
    pub reverse_edge: bool,
}

impl NodeAttrs {
    pub fn shape(&self) -> Shape {
        self.shape.unwrap_or_default()
    }

    pub fn color(&self) -> Rgb {
        self.color.unwrap_or_default()
    }

    pub fn width(&self) -> u32 {
        self.node_width
            .map_or(NODE_WIDTH, |w| w.clamp(MIN_NODE_DIMENSION, MAX_NODE_DIMENSION))
    }

    /// Stored height, or the default. `class` nodes ignore this; see
    /// `shape::measure`.
    pub fn height(&self) -> u32 {
        self.node_height
            .map_or(NODE_HEIGHT, |h| h.clamp(MIN_NODE_DIMENSION, MAX_NODE_DIMENSION))
    }

    pub fn font_size_label(&self) -> u32 {
        self.font_size_label
            .map_or(FONT_SIZE_LABEL, |s| s.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE))
    }

    /// Font size of `class` lines. Follows the label size (minus two, never
    /// below the default) when only the label size was set.
    pub fn font_size_record(&self) -> u32 {
        match (self.font_size_record, self.font_size_label) {
            (Some(size), _) => size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE),
            (None, Some(_)) => self
                .font_size_label()
                .saturating_sub(2)
                .max(FONT_SIZE_RECORD),
            (None, None) => FONT_SIZE_RECORD,
        }
    }

    /// Copy with every stored size pulled into its accepted range, the same
    /// range documents are clamped to on load.
    pub fn clamped(&self) -> NodeAttrs {
        let dimension = |v: u32| v.clamp(MIN_NODE_DIMENSION, MAX_NODE_DIMENSION);
        let font = |v: u32| v.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        NodeAttrs {
            node_width: self.node_width.map(dimension),
            node_height: self.node_height.map(dimension),
            font_size_label: self.font_size_label.map(font),
            font_size_record: self.font_size_record.map(font),
            ..self.clone()
        }
    }

    pub fn font_weight(&self) -> FontWeight {
        self.font_weight_label.unwrap_or_default()
    }

    pub fn justify(&self) -> Justify {
        self.justify.unwrap_or_default()
    }

    pub fn class_title<'a>(&'a self, label: &'a str) -> &'a str {
        self.class_title.as_deref().unwrap_or(label)
    }

    pub fn has_manual_position(&self) -> bool {
        self.manual_x.is_some() || self.manual_y.is_some()
    }

    pub fn clear_manual_position(&mut self) {
        self.manual_x = None;
        self.manual_y = None;
    }
}

/// A single labeled node of the diagram tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramNode {
    pub id: NodeId,
    pub label: String,
    pub attrs: NodeAttrs,
}

impl DiagramNode {
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            attrs: NodeAttrs::default(),
        }
    }

    pub fn with_attrs(mut self, attrs: NodeAttrs) -> Self {
        self.attrs = attrs;
        self
    }
}

// ─── Connections ─────────────────────────────────────────────────────────

/// A user-added edge between any two nodes, independent of the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
    #[serde(rename = "type", default)]
    pub kind: ConnectionKind,
}

impl Connection {
    pub fn new(from: NodeId, to: NodeId, kind: ConnectionKind) -> Self {
        Self { from, to, kind }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }
}

// ─── Diagram ─────────────────────────────────────────────────────────────

/// The whole document: node tree, free connections, global orientation.
#[derive(Debug, Clone)]
pub struct Diagram {
    /// Parent → child edges, weighted by insertion ordinal.
    pub graph: StableDiGraph<DiagramNode, u32>,

    /// The root node index. The root can never be removed.
    pub root: NodeIndex,

    /// Index from NodeId → NodeIndex for fast lookup.
    pub id_index: HashMap<NodeId, NodeIndex>,

    /// Free connections, in the order they were added.
    pub connections: Vec<Connection>,

    /// Orientation used by any node that has none of its own and no
    /// ancestor with one.
    pub global_orientation: Orientation,

    next_ordinal: u32,
}

impl Diagram {
    /// A diagram holding only the `root` node labeled "Root".
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(DiagramNode::new(NodeId::root(), "Root"))
    }

    pub fn with_root(root_node: DiagramNode) -> Self {
        let mut graph = StableDiGraph::new();
        let id = root_node.id;
        let root = graph.add_node(root_node);

        let mut id_index = HashMap::new();
        id_index.insert(id, root);

        Self {
            graph,
            root,
            id_index,
            connections: Vec::new(),
            global_orientation: Orientation::default(),
            next_ordinal: 0,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.graph[self.root].id
    }

    /// Append `node` as the last child of `parent`. Returns the new index.
    pub fn add_node(&mut self, parent: NodeIndex, node: DiagramNode) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, self.next_ordinal);
        self.next_ordinal += 1;
        self.id_index.insert(id, idx);
        idx
    }

    /// Append a new node with a fresh id under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        label: impl Into<String>,
        attrs: NodeAttrs,
    ) -> Option<NodeId> {
        let parent_idx = self.index_of(parent)?;
        let id = self.fresh_id();
        self.add_node(parent_idx, DiagramNode::new(id, label).with_attrs(attrs));
        Some(id)
    }

    /// A `node_<n>` id not used anywhere in this diagram.
    pub fn fresh_id(&self) -> NodeId {
        loop {
            let id = NodeId::fresh();
            if !self.id_index.contains_key(&id) {
                return id;
            }
        }
    }

    /// Remove `idx` and all of its descendants. The root is never removed.
    /// Returns the removed ids in pre-order. Connections are left alone; see
    /// `prune_dangling_connections`.
    pub fn remove_subtree(&mut self, idx: NodeIndex) -> Vec<NodeId> {
        if idx == self.root || !self.graph.contains_node(idx) {
            return Vec::new();
        }
        let doomed = self.preorder_from(idx);
        let mut removed = Vec::with_capacity(doomed.len());
        for node_idx in doomed {
            if let Some(node) = self.graph.remove_node(node_idx) {
                self.id_index.remove(&node.id);
                removed.push(node.id);
            }
        }
        removed
    }

    /// Look up a node by id.
    pub fn get_by_id(&self, id: NodeId) -> Option<&DiagramNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    /// Look up a node mutably by id.
    pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<&mut DiagramNode> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn node(&self, idx: NodeIndex) -> &DiagramNode {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Children in insertion order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(u32, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (*e.weight(), e.target()))
            .collect();
        edges.sort_by_key(|(ordinal, _)| *ordinal);
        edges.into_iter().map(|(_, child)| child).collect()
    }

    /// Every node, parents before children, siblings in order.
    pub fn preorder(&self) -> Vec<NodeIndex> {
        self.preorder_from(self.root)
    }

    fn preorder_from(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            let mut children = self.children(idx);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = match self.index_of(descendant) {
            Some(idx) => idx,
            None => return false,
        };
        while let Some(parent) = self.parent(current) {
            if self.graph[parent].id == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    /// The orientation `idx` lays its children out in: its own, else the
    /// nearest ancestor's, else the global default.
    pub fn effective_orientation(&self, idx: NodeIndex) -> Orientation {
        let mut current = Some(idx);
        while let Some(i) = current {
            if let Some(orientation) = self.graph[i].attrs.orientation {
                return orientation;
            }
            current = self.parent(i);
        }
        self.global_orientation
    }

    /// Store the derived height on every `class` node.
    pub fn sync_class_heights(&mut self) {
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for idx in indices {
            let attrs = &mut self.graph[idx].attrs;
            if attrs.shape() == Shape::Class {
                attrs.node_height = Some(crate::shape::class_height(attrs));
            }
        }
    }

    // ─── Connections ─────────────────────────────────────────────────────

    /// Add a connection. Refused when either endpoint is unknown.
    pub fn add_connection(&mut self, connection: Connection) -> bool {
        if !self.contains(connection.from) || !self.contains(connection.to) {
            return false;
        }
        self.connections.push(connection);
        true
    }

    pub fn remove_connection(&mut self, index: usize) -> Option<Connection> {
        (index < self.connections.len()).then(|| self.connections.remove(index))
    }

    pub fn connections_touching(&self, id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.touches(id))
    }

    /// Drop connections whose endpoints no longer exist. Returns how many
    /// were removed.
    pub fn prune_dangling_connections(&mut self) -> usize {
        let before = self.connections.len();
        let index = &self.id_index;
        self.connections
            .retain(|c| index.contains_key(&c.from) && index.contains_key(&c.to));
        before - self.connections.len()
    }

    fn subtree_eq(&self, a: NodeIndex, other: &Diagram, b: NodeIndex) -> bool {
        if self.graph[a] != other.graph[b] {
            return false;
        }
        let ours = self.children(a);
        let theirs = other.children(b);
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(&theirs)
                .all(|(&x, &y)| self.subtree_eq(x, other, y))
    }
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

/// Structural equality: ids, labels, attrs, child order, connections and
/// global orientation. Graph indices are not compared.
impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.global_orientation == other.global_orientation
            && self.connections == other.connections
            && self.node_count() == other.node_count()
            && self.subtree_eq(self.root, other, other.root)
    }
}
