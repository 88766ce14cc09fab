//! JSON document format.
//!
//! ```json
//! {
//!   "tree": { "id": "root", "text": "Root", "attrs": {}, "children": [] },
//!   "global_orientation": "TB",
//!   "connections": [{ "from": "a", "to": "b", "type": "arrow" }]
//! }
//! ```
//!
//! Loading is lenient: missing keys take their defaults, unknown keywords
//! fall back to the default variant, numbers may be written as strings, and
//! a scalar field of the wrong type (or `null`) is dropped with a warning.
//! Sizes are clamped into their accepted range on load and on save, so a
//! saved document reloads to the same diagram.
//! Only a missing `tree`, malformed JSON or a repeated id abort the load.

use crate::error::DocumentError;
use crate::id::NodeId;
use crate::model::{
    Connection, ConnectionKind, Diagram, DiagramNode, FontWeight, Justify, MAX_FONT_SIZE,
    MAX_NODE_DIMENSION, MIN_FONT_SIZE, MIN_NODE_DIMENSION, NodeAttrs, Orientation, Rgb, Shape,
    parse_dimension,
};
use petgraph::graph::NodeIndex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashSet;

// ─── Wire format ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct DocumentWire {
    #[serde(default)]
    tree: Option<NodeWire>,
    #[serde(default, deserialize_with = "lenient")]
    global_orientation: Orientation,
    #[serde(default, deserialize_with = "lenient")]
    connections: Vec<ConnectionWire>,
}

#[derive(Debug, Serialize, Deserialize)]
struct NodeWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    text: String,
    #[serde(default, deserialize_with = "lenient")]
    attrs: AttrsWire,
    #[serde(default)]
    children: Vec<NodeWire>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct AttrsWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shape: Option<Shape>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    node_width: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    node_height: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size_label: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_size_record: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_weight_label: Option<FontWeight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    justify: Option<Justify>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    class_title: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Vec::is_empty"
    )]
    class_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manual_x: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    manual_y: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reverse_edge: Option<Value>,
}

/// Deserialize `T`, or fall back to its default when the value is `null` or
/// has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(T::default());
    }
    Ok(T::deserialize(&value).unwrap_or_else(|e| {
        log::warn!("ignoring malformed value {value}: {e}");
        T::default()
    }))
}

#[derive(Debug, Serialize, Deserialize)]
struct ConnectionWire {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(rename = "type", default)]
    kind: ConnectionKind,
}

// ─── Save ────────────────────────────────────────────────────────────────

/// Serialize a diagram as pretty-printed JSON.
pub fn save_document(diagram: &Diagram) -> Result<String, DocumentError> {
    let wire = DocumentWire {
        tree: Some(node_to_wire(diagram, diagram.root)),
        global_orientation: diagram.global_orientation,
        connections: diagram
            .connections
            .iter()
            .map(|c| ConnectionWire {
                from: Some(c.from.as_str().to_string()),
                to: Some(c.to.as_str().to_string()),
                kind: c.kind,
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&wire)?)
}

fn node_to_wire(diagram: &Diagram, idx: NodeIndex) -> NodeWire {
    let node = diagram.node(idx);
    NodeWire {
        id: Some(node.id.as_str().to_string()),
        text: node.label.clone(),
        attrs: attrs_to_wire(&node.attrs.clamped()),
        children: diagram
            .children(idx)
            .into_iter()
            .map(|child| node_to_wire(diagram, child))
            .collect(),
    }
}

fn attrs_to_wire(attrs: &NodeAttrs) -> AttrsWire {
    AttrsWire {
        shape: attrs.shape,
        color: attrs.color.map(Rgb::to_hex),
        orientation: attrs.orientation,
        node_width: attrs.node_width.map(Value::from),
        node_height: attrs.node_height.map(Value::from),
        font_size_label: attrs.font_size_label.map(Value::from),
        font_size_record: attrs.font_size_record.map(Value::from),
        font_weight_label: attrs.font_weight_label,
        justify: attrs.justify,
        class_title: attrs.class_title.clone(),
        class_lines: attrs.class_lines.clone(),
        manual_x: attrs.manual_x.map(|v| Value::from(v as f64)),
        manual_y: attrs.manual_y.map(|v| Value::from(v as f64)),
        reverse_edge: attrs.reverse_edge.then_some(Value::Bool(true)),
    }
}

// ─── Load ────────────────────────────────────────────────────────────────

/// Parse a document into a fresh diagram.
pub fn load_document(text: &str) -> Result<Diagram, DocumentError> {
    let wire: DocumentWire = serde_json::from_str(text)?;
    let tree = wire.tree.ok_or(DocumentError::MissingTree)?;

    // An id-less root still claims `root`, so no child may take it.
    let root_id = tree
        .id
        .as_deref()
        .map(NodeId::intern)
        .unwrap_or_else(NodeId::root);
    let mut explicit = HashSet::from([root_id]);
    for child in &tree.children {
        collect_ids(child, &mut explicit)?;
    }
    let root = DiagramNode::new(root_id, tree.text).with_attrs(attrs_from_wire(tree.attrs));
    let mut diagram = Diagram::with_root(root);
    diagram.global_orientation = wire.global_orientation;

    let root_idx = diagram.root;
    for child in tree.children {
        add_subtree(&mut diagram, root_idx, child, &explicit);
    }

    for conn in wire.connections {
        let (Some(from), Some(to)) = (conn.from, conn.to) else {
            log::warn!("dropping connection without both endpoints");
            continue;
        };
        let connection = Connection::new(NodeId::intern(&from), NodeId::intern(&to), conn.kind);
        if !diagram.add_connection(connection) {
            log::warn!("dropping connection {from} -> {to}: unknown endpoint");
        }
    }

    Ok(diagram)
}

fn collect_ids(node: &NodeWire, seen: &mut HashSet<NodeId>) -> Result<(), DocumentError> {
    if let Some(id) = &node.id {
        if !seen.insert(NodeId::intern(id)) {
            return Err(DocumentError::DuplicateId { id: id.clone() });
        }
    }
    node.children
        .iter()
        .try_for_each(|child| collect_ids(child, seen))
}

fn add_subtree(
    diagram: &mut Diagram,
    parent: NodeIndex,
    node: NodeWire,
    explicit: &HashSet<NodeId>,
) {
    let id = match node.id.as_deref() {
        Some(id) => NodeId::intern(id),
        None => loop {
            let candidate = diagram.fresh_id();
            if !explicit.contains(&candidate) {
                break candidate;
            }
        },
    };
    let entry = DiagramNode::new(id, node.text).with_attrs(attrs_from_wire(node.attrs));
    let idx = diagram.add_node(parent, entry);
    for child in node.children {
        add_subtree(diagram, idx, child, explicit);
    }
}

fn attrs_from_wire(wire: AttrsWire) -> NodeAttrs {
    let color = wire.color.and_then(|text| {
        let parsed = Rgb::from_hex(&text);
        if parsed.is_none() {
            log::warn!("unknown color `{text}`, using default");
        }
        parsed
    });

    NodeAttrs {
        shape: wire.shape,
        color,
        orientation: wire.orientation,
        node_width: integer(
            "node_width",
            wire.node_width,
            MIN_NODE_DIMENSION,
            MAX_NODE_DIMENSION,
        ),
        node_height: integer(
            "node_height",
            wire.node_height,
            MIN_NODE_DIMENSION,
            MAX_NODE_DIMENSION,
        ),
        font_size_label: integer(
            "font_size_label",
            wire.font_size_label,
            MIN_FONT_SIZE,
            MAX_FONT_SIZE,
        ),
        font_size_record: integer(
            "font_size_record",
            wire.font_size_record,
            MIN_FONT_SIZE,
            MAX_FONT_SIZE,
        ),
        font_weight_label: wire.font_weight_label,
        justify: wire.justify,
        class_title: wire.class_title,
        class_lines: wire.class_lines,
        manual_x: coordinate("manual_x", wire.manual_x),
        manual_y: coordinate("manual_y", wire.manual_y),
        reverse_edge: flag("reverse_edge", wire.reverse_edge),
    }
}

fn numeric_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Integer attribute through the same coercion as the edit dialog.
fn integer(key: &str, value: Option<Value>, min: u32, max: u32) -> Option<u32> {
    let value = value?;
    let parsed = numeric_text(&value).and_then(|text| parse_dimension(&text, min, max));
    if parsed.is_none() {
        log::warn!("ignoring non-numeric {key}: {value}");
    }
    parsed
}

/// Boolean attribute; `"true"`/`"false"` strings are accepted too.
fn flag(key: &str, value: Option<Value>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let parsed = match &value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => s.trim().to_ascii_lowercase().parse().ok(),
        _ => None,
    };
    parsed.unwrap_or_else(|| {
        log::warn!("ignoring non-boolean {key}: {value}");
        false
    })
}

fn coordinate(key: &str, value: Option<Value>) -> Option<f32> {
    let value = value?;
    let parsed = numeric_text(&value)
        .and_then(|text| text.trim().parse::<f32>().ok())
        .filter(|v| v.is_finite());
    if parsed.is_none() {
        log::warn!("ignoring non-numeric {key}: {value}");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_tree_is_rejected() {
        let err = load_document(r#"{"connections": []}"#).unwrap_err();
        assert!(matches!(err, DocumentError::MissingTree));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = load_document("{ tree: ").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"{"tree": {"id": "root", "text": "R", "children": [
            {"id": "a", "text": "A"}, {"id": "a", "text": "again"}
        ]}}"#;
        let err = load_document(text).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateId { ref id } if id == "a"));
    }

    #[test]
    fn child_cannot_reuse_implicit_root_id() {
        let text = r#"{"tree": {"text": "R", "children": [{"id": "root", "text": "C"}]}}"#;
        let err = load_document(text).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateId { ref id } if id == "root"));
    }

    #[test]
    fn child_cannot_reuse_explicit_root_id() {
        let text = r#"{"tree": {"id": "top", "children": [
            {"id": "a", "children": [{"id": "top"}]}
        ]}}"#;
        let err = load_document(text).unwrap_err();
        assert!(matches!(err, DocumentError::DuplicateId { ref id } if id == "top"));
    }

    #[test]
    fn id_less_root_reloads_after_save() {
        let d = load_document(r#"{"tree": {"text": "R", "children": [{"text": "C"}]}}"#).unwrap();
        assert_eq!(d.root_id(), NodeId::root());
        let reloaded = load_document(&save_document(&d).unwrap()).unwrap();
        assert_eq!(reloaded, d);
    }

    #[test]
    fn malformed_fields_fall_back_per_field() {
        let text = r#"{"tree": {"id": "root", "text": null, "children": [
            {"id": "a", "text": "A", "attrs": null},
            {"id": "b", "text": 7, "attrs": {
                "reverse_edge": "true", "class_lines": null, "class_title": 3,
                "color": false, "shape": "box"
            }},
            {"id": "c", "attrs": {"reverse_edge": "sometimes"}}
        ]}, "global_orientation": null}"#;
        let d = load_document(text).unwrap();
        assert_eq!(d.node_count(), 4);
        assert_eq!(d.get_by_id(d.root_id()).unwrap().label, "");
        assert_eq!(d.global_orientation, Orientation::TopDown);

        let a = d.get_by_id(NodeId::intern("a")).unwrap();
        assert_eq!(a.attrs, NodeAttrs::default());

        let b = d.get_by_id(NodeId::intern("b")).unwrap();
        assert_eq!(b.label, "");
        assert!(b.attrs.reverse_edge);
        assert!(b.attrs.class_lines.is_empty());
        assert_eq!(b.attrs.class_title, None);
        assert_eq!(b.attrs.color, None);
        assert_eq!(b.attrs.shape, Some(Shape::Box));

        let c = d.get_by_id(NodeId::intern("c")).unwrap();
        assert!(!c.attrs.reverse_edge);
    }

    #[test]
    fn out_of_range_sizes_save_clamped() {
        let mut d = Diagram::new();
        let root = d.root_id();
        let attrs = NodeAttrs {
            node_width: Some(5),
            font_size_label: Some(500),
            reverse_edge: true,
            ..NodeAttrs::default()
        };
        let child = d.add_child(root, "Small", attrs).unwrap();

        let reloaded = load_document(&save_document(&d).unwrap()).unwrap();
        let saved = &reloaded.get_by_id(child).unwrap().attrs;
        assert_eq!(saved, &d.get_by_id(child).unwrap().attrs.clamped());
        assert_eq!(saved.node_width, Some(MIN_NODE_DIMENSION));
        assert_eq!(saved.font_size_label, Some(MAX_FONT_SIZE));
        assert!(saved.reverse_edge);

        let resaved = load_document(&save_document(&reloaded).unwrap()).unwrap();
        assert_eq!(resaved, reloaded);
    }

    #[test]
    fn missing_keys_take_defaults() {
        let d = load_document(r#"{"tree": {"id": "root"}}"#).unwrap();
        assert_eq!(d.node_count(), 1);
        assert!(d.connections.is_empty());
        assert_eq!(d.global_orientation, Orientation::TopDown);
        let root = d.get_by_id(d.root_id()).unwrap();
        assert_eq!(root.label, "");
        assert_eq!(root.attrs, NodeAttrs::default());
    }

    #[test]
    fn lenient_values_fall_back() {
        let text = r##"{"tree": {"id": "root", "text": "R", "attrs": {
            "shape": "blob", "orientation": "sideways", "color": "#zzz",
            "node_width": "120.4", "node_height": 2, "font_size_label": "big"
        }}}"##;
        let d = load_document(text).unwrap();
        let attrs = &d.get_by_id(d.root_id()).unwrap().attrs;
        assert_eq!(attrs.shape, Some(Shape::Ellipse));
        assert_eq!(attrs.orientation, Some(Orientation::TopDown));
        assert_eq!(attrs.color, None);
        assert_eq!(attrs.node_width, Some(120));
        assert_eq!(attrs.node_height, Some(MIN_NODE_DIMENSION));
        assert_eq!(attrs.font_size_label, None);
    }

    #[test]
    fn dangling_connections_are_dropped_on_load() {
        let text = r#"{"tree": {"id": "root", "children": [{"id": "a"}]},
            "connections": [
                {"from": "root", "to": "a", "type": "arrow"},
                {"from": "root", "to": "gone", "type": "arrow"},
                {"to": "a"}
            ]}"#;
        let d = load_document(text).unwrap();
        assert_eq!(d.connections.len(), 1);
        assert_eq!(d.connections[0].kind, ConnectionKind::Arrow);
    }

    #[test]
    fn children_without_ids_get_fresh_ones() {
        let text = r#"{"tree": {"id": "root", "children": [{"text": "A"}, {"text": "B"}]}}"#;
        let d = load_document(text).unwrap();
        let kids = d.children(d.root);
        assert_eq!(kids.len(), 2);
        assert_ne!(d.node(kids[0]).id, d.node(kids[1]).id);
        assert!(d.node(kids[0]).id.as_str().starts_with("node_"));
    }

    #[test]
    fn save_omits_unset_attrs() {
        let d = Diagram::new();
        let json = save_document(&d).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["tree"]["attrs"], serde_json::json!({}));
        assert_eq!(value["tree"]["id"], "root");
        assert_eq!(value["tree"]["text"], "Root");
        assert_eq!(value["global_orientation"], "TB");
        assert!(json.contains("\n  \"tree\""));
    }
}
