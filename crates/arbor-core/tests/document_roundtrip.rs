//! Integration tests: diagram → JSON → diagram.
//!
//! Saving and reloading must reproduce ids, labels, attrs, child order,
//! connections and the global orientation exactly.

use arbor_core::id::NodeId;
use arbor_core::model::*;
use arbor_core::{DocumentError, load_document, save_document};
use pretty_assertions::assert_eq;

fn every_attr() -> NodeAttrs {
    NodeAttrs {
        shape: Some(Shape::Class),
        color: Some(Rgb::new(0x6c, 0x5c, 0xe7)),
        orientation: Some(Orientation::RightLeft),
        node_width: Some(140),
        node_height: Some(75),
        font_size_label: Some(12),
        font_size_record: Some(9),
        font_weight_label: Some(FontWeight::Italic),
        justify: Some(Justify::Right),
        class_title: Some("Widget".into()),
        class_lines: vec!["id: u64".into(), "name: String".into()],
        manual_x: Some(12.5),
        manual_y: Some(-40.25),
        reverse_edge: true,
    }
}

fn sample() -> Diagram {
    let mut d = Diagram::new();
    d.global_orientation = Orientation::LeftRight;
    let root = d.root_id();
    let a = d.add_child(root, "Alpha", every_attr()).unwrap();
    let b = d
        .add_child(
            root,
            "Beta",
            NodeAttrs {
                shape: Some(Shape::Interface),
                ..NodeAttrs::default()
            },
        )
        .unwrap();
    let a1 = d.add_child(a, "Alpha one", NodeAttrs::default()).unwrap();
    d.add_child(a, "Alpha two", NodeAttrs::default()).unwrap();
    d.add_connection(Connection::new(a1, b, ConnectionKind::DoubleArrowOneway));
    d.add_connection(Connection::new(b, root, ConnectionKind::Double));
    d
}

#[test]
fn save_then_load_is_identity() {
    let original = sample();
    let text = save_document(&original).unwrap();
    let loaded = load_document(&text).unwrap();
    assert_eq!(loaded, original);
}

#[test]
fn ids_are_preserved_verbatim() {
    let original = sample();
    let loaded = load_document(&save_document(&original).unwrap()).unwrap();
    let ids = |d: &Diagram| -> Vec<String> {
        d.preorder()
            .into_iter()
            .map(|idx| d.node(idx).id.as_str().to_string())
            .collect()
    };
    assert_eq!(ids(&loaded), ids(&original));
}

#[test]
fn saving_twice_is_stable() {
    let once = save_document(&sample()).unwrap();
    let twice = save_document(&load_document(&once).unwrap()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn fixture_loads_with_structure() {
    let input = include_str!("fixtures/org_chart.json");
    let d = load_document(input).unwrap();

    assert_eq!(d.node_count(), 6);
    let kids: Vec<&str> = d
        .children(d.root)
        .into_iter()
        .map(|idx| d.node(idx).id.as_str())
        .collect();
    assert_eq!(kids, vec!["api", "workers", "user"]);

    let api = d.get_by_id(NodeId::intern("api")).unwrap();
    assert_eq!(api.attrs.shape(), Shape::Class);
    assert_eq!(api.attrs.class_title(&api.label), "ApiServer");
    assert_eq!(api.attrs.class_lines.len(), 3);

    let workers = d.index_of(NodeId::intern("workers")).unwrap();
    assert_eq!(d.effective_orientation(workers), Orientation::LeftRight);
    let ingest = d.index_of(NodeId::intern("ingest")).unwrap();
    assert_eq!(d.effective_orientation(ingest), Orientation::LeftRight);

    assert_eq!(d.connections.len(), 2);
    assert_eq!(d.connections[1].kind, ConnectionKind::DoubleArrow);
}

#[test]
fn fixture_roundtrips() {
    let d = load_document(include_str!("fixtures/org_chart.json")).unwrap();
    let again = load_document(&save_document(&d).unwrap()).unwrap();
    assert_eq!(again, d);
}

#[test]
fn document_without_tree_is_rejected() {
    let result = load_document(r#"{"global_orientation": "LR"}"#);
    assert!(matches!(result, Err(DocumentError::MissingTree)));
}
