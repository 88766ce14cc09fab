//! Integration tests: fixture document → layout → exported image.

use arbor_core::geom::Point;
use arbor_core::layout::{LayoutConfig, TreeLayout, Viewport, layout_tree};
use arbor_core::load_document;
use arbor_core::model::{Diagram, Rgb};
use arbor_render::{ExportConfig, PaintOptions, export_png, export_svg, hit_test, render_svg};
use pretty_assertions::assert_eq;

const ORG_CHART: &str = include_str!("../../arbor-core/tests/fixtures/org_chart.json");

fn fixture() -> (Diagram, TreeLayout) {
    let d = load_document(ORG_CHART).unwrap();
    let l = layout_tree(&d, Viewport::default(), &LayoutConfig::default(), None);
    (d, l)
}

fn view_box(svg: &str) -> [f32; 4] {
    let start = svg.find("viewBox=\"").unwrap() + "viewBox=\"".len();
    let rest = &svg[start..];
    let raw = &rest[..rest.find('"').unwrap()];
    let nums: Vec<f32> = raw.split_whitespace().map(|n| n.parse().unwrap()).collect();
    [nums[0], nums[1], nums[2], nums[3]]
}

#[test]
fn export_crops_around_every_node_with_border() {
    let (d, l) = fixture();
    let svg = export_svg(&d, &l, &ExportConfig::default());
    let [x, y, w, h] = view_box(&svg);
    let nodes = l.extents().unwrap();

    // Strokes and labels may reach past the boxes, never the other way.
    assert!(x <= nodes.x - 30.0 + 0.01, "{x} vs {nodes:?}");
    assert!(y <= nodes.y - 30.0 + 0.01, "{y} vs {nodes:?}");
    assert!(x + w >= nodes.right() + 30.0 - 0.01);
    assert!(y + h >= nodes.bottom() + 30.0 - 0.01);
}

#[test]
fn border_width_follows_config() {
    let (d, l) = fixture();
    let [_, _, w0, h0] = view_box(&export_svg(&d, &l, &ExportConfig::default().with_border(0.0)));
    let [_, _, w1, h1] = view_box(&export_svg(&d, &l, &ExportConfig::default().with_border(50.0)));
    assert!((w1 - w0 - 100.0).abs() < 0.02, "{w0} {w1}");
    assert!((h1 - h0 - 100.0).abs() < 0.02, "{h0} {h1}");
}

#[test]
fn export_never_shows_selection() {
    let (d, l) = fixture();
    let highlight = Rgb::HIGHLIGHT.to_hex();

    let shown = PaintOptions::plain()
        .with_selected(Some(d.root_id()))
        .with_show_selection(true);
    let editing = render_svg(&d, &l, &shown, 30.0, Rgb::WHITE);
    assert!(editing.contains(&highlight));

    let exported = export_svg(&d, &l, &ExportConfig::default());
    assert!(!exported.contains(&highlight));
}

#[test]
fn labels_and_class_lines_are_drawn() {
    let (d, l) = fixture();
    let svg = export_svg(&d, &l, &ExportConfig::default());
    for text in ["Platform", "ApiServer", "• route(req)", "Workers", "Billing", "Operator"] {
        assert!(svg.contains(&format!(">{text}</text>")), "missing {text}");
    }
}

#[test]
fn png_export_writes_png() {
    let (d, l) = fixture();
    let png = export_png(&d, &l, &ExportConfig::default().with_scale(0.5)).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn hit_test_finds_fixture_nodes() {
    let (d, l) = fixture();
    for id in ["api", "workers", "ingest", "billing", "user"] {
        let id = arbor_core::NodeId::intern(id);
        let center = l.bounds_of(id).unwrap().center();
        assert_eq!(hit_test(&d, &l, center), Some(id));
    }
    assert_eq!(hit_test(&d, &l, Point::new(-1000.0, -1000.0)), None);
}
