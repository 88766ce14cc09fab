pub mod document;
pub mod error;
pub mod format;
pub mod geom;
pub mod id;
pub mod layout;
pub mod lint;
pub mod model;
pub mod routing;
pub mod shape;

pub use document::{load_document, save_document};
pub use error::DocumentError;
pub use format::{FormatConfig, format_document};
pub use geom::{Bounds, Point, Size};
pub use id::NodeId;
pub use layout::{LayoutConfig, TreeEdge, TreeLayout, Viewport, layout_tree};
pub use lint::{LintDiagnostic, LintSeverity, lint_document};
pub use model::*;
pub use routing::{RoutedConnection, route_all, route_connection, route_tree_edge};
pub use shape::{Primitive, border_point, measure, primitives};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
