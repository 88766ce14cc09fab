pub mod export;
pub mod hit;
pub mod paint;
pub mod scene;
pub mod svg;
pub mod target;

pub use export::{ExportConfig, ExportError, export_png, export_svg};
pub use hit::hit_test;
pub use paint::{PaintOptions, paint_diagram};
pub use scene::{ScenePainter, paint_scene};
pub use svg::{SvgTarget, render_svg};
pub use target::{PrimitiveRecorder, RenderTarget, draw_primitive};
