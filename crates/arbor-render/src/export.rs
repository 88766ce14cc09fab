//! Image export.
//!
//! The diagram is painted through [`SvgTarget`] with selection suppressed,
//! cropped to what was drawn plus a solid border, and rasterised with
//! usvg/resvg when a bitmap is wanted.

use crate::paint::PaintOptions;
use crate::svg::render_svg;
use arbor_core::layout::TreeLayout;
use arbor_core::model::{Diagram, FONT_FAMILY, Rgb};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to parse SVG")]
    SvgParse,
    #[error("failed to allocate pixmap for raster rendering")]
    PixmapAlloc,
    #[error("failed to encode PNG")]
    PngEncode,
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Raster scale factor; 1.0 is one pixel per canvas unit.
    pub scale: f32,
    /// Solid margin around the drawing, in canvas units.
    pub border: f32,
    pub background: Rgb,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            border: 30.0,
            background: Rgb::WHITE,
        }
    }
}

impl ExportConfig {
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_border(mut self, border: f32) -> Self {
        self.border = border;
        self
    }

    pub fn with_background(mut self, background: Rgb) -> Self {
        self.background = background;
        self
    }
}

/// Standalone SVG of the diagram, cropped and bordered.
pub fn export_svg(diagram: &Diagram, layout: &TreeLayout, config: &ExportConfig) -> String {
    render_svg(
        diagram,
        layout,
        &PaintOptions::plain(),
        config.border.max(0.0),
        config.background,
    )
}

/// PNG bytes of the diagram at `config.scale`.
pub fn export_png(diagram: &Diagram, layout: &TreeLayout, config: &ExportConfig) -> Result<Vec<u8>> {
    let svg = export_svg(diagram, layout, config);
    svg_to_png(&svg, config)
}

pub fn svg_to_png(svg: &str, config: &ExportConfig) -> Result<Vec<u8>> {
    let pixmap = svg_to_pixmap(svg, config)?;
    pixmap.encode_png().map_err(|_| ExportError::PngEncode)
}

fn svg_to_pixmap(svg: &str, config: &ExportConfig) -> Result<tiny_skia::Pixmap> {
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    opt.font_family = FONT_FAMILY.to_string();

    let tree = usvg::Tree::from_str(svg, &opt).map_err(|_| ExportError::SvgParse)?;

    let scale = if config.scale.is_finite() && config.scale > 0.0 {
        config.scale
    } else {
        log::warn!("ignoring export scale {}, using 1.0", config.scale);
        1.0
    };
    let size = tree.size();
    let width = (size.width() * scale).ceil().max(1.0) as u32;
    let height = (size.height() * scale).ceil().max(1.0) as u32;
    log::debug!("rasterising {width}x{height} at scale {scale}");

    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or(ExportError::PixmapAlloc)?;
    let bg = config.background;
    pixmap.fill(tiny_skia::Color::from_rgba8(bg.r, bg.g, bg.b, 255));
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::layout::{LayoutConfig, Viewport, layout_tree};
    use arbor_core::model::NodeAttrs;
    use pretty_assertions::assert_eq;

    fn diagram() -> (Diagram, TreeLayout) {
        let mut d = Diagram::new();
        d.add_child(d.root_id(), "child", NodeAttrs::default());
        let l = layout_tree(&d, Viewport::default(), &LayoutConfig::default(), None);
        (d, l)
    }

    #[test]
    fn png_has_signature_and_scaled_size() {
        let (d, l) = diagram();
        let png = export_png(&d, &l, &ExportConfig::default().with_scale(2.0)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let svg = export_svg(&d, &l, &ExportConfig::default());
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default()).unwrap();
        let pixmap = svg_to_pixmap(&svg, &ExportConfig::default().with_scale(2.0)).unwrap();
        assert_eq!(pixmap.width(), (tree.size().width() * 2.0).ceil() as u32);
    }

    #[test]
    fn background_fills_the_border() {
        let (d, l) = diagram();
        let config = ExportConfig::default().with_background(Rgb::new(0, 0, 255));
        let svg = export_svg(&d, &l, &config);
        let pixmap = svg_to_pixmap(&svg, &config).unwrap();
        let corner = pixmap.pixel(0, 0).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (0, 0, 255));
    }

    #[test]
    fn broken_svg_is_an_error() {
        let err = svg_to_png("<svg", &ExportConfig::default()).unwrap_err();
        assert!(matches!(err, ExportError::SvgParse));
    }
}
