//! Overlay builder: renders the logo and/or text into a tightly-bounded
//! surface, independent of the photo it will be stamped onto.

use super::backend::{BackendError, Dimensions, RasterBackend, RasterSurface};
use super::calculations::{OverlayLayout, TextMetrics, layout_overlay, text_lines};
use super::params::{Placement, TextRun};
use crate::config::WatermarkOptions;
use image::RgbaImage;
use tracing::debug;

/// A rendered overlay plus the layout it was drawn from.
pub struct Overlay<S> {
    pub surface: S,
    pub layout: OverlayLayout,
}

impl<S: RasterSurface> Overlay<S> {
    pub fn dimensions(&self) -> Dimensions {
        self.layout.dimensions
    }
}

/// Whether the options ask for any text to be drawn.
pub fn needs_text(options: &WatermarkOptions) -> bool {
    options.mode.includes_text() && !text_lines(&options.text).is_empty()
}

/// Measure the text block the options describe.
///
/// `None` when the mode excludes text or the text is blank. Fails only if
/// text is wanted and the backend cannot measure it.
pub fn measure_text_block<B: RasterBackend>(
    backend: &B,
    options: &WatermarkOptions,
) -> Result<Option<TextMetrics>, BackendError> {
    if !options.mode.includes_text() {
        return Ok(None);
    }
    let lines = text_lines(&options.text);
    if lines.is_empty() {
        return Ok(None);
    }

    let size = options.text_size();
    let mut width: f64 = 0.0;
    for line in &lines {
        width = width.max(backend.measure_text(line, size)?);
    }
    Ok(Some(TextMetrics {
        width,
        line_count: lines.len(),
    }))
}

/// Compute the overlay layout for a photo whose shortest edge is `shortest_edge`.
pub fn plan_overlay<B: RasterBackend>(
    backend: &B,
    logo: Option<Dimensions>,
    options: &WatermarkOptions,
    shortest_edge: u32,
) -> Result<OverlayLayout, BackendError> {
    let text = measure_text_block(backend, options)?;
    let layout = layout_overlay(
        options.mode,
        logo,
        text,
        options.text_size(),
        options.scale(),
        shortest_edge,
    );
    debug!(
        mode = %options.mode,
        width = layout.dimensions.width,
        height = layout.dimensions.height,
        has_logo = layout.logo.is_some(),
        has_text = layout.text_origin.is_some(),
        "overlay layout"
    );
    Ok(layout)
}

/// Draw the content of `layout` into a fresh surface.
///
/// The logo sits at the origin; text lines are filled left-aligned at full
/// opacity. Overlay opacity is applied later, when the overlay is placed.
pub fn render_overlay<B: RasterBackend>(
    backend: &B,
    layout: OverlayLayout,
    logo: Option<&RgbaImage>,
    options: &WatermarkOptions,
) -> Result<Overlay<B::Surface>, BackendError> {
    let mut surface = backend.allocate(layout.dimensions.width, layout.dimensions.height)?;

    if let (Some((w, h)), Some(bitmap)) = (layout.logo, logo) {
        surface.draw_bitmap(bitmap, &Placement::new(0.0, 0.0, w, h));
    }

    if let Some(origin) = layout.text_origin {
        let size = options.text_size();
        let color = options.text_color();
        for (i, line) in text_lines(&options.text).into_iter().enumerate() {
            surface.fill_text(&TextRun {
                text: line,
                x: origin.x,
                y: origin.y + i as f64 * layout.line_height,
                size,
                color,
            })?;
        }
    }

    Ok(Overlay { surface, layout })
}

/// Lay out and render the overlay in one step.
pub fn build_overlay<B: RasterBackend>(
    backend: &B,
    logo: Option<&RgbaImage>,
    options: &WatermarkOptions,
    shortest_edge: u32,
) -> Result<Overlay<B::Surface>, BackendError> {
    let layout = plan_overlay(backend, logo.map(Dimensions::from), options, shortest_edge)?;
    render_overlay(backend, layout, logo, options)
}
