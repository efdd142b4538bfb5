//! Pure geometry for watermark placement.
//!
//! All functions here are pure and testable without any pixels: output canvas
//! size, anchor coordinates, the tile grid, and the layout of logo and text
//! inside an overlay. Coordinates are allowed to fall outside the canvas;
//! drawing clips them.

use super::backend::Dimensions;
use super::params::{Anchor, Horizontal, OverlayMode, Percent, TextSize, Vertical};

/// Output canvas size after the long-edge cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitSize {
    pub width: u32,
    pub height: u32,
    /// Factor applied to both edges; never above 1.
    pub scale: f64,
}

impl FitSize {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }
}

/// Downscale `(width, height)` so the longer edge fits `max_long_edge`.
///
/// `None` means no cap. Images that already fit are returned unchanged with
/// `scale = 1`; the function never upscales.
///
/// ```
/// # use listing_mark::imaging::compute_fit_size;
/// let fit = compute_fit_size(1920, 1080, Some(1200));
/// assert_eq!((fit.width, fit.height, fit.scale), (1200, 675, 0.625));
///
/// let small = compute_fit_size(800, 600, Some(1200));
/// assert_eq!((small.width, small.height, small.scale), (800, 600, 1.0));
/// ```
pub fn compute_fit_size(width: u32, height: u32, max_long_edge: Option<u32>) -> FitSize {
    let long_edge = width.max(height);
    match max_long_edge {
        Some(max) if long_edge > max => {
            let scale = max as f64 / long_edge as f64;
            FitSize {
                width: scale_edge(width, scale),
                height: scale_edge(height, scale),
                scale,
            }
        }
        _ => FitSize {
            width,
            height,
            scale: 1.0,
        },
    }
}

fn scale_edge(edge: u32, scale: f64) -> u32 {
    ((edge as f64 * scale).round() as u32).max(1)
}

/// Top-left corner of a placed box, in canvas pixels. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPosition {
    pub x: i64,
    pub y: i64,
}

/// Resolve the top-left corner for a box placed at `anchor`.
///
/// Edges sit `padding` pixels inside the canvas; centered axes round half
/// the leftover space, with ties going up (`-25.5` becomes `-25`). Nothing is clamped: a box wider than the canvas
/// resolves partly off-canvas.
pub fn resolve_anchor(
    anchor: Anchor,
    canvas: Dimensions,
    overlay: Dimensions,
    padding: i64,
) -> AnchorPosition {
    let (canvas_w, canvas_h) = (canvas.width as i64, canvas.height as i64);
    let (box_w, box_h) = (overlay.width as i64, overlay.height as i64);

    let x = match anchor.horizontal() {
        Horizontal::Left => padding,
        Horizontal::Center => half_round_up(canvas_w - box_w),
        Horizontal::Right => canvas_w - padding - box_w,
    };
    let y = match anchor.vertical() {
        Vertical::Top => padding,
        Vertical::Middle => half_round_up(canvas_h - box_h),
        Vertical::Bottom => canvas_h - padding - box_h,
    };

    AnchorPosition { x, y }
}

fn half_round_up(leftover: i64) -> i64 {
    (leftover as f64 / 2.0 + 0.5).floor() as i64
}

/// A point in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Top-left corners of a tile grid covering `canvas`.
///
/// Steps are `overlay + gap` on each axis. Rows and columns start one step
/// before the origin and continue while below `edge + step`, so rotated
/// tiles leave no seam at any border.
pub fn tile_grid(canvas: Dimensions, overlay: Dimensions, gap: f64) -> Vec<Point> {
    let step_x = overlay.width as f64 + gap;
    let step_y = overlay.height as f64 + gap;
    let (columns, rows) = tile_grid_shape(canvas, overlay, gap);

    let mut points = Vec::with_capacity(columns * rows);
    for row in 0..rows {
        let y = -step_y + row as f64 * step_y;
        for column in 0..columns {
            let x = -step_x + column as f64 * step_x;
            points.push(Point { x, y });
        }
    }
    points
}

/// `(columns, rows)` of the grid [`tile_grid`] produces, without building it.
pub fn tile_grid_shape(canvas: Dimensions, overlay: Dimensions, gap: f64) -> (usize, usize) {
    let step_x = overlay.width as f64 + gap;
    let step_y = overlay.height as f64 + gap;
    if !(step_x > 0.0 && step_y > 0.0) {
        return (0, 0);
    }
    (
        grid_steps(canvas.width, step_x),
        grid_steps(canvas.height, step_y),
    )
}

/// Number of values `-step + i*step` strictly below `edge + step`.
fn grid_steps(edge: u32, step: f64) -> usize {
    let span = edge as f64 + 2.0 * step;
    (span / step).ceil() as usize
}

/// Rendered logo size when its width is scaled to `target_width`.
///
/// Aspect ratio is kept; each rendered dimension is at least one pixel.
pub fn logo_render_size(native: Dimensions, target_width: f64) -> (f64, f64) {
    if native.width == 0 || native.height == 0 {
        return (1.0, 1.0);
    }
    let scale = target_width / native.width as f64;
    (
        (native.width as f64 * scale).max(1.0),
        (native.height as f64 * scale).max(1.0),
    )
}

/// Center of an overlay instance whose unrotated top-left is `origin`.
///
/// Rotation pivots about this point, so it is the same for every angle.
pub fn instance_center(origin: Point, overlay: Dimensions) -> Point {
    Point {
        x: origin.x + overlay.width as f64 / 2.0,
        y: origin.y + overlay.height as f64 / 2.0,
    }
}

/// Measured text block: widest line and number of non-blank lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub line_count: usize,
}

/// Where the content of an overlay goes inside its buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayLayout {
    /// Buffer size; never below 1×1.
    pub dimensions: Dimensions,
    /// Rendered logo size, drawn at the origin.
    pub logo: Option<(f64, f64)>,
    /// Top-left of the first text line.
    pub text_origin: Option<Point>,
    pub line_height: f64,
}

/// Lay out an overlay of logo and/or text.
///
/// `logo` is the native logo size, `text` the measured non-blank lines.
/// Content the mode excludes is dropped. The logo/text gap only exists in
/// [`OverlayMode::Both`] when a logo is present.
pub fn layout_overlay(
    mode: OverlayMode,
    logo: Option<Dimensions>,
    text: Option<TextMetrics>,
    text_size: TextSize,
    scale: Percent,
    shortest_edge: u32,
) -> OverlayLayout {
    let logo = logo
        .filter(|_| mode.includes_logo())
        .map(|native| logo_render_size(native, scale.of(shortest_edge)));
    let text = text.filter(|t| mode.includes_text() && t.line_count > 0);

    let line_height = text_size.line_height();
    let (logo_w, logo_h) = logo.unwrap_or((0.0, 0.0));
    let (text_w, text_h) = text.map_or((0.0, 0.0), |t| {
        (t.width, line_height * t.line_count as f64)
    });
    let gap = if mode == OverlayMode::Both && logo.is_some() {
        text_size.logo_gap()
    } else {
        0.0
    };

    let (width, height) = match mode {
        OverlayMode::Logo => (logo_w, logo_h),
        OverlayMode::Text => (text_w, text_h),
        OverlayMode::Both => (logo_w + gap + text_w, logo_h.max(text_h)),
    };
    let dimensions = Dimensions {
        width: ceil_dimension(width),
        height: ceil_dimension(height),
    };

    let text_origin = text.map(|_| {
        let y = if mode == OverlayMode::Both {
            ((dimensions.height as f64 - text_h) / 2.0).round().max(0.0)
        } else {
            0.0
        };
        Point {
            x: logo_w + gap,
            y,
        }
    });

    OverlayLayout {
        dimensions,
        logo,
        text_origin,
        line_height,
    }
}

fn ceil_dimension(value: f64) -> u32 {
    if value.is_finite() {
        (value.ceil() as u32).max(1)
    } else {
        1
    }
}

/// Non-blank, trimmed lines of a multi-line string.
pub fn text_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Degrees to radians, treating non-finite input as no rotation.
pub fn rotation_radians(degrees: f64) -> f64 {
    if degrees.is_finite() {
        degrees.to_radians()
    } else {
        0.0
    }
}
