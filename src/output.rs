//! CLI output formatting for the `apply` and `check` commands.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Canvas 1200x675 (scaled 0.625 from 1920x1080)
//! Overlay 135x68
//!     Logo: 135x67.5
//! Placement bottom_right, opacity 0.60, rotation 0°
//!     001 (1041, 583)
//! ```
//!
//! Tiled runs print `Tiled 8x9, opacity ...` and one line per instance.
//!
//! ## Apply
//!
//! ```text
//! listing-watermarked.jpg
//!     JPEG 1200x675, 183204 bytes
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::WatermarkOptions;
use crate::imaging::compositor::tile_shape;
use crate::imaging::{Dimensions, EncodedImage, WatermarkPlan};
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Whole numbers print without decimals, everything else with one.
fn format_px(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

pub fn format_plan(
    plan: &WatermarkPlan,
    source: Dimensions,
    options: &WatermarkOptions,
) -> Vec<String> {
    let mut lines = Vec::new();
    let canvas = plan.canvas();

    if plan.fit.scale < 1.0 {
        lines.push(format!(
            "Canvas {}x{} (scaled {:.3} from {}x{})",
            canvas.width, canvas.height, plan.fit.scale, source.width, source.height
        ));
    } else {
        lines.push(format!("Canvas {}x{}", canvas.width, canvas.height));
    }

    let overlay = &plan.overlay;
    lines.push(format!(
        "Overlay {}x{}",
        overlay.dimensions.width, overlay.dimensions.height
    ));
    if let Some((w, h)) = overlay.logo {
        lines.push(format!("{}Logo: {}x{}", indent(1), format_px(w), format_px(h)));
    }
    if let Some(origin) = overlay.text_origin {
        lines.push(format!(
            "{}Text: at ({}, {}), line height {}",
            indent(1),
            format_px(origin.x),
            format_px(origin.y),
            format_px(overlay.line_height)
        ));
    }
    if overlay.logo.is_none() && overlay.text_origin.is_none() {
        lines.push(format!("{}(empty)", indent(1)));
    }

    let style = format!(
        "opacity {:.2}, rotation {}°",
        options.opacity().value(),
        format_px(options.rotation_deg)
    );
    match tile_shape(canvas, overlay.dimensions, options) {
        Some((columns, rows)) => lines.push(format!("Tiled {columns}x{rows}, {style}")),
        None => lines.push(format!("Placement {}, {style}", options.position)),
    }
    for (i, p) in plan.placements.iter().enumerate() {
        lines.push(format!(
            "{}{} ({}, {})",
            indent(1),
            format_index(i + 1),
            format_px(p.x),
            format_px(p.y)
        ));
    }

    lines
}

pub fn print_plan(plan: &WatermarkPlan, source: Dimensions, options: &WatermarkOptions) {
    for line in format_plan(plan, source, options) {
        println!("{}", line);
    }
}

pub fn format_applied(path: &Path, encoded: &EncodedImage) -> Vec<String> {
    vec![
        path.display().to_string(),
        format!(
            "{}{} {}x{}, {} bytes",
            indent(1),
            encoded.format,
            encoded.width,
            encoded.height,
            encoded.bytes.len()
        ),
    ]
}

pub fn print_applied(path: &Path, encoded: &EncodedImage) {
    for line in format_applied(path, encoded) {
        println!("{}", line);
    }
}
