//! Compositor: stamps overlay instances onto the resized photo.
//!
//! A single instance goes to the resolved anchor; a tiled run covers the
//! frame with a grid that starts one step before the origin and ends one
//! step past each edge. Every instance rotates about its own center, so the
//! angle never moves its centroid.

use super::backend::{Dimensions, RasterSurface};
use super::calculations::{Point, resolve_anchor, rotation_radians, tile_grid, tile_grid_shape};
use super::params::Placement;
use crate::config::WatermarkOptions;
use tracing::debug;

/// Placements of every overlay instance on a canvas.
pub fn place_instances(
    canvas: Dimensions,
    overlay: Dimensions,
    options: &WatermarkOptions,
) -> Vec<Placement> {
    let origins = if options.tile {
        tile_grid(canvas, overlay, tile_gap(canvas, options))
    } else {
        let pos = resolve_anchor(
            options.position,
            canvas,
            overlay,
            i64::from(options.padding_px),
        );
        vec![Point {
            x: pos.x as f64,
            y: pos.y as f64,
        }]
    };

    let rotation = rotation_radians(options.rotation_deg);
    let opacity = options.opacity();
    origins
        .into_iter()
        .map(|origin| {
            Placement::new(origin.x, origin.y, overlay.width as f64, overlay.height as f64)
                .rotated(rotation)
                .with_opacity(opacity)
        })
        .collect()
}

/// Gap between tiles in pixels.
fn tile_gap(canvas: Dimensions, options: &WatermarkOptions) -> f64 {
    options.tile_gap().of(canvas.shortest_edge())
}

/// `(columns, rows)` of the tile grid, or `None` for a single instance.
pub fn tile_shape(
    canvas: Dimensions,
    overlay: Dimensions,
    options: &WatermarkOptions,
) -> Option<(usize, usize)> {
    options
        .tile
        .then(|| tile_grid_shape(canvas, overlay, tile_gap(canvas, options)))
}

/// Draw `overlay` at every placement.
pub fn stamp<S: RasterSurface>(canvas: &mut S, overlay: &S, placements: &[Placement]) {
    debug!(
        instances = placements.len(),
        canvas_width = canvas.dimensions().width,
        canvas_height = canvas.dimensions().height,
        "stamping overlay"
    );
    for placement in placements {
        canvas.draw_surface(overlay, placement);
    }
}
