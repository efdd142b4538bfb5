//! Watermark compositing — pure Rust, no system libraries.
//!
//! | Stage | Module | Crate / function |
//! |---|---|---|
//! | **Fit** | [`calculations`] | pure math |
//! | **Overlay** | [`overlay`] | logo via `imageops::resize` (Lanczos3), text via `ab_glyph` |
//! | **Composite** | [`compositor`] | rotated bilinear source-over blending |
//! | **Encode** | [`encoder`] | `image` JPEG / PNG / lossless WebP encoders |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and layout (unit testable)
//! - **Parameters**: Clamped value types and explicit drawing records
//! - **Backend**: [`RasterBackend`] / [`RasterSurface`] traits + [`RustBackend`]
//! - **Stages**: overlay builder, compositor and encoder over any backend
//! - **Operations**: [`apply_watermark`], the single entry point

pub mod backend;
pub mod calculations;
pub mod compositor;
pub mod encoder;
pub mod operations;
pub mod overlay;
pub mod params;
pub mod rust_backend;
pub mod typeface;

pub use backend::{BackendError, Dimensions, EncodedImage, RasterBackend, RasterSurface};
pub use calculations::{FitSize, compute_fit_size, resolve_anchor, tile_grid};
pub use operations::{WatermarkPlan, apply_watermark, composite, decode_bitmap, plan_watermark};
pub use params::{
    Anchor, EncodeParams, JpegQuality, Opacity, OutputFormat, OverlayMode, Percent, Placement,
    Rgb, TextSize, parse_hex_color,
};
pub use rust_backend::{RgbaSurface, RustBackend};
pub use typeface::{Typeface, TypefaceError};
