//! Shared test utilities for the listing-mark test suite.
//!
//! Synthetic photos and logos, plus an options builder, so unit tests never
//! need fixture files on disk.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let photo = photo_bitmap(1920, 1080);
//! let logo = logo_bitmap(400, 200);
//! let options = options_with(|o| {
//!     o.max_long_edge_px = Some(1200);
//!     o.opacity = 0.6;
//! });
//! ```

use crate::config::WatermarkOptions;
use image::{DynamicImage, Rgba, RgbaImage};

// =========================================================================
// Bitmaps
// =========================================================================

/// Opaque gradient photo. Every pixel differs from its neighbours, so
/// resampling and blending mistakes show up in pixel asserts.
pub fn photo_bitmap(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
    })
}

pub fn photo_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(photo_bitmap(width, height))
}

/// Solid red logo with full alpha.
pub fn logo_bitmap(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]))
}

pub fn logo_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(logo_bitmap(width, height))
}

/// Single-color opaque canvas.
pub fn solid_bitmap(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(rgba))
}

// =========================================================================
// Options
// =========================================================================

/// Stock options with `edit` applied.
pub fn options_with(edit: impl FnOnce(&mut WatermarkOptions)) -> WatermarkOptions {
    let mut options = WatermarkOptions::default();
    edit(&mut options);
    options
}

/// The listing-photo scenario: 20% logo, bottom-right, 24px padding,
/// 60% opacity, capped at 1200px.
pub fn listing_options() -> WatermarkOptions {
    options_with(|o| {
        o.scale_pct = 20.0;
        o.padding_px = 24;
        o.opacity = 0.6;
        o.max_long_edge_px = Some(1200);
    })
}
