//! # Listing Mark
//!
//! A deterministic watermarking engine for real-estate listing photos. Give
//! it a decoded photo, an optional logo, and a [`WatermarkOptions`](config::WatermarkOptions)
//! record; it returns a new encoded image with the branding burned in, either
//! at one of nine anchors or tiled across the frame, rotated and faded as
//! requested.
//!
//! ```no_run
//! use listing_mark::config::WatermarkOptions;
//! use listing_mark::imaging::{RustBackend, apply_watermark, decode_bitmap};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let photo = decode_bitmap(&std::fs::read("house.jpg")?)?;
//! let logo = decode_bitmap(&std::fs::read("logo.png")?)?;
//! let options = WatermarkOptions {
//!     max_long_edge_px: Some(1200),
//!     ..WatermarkOptions::default()
//! };
//!
//! let encoded = apply_watermark(&RustBackend::new(), &photo, Some(&logo), &options)?;
//! std::fs::write("house-watermarked.jpg", &encoded.bytes)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture: Four-Stage Pipeline
//!
//! Every call runs the same strictly layered stages:
//!
//! ```text
//! 1. Fit        photo size   →  canvas size       (downscale to the long-edge cap)
//! 2. Overlay    logo + text  →  overlay surface   (tight box, independent of the photo)
//! 3. Composite  canvas       →  stamped canvas    (anchored or tiled, rotated, faded)
//! 4. Encode     canvas       →  JPEG / PNG / WebP bytes
//! ```
//!
//! No stage keeps state between calls. Callers can watermark many photos
//! concurrently against one shared backend without locking.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | The engine: geometry, overlay builder, compositor, encoder, raster backend |
//! | [`config`] | `WatermarkOptions`, stock defaults, TOML/JSON options files |
//! | [`output`] | CLI output formatting for `apply` and `check` |
//!
//! # Design Decisions
//!
//! ## Clamp, Never Reject
//!
//! Out-of-range numbers (opacity 1.5, scale 0%, quality 7) are clamped where
//! they are used, blank text contributes no lines, and a missing logo leaves
//! an empty overlay. The engine always produces a reasonable image. Only two
//! things fail: a backend that cannot draw (including text requested without
//! a typeface) and an encoder error. See [`imaging::BackendError`].
//!
//! ## Explicit Drawing State
//!
//! Every draw call carries its full placement: rectangle, rotation, opacity.
//! Text runs carry their size and color. Surfaces have no "current alpha" or
//! "current font", so the order of calls cannot leak state from one draw
//! into the next.
//!
//! ## One Backend Trait, One Software Implementation
//!
//! The stages talk to a [`RasterBackend`](imaging::RasterBackend) trait. The
//! shipped [`RustBackend`](imaging::RustBackend) is a pure-Rust rasterizer on
//! the `image` crate with `ab_glyph` for text. Tests use a recording mock
//! that checks geometry without touching pixels.
//!
//! ## Sizes Relative to the Photo
//!
//! Logo width and tile gaps are percentages of the output's shortest edge,
//! so the same options look the same on a phone snapshot and on a 6000px
//! DSLR frame.

pub mod config;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
