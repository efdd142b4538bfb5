//! Pure Rust raster backend: everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Surface | `image::RgbaImage` (straight alpha, 8 bits per channel) |
//! | Scaled draw | `image::imageops::resize` with `Lanczos3`, then bilinear placement |
//! | Rotated draw | inverse-mapped bilinear sampling in premultiplied alpha |
//! | Text | `ab_glyph` outlines, coverage used as alpha |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (alpha flattened over black) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → WebP | `image::codecs::webp::WebPEncoder` (lossless) |
//!
//! Blending is source-over. Every pixel of a transformed draw is computed
//! from its own center, so output depends only on the inputs.

use super::backend::{BackendError, Dimensions, EncodedImage, RasterBackend, RasterSurface};
use super::params::{EncodeParams, OutputFormat, Placement, Rgb, TextRun, TextSize};
use super::typeface::Typeface;
use ab_glyph::{Font, Glyph, GlyphId, ScaleFont, point};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbImage, RgbaImage};
use std::borrow::Cow;
use tracing::warn;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// Text needs a [`Typeface`]; without one, [`supports_text`](RasterBackend::supports_text)
/// is false and text calls fail with [`BackendError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct RustBackend {
    typeface: Option<Typeface>,
}

impl RustBackend {
    pub fn new() -> Self {
        Self { typeface: None }
    }

    pub fn with_typeface(typeface: Typeface) -> Self {
        Self {
            typeface: Some(typeface),
        }
    }

    /// Backend using the first bold sans-serif font found on the system.
    ///
    /// Falls back to a logo-only backend when none is installed.
    pub fn with_system_font() -> Self {
        match Typeface::discover() {
            Ok(typeface) => Self::with_typeface(typeface),
            Err(err) => {
                warn!(%err, "text overlays unavailable");
                Self::new()
            }
        }
    }

    pub fn typeface(&self) -> Option<&Typeface> {
        self.typeface.as_ref()
    }
}

/// A software drawing surface.
#[derive(Debug, Clone)]
pub struct RgbaSurface {
    pixels: RgbaImage,
    typeface: Option<Typeface>,
}

impl RgbaSurface {
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }
}

/// Longest edge a surface may have, matching common browser canvas limits.
pub const MAX_SURFACE_EDGE: u32 = 32_767;

/// Pixel budget per surface (16384 x 16384).
pub const MAX_SURFACE_PIXELS: u64 = 268_435_456;

impl RasterBackend for RustBackend {
    type Surface = RgbaSurface;

    fn allocate(&self, width: u32, height: u32) -> Result<RgbaSurface, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Unavailable(format!(
                "cannot allocate a {width}x{height} surface"
            )));
        }
        if width > MAX_SURFACE_EDGE
            || height > MAX_SURFACE_EDGE
            || width as u64 * height as u64 > MAX_SURFACE_PIXELS
        {
            return Err(BackendError::Unavailable(format!(
                "{width}x{height} surface is too large"
            )));
        }
        Ok(RgbaSurface {
            pixels: RgbaImage::new(width, height),
            typeface: self.typeface.clone(),
        })
    }

    fn supports_text(&self) -> bool {
        self.typeface.is_some()
    }

    fn measure_text(&self, text: &str, size: TextSize) -> Result<f64, BackendError> {
        let typeface = require_typeface(self.typeface.as_ref())?;
        let (_, advance) = layout_line(typeface, text, size, 0.0, 0.0);
        Ok(advance as f64)
    }
}

fn require_typeface(typeface: Option<&Typeface>) -> Result<&Typeface, BackendError> {
    typeface.ok_or_else(|| BackendError::Unavailable("no typeface loaded for text".into()))
}

/// Position the glyphs of one line with its top edge at `y`.
///
/// Returns the glyphs and the total advance width.
fn layout_line(
    typeface: &Typeface,
    text: &str,
    size: TextSize,
    x: f32,
    y: f32,
) -> (Vec<Glyph>, f32) {
    let scale = typeface.px_scale(size);
    let font = typeface.font().as_scaled(scale);
    let baseline = y + font.ascent();

    let mut glyphs = Vec::with_capacity(text.len());
    let mut caret = x;
    let mut previous: Option<GlyphId> = None;
    for c in text.chars() {
        let id = font.glyph_id(c);
        if let Some(prev) = previous {
            caret += font.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, baseline)));
        caret += font.h_advance(id);
        previous = Some(id);
    }
    (glyphs, caret - x)
}

// =============================================================================
// Pixel math
// =============================================================================

/// Premultiplied RGBA, color channels in 0–255 scaled by alpha in 0–1.
type Premultiplied = [f32; 4];

fn premultiply(pixel: &Rgba<u8>) -> Premultiplied {
    let a = pixel[3] as f32 / 255.0;
    [
        pixel[0] as f32 * a,
        pixel[1] as f32 * a,
        pixel[2] as f32 * a,
        a,
    ]
}

/// Source-over `src` scaled by `opacity` onto the straight-alpha `dst`.
fn blend_over(dst: &mut Rgba<u8>, src: Premultiplied, opacity: f32) {
    let src_a = (src[3] * opacity).clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let keep = dst_a * (1.0 - src_a);
    let out_a = src_a + keep;

    for c in 0..3 {
        let premul = src[c] * opacity + dst[c] as f32 * keep;
        dst[c] = (premul / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Bilinear sample at continuous texel coordinates; outside texels are transparent.
fn sample_bilinear(source: &RgbaImage, u: f64, v: f64) -> Premultiplied {
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = (u - x0) as f32;
    let fy = (v - y0) as f32;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let texel = |x: i64, y: i64| -> Premultiplied {
        if x < 0 || y < 0 || x >= source.width() as i64 || y >= source.height() as i64 {
            [0.0; 4]
        } else {
            premultiply(source.get_pixel(x as u32, y as u32))
        }
    };

    let corners = [
        (texel(x0, y0), (1.0 - fx) * (1.0 - fy)),
        (texel(x0 + 1, y0), fx * (1.0 - fy)),
        (texel(x0, y0 + 1), (1.0 - fx) * fy),
        (texel(x0 + 1, y0 + 1), fx * fy),
    ];
    let mut out = [0.0f32; 4];
    for (value, weight) in corners {
        for c in 0..4 {
            out[c] += value[c] * weight;
        }
    }
    out
}

/// Resample `source` to the pixel size closest to the placement, if needed.
fn prepare_source<'a>(source: &'a RgbaImage, placement: &Placement) -> Cow<'a, RgbaImage> {
    let target_w = (placement.width.round() as u32).max(1);
    let target_h = (placement.height.round() as u32).max(1);
    if (target_w, target_h) == source.dimensions() {
        Cow::Borrowed(source)
    } else {
        Cow::Owned(image::imageops::resize(
            source,
            target_w,
            target_h,
            FilterType::Lanczos3,
        ))
    }
}

fn is_integral(v: f64) -> bool {
    v.fract() == 0.0
}

impl RgbaSurface {
    fn draw_image(&mut self, source: &RgbaImage, placement: &Placement) {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(placement.width)
            || !valid(placement.height)
            || !placement.x.is_finite()
            || !placement.y.is_finite()
            || source.width() == 0
            || source.height() == 0
        {
            return;
        }
        let opacity = placement.opacity.value() as f32;
        if opacity <= 0.0 {
            return;
        }

        let source = prepare_source(source, placement);
        let exact = placement.rotation_rad == 0.0
            && placement.width == source.width() as f64
            && placement.height == source.height() as f64
            && is_integral(placement.x)
            && is_integral(placement.y);

        if exact {
            self.blit(&source, placement.x as i64, placement.y as i64, opacity);
        } else {
            self.draw_transformed(&source, placement, opacity);
        }
    }

    /// Pixel-aligned copy with no resampling.
    fn blit(&mut self, source: &RgbaImage, left: i64, top: i64, opacity: f32) {
        let (canvas_w, canvas_h) = (self.pixels.width() as i64, self.pixels.height() as i64);
        let x_start = left.max(0);
        let y_start = top.max(0);
        let x_end = (left + source.width() as i64).min(canvas_w);
        let y_end = (top + source.height() as i64).min(canvas_h);

        for y in y_start..y_end {
            for x in x_start..x_end {
                let src = source.get_pixel((x - left) as u32, (y - top) as u32);
                let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
                blend_over(dst, premultiply(src), opacity);
            }
        }
    }

    /// Inverse-map every destination pixel in the rotated footprint.
    fn draw_transformed(&mut self, source: &RgbaImage, placement: &Placement, opacity: f32) {
        let (cx, cy) = placement.center();
        let half_w = placement.width / 2.0;
        let half_h = placement.height / 2.0;
        let (sin, cos) = placement.rotation_rad.sin_cos();

        // Axis-aligned bounds of the rotated rectangle, plus a pixel of filter slack.
        let extent_x = half_w * cos.abs() + half_h * sin.abs() + 1.0;
        let extent_y = half_w * sin.abs() + half_h * cos.abs() + 1.0;
        let (canvas_w, canvas_h) = (self.pixels.width() as f64, self.pixels.height() as f64);
        let x_start = (cx - extent_x).floor().max(0.0) as u32;
        let y_start = (cy - extent_y).floor().max(0.0) as u32;
        let x_end = (cx + extent_x).ceil().min(canvas_w).max(0.0) as u32;
        let y_end = (cy + extent_y).ceil().min(canvas_h).max(0.0) as u32;

        let texels_per_px_x = source.width() as f64 / placement.width;
        let texels_per_px_y = source.height() as f64 / placement.height;

        for y in y_start..y_end {
            let dy = y as f64 + 0.5 - cy;
            for x in x_start..x_end {
                let dx = x as f64 + 0.5 - cx;
                let local_x = dx * cos + dy * sin + half_w;
                let local_y = -dx * sin + dy * cos + half_h;
                if local_x < -1.0
                    || local_y < -1.0
                    || local_x > placement.width + 1.0
                    || local_y > placement.height + 1.0
                {
                    continue;
                }
                let src = sample_bilinear(
                    source,
                    local_x * texels_per_px_x - 0.5,
                    local_y * texels_per_px_y - 0.5,
                );
                blend_over(self.pixels.get_pixel_mut(x, y), src, opacity);
            }
        }
    }
}

/// Composite straight-alpha RGBA over black, as a canvas does for JPEG.
fn flatten_over_black(pixels: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let p = premultiply(pixels.get_pixel(x, y));
        image::Rgb([p[0].round() as u8, p[1].round() as u8, p[2].round() as u8])
    })
}

fn encode_error(format: OutputFormat, err: image::ImageError) -> BackendError {
    BackendError::Encode(format!("{format} encoding failed: {err}"))
}

impl RasterSurface for RgbaSurface {
    fn dimensions(&self) -> Dimensions {
        Dimensions::from(&self.pixels)
    }

    fn draw_bitmap(&mut self, bitmap: &RgbaImage, placement: &Placement) {
        self.draw_image(bitmap, placement);
    }

    fn draw_surface(&mut self, source: &Self, placement: &Placement) {
        self.draw_image(&source.pixels, placement);
    }

    fn fill_text(&mut self, run: &TextRun<'_>) -> Result<(), BackendError> {
        let typeface = require_typeface(self.typeface.as_ref())?;
        let (glyphs, _) = layout_line(typeface, run.text, run.size, run.x as f32, run.y as f32);
        let Rgb { r, g, b } = run.color;
        let pixels = &mut self.pixels;
        let (width, height) = (pixels.width() as i64, pixels.height() as i64);

        for glyph in glyphs {
            let Some(outlined) = typeface.font().outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }
                let a = coverage.clamp(0.0, 1.0);
                let src = [r as f32 * a, g as f32 * a, b as f32 * a, a];
                blend_over(pixels.get_pixel_mut(x as u32, y as u32), src, 1.0);
            });
        }
        Ok(())
    }

    fn encode(&self, params: &EncodeParams) -> Result<EncodedImage, BackendError> {
        let (width, height) = self.pixels.dimensions();
        let mut bytes = Vec::new();

        match params.format {
            OutputFormat::Jpeg => {
                let rgb = flatten_over_black(&self.pixels);
                JpegEncoder::new_with_quality(&mut bytes, params.quality.encoder_value())
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
            OutputFormat::Png => PngEncoder::new(&mut bytes).write_image(
                self.pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            OutputFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
                self.pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        }
        .map_err(|e| encode_error(params.format, e))?;

        Ok(EncodedImage {
            bytes,
            format: params.format,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{JpegQuality, Opacity};
    use crate::test_helpers::{logo_bitmap, photo_bitmap, solid_bitmap};

    fn canvas(width: u32, height: u32) -> RgbaSurface {
        RustBackend::new().allocate(width, height).unwrap()
    }

    fn params(format: OutputFormat) -> EncodeParams {
        EncodeParams {
            format,
            quality: JpegQuality::default(),
        }
    }

    #[test]
    fn allocate_is_transparent() {
        let surface = canvas(4, 3);
        assert_eq!(surface.dimensions(), Dimensions::new(4, 3));
        assert!(surface.pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn allocate_rejects_empty_and_oversized() {
        let backend = RustBackend::new();
        assert!(matches!(
            backend.allocate(0, 10),
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(
            backend.allocate(MAX_SURFACE_EDGE + 1, 1),
            Err(BackendError::Unavailable(_))
        ));
        assert!(matches!(
            backend.allocate(1, 100_000),
            Err(BackendError::Unavailable(_))
        ));
        // Both edges in range, pixel count over budget.
        assert!(matches!(
            backend.allocate(20_000, 20_000),
            Err(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn allocate_accepts_limit_edge() {
        let surface = RustBackend::new().allocate(MAX_SURFACE_EDGE, 1).unwrap();
        assert_eq!(surface.pixels().dimensions(), (MAX_SURFACE_EDGE, 1));
    }

    #[test]
    fn aligned_draw_copies_pixels() {
        let mut surface = canvas(50, 40);
        let photo = photo_bitmap(50, 40);
        surface.draw_bitmap(&photo, &Placement::new(0.0, 0.0, 50.0, 40.0));
        assert_eq!(surface.pixels(), &photo);
    }

    #[test]
    fn draw_clips_off_canvas() {
        let mut surface = canvas(10, 10);
        let logo = logo_bitmap(6, 6);
        surface.draw_bitmap(&logo, &Placement::new(-3.0, 7.0, 6.0, 6.0));

        assert_eq!(surface.pixels().get_pixel(0, 9), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(2, 7), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(3, 7)[3], 0);
        assert_eq!(surface.pixels().get_pixel(0, 6)[3], 0);
    }

    #[test]
    fn opacity_blends_with_background() {
        let mut surface = canvas(4, 4);
        surface.draw_bitmap(
            &solid_bitmap(4, 4, [0, 0, 255, 255]),
            &Placement::new(0.0, 0.0, 4.0, 4.0),
        );
        surface.draw_bitmap(
            &logo_bitmap(4, 4),
            &Placement::new(0.0, 0.0, 4.0, 4.0).with_opacity(Opacity::new(0.5)),
        );
        assert_eq!(surface.pixels().get_pixel(1, 1), &Rgba([128, 0, 128, 255]));
    }

    #[test]
    fn zero_opacity_draws_nothing() {
        let mut surface = canvas(4, 4);
        surface.draw_bitmap(
            &logo_bitmap(4, 4),
            &Placement::new(0.0, 0.0, 4.0, 4.0).with_opacity(Opacity::new(-1.0)),
        );
        assert!(surface.pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn scaled_draw_fills_target_rect() {
        let mut surface = canvas(20, 20);
        surface.draw_bitmap(&logo_bitmap(2, 2), &Placement::new(5.0, 5.0, 10.0, 10.0));

        let center = surface.pixels().get_pixel(10, 10);
        assert!(center[0] > 250 && center[1] < 5 && center[3] > 250);
        assert_eq!(surface.pixels().get_pixel(2, 2)[3], 0);
        assert_eq!(surface.pixels().get_pixel(17, 17)[3], 0);
    }

    #[test]
    fn quarter_turn_swaps_footprint() {
        let mut surface = canvas(100, 100);
        let placement = Placement::new(40.0, 45.0, 20.0, 10.0).rotated(std::f64::consts::FRAC_PI_2);
        surface.draw_bitmap(&logo_bitmap(20, 10), &placement);

        // Rotated footprint spans x 45..55, y 40..60 around the (50, 50) center.
        assert_eq!(surface.pixels().get_pixel(50, 42), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(50, 57), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(42, 50)[3], 0);
        assert_eq!(surface.pixels().get_pixel(58, 50)[3], 0);
    }

    #[test]
    fn draw_surface_uses_source_pixels() {
        let mut overlay = canvas(5, 5);
        overlay.draw_bitmap(&logo_bitmap(5, 5), &Placement::new(0.0, 0.0, 5.0, 5.0));

        let mut surface = canvas(10, 10);
        surface.draw_surface(&overlay, &Placement::new(2.0, 2.0, 5.0, 5.0));
        assert_eq!(surface.pixels().get_pixel(4, 4), &Rgba([255, 0, 0, 255]));
        assert_eq!(surface.pixels().get_pixel(8, 8)[3], 0);
    }

    #[test]
    fn text_requires_typeface() {
        let backend = RustBackend::new();
        assert!(!backend.supports_text());
        assert!(matches!(
            backend.measure_text("Acme", TextSize::new(32.0)),
            Err(BackendError::Unavailable(_))
        ));

        let mut surface = canvas(10, 10);
        let run = TextRun {
            text: "A",
            x: 0.0,
            y: 0.0,
            size: TextSize::new(8.0),
            color: Rgb::WHITE,
        };
        assert!(matches!(
            surface.fill_text(&run),
            Err(BackendError::Unavailable(_))
        ));
    }

    #[test]
    fn system_font_renders_and_measures_text() {
        let backend = RustBackend::with_system_font();
        if !backend.supports_text() {
            return;
        }

        let short = backend.measure_text("Ac", TextSize::new(32.0)).unwrap();
        let long = backend.measure_text("Acme Realty", TextSize::new(32.0)).unwrap();
        assert!(short > 0.0 && long > short);

        let mut surface = backend.allocate(long.ceil() as u32, 40).unwrap();
        surface
            .fill_text(&TextRun {
                text: "Acme Realty",
                x: 0.0,
                y: 0.0,
                size: TextSize::new(32.0),
                color: Rgb::new(0, 255, 0),
            })
            .unwrap();

        let inked: Vec<_> = surface.pixels().pixels().filter(|p| p[3] > 0).collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().filter(|p| p[3] == 255).all(|p| p[1] == 255 && p[0] == 0));
    }

    #[test]
    fn png_encode_preserves_pixels() {
        let mut surface = canvas(16, 8);
        surface.draw_bitmap(&photo_bitmap(16, 8), &Placement::new(0.0, 0.0, 16.0, 8.0));
        let encoded = surface.encode(&params(OutputFormat::Png)).unwrap();

        assert_eq!(encoded.mime_type(), "image/png");
        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgba8();
        assert_eq!(&decoded, surface.pixels());
    }

    #[test]
    fn jpeg_encode_flattens_alpha() {
        let surface = canvas(8, 8);
        let encoded = surface.encode(&params(OutputFormat::Jpeg)).unwrap();
        assert_eq!(encoded.mime_type(), "image/jpeg");
        assert_eq!(&encoded.bytes[..2], &[0xFF, 0xD8]);

        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgb8();
        assert!(decoded.pixels().all(|p| p.0.iter().all(|&c| c < 8)));
    }

    #[test]
    fn webp_encode_is_lossless() {
        let mut surface = canvas(12, 12);
        surface.draw_bitmap(&photo_bitmap(12, 12), &Placement::new(0.0, 0.0, 12.0, 12.0));
        let encoded = surface.encode(&params(OutputFormat::Webp)).unwrap();

        assert_eq!(encoded.mime_type(), "image/webp");
        assert_eq!(&encoded.bytes[..4], b"RIFF");
        let decoded = image::load_from_memory(&encoded.bytes).unwrap().to_rgba8();
        assert_eq!(&decoded, surface.pixels());
    }

    #[test]
    fn jpeg_quality_changes_output_size() {
        let mut surface = canvas(64, 64);
        surface.draw_bitmap(&photo_bitmap(64, 64), &Placement::new(0.0, 0.0, 64.0, 64.0));
        let low = surface
            .encode(&EncodeParams {
                format: OutputFormat::Jpeg,
                quality: JpegQuality::new(0.1),
            })
            .unwrap();
        let high = surface
            .encode(&EncodeParams {
                format: OutputFormat::Jpeg,
                quality: JpegQuality::new(1.0),
            })
            .unwrap();
        assert!(low.bytes.len() < high.bytes.len());
    }
}
