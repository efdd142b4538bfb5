//! High-level watermark operations.
//!
//! These functions wire the stages together: fit the photo, build the
//! overlay, place its instances, encode. They take options, compute
//! parameters, and call the backend. Nothing is kept between calls, so any
//! number of calls may run concurrently on a shared backend.

use super::backend::{BackendError, Dimensions, EncodedImage, RasterBackend, RasterSurface};
use super::calculations::{FitSize, OverlayLayout, compute_fit_size};
use super::compositor::{place_instances, stamp};
use super::encoder::{encode, encode_params};
use super::overlay::{needs_text, plan_overlay, render_overlay};
use super::params::Placement;
use crate::config::WatermarkOptions;
use image::{DynamicImage, RgbaImage};
use tracing::debug;

/// Result type for watermark operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Geometry of one watermark call, computed without touching pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkPlan {
    pub fit: FitSize,
    pub overlay: OverlayLayout,
    pub placements: Vec<Placement>,
}

impl WatermarkPlan {
    pub fn canvas(&self) -> Dimensions {
        self.fit.dimensions()
    }
}

/// Decode an encoded image (JPEG, PNG, WebP) into a bitmap.
///
/// Decode failures are the caller's input problem, not a backend failure,
/// so they surface as [`image::ImageError`].
pub fn decode_bitmap(bytes: &[u8]) -> std::result::Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Fail before any drawing when text is wanted but cannot be drawn.
fn ensure_text_capable<B: RasterBackend>(backend: &B, options: &WatermarkOptions) -> Result<()> {
    if needs_text(options) && !backend.supports_text() {
        return Err(BackendError::Unavailable(
            "text overlay requested but no typeface is loaded".into(),
        ));
    }
    Ok(())
}

/// Compute canvas size, overlay layout and every placement.
///
/// Needs the backend only to measure text.
pub fn plan_watermark<B: RasterBackend>(
    backend: &B,
    photo: Dimensions,
    logo: Option<Dimensions>,
    options: &WatermarkOptions,
) -> Result<WatermarkPlan> {
    ensure_text_capable(backend, options)?;

    let fit = compute_fit_size(photo.width, photo.height, options.max_long_edge());
    debug!(
        source_width = photo.width,
        source_height = photo.height,
        width = fit.width,
        height = fit.height,
        scale = fit.scale,
        "fit size"
    );

    let canvas = fit.dimensions();
    let overlay = plan_overlay(backend, logo, options, canvas.shortest_edge())?;
    let placements = place_instances(canvas, overlay.dimensions, options);
    debug!(instances = placements.len(), tile = options.tile, "placements");

    Ok(WatermarkPlan {
        fit,
        overlay,
        placements,
    })
}

/// Composite the watermark onto `photo` and return the finished surface.
pub fn composite<B: RasterBackend>(
    backend: &B,
    photo: &RgbaImage,
    logo: Option<&RgbaImage>,
    options: &WatermarkOptions,
) -> Result<(B::Surface, WatermarkPlan)> {
    let plan = plan_watermark(
        backend,
        Dimensions::from(photo),
        logo.map(Dimensions::from),
        options,
    )?;
    let canvas_dims = plan.canvas();

    let mut canvas = backend.allocate(canvas_dims.width, canvas_dims.height)?;
    canvas.draw_bitmap(
        photo,
        &Placement::new(0.0, 0.0, canvas_dims.width as f64, canvas_dims.height as f64),
    );

    let overlay = render_overlay(backend, plan.overlay, logo, options)?;
    stamp(&mut canvas, &overlay.surface, &plan.placements);

    Ok((canvas, plan))
}

/// Burn a branding overlay into `photo` and encode the result.
///
/// The single entry point of the engine. Out-of-range options are clamped
/// and missing content degrades to an emptier overlay; the only failures
/// are an unusable backend and an encoder error.
pub fn apply_watermark<B: RasterBackend>(
    backend: &B,
    photo: &DynamicImage,
    logo: Option<&DynamicImage>,
    options: &WatermarkOptions,
) -> Result<EncodedImage> {
    let photo = photo.to_rgba8();
    let logo = logo.map(DynamicImage::to_rgba8);
    let (canvas, _) = composite(backend, &photo, logo.as_ref(), options)?;
    encode(&canvas, &encode_params(options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::params::{OutputFormat, OverlayMode};
    use crate::test_helpers::{
        listing_options, logo_bitmap, logo_image, options_with, photo_bitmap, photo_image,
    };

    #[test]
    fn listing_scenario_geometry() {
        let backend = MockBackend::new();
        let plan = plan_watermark(
            &backend,
            Dimensions::new(1920, 1080),
            Some(Dimensions::new(400, 200)),
            &listing_options(),
        )
        .unwrap();

        assert_eq!(plan.canvas(), Dimensions::new(1200, 675));
        assert_eq!(plan.fit.scale, 0.625);
        assert_eq!(plan.overlay.logo, Some((135.0, 67.5)));
        assert_eq!(plan.overlay.dimensions, Dimensions::new(135, 68));
        assert_eq!(plan.placements.len(), 1);

        let p = plan.placements[0];
        assert_eq!((p.x, p.y), (1041.0, 583.0));
        assert_eq!(p.opacity.value(), 0.6);
        assert_eq!(p.rotation_rad, 0.0);
    }

    #[test]
    fn composite_draws_photo_then_overlay() {
        let backend = MockBackend::new();
        let photo = photo_bitmap(1920, 1080);
        let logo = logo_bitmap(400, 200);
        let (canvas, plan) =
            composite(&backend, &photo, Some(&logo), &listing_options()).unwrap();

        assert_eq!(canvas.dims, Dimensions::new(1200, 675));
        assert_eq!(
            canvas.ops[0],
            RecordedOp::DrawBitmap {
                source: Dimensions::new(1920, 1080),
                placement: Placement::new(0.0, 0.0, 1200.0, 675.0),
            }
        );
        assert_eq!(canvas.surface_draws(), plan.placements);
        assert!(matches!(
            canvas.ops[1],
            RecordedOp::DrawSurface { source, .. } if source == Dimensions::new(135, 68)
        ));
    }

    #[test]
    fn photo_within_cap_is_not_resized() {
        let backend = MockBackend::new();
        let plan = plan_watermark(
            &backend,
            Dimensions::new(800, 600),
            None,
            &listing_options(),
        )
        .unwrap();
        assert_eq!(plan.canvas(), Dimensions::new(800, 600));
        assert_eq!(plan.fit.scale, 1.0);
    }

    #[test]
    fn scale_below_one_percent_matches_one_percent() {
        let backend = MockBackend::new();
        let plan = |scale_pct| {
            plan_watermark(
                &backend,
                Dimensions::new(1000, 800),
                Some(Dimensions::new(100, 100)),
                &options_with(|o| o.scale_pct = scale_pct),
            )
            .unwrap()
        };
        assert_eq!(plan(0.0), plan(1.0));
        assert_eq!(plan(0.0).overlay.dimensions, Dimensions::new(8, 8));
    }

    #[test]
    fn text_without_typeface_fails_before_drawing() {
        let backend = MockBackend::without_text();
        let options = options_with(|o| {
            o.mode = OverlayMode::Both;
            o.text = "Acme Realty".into();
        });
        let logo = logo_image(10, 10);
        let result = apply_watermark(&backend, &photo_image(100, 80), Some(&logo), &options);
        assert!(matches!(result, Err(BackendError::Unavailable(_))));
    }

    #[test]
    fn blank_text_needs_no_typeface() {
        let backend = MockBackend::without_text();
        let options = options_with(|o| {
            o.mode = OverlayMode::Text;
            o.text = "   ".into();
        });
        let encoded = apply_watermark(&backend, &photo_image(100, 80), None, &options).unwrap();
        assert_eq!((encoded.width, encoded.height), (100, 80));
    }

    #[test]
    fn apply_tags_requested_format() {
        let backend = MockBackend::new();
        let options = options_with(|o| o.output_format = OutputFormat::Webp);
        let encoded = apply_watermark(&backend, &photo_image(64, 48), None, &options).unwrap();
        assert_eq!(encoded.mime_type(), "image/webp");
        // photo draw + one overlay instance
        assert_eq!(encoded.bytes, b"64x48:2".to_vec());
    }

    #[test]
    fn apply_is_deterministic() {
        let backend = MockBackend::new();
        let options = options_with(|o| {
            o.tile = true;
            o.rotation_deg = 30.0;
        });
        let photo = photo_image(300, 200);
        let logo = logo_image(40, 20);
        let a = apply_watermark(&backend, &photo, Some(&logo), &options).unwrap();
        let b = apply_watermark(&backend, &photo, Some(&logo), &options).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decode_bitmap_rejects_garbage() {
        assert!(decode_bitmap(b"not an image").is_err());
    }
}
