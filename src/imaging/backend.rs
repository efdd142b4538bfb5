//! Raster backend traits and shared types.
//!
//! The [`RasterBackend`] trait allocates drawing surfaces and measures text;
//! each [`RasterSurface`] supports the handful of operations the watermark
//! pipeline needs: draw a bitmap, draw another surface, fill a line of text,
//! and encode itself. Every call carries its complete state (placement,
//! rotation, opacity, font size, color); there is no current-alpha or
//! current-font to get out of order.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), a software rasterizer
//! over the `image` crate.

use super::params::{EncodeParams, OutputFormat, Placement, TextRun, TextSize};
use image::RgbaImage;
use thiserror::Error;

/// The two ways a watermark call can fail.
///
/// Everything else (out-of-range numbers, blank text, a missing logo)
/// degrades to a reasonable image instead of erroring.
#[derive(Error, Debug)]
pub enum BackendError {
    /// No usable drawing context. Environment problem; retrying won't help.
    #[error("Raster backend unavailable: {0}")]
    Unavailable(String),
    /// Serializing the finished surface failed. The whole call may be retried.
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Pixel size of a bitmap, surface, or overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn shortest_edge(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn longest_edge(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl From<&RgbaImage> for Dimensions {
    fn from(image: &RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// An encoded output buffer tagged with its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// A drawing surface.
pub trait RasterSurface {
    fn dimensions(&self) -> Dimensions;

    /// Draw `bitmap` at `placement`, scaled, rotated, and alpha-blended.
    fn draw_bitmap(&mut self, bitmap: &RgbaImage, placement: &Placement);

    /// Draw another surface of the same backend at `placement`.
    fn draw_surface(&mut self, source: &Self, placement: &Placement);

    /// Fill one line of text at full opacity.
    fn fill_text(&mut self, run: &TextRun<'_>) -> Result<(), BackendError>;

    /// Serialize the surface. Performs no pixel manipulation beyond what the
    /// format requires (JPEG has no alpha channel).
    fn encode(&self, params: &EncodeParams) -> Result<EncodedImage, BackendError>;
}

/// Factory for surfaces plus the text metrics the layout needs.
pub trait RasterBackend: Sync {
    type Surface: RasterSurface;

    /// Allocate a transparent surface.
    fn allocate(&self, width: u32, height: u32) -> Result<Self::Surface, BackendError>;

    /// Whether [`measure_text`](Self::measure_text) and
    /// [`RasterSurface::fill_text`] can work.
    fn supports_text(&self) -> bool;

    /// Advance width of one line at `size`, in pixels.
    fn measure_text(&self, text: &str, size: TextSize) -> Result<f64, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{JpegQuality, Opacity, Rgb};

    /// Mock backend whose surfaces record operations without touching pixels.
    ///
    /// Text is measured as `chars × size × 0.5`.
    pub struct MockBackend {
        pub text_capable: bool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        DrawBitmap {
            source: Dimensions,
            placement: Placement,
        },
        DrawSurface {
            source: Dimensions,
            placement: Placement,
        },
        FillText {
            text: String,
            x: f64,
            y: f64,
            size: f64,
            color: Rgb,
        },
    }

    #[derive(Debug)]
    pub struct MockSurface {
        pub dims: Dimensions,
        pub ops: Vec<RecordedOp>,
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self { text_capable: true }
        }

        pub fn without_text() -> Self {
            Self {
                text_capable: false,
            }
        }
    }

    impl MockSurface {
        pub fn surface_draws(&self) -> Vec<Placement> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    RecordedOp::DrawSurface { placement, .. } => Some(*placement),
                    _ => None,
                })
                .collect()
        }

        pub fn texts(&self) -> Vec<(String, f64, f64)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    RecordedOp::FillText { text, x, y, .. } => Some((text.clone(), *x, *y)),
                    _ => None,
                })
                .collect()
        }
    }

    impl RasterBackend for MockBackend {
        type Surface = MockSurface;

        fn allocate(&self, width: u32, height: u32) -> Result<MockSurface, BackendError> {
            Ok(MockSurface {
                dims: Dimensions::new(width, height),
                ops: Vec::new(),
            })
        }

        fn supports_text(&self) -> bool {
            self.text_capable
        }

        fn measure_text(&self, text: &str, size: TextSize) -> Result<f64, BackendError> {
            if !self.text_capable {
                return Err(BackendError::Unavailable("no typeface".into()));
            }
            Ok(text.chars().count() as f64 * size.px() * 0.5)
        }
    }

    impl RasterSurface for MockSurface {
        fn dimensions(&self) -> Dimensions {
            self.dims
        }

        fn draw_bitmap(&mut self, bitmap: &RgbaImage, placement: &Placement) {
            self.ops.push(RecordedOp::DrawBitmap {
                source: Dimensions::from(bitmap),
                placement: *placement,
            });
        }

        fn draw_surface(&mut self, source: &Self, placement: &Placement) {
            self.ops.push(RecordedOp::DrawSurface {
                source: source.dims,
                placement: *placement,
            });
        }

        fn fill_text(&mut self, run: &TextRun<'_>) -> Result<(), BackendError> {
            self.ops.push(RecordedOp::FillText {
                text: run.text.to_string(),
                x: run.x,
                y: run.y,
                size: run.size.px(),
                color: run.color,
            });
            Ok(())
        }

        fn encode(&self, params: &EncodeParams) -> Result<EncodedImage, BackendError> {
            Ok(EncodedImage {
                bytes: format!("{}x{}:{}", self.dims.width, self.dims.height, self.ops.len())
                    .into_bytes(),
                format: params.format,
                width: self.dims.width,
                height: self.dims.height,
            })
        }
    }

    #[test]
    fn mock_records_draws() {
        let backend = MockBackend::new();
        let mut surface = backend.allocate(200, 100).unwrap();
        let bitmap = RgbaImage::new(20, 10);

        surface.draw_bitmap(&bitmap, &Placement::new(5.0, 6.0, 40.0, 20.0));
        let other = backend.allocate(3, 3).unwrap();
        surface.draw_surface(
            &other,
            &Placement::new(1.0, 2.0, 3.0, 3.0).with_opacity(Opacity::new(0.5)),
        );

        assert_eq!(surface.ops.len(), 2);
        assert!(matches!(
            &surface.ops[0],
            RecordedOp::DrawBitmap { source, .. } if *source == Dimensions::new(20, 10)
        ));
        assert_eq!(surface.surface_draws()[0].opacity.value(), 0.5);
    }

    #[test]
    fn mock_measures_text_by_char_count() {
        let backend = MockBackend::new();
        assert_eq!(backend.measure_text("abcd", TextSize::new(20.0)).unwrap(), 40.0);
        assert!(
            MockBackend::without_text()
                .measure_text("abcd", TextSize::new(20.0))
                .is_err()
        );
    }

    #[test]
    fn mock_encode_tags_format() {
        let surface = MockBackend::new().allocate(4, 3).unwrap();
        let encoded = surface
            .encode(&EncodeParams {
                format: OutputFormat::Png,
                quality: JpegQuality::default(),
            })
            .unwrap();
        assert_eq!(encoded.mime_type(), "image/png");
        assert_eq!((encoded.width, encoded.height), (4, 3));
    }

    #[test]
    fn dimensions_edges() {
        let d = Dimensions::new(1200, 675);
        assert_eq!(d.shortest_edge(), 675);
        assert_eq!(d.longest_edge(), 1200);
    }

    #[test]
    fn error_display() {
        let err = BackendError::Unavailable("no 2d context".into());
        assert_eq!(err.to_string(), "Raster backend unavailable: no 2d context");
        let err = BackendError::Encode("buffer rejected".into());
        assert_eq!(err.to_string(), "Encode failed: buffer rejected");
    }
}
