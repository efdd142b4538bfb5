//! The bold sans-serif typeface used for overlay text.
//!
//! Font sizes are CSS-style em sizes: a 32px font has an em square 32 pixels
//! tall, which `ab_glyph` expresses as a larger [`PxScale`] (its scale is the
//! ascent-to-descent height).

use super::params::TextSize;
use ab_glyph::{Font, FontArc, PxScale};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TypefaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid font data: {0}")]
    Invalid(#[from] ab_glyph::InvalidFont),
    #[error("no bold sans-serif font found in system font directories")]
    NotFound,
}

/// Well-known bold sans-serif fonts on Linux, macOS and Windows.
const SYSTEM_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation2/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

#[derive(Clone)]
pub struct Typeface {
    font: FontArc,
}

impl std::fmt::Debug for Typeface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typeface")
            .field("units_per_em", &self.font.units_per_em())
            .finish()
    }
}

impl Typeface {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TypefaceError> {
        let font = FontArc::try_from_vec(bytes)?;
        Ok(Self { font })
    }

    pub fn from_path(path: &Path) -> Result<Self, TypefaceError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(bytes)
    }

    /// First loadable font among the well-known system locations.
    pub fn discover() -> Result<Self, TypefaceError> {
        Self::discover_in(SYSTEM_CANDIDATES.iter().map(PathBuf::from))
    }

    fn discover_in(candidates: impl IntoIterator<Item = PathBuf>) -> Result<Self, TypefaceError> {
        for path in candidates {
            if !path.is_file() {
                continue;
            }
            match Self::from_path(&path) {
                Ok(typeface) => {
                    debug!(path = %path.display(), "using system font");
                    return Ok(typeface);
                }
                Err(err) => debug!(path = %path.display(), %err, "skipping unreadable font"),
            }
        }
        Err(TypefaceError::NotFound)
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// `ab_glyph` scale for an em size of `size` pixels.
    pub fn px_scale(&self, size: TextSize) -> PxScale {
        let em = size.px() as f32;
        match self.font.units_per_em() {
            Some(units) if units > 0.0 => PxScale::from(em * self.font.height_unscaled() / units),
            _ => PxScale::from(em),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn from_bytes_rejects_garbage() {
        let result = Typeface::from_bytes(b"definitely not a font".to_vec());
        assert!(matches!(result, Err(TypefaceError::Invalid(_))));
    }

    #[test]
    fn from_path_missing_file_is_io_error() {
        let result = Typeface::from_path(Path::new("/nonexistent/font.ttf"));
        assert!(matches!(result, Err(TypefaceError::Io(_))));
    }

    #[test]
    fn discover_skips_invalid_candidates() {
        let tmp = TempDir::new().unwrap();
        let bogus = tmp.path().join("Bogus-Bold.ttf");
        std::fs::write(&bogus, b"nope").unwrap();

        let result = Typeface::discover_in([tmp.path().join("missing.ttf"), bogus]);
        assert!(matches!(result, Err(TypefaceError::NotFound)));
    }

    #[test]
    fn system_font_scale_exceeds_em_size() {
        // Only meaningful where a system font exists.
        let Ok(typeface) = Typeface::discover() else {
            return;
        };
        let scale = typeface.px_scale(TextSize::new(32.0));
        assert!(scale.y >= 32.0);
    }
}
