//! Watermark options.
//!
//! [`WatermarkOptions`] is the single configuration record the engine takes.
//! It can be built in code, deserialized directly from the JSON the web
//! application sends (camelCase keys), or loaded from a sparse options file
//! layered over the stock defaults.
//!
//! ## Options File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! mode = "logo"             # logo | text | both
//! position = "bottom_right" # {top,middle,bottom}_{left,center,right}
//! padding_px = 24           # Margin from the photo edge (single placement only)
//! opacity = 0.6             # 0.0 - 1.0
//! rotation_deg = 0.0        # Around each overlay's own center
//! scale_pct = 20.0          # Logo width as % of the photo's shortest edge (1 - 200)
//! text = ""                 # Multi-line; blank lines are dropped
//! text_size_px = 32.0       # 8 - 220
//! text_color = "#ffffff"    # #RGB or #RRGGBB
//! tile = false              # Repeat across the whole frame
//! tile_gap_pct = 25.0       # Gap between tiles as % of the shortest edge (1 - 200)
//! # max_long_edge_px = 2048 # Downscale cap; omit or 0 for no limit
//! output_format = "jpeg"    # jpeg | png | webp
//! jpeg_quality = 0.9        # 0.1 - 1.0, JPEG only
//! ```
//!
//! Files ending in `.json` are read as JSON, `.toml` (or no extension) as
//! TOML; other extensions are rejected. Keys may
//! be snake_case or camelCase. Unknown keys are rejected to catch typos.
//!
//! Numeric values are never rejected: the engine clamps them where it uses
//! them (see [`crate::imaging::params`]).

use crate::imaging::{
    Anchor, JpegQuality, Opacity, OutputFormat, OverlayMode, Percent, Rgb, TextSize,
    parse_hex_color,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported options file '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),
}

/// Everything that controls one watermark call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkOptions {
    /// Which content the overlay contains.
    pub mode: OverlayMode,
    /// Anchor for a single placement; ignored when tiling.
    pub position: Anchor,
    /// Margin from the photo edge for a single placement. Not clamped.
    #[serde(alias = "paddingPx")]
    pub padding_px: i32,
    pub opacity: f64,
    /// Rotation in degrees around each overlay instance's center. Not clamped.
    #[serde(alias = "rotationDeg")]
    pub rotation_deg: f64,
    /// Logo width as a percentage of the output's shortest edge.
    #[serde(alias = "scalePct")]
    pub scale_pct: f64,
    /// Multi-line overlay text.
    pub text: String,
    #[serde(alias = "textSizePx")]
    pub text_size_px: f64,
    /// `#RGB` or `#RRGGBB`.
    #[serde(alias = "textColor")]
    pub text_color: String,
    pub tile: bool,
    /// Gap between tiles as a percentage of the output's shortest edge.
    #[serde(alias = "tileGapPct")]
    pub tile_gap_pct: f64,
    /// Cap on the output's longer edge. `None` or `0` means no limit.
    #[serde(alias = "maxLongEdgePx")]
    pub max_long_edge_px: Option<u32>,
    #[serde(alias = "outputFormat")]
    pub output_format: OutputFormat,
    #[serde(alias = "jpegQuality")]
    pub jpeg_quality: f64,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            mode: OverlayMode::Logo,
            position: Anchor::BottomRight,
            padding_px: 24,
            opacity: 0.6,
            rotation_deg: 0.0,
            scale_pct: 20.0,
            text: String::new(),
            text_size_px: 32.0,
            text_color: "#ffffff".to_string(),
            tile: false,
            tile_gap_pct: 25.0,
            max_long_edge_px: None,
            output_format: OutputFormat::Jpeg,
            jpeg_quality: 0.9,
        }
    }
}

impl WatermarkOptions {
    pub fn opacity(&self) -> Opacity {
        Opacity::new(self.opacity)
    }

    pub fn scale(&self) -> Percent {
        Percent::new(self.scale_pct)
    }

    pub fn tile_gap(&self) -> Percent {
        Percent::new(self.tile_gap_pct)
    }

    pub fn text_size(&self) -> TextSize {
        TextSize::new(self.text_size_px)
    }

    pub fn jpeg_quality(&self) -> JpegQuality {
        JpegQuality::new(self.jpeg_quality)
    }

    pub fn max_long_edge(&self) -> Option<u32> {
        self.max_long_edge_px.filter(|&max| max > 0)
    }

    /// Parsed text color; malformed values fall back to white.
    pub fn text_color(&self) -> Rgb {
        parse_hex_color(&self.text_color).unwrap_or_else(|err| {
            warn!(%err, "falling back to white text");
            Rgb::WHITE
        })
    }
}

// =============================================================================
// Options loading and merging
// =============================================================================

/// Stock defaults as a JSON object, the base layer for sparse overrides.
pub fn stock_defaults_value() -> serde_json::Value {
    serde_json::to_value(WatermarkOptions::default()).unwrap_or_default()
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Objects are merged key-by-key (overlay keys override base keys).
/// - Non-object values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_values(base: serde_json::Value, overlay: serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => merge_values(base_val, overlay_val),
                    None => overlay_val,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// `scalePct` -> `scale_pct`, so camelCase overrides land on the stock keys.
fn snake_case_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn normalize_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, val)| (snake_case_key(&key), val))
                .collect(),
        ),
        other => other,
    }
}

/// Parse an options document by extension: `.json` is JSON, `.toml` or no
/// extension is TOML.
pub fn parse_options_document(
    path: &Path,
    content: &str,
) -> Result<serde_json::Value, ConfigError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let value = match extension.as_deref() {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") | None => toml::from_str(content)?,
        Some(_) => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
    };
    Ok(normalize_keys(value))
}

/// Merge an optional overlay onto a base value and deserialize.
pub fn resolve_options(
    base: serde_json::Value,
    overlay: Option<serde_json::Value>,
) -> Result<WatermarkOptions, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_values(base, ov),
        None => base,
    };
    Ok(serde_json::from_value(merged)?)
}

/// Load options from a file, layered over the stock defaults.
pub fn load_options(path: &Path) -> Result<WatermarkOptions, ConfigError> {
    let content = fs::read_to_string(path)?;
    let overlay = parse_options_document(path, &content)?;
    resolve_options(stock_defaults_value(), Some(overlay))
}

/// Returns a fully-commented stock options file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Listing Mark Watermark Options
# ==============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Out-of-range numbers are clamped,
# never rejected. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content
# ---------------------------------------------------------------------------
# What the overlay contains: "logo", "text", or "both" (logo, then text).
mode = "logo"

# Overlay text. Line breaks split lines; blank lines are dropped.
text = ""

# Font size in pixels (8 - 220). Line height is 1.25x this.
text_size_px = 32.0

# Text color, #RGB or #RRGGBB.
text_color = "#ffffff"

# Logo width as a percentage of the output's shortest edge (1 - 200).
scale_pct = 20.0

# ---------------------------------------------------------------------------
# Placement
# ---------------------------------------------------------------------------
# Anchor for a single overlay: top_left, top_center, top_right,
# middle_left, middle_center, middle_right, bottom_left, bottom_center,
# bottom_right. Ignored when tiling.
position = "bottom_right"

# Margin from the photo edge in pixels (single overlay only).
padding_px = 24

# Overlay opacity (0.0 - 1.0).
opacity = 0.6

# Rotation in degrees, around each overlay's own center.
rotation_deg = 0.0

# Repeat the overlay across the whole frame instead of one anchored copy.
tile = false

# Gap between tiles as a percentage of the shortest edge (1 - 200).
tile_gap_pct = 25.0

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
# Cap on the longer edge in pixels; photos are downscaled, never upscaled.
# Omit or set to 0 for no limit.
# max_long_edge_px = 2048

# "jpeg", "png", or "webp" (WebP output is lossless).
output_format = "jpeg"

# JPEG quality (0.1 - 1.0). Ignored for PNG and WebP.
jpeg_quality = 0.9
"##
}
