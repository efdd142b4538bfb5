//! Parameter types for watermark operations.
//!
//! These types describe *what* to draw, not *how*. They are the interface
//! between the pipeline stages ([`overlay`](super::overlay),
//! [`compositor`](super::compositor), [`encoder`](super::encoder)) and the
//! [`backend`](super::backend) that does the pixel work. Every drawing call
//! receives its full state through these records; backends keep no
//! "current alpha" or "current font" between calls.
//!
//! ## Types
//!
//! - [`Opacity`] — overlay alpha, clamped to 0.0–1.0 on construction.
//! - [`Percent`] — logo scale / tile gap as a percentage of the shortest edge, clamped to 1–200.
//! - [`TextSize`] — font size in pixels, clamped to 8–220; derives line height and logo/text gap.
//! - [`JpegQuality`] — lossy quality, clamped to 0.1–1.0.
//! - [`Anchor`] — the nine named placement anchors.
//! - [`OverlayMode`] — logo, text, or both.
//! - [`OutputFormat`] — JPEG, PNG or WebP, with MIME type and file extension.
//! - [`Rgb`] — text color parsed from `#RGB` / `#RRGGBB`.
//! - [`Placement`] — destination rectangle, rotation and opacity of one draw.
//! - [`TextRun`] — one line of text to fill.
//! - [`EncodeParams`] — output format plus quality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A named parameter value that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct ParseParamError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

/// Clamp into `[min, max]`, mapping NaN to `min`.
fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.clamp(min, max)
    }
}

/// Overlay opacity (0.0–1.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Opacity(f64);

impl Opacity {
    pub const OPAQUE: Opacity = Opacity(1.0);

    pub fn new(value: f64) -> Self {
        Self(clamp_finite(value, 0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// A size expressed as a percentage of an image's shortest edge (1–200).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(f64);

impl Percent {
    pub fn new(value: f64) -> Self {
        Self(clamp_finite(value, 1.0, 200.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// This percentage of `edge` pixels.
    pub fn of(self, edge: u32) -> f64 {
        self.0 / 100.0 * edge as f64
    }
}

/// Font size in pixels (8–220).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TextSize(f64);

impl TextSize {
    pub fn new(px: f64) -> Self {
        Self(clamp_finite(px, 8.0, 220.0))
    }

    pub fn px(self) -> f64 {
        self.0
    }

    /// Distance between consecutive baselines.
    pub fn line_height(self) -> f64 {
        (self.0 * 1.25).round()
    }

    /// Horizontal space between the logo and the text block.
    pub fn logo_gap(self) -> f64 {
        (self.0 * 0.6).round()
    }
}

/// Lossy encoding quality (0.1–1.0), used only for JPEG output.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct JpegQuality(f64);

impl JpegQuality {
    pub fn new(value: f64) -> Self {
        Self(clamp_finite(value, 0.1, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Quality on the encoder's 1–100 scale.
    pub fn encoder_value(self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for JpegQuality {
    fn default() -> Self {
        Self(0.9)
    }
}

/// Horizontal component of an [`Anchor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Horizontal {
    Left,
    Center,
    Right,
}

/// Vertical component of an [`Anchor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vertical {
    Top,
    Middle,
    Bottom,
}

/// One of the nine named positions for a single overlay.
///
/// Names are vertical-then-horizontal: `bottom_right`, `middle_center`, ...
/// Parsing also accepts `kebab-case`, `camelCase` and the bare `center`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl Anchor {
    pub const ALL: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::MiddleCenter,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Anchor::TopLeft => "top_left",
            Anchor::TopCenter => "top_center",
            Anchor::TopRight => "top_right",
            Anchor::MiddleLeft => "middle_left",
            Anchor::MiddleCenter => "middle_center",
            Anchor::MiddleRight => "middle_right",
            Anchor::BottomLeft => "bottom_left",
            Anchor::BottomCenter => "bottom_center",
            Anchor::BottomRight => "bottom_right",
        }
    }

    pub fn horizontal(self) -> Horizontal {
        match self {
            Anchor::TopLeft | Anchor::MiddleLeft | Anchor::BottomLeft => Horizontal::Left,
            Anchor::TopCenter | Anchor::MiddleCenter | Anchor::BottomCenter => Horizontal::Center,
            Anchor::TopRight | Anchor::MiddleRight | Anchor::BottomRight => Horizontal::Right,
        }
    }

    pub fn vertical(self) -> Vertical {
        match self {
            Anchor::TopLeft | Anchor::TopCenter | Anchor::TopRight => Vertical::Top,
            Anchor::MiddleLeft | Anchor::MiddleCenter | Anchor::MiddleRight => Vertical::Middle,
            Anchor::BottomLeft | Anchor::BottomCenter | Anchor::BottomRight => Vertical::Bottom,
        }
    }
}

/// Lowercase snake_case form of `topLeft`, `top-left`, `Top Left`, ...
fn normalize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 4);
    let mut prev_lower = false;
    for c in raw.trim().chars() {
        if c.is_ascii_uppercase() && prev_lower {
            out.push('_');
        }
        match c {
            '-' | ' ' => out.push('_'),
            c => out.push(c.to_ascii_lowercase()),
        }
        prev_lower = c.is_ascii_lowercase();
    }
    out
}

impl FromStr for Anchor {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = normalize_name(s);
        if name == "center" {
            return Ok(Anchor::MiddleCenter);
        }
        Anchor::ALL
            .into_iter()
            .find(|a| a.as_str() == name)
            .ok_or_else(|| ParseParamError {
                kind: "position",
                value: s.to_string(),
                expected: "top_left, top_center, top_right, middle_left, middle_center, \
                           middle_right, bottom_left, bottom_center, bottom_right",
            })
    }
}

impl TryFrom<String> for Anchor {
    type Error = ParseParamError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.as_str().to_string()
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the overlay contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayMode {
    #[default]
    Logo,
    Text,
    Both,
}

impl OverlayMode {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayMode::Logo => "logo",
            OverlayMode::Text => "text",
            OverlayMode::Both => "both",
        }
    }

    pub fn includes_logo(self) -> bool {
        matches!(self, OverlayMode::Logo | OverlayMode::Both)
    }

    pub fn includes_text(self) -> bool {
        matches!(self, OverlayMode::Text | OverlayMode::Both)
    }
}

impl FromStr for OverlayMode {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logo" => Ok(OverlayMode::Logo),
            "text" => Ok(OverlayMode::Text),
            "both" => Ok(OverlayMode::Both),
            _ => Err(ParseParamError {
                kind: "mode",
                value: s.to_string(),
                expected: "logo, text, both",
            }),
        }
    }
}

impl fmt::Display for OverlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Webp => "webp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ParseParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.strip_prefix("image/").unwrap_or(&lower) {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::Webp),
            _ => Err(ParseParamError {
                kind: "output format",
                value: s.to_string(),
                expected: "jpeg, png, webp",
            }),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Webp => "WebP",
        })
    }
}

/// An opaque RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Parse `#RGB` or `#RRGGBB` (the `#` is optional).
///
/// ```
/// # use listing_mark::imaging::{parse_hex_color, Rgb};
/// assert_eq!(parse_hex_color("#fff"), Ok(Rgb::WHITE));
/// assert_eq!(parse_hex_color("1a2b3c"), Ok(Rgb::new(0x1a, 0x2b, 0x3c)));
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Rgb, ParseParamError> {
    let invalid = || ParseParamError {
        kind: "color",
        value: hex.to_string(),
        expected: "#RGB, #RRGGBB",
    };
    let digits = hex.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match digits.len() {
        // Each short digit doubles: f -> ff
        3 => Ok(Rgb::new(
            channel(&digits[0..1])? * 17,
            channel(&digits[1..2])? * 17,
            channel(&digits[2..3])? * 17,
        )),
        6 => Ok(Rgb::new(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        _ => Err(invalid()),
    }
}

/// Where and how to draw one bitmap or surface.
///
/// The source is scaled to `width`×`height`, its top-left corner sits at
/// `(x, y)`, and it is rotated by `rotation_rad` about its own center
/// (positive angles turn clockwise, y pointing down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_rad: f64,
    pub opacity: Opacity,
}

impl Placement {
    /// Unrotated, fully opaque placement.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation_rad: 0.0,
            opacity: Opacity::OPAQUE,
        }
    }

    pub fn rotated(self, rotation_rad: f64) -> Self {
        Self {
            rotation_rad,
            ..self
        }
    }

    pub fn with_opacity(self, opacity: Opacity) -> Self {
        Self { opacity, ..self }
    }

    /// Pivot of the rotation; rotation never moves it.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// One line of text, filled left-aligned with its top edge at `y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    pub x: f64,
    pub y: f64,
    pub size: TextSize,
    pub color: Rgb,
}

/// Parameters for serializing a finished surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    /// Only consulted for [`OutputFormat::Jpeg`].
    pub quality: JpegQuality,
}
