//! Bookmark icon theming: dominant color and legible overlay text color.
//!
//! DESIGN
//! ======
//! `get_contrasting_color` is pure arithmetic. Image work goes through
//! `decode_icon` and `quantize`, and `icon_theme` folds every failure into a
//! caller-supplied fallback so a broken icon never breaks a bookmark tile.

#[cfg(test)]
#[path = "color_test.rs"]
mod color_test;

use std::fmt;

use image::DynamicImage;

use crate::quantize;

/// Brightness above which dark text is used.
pub const CONTRAST_THRESHOLD: f64 = 128.0;

/// Failure to derive a color from an icon.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ColorError {
    /// The bytes are not a decodable image.
    #[error("icon decode failed: {0}")]
    Decode(String),

    /// The image has no opaque, non-white pixels to sample.
    #[error("image has no usable pixels")]
    EmptyImage,
}

/// An sRGB color, one byte per channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB` or `#RRGGBB`.
    #[must_use]
    pub fn from_hex(raw: &str) -> Option<Self> {
        let hex = raw.trim().strip_prefix('#')?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => Some(Self::new(
                hex_channel(&hex[0..1].repeat(2))?,
                hex_channel(&hex[1..2].repeat(2))?,
                hex_channel(&hex[2..3].repeat(2))?,
            )),
            6 => Some(Self::new(hex_channel(&hex[0..2])?, hex_channel(&hex[2..4])?, hex_channel(&hex[4..6])?)),
            _ => None,
        }
    }

    /// Canonical lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Weighted brightness `(299 R + 587 G + 114 B) / 1000`, in `0.0..=255.0`.
    #[must_use]
    pub fn brightness(self) -> f64 {
        (f64::from(self.r) * 299.0 + f64::from(self.g) * 587.0 + f64::from(self.b) * 114.0) / 1000.0
    }
}

fn hex_channel(digits: &str) -> Option<u8> {
    u8::from_str_radix(digits, 16).ok()
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Text color to lay over a background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContrastingColor {
    Black,
    White,
}

impl ContrastingColor {
    /// CSS keyword: `"black"` or `"white"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl fmt::Display for ContrastingColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Black text on bright backgrounds (brightness > 128), white otherwise.
#[must_use]
pub fn get_contrasting_color(color: impl Into<Rgb>) -> ContrastingColor {
    if color.into().brightness() > CONTRAST_THRESHOLD {
        ContrastingColor::Black
    } else {
        ContrastingColor::White
    }
}

/// Decode icon bytes (PNG, JPEG, GIF, ICO, WebP, BMP).
///
/// # Errors
///
/// Returns `ColorError::Decode` when the format is unknown or the data is corrupt.
pub fn decode_icon(bytes: &[u8]) -> Result<DynamicImage, ColorError> {
    image::load_from_memory(bytes).map_err(|e| ColorError::Decode(e.to_string()))
}

/// Dominant color of a decoded image.
///
/// # Errors
///
/// Returns `ColorError::EmptyImage` when every pixel is transparent or white.
pub fn extract_dominant_color(image: &DynamicImage) -> Result<Rgb, ColorError> {
    quantize::dominant_color(image, quantize::DEFAULT_QUALITY)
}

/// Tile colors derived from a bookmark icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IconTheme {
    pub background: Rgb,
    pub text: ContrastingColor,
}

impl IconTheme {
    #[must_use]
    pub fn from_background(background: Rgb) -> Self {
        Self { background, text: get_contrasting_color(background) }
    }
}

/// Theme a tile from raw icon bytes, using `fallback` as the background when
/// the icon cannot be decoded or has no usable pixels.
#[must_use]
pub fn icon_theme(bytes: &[u8], fallback: Rgb) -> IconTheme {
    let background = match decode_icon(bytes).and_then(|img| extract_dominant_color(&img)) {
        Ok(color) => color,
        Err(e) => {
            log::debug!("{e}; using fallback {}", fallback.to_hex());
            fallback
        }
    };
    IconTheme::from_background(background)
}
