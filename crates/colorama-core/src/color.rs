//! RGBA colors as stored in the raster surface.

use serde::{Deserialize, Serialize};

/// An 8-bit straight-alpha RGBA color.
///
/// Serialized as a hex string (`#rrggbb` or `#rrggbbaa`) so that saved
/// settings stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build a color from the first four bytes of an RGBA slice.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (the leading `#` is optional).
    pub fn parse_hex(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();

        match hex.len() {
            3 => {
                let r = channel(0..1)?;
                let g = channel(1..2)?;
                let b = channel(2..3)?;
                Some(Self::rgb(r * 17, g * 17, b * 17))
            }
            6 => Some(Self::rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Some(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => None,
        }
    }

    /// Parse a hex color, degrading to opaque black when the input is malformed.
    pub fn parse_or_default(input: &str) -> Self {
        Self::parse_hex(input).unwrap_or_else(|| {
            log::warn!("Unparseable color {:?}, falling back to black", input);
            Self::BLACK
        })
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl From<Rgba> for String {
    fn from(color: Rgba) -> Self {
        color.to_hex()
    }
}

impl From<String> for Rgba {
    fn from(value: String) -> Self {
        Rgba::parse_or_default(&value)
    }
}

impl From<tiny_skia::ColorU8> for Rgba {
    fn from(color: tiny_skia::ColorU8) -> Self {
        Self::new(color.red(), color.green(), color.blue(), color.alpha())
    }
}

impl From<Rgba> for tiny_skia::ColorU8 {
    fn from(color: Rgba) -> Self {
        tiny_skia::ColorU8::from_rgba(color.r, color.g, color.b, color.a)
    }
}

impl From<Rgba> for tiny_skia::Color {
    fn from(color: Rgba) -> Self {
        tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl From<tiny_skia::PremultipliedColorU8> for Rgba {
    fn from(color: tiny_skia::PremultipliedColorU8) -> Self {
        if color.alpha() == 0 {
            return Rgba::TRANSPARENT;
        }
        color.demultiply().into()
    }
}

impl From<Rgba> for tiny_skia::PremultipliedColorU8 {
    fn from(color: Rgba) -> Self {
        tiny_skia::ColorU8::from(color).premultiply()
    }
}
