// crates/beatcut-core/src/helpers/color.rs
//
// 8-bit RGB color shared by the model, the preview raster code and the
// export compiler. One type, three wire forms:
//
//   `#RRGGBB`      — project file / UI form (serde round-trips this)
//   `0xRRGGBB`     — FFmpeg filter args (drawbox, color=c=…)
//   `&HAABBGGRR&`  — ASS style/override fields (alpha first, BGR order)

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

pub const WHITE: Color = Color { r: 0xFF, g: 0xFF, b: 0xFF };
pub const BLACK: Color = Color { r: 0x00, g: 0x00, b: 0x00 };

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (leading `#` optional). Returns `None` on any
    /// malformed input rather than guessing.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let n = u32::from_str_radix(hex, 16).ok()?;
        Some(Self {
            r: (n >> 16) as u8,
            g: (n >> 8) as u8,
            b: n as u8,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// FFmpeg color argument form, e.g. `0x1A2B3C`.
    pub fn to_ffmpeg(self) -> String {
        format!("0x{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// ASS `&HAABBGGRR&` form. `alpha` is ASS transparency: 0 = opaque,
    /// 255 = invisible.
    pub fn to_ass(self, alpha: u8) -> String {
        format!("&H{:02X}{:02X}{:02X}{:02X}&", alpha, self.b, self.g, self.r)
    }

    /// Inline ASS override payload (no alpha), e.g. `&H3C2B1A&` for use in
    /// `{\c…}` karaoke color switches.
    pub fn to_ass_rgb(self) -> String {
        format!("&H{:02X}{:02X}{:02X}&", self.b, self.g, self.r)
    }
}

impl Default for Color {
    fn default() -> Self {
        WHITE
    }
}

// Serialized as the `#RRGGBB` string the project file uses.
impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let s = String::deserialize(de)?;
        Color::from_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid color {s:?}")))
    }
}
