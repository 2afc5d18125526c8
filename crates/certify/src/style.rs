//! Render style: color, size, and font selection

use crate::{Error, Result};
use pdf_stamp::{BuiltinFont, Color};

/// Which font draws the name.
///
/// Built-in and embedded fonts are mutually exclusive by construction;
/// `FontChoice::pick` applies the precedence rule when a caller supplies
/// both.
#[derive(Debug, Clone)]
pub enum FontChoice {
    /// One of the base-14 fonts; nothing gets embedded in the output
    Builtin(BuiltinFont),
    /// Raw TTF bytes, embedded into each rendered document
    Embedded(Vec<u8>),
}

impl FontChoice {
    /// Resolve a font selection from optional inputs.
    ///
    /// Embedded font data takes precedence over a built-in name when both
    /// are supplied. An unknown built-in name is a configuration error
    /// (batch-fatal, surfaced before any row is processed); malformed
    /// embedded data is deliberately not checked here, since that is a
    /// render error by contract.
    pub fn pick(builtin_name: Option<&str>, font_data: Option<Vec<u8>>) -> Result<Self> {
        if let Some(data) = font_data {
            return Ok(Self::Embedded(data));
        }
        let name = builtin_name.unwrap_or("Helvetica");
        BuiltinFont::from_name(name)
            .map(Self::Builtin)
            .ok_or_else(|| Error::Config(format!("unknown built-in font: {name}")))
    }
}

/// Style parameters for drawing a name
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub color: Color,
    pub font_size: f64,
    pub font: FontChoice,
}

impl Default for RenderStyle {
    /// Black 24pt Helvetica, the classic certificate fill-in
    fn default() -> Self {
        Self {
            color: Color::black(),
            font_size: 24.0,
            font: FontChoice::Builtin(BuiltinFont::Helvetica),
        }
    }
}

/// Parse a `#rrggbb` (or `rrggbb`) hex color; channels map as byte/255.
pub fn parse_hex_color(input: &str) -> Result<Color> {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::Config(format!("invalid hex color: {input}")));
    }
    let r = u8::from_str_radix(&hex[0..2], 16).expect("checked hex");
    let g = u8::from_str_radix(&hex[2..4], 16).expect("checked hex");
    let b = u8::from_str_radix(&hex[4..6], 16).expect("checked hex");
    Ok(Color::from_rgb(r, g, b))
}
