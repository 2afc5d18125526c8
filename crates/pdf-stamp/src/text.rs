//! Text encoding and PDF text operator generation

use crate::document::Color;

/// Encoded text ready for a Tj operator
pub(crate) enum ShowText {
    /// WinAnsi-encoded literal string (built-in fonts)
    Literal(Vec<u8>),
    /// Glyph-ID hex string including the angle brackets (embedded fonts)
    Hex(String),
}

/// Map a character to its WinAnsi byte.
///
/// Characters WinAnsi cannot represent become `?`; callers that need full
/// Unicode must go through an embedded font instead.
pub(crate) fn winansi_byte(c: char) -> u8 {
    let code = c as u32;
    match c {
        _ if code < 0x80 => code as u8,
        '\u{20AC}' => 0x80, // euro
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85, // ellipsis
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91, // left single quote
        '\u{2019}' => 0x92, // right single quote
        '\u{201C}' => 0x93, // left double quote
        '\u{201D}' => 0x94, // right double quote
        '\u{2022}' => 0x95, // bullet
        '\u{2013}' => 0x96, // en dash
        '\u{2014}' => 0x97, // em dash
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99, // trademark
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        _ if (0xA0..=0xFF).contains(&code) => code as u8,
        _ => b'?',
    }
}

/// Encode a string as WinAnsi bytes.
pub(crate) fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars().map(winansi_byte).collect()
}

/// Escape WinAnsi bytes into PDF literal-string form (without parentheses).
pub(crate) fn escape_literal(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            b'\\' => out.push_str("\\\\"),
            0x20..=0x7E => out.push(b as char),
            _ => out.push_str(&format!("\\{b:03o}")),
        }
    }
    out
}

/// Generate PDF operators for a single line of text
///
/// Emits BT / rg / Tf / Td / Tj / ET with the given font resource name,
/// size, fill color, and baseline position (PDF coordinates, from bottom).
pub(crate) fn generate_text_operators(
    show: &ShowText,
    resource_name: &str,
    font_size: f64,
    color: Color,
    x: f64,
    y: f64,
) -> Vec<u8> {
    let mut ops = String::new();

    ops.push_str("BT\n");
    ops.push_str(&format!("{} {} {} rg\n", color.r, color.g, color.b));
    ops.push_str(&format!("/{resource_name} {font_size} Tf\n"));
    ops.push_str(&format!("{x} {y} Td\n"));
    match show {
        ShowText::Literal(bytes) => {
            ops.push_str(&format!("({}) Tj\n", escape_literal(bytes)));
        }
        ShowText::Hex(hex) => {
            ops.push_str(&format!("{hex} Tj\n"));
        }
    }
    ops.push_str("ET\n");

    ops.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winansi_ascii_passthrough() {
        assert_eq!(winansi_byte('A'), b'A');
        assert_eq!(winansi_byte(' '), b' ');
        assert_eq!(winansi_byte('~'), b'~');
    }

    #[test]
    fn test_winansi_latin1() {
        assert_eq!(winansi_byte('é'), 0xE9);
        assert_eq!(winansi_byte('Ü'), 0xDC);
    }

    #[test]
    fn test_winansi_specials() {
        assert_eq!(winansi_byte('\u{2019}'), 0x92);
        assert_eq!(winansi_byte('\u{2014}'), 0x97);
    }

    #[test]
    fn test_winansi_unmappable() {
        assert_eq!(winansi_byte('山'), b'?');
        assert_eq!(winansi_byte('Ω'), b'?');
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(escape_literal(b"Jane Doe"), "Jane Doe");
        assert_eq!(escape_literal(b"a(b)c"), "a\\(b\\)c");
        assert_eq!(escape_literal(b"back\\slash"), "back\\\\slash");
        assert_eq!(escape_literal(&[0xE9]), "\\351");
    }

    #[test]
    fn test_generate_text_operators_literal() {
        let show = ShowText::Literal(b"Jane Doe".to_vec());
        let ops = generate_text_operators(&show, "CF1", 24.0, Color::black(), 150.0, 400.0);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("BT"));
        assert!(ops_str.contains("0 0 0 rg"));
        assert!(ops_str.contains("/CF1 24 Tf"));
        assert!(ops_str.contains("150 400 Td"));
        assert!(ops_str.contains("(Jane Doe) Tj"));
        assert!(ops_str.contains("ET"));
    }

    #[test]
    fn test_generate_text_operators_hex() {
        let show = ShowText::Hex("<004A0061>".to_string());
        let ops = generate_text_operators(&show, "CF2", 18.0, Color::rgb(1.0, 0.0, 0.0), 10.0, 20.0);
        let ops_str = String::from_utf8(ops).unwrap();

        assert!(ops_str.contains("1 0 0 rg"));
        assert!(ops_str.contains("<004A0061> Tj"));
    }
}
