//! Page text scanning
//!
//! Decodes page content streams and replays the PDF text state machine
//! (Tf/Td/TD/Tm/T*/TL and the show operators Tj/TJ/'/") to produce text
//! spans with bounding rectangles. One span corresponds to one show
//! operation, in content-stream order, which makes results deterministic
//! for identical input bytes.
//!
//! Widths for the bounding boxes are resolved in order of preference:
//! the font's /Widths array, built-in base-14 metrics matched by
//! /BaseFont, then a 0.5 em per character approximation.

use crate::document::{media_box, object_to_f64};
use crate::fonts::BuiltinFont;
use crate::{Rect, Result};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use std::collections::HashMap;

/// A decoded run of text on a page
#[derive(Debug, Clone)]
pub struct TextSpan {
    /// Page number (1-indexed)
    pub page: u32,
    /// Index of the show operation in the page's decoded content
    pub(crate) op_index: usize,
    /// Decoded text
    pub text: String,
    /// Bounding rectangle in top-origin page coordinates
    pub rect: Rect,
    /// Font size in points (text-space)
    pub font_size: f64,
}

/// How to measure text for a given page font
enum WidthSource {
    /// /Widths array indexed from /FirstChar, per character code
    Explicit {
        first_char: i64,
        widths: Vec<f64>,
        default: f64,
    },
    /// Base-14 font matched by /BaseFont
    Builtin(BuiltinFont),
    /// Nothing usable; 0.5 em per character
    Approximate,
}

struct FontInfo {
    encoding: String,
    widths: WidthSource,
    /// Ascent as a fraction of the em
    ascent: f64,
    /// Descent as a fraction of the em (negative)
    descent: f64,
}

impl FontInfo {
    fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let encoding = dict.get_font_encoding().to_string();

        let base_font = dict
            .get(b"BaseFont")
            .ok()
            .and_then(|obj| match obj {
                Object::Name(name) => Some(String::from_utf8_lossy(name).to_string()),
                _ => None,
            })
            .map(strip_subset_prefix);
        let builtin = base_font.as_deref().and_then(BuiltinFont::from_name);

        let widths = explicit_widths(doc, dict)
            .or_else(|| builtin.map(WidthSource::Builtin))
            .unwrap_or(WidthSource::Approximate);

        let (ascent, descent) = match builtin {
            Some(f) => (f.ascent() as f64 / 1000.0, f.descent() as f64 / 1000.0),
            None => (0.8, -0.2),
        };

        Self {
            encoding,
            widths,
            ascent,
            descent,
        }
    }

    /// Width in points of a show operation's bytes at the given size
    fn measure(&self, bytes: &[u8], decoded: &str, font_size: f64) -> f64 {
        match &self.widths {
            WidthSource::Explicit {
                first_char,
                widths,
                default,
            } => {
                let units: f64 = bytes
                    .iter()
                    .map(|&b| {
                        let idx = b as i64 - first_char;
                        if idx >= 0 && (idx as usize) < widths.len() {
                            widths[idx as usize]
                        } else {
                            *default
                        }
                    })
                    .sum();
                units / 1000.0 * font_size
            }
            WidthSource::Builtin(font) => font.text_width(decoded, font_size),
            WidthSource::Approximate => 0.5 * font_size * decoded.chars().count() as f64,
        }
    }
}

/// Drop the "ABCDEF+" subset tag from a BaseFont name
fn strip_subset_prefix(name: String) -> String {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest.to_string()
        }
        _ => name,
    }
}

fn explicit_widths(doc: &Document, dict: &Dictionary) -> Option<WidthSource> {
    let widths_obj = dict.get(b"Widths").ok()?;
    let arr = match widths_obj {
        Object::Array(arr) => arr.clone(),
        Object::Reference(ref_id) => doc.get_object(*ref_id).ok()?.as_array().ok()?.clone(),
        _ => return None,
    };
    let first_char = dict
        .get(b"FirstChar")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0);
    let widths: Vec<f64> = arr
        .iter()
        .map(|o| object_to_f64(o).unwrap_or(500.0))
        .collect();
    Some(WidthSource::Explicit {
        first_char,
        widths,
        default: 500.0,
    })
}

/// 2D affine matrix [a b c d e f]
type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m1: &Matrix, m2: &Matrix) -> Matrix {
    [
        m1[0] * m2[0] + m1[1] * m2[2],
        m1[0] * m2[1] + m1[1] * m2[3],
        m1[2] * m2[0] + m1[3] * m2[2],
        m1[2] * m2[1] + m1[3] * m2[3],
        m1[4] * m2[0] + m1[5] * m2[2] + m2[4],
        m1[4] * m2[1] + m1[5] * m2[3] + m2[5],
    ]
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

/// Scan every page of a document into text spans
pub fn scan_document(doc: &Document) -> Result<Vec<TextSpan>> {
    let mut spans = Vec::new();
    let pages = doc.get_pages();

    for (&page_no, &page_id) in &pages {
        let mbox = media_box(doc, page_id)?;
        let page_height = mbox[3] - mbox[1];

        let fonts: HashMap<Vec<u8>, FontInfo> = doc
            .get_page_fonts(page_id)
            .into_iter()
            .map(|(name, dict)| (name, FontInfo::from_dict(doc, dict)))
            .collect();

        let content_bytes = match doc.get_page_content(page_id) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        let content = match Content::decode(&content_bytes) {
            Ok(content) => content,
            Err(_) => continue,
        };

        scan_page(page_no, page_height, &fonts, &content, &mut spans);
    }

    Ok(spans)
}

fn scan_page(
    page_no: u32,
    page_height: f64,
    fonts: &HashMap<Vec<u8>, FontInfo>,
    content: &Content,
    spans: &mut Vec<TextSpan>,
) {
    let mut text_matrix = IDENTITY;
    let mut line_matrix = IDENTITY;
    let mut leading = 0.0f64;
    let mut font_size = 0.0f64;
    let mut current_font: Option<&FontInfo> = None;

    for (op_index, op) in content.operations.iter().enumerate() {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                text_matrix = IDENTITY;
                line_matrix = IDENTITY;
            }
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (operands.first(), operands.get(1).and_then(object_to_f64))
                {
                    current_font = fonts.get(name.as_slice());
                    font_size = size;
                }
            }
            "TL" => {
                if let Some(l) = operands.first().and_then(object_to_f64) {
                    leading = l;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(object_to_f64),
                    operands.get(1).and_then(object_to_f64),
                ) {
                    line_matrix = multiply(&translation(tx, ty), &line_matrix);
                    text_matrix = line_matrix;
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (
                    operands.first().and_then(object_to_f64),
                    operands.get(1).and_then(object_to_f64),
                ) {
                    leading = -ty;
                    line_matrix = multiply(&translation(tx, ty), &line_matrix);
                    text_matrix = line_matrix;
                }
            }
            "Tm" => {
                if operands.len() >= 6 {
                    let values: Vec<f64> =
                        operands.iter().take(6).filter_map(object_to_f64).collect();
                    if values.len() == 6 {
                        line_matrix = [
                            values[0], values[1], values[2], values[3], values[4], values[5],
                        ];
                        text_matrix = line_matrix;
                    }
                }
            }
            "T*" => {
                line_matrix = multiply(&translation(0.0, -leading), &line_matrix);
                text_matrix = line_matrix;
            }
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_op(
                        page_no,
                        page_height,
                        op_index,
                        current_font,
                        font_size,
                        &mut text_matrix,
                        &[ShowPart::Text(bytes.clone())],
                        spans,
                    );
                }
            }
            "'" => {
                line_matrix = multiply(&translation(0.0, -leading), &line_matrix);
                text_matrix = line_matrix;
                if let Some(Object::String(bytes, _)) = operands.first() {
                    show_op(
                        page_no,
                        page_height,
                        op_index,
                        current_font,
                        font_size,
                        &mut text_matrix,
                        &[ShowPart::Text(bytes.clone())],
                        spans,
                    );
                }
            }
            "\"" => {
                line_matrix = multiply(&translation(0.0, -leading), &line_matrix);
                text_matrix = line_matrix;
                if let Some(Object::String(bytes, _)) = operands.get(2) {
                    show_op(
                        page_no,
                        page_height,
                        op_index,
                        current_font,
                        font_size,
                        &mut text_matrix,
                        &[ShowPart::Text(bytes.clone())],
                        spans,
                    );
                }
            }
            "TJ" => {
                if let Some(Object::Array(arr)) = operands.first() {
                    let parts: Vec<ShowPart> = arr
                        .iter()
                        .filter_map(|obj| match obj {
                            Object::String(bytes, _) => Some(ShowPart::Text(bytes.clone())),
                            other => object_to_f64(other).map(ShowPart::Adjust),
                        })
                        .collect();
                    show_op(
                        page_no,
                        page_height,
                        op_index,
                        current_font,
                        font_size,
                        &mut text_matrix,
                        &parts,
                        spans,
                    );
                }
            }
            _ => {}
        }
    }
}

enum ShowPart {
    Text(Vec<u8>),
    /// TJ position adjustment in thousandths of an em (positive moves left)
    Adjust(f64),
}

/// Record one show operation as a span and advance the text matrix
#[allow(clippy::too_many_arguments)]
fn show_op(
    page_no: u32,
    page_height: f64,
    op_index: usize,
    font: Option<&FontInfo>,
    font_size: f64,
    text_matrix: &mut Matrix,
    parts: &[ShowPart],
    spans: &mut Vec<TextSpan>,
) {
    // Horizontal scale; assumes the common unrotated case.
    let scale = text_matrix[0];
    let start_x = text_matrix[4];
    let baseline_y = text_matrix[5];

    let mut text = String::new();
    let mut advance = 0.0f64;

    for part in parts {
        match part {
            ShowPart::Text(bytes) => {
                let decoded = match font {
                    Some(info) => Document::decode_text(Some(info.encoding.as_str()), bytes),
                    None => Document::decode_text(None, bytes),
                };
                let width = match font {
                    Some(info) => info.measure(bytes, &decoded, font_size),
                    None => 0.5 * font_size * decoded.chars().count() as f64,
                };
                text.push_str(&decoded);
                advance += width;
            }
            ShowPart::Adjust(amount) => {
                advance -= amount / 1000.0 * font_size;
            }
        }
    }

    let user_advance = advance * scale;
    let effective_size = font_size * scale;
    let (ascent, descent) = match font {
        Some(info) => (info.ascent, info.descent),
        None => (0.8, -0.2),
    };

    if !text.is_empty() {
        spans.push(TextSpan {
            page: page_no,
            op_index,
            text,
            rect: Rect {
                x0: start_x,
                y0: page_height - (baseline_y + ascent * effective_size),
                x1: start_x + user_advance,
                y1: page_height - (baseline_y + descent * effective_size),
            },
            font_size,
        });
    }

    *text_matrix = multiply(&translation(advance, 0.0), text_matrix);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_subset_prefix() {
        assert_eq!(strip_subset_prefix("ABCDEF+Helvetica".into()), "Helvetica");
        assert_eq!(strip_subset_prefix("Helvetica".into()), "Helvetica");
        // Tag must be exactly six uppercase letters
        assert_eq!(strip_subset_prefix("Ab+Font".into()), "Ab+Font");
    }

    #[test]
    fn test_matrix_translation() {
        let m = multiply(&translation(10.0, 5.0), &IDENTITY);
        assert_eq!(m[4], 10.0);
        assert_eq!(m[5], 5.0);

        let m2 = multiply(&translation(3.0, 4.0), &m);
        assert_eq!(m2[4], 13.0);
        assert_eq!(m2[5], 9.0);
    }

    #[test]
    fn test_matrix_scaled_translation() {
        // 2x scale, then a translation expressed in text space
        let scaled: Matrix = [2.0, 0.0, 0.0, 2.0, 100.0, 50.0];
        let m = multiply(&translation(10.0, 0.0), &scaled);
        assert_eq!(m[4], 120.0);
        assert_eq!(m[5], 50.0);
    }
}
