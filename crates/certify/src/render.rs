//! Certificate rendering
//!
//! One parameterized renderer: open a working copy of the template, erase
//! the placeholder if one was found, and draw the recipient's name centered
//! in the placement rectangle.

use crate::style::{FontChoice, RenderStyle};
use crate::{Error, Placement, Result, Template};
use pdf_stamp::{EmbeddedFont, WorkingDoc};

/// Render one certificate to PDF bytes.
///
/// The template is never mutated; the working copy lives only for this
/// call. Fails with [`Error::Render`] on malformed template bytes, an
/// invalid rectangle, or unreadable embedded font data (no silent fallback
/// to a built-in font).
///
/// Names wider than the rectangle are drawn anyway and may overflow
/// visually; shrinking or truncating would alter the certificate content.
pub fn render(
    name: &str,
    template: &Template,
    placement: &Placement,
    style: &RenderStyle,
) -> Result<Vec<u8>> {
    let rect = placement.rect;
    if !rect.is_valid() {
        return Err(Error::Render(format!(
            "invalid rectangle: {:?} (needs positive width and height)",
            rect
        )));
    }

    let mut doc =
        WorkingDoc::from_bytes(template.bytes()).map_err(|e| Error::Render(e.to_string()))?;

    // A discovered placeholder is erased, not covered: downstream text
    // extraction must not see it. A manual rectangle has nothing to erase.
    if placement.found {
        doc.redact_rect(placement.page, &rect)
            .map_err(|e| Error::Render(e.to_string()))?;
    }

    let size = style.font_size;
    let x = |text_width: f64| rect.x0 + (rect.width() - text_width) / 2.0;
    // Baseline-relative vertical centering; close enough for typical
    // font metrics, not exact ascent/descent math.
    let baseline = rect.y0 + rect.height() / 2.0 + size / 2.0;

    match &style.font {
        FontChoice::Builtin(font) => {
            let width = font.text_width(name, size);
            doc.draw_text_builtin(
                placement.page,
                *font,
                size,
                style.color,
                x(width),
                baseline,
                name,
            )
            .map_err(|e| Error::Render(e.to_string()))?;
        }
        FontChoice::Embedded(data) => {
            let font = EmbeddedFont::from_bytes("CustomFont", data)
                .map_err(|e| Error::Render(format!("embedded font unreadable: {e}")))?;
            let width = font.text_width(name, size);
            doc.draw_text_embedded(
                placement.page,
                &font,
                size,
                style.color,
                x(width),
                baseline,
                name,
            )
            .map_err(|e| Error::Render(e.to_string()))?;
        }
    }

    doc.to_bytes().map_err(|e| Error::Render(e.to_string()))
}
