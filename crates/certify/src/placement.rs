//! Placement resolution
//!
//! Determines the rectangle a name is drawn into: either the bounding box
//! of a literal placeholder token discovered in the template text, or a
//! caller-supplied manual default.

use crate::{Error, Result, Template};
use pdf_stamp::{Rect, WorkingDoc};

/// Where a name will be drawn.
///
/// `found` distinguishes a placeholder-derived rectangle (which also gets
/// redacted before drawing) from a manual default (nothing to erase).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Target page (1-indexed)
    pub page: u32,
    pub rect: Rect,
    pub found: bool,
}

/// Resolve the placement for a template.
///
/// Pages are scanned in ascending order, operations in content-stream
/// order; the first span containing `token` verbatim wins. With no match,
/// a supplied manual rectangle is used on page 1; with neither, resolution
/// fails with [`Error::NoPlacementTarget`].
///
/// Resolution depends only on the template and token, so a batch resolves
/// once and reuses the result for every row.
pub fn resolve(template: &Template, token: &str, manual_default: Option<Rect>) -> Result<Placement> {
    let doc = WorkingDoc::from_bytes(template.bytes())?;
    let spans = doc.scan_text()?;

    if let Some(span) = spans.iter().find(|span| span.text.contains(token)) {
        return Ok(Placement {
            page: span.page,
            rect: span.rect,
            found: true,
        });
    }

    match manual_default {
        Some(rect) => Ok(Placement {
            page: 1,
            rect,
            found: false,
        }),
        None => Err(Error::NoPlacementTarget),
    }
}

/// Geometry-only convenience rectangle for when no template has been
/// inspected yet: horizontally centered at 60% of the page width, a band
/// just below the vertical middle.
///
/// This is a UI default, not a discovered placement; it only ever enters
/// [`resolve`] as the `manual_default`.
pub fn default_rect(page_width: f64, page_height: f64) -> Rect {
    Rect {
        x0: page_width * 0.2,
        y0: page_height * 0.45,
        x1: page_width * 0.8,
        y1: page_height * 0.55,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rect_proportions() {
        let r = default_rect(612.0, 792.0);
        assert!((r.width() - 612.0 * 0.6).abs() < 1e-9);
        assert!((r.x0 - 122.4).abs() < 1e-9);
        assert!((r.y0 - 356.4).abs() < 1e-9);
        assert!(r.is_valid());
    }

    #[test]
    fn test_default_rect_is_centered() {
        let r = default_rect(1000.0, 500.0);
        let left_margin = r.x0;
        let right_margin = 1000.0 - r.x1;
        assert!((left_margin - right_margin).abs() < 1e-9);
    }
}
