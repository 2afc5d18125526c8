//! PDF Stamp - low-level PDF text stamping
//!
//! This crate provides functionality for:
//! - Opening a working copy of a template PDF from bytes
//! - Scanning page text into spans with bounding rectangles
//! - Redacting (permanently removing) text inside a region
//! - Drawing single-line text with built-in or embedded TrueType fonts
//!
//! # Example
//!
//! ```ignore
//! use pdf_stamp::{BuiltinFont, Color, WorkingDoc};
//!
//! let mut doc = WorkingDoc::from_bytes(&template_bytes)?;
//! doc.draw_text_builtin(1, BuiltinFont::Helvetica, 24.0, Color::black(), 180.0, 400.0, "Jane Doe")?;
//! let out = doc.to_bytes()?;
//! ```
//!
//! Coordinates on the public surface are top-origin (y grows downward, like
//! most template authoring tools report them); conversion to PDF's
//! bottom-origin space happens internally against the page MediaBox.

mod document;
mod fonts;
mod redact;
mod scan;
mod text;

pub use document::{Color, WorkingDoc};
pub use fonts::{BuiltinFont, EmbeddedFont};
pub use scan::{scan_document, TextSpan};

use thiserror::Error;

/// Errors that can occur during PDF stamping
#[derive(Debug, Error)]
pub enum StampError {
    #[error("Failed to open PDF: {0}")]
    Open(String),

    #[error("Failed to save PDF: {0}")]
    Save(String),

    #[error("PDF parsing error: {0}")]
    Parse(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(u32, usize),

    #[error("Failed to parse font: {0}")]
    FontParse(String),

    #[error("Unknown built-in font: {0}")]
    UnknownFont(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    Lopdf(#[from] lopdf::Error),
}

/// Result type for stamping operations
pub type Result<T> = std::result::Result<T, StampError>;

/// Rectangle in top-origin page coordinates (y grows downward).
///
/// Invariant for a usable rectangle: x0 < x1 and y0 < y1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// A rectangle is usable when both dimensions are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite())
            && self.width() > 0.0
            && self.height() > 0.0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_dimensions() {
        let r = Rect::new(10.0, 20.0, 110.0, 60.0);
        assert_eq!(r.width(), 100.0);
        assert_eq!(r.height(), 40.0);
        assert!(r.is_valid());
    }

    #[test]
    fn test_rect_degenerate() {
        assert!(!Rect::new(10.0, 20.0, 10.0, 60.0).is_valid());
        assert!(!Rect::new(10.0, 20.0, 5.0, 60.0).is_valid());
        assert!(!Rect::new(10.0, f64::NAN, 20.0, 60.0).is_valid());
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        let c = Rect::new(20.0, 20.0, 30.0, 30.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }
}
