//! The immutable template document
//!
//! Loaded once per batch and shared read-only; every render derives its own
//! working copy from the bytes, so the template itself is never mutated.

use crate::{Error, Result};
use pdf_stamp::WorkingDoc;

/// An immutable certificate template: the raw bytes plus parsed page
/// geometry (page count, per-page width/height).
#[derive(Debug, Clone)]
pub struct Template {
    bytes: Vec<u8>,
    pages: Vec<(f64, f64)>,
}

impl Template {
    /// Parse template bytes, capturing page geometry.
    ///
    /// Malformed bytes fail here, before any batch work starts.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let doc = WorkingDoc::from_bytes(&bytes)
            .map_err(|e| Error::Config(format!("template is not a readable PDF: {e}")))?;

        let page_count = doc.page_count();
        if page_count == 0 {
            return Err(Error::Config("template has no pages".to_string()));
        }

        let mut pages = Vec::with_capacity(page_count);
        for page in 1..=page_count as u32 {
            pages.push(doc.page_size(page)?);
        }

        Ok(Self { bytes, pages })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Width and height of a page (1-indexed)
    pub fn page_size(&self, page: u32) -> Option<(f64, f64)> {
        self.pages.get(page.saturating_sub(1) as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_garbage_bytes() {
        let result = Template::from_bytes(b"definitely not a pdf".to_vec());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
