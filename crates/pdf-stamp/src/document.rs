//! PDF working-copy wrapper
//!
//! A `WorkingDoc` is an independent, mutable copy opened from shared
//! template bytes. The template buffer itself is never touched; every
//! render opens its own copy, stamps it, and serializes it back out.

use crate::fonts::{BuiltinFont, EmbeddedFont};
use crate::scan::{scan_document, TextSpan};
use crate::text::{encode_winansi, generate_text_operators, ShowText};
use crate::{redact, Rect, Result, StampError};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// RGB Color (values 0.0 - 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// Create a new RGB color (values 0.0 - 1.0)
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Create color from RGB values (0-255)
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        }
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

/// Font selector for a buffered draw
enum FontSel {
    Builtin(BuiltinFont),
    Embedded(String),
}

/// A buffered text operation, encoded and flushed during save
struct BufferedTextOp {
    page: u32,
    font: FontSel,
    font_size: f64,
    color: Color,
    /// X coordinate (PDF coordinates)
    x: f64,
    /// Baseline Y (PDF coordinates, already converted from top-origin)
    y: f64,
    text: String,
}

/// Mutable working copy of a PDF document
pub struct WorkingDoc {
    /// The underlying lopdf document
    inner: Document,
    /// Embedded fonts used by buffered draws (font name -> data)
    embedded_fonts: HashMap<String, EmbeddedFont>,
    /// Buffered text operations (flushed during save)
    buffered_text_ops: Vec<BufferedTextOp>,
    /// Next font resource number
    next_font_resource: u32,
}

impl WorkingDoc {
    /// Open a working copy from PDF bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let inner = Document::load_mem(data).map_err(|e| StampError::Open(e.to_string()))?;

        Ok(Self {
            inner,
            embedded_fonts: HashMap::new(),
            buffered_text_ops: Vec::new(),
            next_font_resource: 1,
        })
    }

    /// Number of pages in the document
    pub fn page_count(&self) -> usize {
        self.inner.get_pages().len()
    }

    /// Page width and height in points (1-indexed page number)
    pub fn page_size(&self, page: u32) -> Result<(f64, f64)> {
        let page_id = self.page_id(page)?;
        let media_box = media_box(&self.inner, page_id)?;
        Ok((media_box[2] - media_box[0], media_box[3] - media_box[1]))
    }

    /// Scan all pages into text spans (content-stream order)
    pub fn scan_text(&self) -> Result<Vec<TextSpan>> {
        scan_document(&self.inner)
    }

    /// Permanently remove text content intersecting `rect` on a page.
    ///
    /// This rewrites the page content stream without the intersecting show
    /// operations; extraction afterwards will not see the removed text.
    /// Returns the number of operations removed.
    pub fn redact_rect(&mut self, page: u32, rect: &Rect) -> Result<usize> {
        let page_count = self.page_count();
        if page == 0 || page as usize > page_count {
            return Err(StampError::InvalidPage(page, page_count));
        }
        redact::redact_page(&mut self.inner, page, rect)
    }

    /// Draw a single line of text with a built-in font.
    ///
    /// `y_top` is the baseline measured from the top of the page.
    pub fn draw_text_builtin(
        &mut self,
        page: u32,
        font: BuiltinFont,
        font_size: f64,
        color: Color,
        x: f64,
        y_top: f64,
        text: &str,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let y = self.to_pdf_y(page, y_top)?;
        self.buffered_text_ops.push(BufferedTextOp {
            page,
            font: FontSel::Builtin(font),
            font_size,
            color,
            x,
            y,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Draw a single line of text with an embedded TrueType font.
    ///
    /// The font is cloned into the document on first use so the caller's
    /// copy stays reusable across renders; drawn characters are tracked on
    /// the document's copy for /W and ToUnicode generation.
    pub fn draw_text_embedded(
        &mut self,
        page: u32,
        font: &EmbeddedFont,
        font_size: f64,
        color: Color,
        x: f64,
        y_top: f64,
        text: &str,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let y = self.to_pdf_y(page, y_top)?;

        let entry = self
            .embedded_fonts
            .entry(font.name.clone())
            .or_insert_with(|| font.clone());
        entry.add_chars(text);

        self.buffered_text_ops.push(BufferedTextOp {
            page,
            font: FontSel::Embedded(font.name.clone()),
            font_size,
            color,
            x,
            y,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Serialize the working copy to bytes.
    ///
    /// Flushes buffered text (embedding fonts and registering page
    /// resources first) and saves the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush_text_ops()?;

        let mut buffer = Vec::new();
        self.inner
            .save_to(&mut buffer)
            .map_err(|e| StampError::Save(e.to_string()))?;

        Ok(buffer)
    }

    /// Convert a top-origin baseline to PDF coordinates, validating the page
    fn to_pdf_y(&self, page: u32, y_top: f64) -> Result<f64> {
        let page_count = self.page_count();
        if page == 0 || page as usize > page_count {
            return Err(StampError::InvalidPage(page, page_count));
        }
        let (_, page_height) = self.page_size(page)?;
        Ok(page_height - y_top)
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        let pages = self.inner.get_pages();
        pages
            .get(&page)
            .copied()
            .ok_or(StampError::InvalidPage(page, pages.len()))
    }

    /// Encode and write all buffered text operations
    fn flush_text_ops(&mut self) -> Result<()> {
        if self.buffered_text_ops.is_empty() {
            return Ok(());
        }
        let text_ops = std::mem::take(&mut self.buffered_text_ops);

        // Embed each distinct font once and hand out resource names.
        let mut font_refs: HashMap<String, (String, ObjectId)> = HashMap::new();
        for op in &text_ops {
            let key = match &op.font {
                FontSel::Builtin(f) => format!("builtin:{}", f.base_name()),
                FontSel::Embedded(name) => format!("embedded:{name}"),
            };
            if !font_refs.contains_key(&key) {
                let object_id = match &op.font {
                    FontSel::Builtin(f) => self.inner.add_object(f.to_font_dict()),
                    FontSel::Embedded(name) => {
                        let font = self
                            .embedded_fonts
                            .get(name)
                            .ok_or_else(|| StampError::FontParse(name.clone()))?
                            .clone();
                        self.embed_font_object(&font)?
                    }
                };
                let resource_name = format!("CF{}", self.next_font_resource);
                self.next_font_resource += 1;
                font_refs.insert(key, (resource_name, object_id));
            }
        }

        // Group operators per page, then register resources and append
        // content once per page.
        let mut page_content: HashMap<u32, Vec<u8>> = HashMap::new();
        let mut page_fonts: HashMap<u32, Vec<(String, ObjectId)>> = HashMap::new();

        for op in &text_ops {
            let (key, show) = match &op.font {
                FontSel::Builtin(f) => (
                    format!("builtin:{}", f.base_name()),
                    ShowText::Literal(encode_winansi(&op.text)),
                ),
                FontSel::Embedded(name) => {
                    let font = &self.embedded_fonts[name];
                    (
                        format!("embedded:{name}"),
                        ShowText::Hex(font.encode_text_hex(&op.text)),
                    )
                }
            };
            let (resource_name, object_id) = font_refs[&key].clone();

            let operators =
                generate_text_operators(&show, &resource_name, op.font_size, op.color, op.x, op.y);
            page_content
                .entry(op.page)
                .or_default()
                .extend_from_slice(&operators);

            let fonts = page_fonts.entry(op.page).or_default();
            if !fonts.iter().any(|(name, _)| *name == resource_name) {
                fonts.push((resource_name, object_id));
            }
        }

        for (page, fonts) in page_fonts {
            self.add_fonts_to_page_resources(page, &fonts)?;
        }
        for (page, content) in page_content {
            self.append_to_content_stream(page, &content)?;
        }

        Ok(())
    }

    /// Embed a TrueType font as a Type0/Identity-H object graph
    fn embed_font_object(&mut self, font: &EmbeddedFont) -> Result<ObjectId> {
        let objects = font.to_pdf_objects();

        let font_file_id = self.inner.add_object(objects.font_file_stream);

        let mut font_descriptor = objects.font_descriptor;
        font_descriptor.set("FontFile2", Object::Reference(font_file_id));
        let font_descriptor_id = self.inner.add_object(font_descriptor);

        let mut cid_font = objects.cid_font;
        cid_font.set("FontDescriptor", Object::Reference(font_descriptor_id));
        let cid_font_id = self.inner.add_object(cid_font);

        let tounicode_id = self.inner.add_object(objects.tounicode_stream);

        let mut type0_font = objects.type0_font;
        type0_font.set(
            "DescendantFonts",
            Object::Array(vec![Object::Reference(cid_font_id)]),
        );
        type0_font.set("ToUnicode", Object::Reference(tounicode_id));

        Ok(self.inner.add_object(type0_font))
    }

    /// Add font references to a page's Resources dictionary
    fn add_fonts_to_page_resources(
        &mut self,
        page: u32,
        fonts: &[(String, ObjectId)],
    ) -> Result<()> {
        let page_id = self.page_id(page)?;

        let page_obj = self.inner.get_object(page_id)?;
        let page_dict = page_obj
            .as_dict()
            .map_err(|_| StampError::Parse("Page object is not a dictionary".to_string()))?;

        let mut resources_dict = match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id) {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        };

        let mut font_dict = match resources_dict.get(b"Font") {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            Ok(Object::Reference(ref_id)) => match self.inner.get_object(*ref_id) {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                _ => Dictionary::new(),
            },
            _ => Dictionary::new(),
        };

        for (resource_name, object_id) in fonts {
            font_dict.set(resource_name.as_bytes(), Object::Reference(*object_id));
        }

        resources_dict.set(b"Font", Object::Dictionary(font_dict));

        let mut new_page_dict = page_dict.clone();
        new_page_dict.set(b"Resources", Object::Dictionary(resources_dict));
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }

    /// Append content to a page's content stream
    ///
    /// Reads the existing content (stream, reference, or array of streams),
    /// appends the new operators, and writes a single new stream object.
    fn append_to_content_stream(&mut self, page: u32, content: &[u8]) -> Result<()> {
        let page_id = self.page_id(page)?;

        let (existing_content, page_dict_clone) = {
            let page_obj = self.inner.get_object(page_id)?;
            let page_dict = page_obj
                .as_dict()
                .map_err(|_| StampError::Parse("Page object is not a dictionary".to_string()))?;
            let page_dict_clone = page_dict.clone();

            let existing_content = match page_dict.get(b"Contents") {
                Ok(contents) => match contents {
                    Object::Stream(stream) => stream
                        .decompressed_content()
                        .unwrap_or_else(|_| stream.content.clone()),
                    Object::Reference(ref_id) => {
                        if let Ok(Object::Stream(stream)) = self.inner.get_object(*ref_id) {
                            stream
                                .decompressed_content()
                                .unwrap_or_else(|_| stream.content.clone())
                        } else {
                            Vec::new()
                        }
                    }
                    Object::Array(arr) => {
                        let mut combined = Vec::new();
                        for obj in arr {
                            let stream = match obj {
                                Object::Reference(ref_id) => {
                                    match self.inner.get_object(*ref_id) {
                                        Ok(Object::Stream(stream)) => Some(stream),
                                        _ => None,
                                    }
                                }
                                Object::Stream(stream) => Some(stream),
                                _ => None,
                            };
                            if let Some(stream) = stream {
                                let data = stream
                                    .decompressed_content()
                                    .unwrap_or_else(|_| stream.content.clone());
                                combined.extend_from_slice(&data);
                                // Operators from adjacent streams must not
                                // run together.
                                combined.push(b'\n');
                            }
                        }
                        combined
                    }
                    _ => Vec::new(),
                },
                Err(_) => Vec::new(),
            };

            (existing_content, page_dict_clone)
        };

        let mut new_content = existing_content;
        if !new_content.ends_with(b"\n") && !new_content.is_empty() {
            new_content.push(b'\n');
        }
        new_content.extend_from_slice(content);

        let new_stream = Stream::new(Dictionary::new(), new_content);
        let stream_id = self.inner.add_object(new_stream);

        let mut new_page_dict = page_dict_clone;
        new_page_dict.set(b"Contents", Object::Reference(stream_id));
        self.inner.objects.insert(page_id, new_page_dict.into());

        Ok(())
    }
}

/// Get a page's MediaBox (or CropBox), following the Pages parent chain.
///
/// Falls back to A4 when no box is found within the depth limit.
pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4]> {
    let mut current_id = page_id;

    for _ in 0..10 {
        let obj = doc.get_object(current_id)?;
        let dict = obj
            .as_dict()
            .map_err(|_| StampError::Parse("Object is not a dictionary".to_string()))?;

        if let Ok(media_box) = dict.get(b"MediaBox").or_else(|_| dict.get(b"CropBox")) {
            let arr = match media_box {
                Object::Array(arr) => arr.clone(),
                Object::Reference(ref_id) => doc
                    .get_object(*ref_id)?
                    .as_array()
                    .map_err(|_| {
                        StampError::Parse("MediaBox reference is not an array".to_string())
                    })?
                    .clone(),
                _ => return Err(StampError::Parse("MediaBox is not an array".to_string())),
            };
            if arr.len() >= 4 {
                let mut values = [0.0f64; 4];
                for (i, obj) in arr.iter().take(4).enumerate() {
                    values[i] = object_to_f64(obj).ok_or_else(|| {
                        StampError::Parse("Invalid MediaBox coordinate".to_string())
                    })?;
                }
                return Ok(values);
            }
            return Err(StampError::Parse("Invalid MediaBox format".to_string()));
        }

        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current_id = *parent_id,
            _ => break,
        }
    }

    // A4 fallback
    Ok([0.0, 0.0, 595.28, 841.89])
}

/// Numeric PDF object to f64
pub(crate) fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_constructors() {
        assert_eq!(Color::default(), Color::black());
        let c = Color::from_rgb(255, 0, 128);
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 0.0).abs() < 1e-6);
        assert!((c.b - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_object_to_f64() {
        assert_eq!(object_to_f64(&Object::Integer(42)), Some(42.0));
        assert_eq!(object_to_f64(&Object::Real(1.5)), Some(1.5));
        assert_eq!(object_to_f64(&Object::Null), None);
    }

    #[test]
    fn test_open_rejects_garbage() {
        let result = WorkingDoc::from_bytes(b"not a pdf at all");
        assert!(matches!(result, Err(StampError::Open(_))));
    }
}
