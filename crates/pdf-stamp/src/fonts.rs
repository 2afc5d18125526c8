//! Font handling: built-in (base-14) metrics and embedded TrueType fonts

use crate::{Result, StampError};
use lopdf::{Dictionary, Object, Stream};
use std::collections::HashSet;

/// The built-in PDF fonts supported for stamping.
///
/// These are base-14 fonts: every conforming reader ships them, so nothing
/// is embedded in the output. Widths come from the published Adobe core
/// metrics (ASCII range) and are only used for centering math.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl BuiltinFont {
    /// Resolve a user-facing selector to a font.
    ///
    /// Accepts both the PDF base names ("Helvetica-Oblique", "Times-Roman")
    /// and the friendlier Italic/Times spellings ("Helvetica-Italic",
    /// "Times"), case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let n = name.trim().to_ascii_lowercase();
        match n.as_str() {
            "helvetica" => Some(Self::Helvetica),
            "helvetica-bold" => Some(Self::HelveticaBold),
            "helvetica-oblique" | "helvetica-italic" => Some(Self::HelveticaOblique),
            "helvetica-boldoblique" | "helvetica-bolditalic" => Some(Self::HelveticaBoldOblique),
            "times" | "times-roman" => Some(Self::TimesRoman),
            "times-bold" => Some(Self::TimesBold),
            "times-italic" => Some(Self::TimesItalic),
            "times-bolditalic" => Some(Self::TimesBoldItalic),
            "courier" => Some(Self::Courier),
            "courier-bold" => Some(Self::CourierBold),
            "courier-oblique" | "courier-italic" => Some(Self::CourierOblique),
            "courier-boldoblique" | "courier-bolditalic" => Some(Self::CourierBoldOblique),
            _ => None,
        }
    }

    /// The /BaseFont name written into the PDF.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    fn widths(&self) -> Option<&'static [u16; 95]> {
        match self {
            Self::Helvetica | Self::HelveticaOblique => Some(&WIDTHS_HELVETICA),
            Self::HelveticaBold | Self::HelveticaBoldOblique => Some(&WIDTHS_HELVETICA_BOLD),
            Self::TimesRoman => Some(&WIDTHS_TIMES_ROMAN),
            Self::TimesBold => Some(&WIDTHS_TIMES_BOLD),
            Self::TimesItalic => Some(&WIDTHS_TIMES_ITALIC),
            Self::TimesBoldItalic => Some(&WIDTHS_TIMES_BOLD_ITALIC),
            // Courier is monospaced at 600 across all variants.
            _ => None,
        }
    }

    fn default_width(&self) -> u16 {
        match self {
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => 556,
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => 500,
            _ => 600,
        }
    }

    /// Advance width of a character in millesimal (1/1000 em) units.
    pub fn char_width(&self, c: char) -> u16 {
        match self.widths() {
            None => 600,
            Some(table) => {
                let code = c as u32;
                if (0x20..=0x7E).contains(&code) {
                    table[(code - 0x20) as usize]
                } else {
                    self.default_width()
                }
            }
        }
    }

    /// Width of a string in points at the given font size.
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.char_width(c) as u32).sum();
        units as f64 / 1000.0 * font_size
    }

    /// Typographic ascent in millesimal units.
    pub fn ascent(&self) -> i16 {
        match self {
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => 718,
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => 683,
            _ => 629,
        }
    }

    /// Typographic descent in millesimal units (negative).
    pub fn descent(&self) -> i16 {
        match self {
            Self::Helvetica
            | Self::HelveticaBold
            | Self::HelveticaOblique
            | Self::HelveticaBoldOblique => -207,
            Self::TimesRoman | Self::TimesBold | Self::TimesItalic | Self::TimesBoldItalic => -217,
            _ => -157,
        }
    }

    /// Build the font dictionary for page resources.
    pub(crate) fn to_font_dict(&self) -> Dictionary {
        Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(self.base_name().into())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ])
    }
}

/// PDF objects generated for embedding a TrueType font
pub(crate) struct FontObjects {
    pub type0_font: Dictionary,
    pub cid_font: Dictionary,
    pub font_descriptor: Dictionary,
    pub font_file_stream: Stream,
    pub tounicode_stream: Stream,
}

/// An embedded TrueType font, parsed once and reusable across documents.
#[derive(Clone)]
pub struct EmbeddedFont {
    /// Font identifier (used as the /BaseFont name)
    pub name: String,
    /// Raw TTF data
    ttf_data: Vec<u8>,
    /// Characters drawn with this font (drives /W and ToUnicode generation)
    used_chars: HashSet<char>,
    /// Parsed font face
    face: ttf_parser::Face<'static>,
}

impl EmbeddedFont {
    /// Parse TTF bytes into an embeddable font.
    ///
    /// The face borrows leaked storage so it can live for the document
    /// lifetime; fonts are parsed once per batch, not per render.
    pub fn from_bytes(name: &str, ttf_data: &[u8]) -> Result<Self> {
        let data = ttf_data.to_vec();
        let static_data: &'static [u8] = Box::leak(data.clone().into_boxed_slice());

        let face = ttf_parser::Face::parse(static_data, 0)
            .map_err(|e| StampError::FontParse(format!("{e:?}")))?;

        Ok(Self {
            name: name.to_string(),
            ttf_data: data,
            used_chars: HashSet::new(),
            face,
        })
    }

    /// Record characters as used (drives /W and ToUnicode generation)
    pub fn add_chars(&mut self, text: &str) {
        for c in text.chars() {
            self.used_chars.insert(c);
        }
    }

    /// Get glyph ID for a character
    pub fn glyph_id(&self, c: char) -> Option<u16> {
        self.face.glyph_index(c).map(|id| id.0)
    }

    pub fn units_per_em(&self) -> u16 {
        self.face.units_per_em()
    }

    pub fn ascender(&self) -> i16 {
        self.face.ascender()
    }

    pub fn descender(&self) -> i16 {
        self.face.descender()
    }

    fn glyph_advance(&self, c: char) -> u16 {
        self.face
            .glyph_index(c)
            .and_then(|id| self.face.glyph_hor_advance(id))
            .unwrap_or(0)
    }

    /// Width of a string in points at the given font size.
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: u32 = text.chars().map(|c| self.glyph_advance(c) as u32).sum();
        units as f64 / self.units_per_em() as f64 * font_size
    }

    /// Encode text as a glyph-ID hex string for the Tj operator
    pub fn encode_text_hex(&self, text: &str) -> String {
        let mut result = String::new();
        for c in text.chars() {
            let gid = self.glyph_id(c).unwrap_or(0);
            result.push_str(&format!("{gid:04X}"));
        }
        format!("<{result}>")
    }

    /// Generate all PDF objects needed to embed this font
    ///
    /// The whole font file is embedded (no subsetting); certificates use a
    /// handful of glyphs and output size is not a constraint here.
    pub(crate) fn to_pdf_objects(&self) -> FontObjects {
        let font_name = Object::Name(self.name.clone().into());

        let tounicode_content = self.generate_tounicode_cmap();
        let tounicode_stream = Stream::new(
            Dictionary::from_iter(vec![("Type", Object::Name(b"CMap".to_vec()))]),
            tounicode_content.into_bytes(),
        );

        let font_file_stream = Stream::new(
            Dictionary::from_iter(vec![(
                "Length1",
                Object::Integer(self.ttf_data.len() as i64),
            )]),
            self.ttf_data.clone(),
        );

        let units_per_em = self.units_per_em() as i64;
        let ascender = self.ascender();
        let descender = self.descender();

        let font_bbox = vec![
            Object::Integer(0),
            Object::Integer(descender as i64),
            Object::Integer(units_per_em),
            Object::Integer(ascender as i64),
        ];

        let font_descriptor = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"FontDescriptor".to_vec())),
            ("FontName", font_name.clone()),
            ("Flags", Object::Integer(4)), // Symbolic
            ("FontBBox", Object::Array(font_bbox)),
            ("ItalicAngle", Object::Integer(0)),
            ("Ascent", Object::Integer(ascender as i64)),
            ("Descent", Object::Integer(descender as i64)),
            ("CapHeight", Object::Integer(ascender as i64)),
            ("StemV", Object::Integer(80)),
        ]);

        let cid_system_info = Dictionary::from_iter(vec![
            ("Registry", Object::string_literal("Adobe")),
            ("Ordering", Object::string_literal("Identity")),
            ("Supplement", Object::Integer(0)),
        ]);

        let cid_font = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
            ("BaseFont", font_name.clone()),
            ("CIDSystemInfo", Object::Dictionary(cid_system_info)),
            ("W", Object::Array(self.generate_widths_array())),
            ("DW", Object::Integer(1000)),
        ]);

        let type0_font = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type0".to_vec())),
            ("BaseFont", font_name),
            ("Encoding", Object::Name(b"Identity-H".to_vec())),
        ]);

        FontObjects {
            type0_font,
            cid_font,
            font_descriptor,
            font_file_stream,
            tounicode_stream,
        }
    }

    /// Generate the /W array for used glyphs
    ///
    /// Widths are normalized to 1000 units/em as the CID metrics require.
    fn generate_widths_array(&self) -> Vec<Object> {
        let mut gids: Vec<u16> = self
            .used_chars
            .iter()
            .filter_map(|&c| self.glyph_id(c))
            .collect();
        gids.sort_unstable();
        gids.dedup();

        let upem = self.units_per_em() as f64;
        let mut widths = Vec::new();
        for gid in gids {
            let advance = self
                .face
                .glyph_hor_advance(ttf_parser::GlyphId(gid))
                .unwrap_or(0) as f64;
            let scaled = (advance / upem * 1000.0).round() as i64;
            widths.push(Object::Integer(gid as i64));
            widths.push(Object::Array(vec![Object::Integer(scaled)]));
        }

        widths
    }

    /// Generate ToUnicode CMap stream content for used characters
    fn generate_tounicode_cmap(&self) -> String {
        let mut cmap = String::new();

        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        let mut char_list: Vec<char> = self.used_chars.iter().copied().collect();
        char_list.sort_by_key(|c| *c as u32);

        if !char_list.is_empty() {
            for chunk in char_list.chunks(100) {
                cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
                for c in chunk {
                    let gid = self.glyph_id(*c).unwrap_or(0);
                    let unicode = *c as u32;
                    cmap.push_str(&format!("<{gid:04X}> <{unicode:04X}>\n"));
                }
                cmap.push_str("endbfchar\n");
            }
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }
}

// Published Adobe core-14 advance widths for the ASCII range 0x20..=0x7E,
// in millesimal units. Oblique variants share the upright tables; Courier
// is monospaced at 600 and has no table.

#[rustfmt::skip]
const WIDTHS_HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
    584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
    500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
    278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const WIDTHS_HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
    278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
    584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
    556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
    333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const WIDTHS_TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278,
    564, 564, 564, 444, 921, 722, 667, 667, 722, 611, 556, 722, 722, 333,
    389, 722, 611, 889, 722, 722, 556, 722, 667, 556, 611, 722, 722, 944,
    722, 722, 611, 333, 278, 333, 469, 500, 333, 444, 500, 444, 500, 444,
    333, 500, 500, 278, 278, 500, 278, 778, 500, 500, 500, 500, 333, 389,
    278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const WIDTHS_TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    570, 570, 570, 500, 930, 722, 667, 722, 722, 667, 611, 778, 778, 389,
    500, 778, 667, 944, 722, 778, 611, 778, 722, 556, 667, 722, 722, 1000,
    722, 722, 667, 333, 278, 333, 581, 500, 333, 500, 556, 444, 556, 444,
    333, 500, 556, 278, 333, 556, 278, 833, 556, 500, 556, 556, 444, 389,
    333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const WIDTHS_TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    675, 675, 675, 500, 920, 611, 611, 667, 722, 611, 611, 722, 722, 333,
    444, 667, 556, 833, 667, 722, 611, 722, 611, 500, 556, 722, 611, 833,
    611, 556, 556, 389, 278, 389, 422, 500, 333, 500, 500, 444, 500, 444,
    278, 500, 500, 278, 278, 444, 278, 722, 500, 500, 500, 500, 389, 389,
    278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const WIDTHS_TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333,
    250, 278, 500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333,
    570, 570, 570, 500, 832, 667, 667, 667, 722, 667, 667, 722, 778, 389,
    500, 667, 611, 889, 722, 722, 611, 722, 667, 556, 611, 722, 667, 889,
    667, 611, 611, 333, 278, 333, 570, 500, 333, 500, 500, 444, 500, 444,
    333, 500, 556, 278, 278, 500, 278, 778, 556, 500, 500, 500, 389, 389,
    278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];
