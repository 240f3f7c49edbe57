//! # Font Management
//!
//! Resolving font requests to concrete faces and measuring text with them.
//!
//! [`FontResolver`] is the configuration object: it maps a family plus
//! bold/italic flags to a variant key and holds any TrueType bytes registered
//! for that key. It is built once at startup. [`FontContext`] is the frozen,
//! parsed form handed to layout and PDF serialization. It is immutable, so
//! independent layout passes can share one.
//!
//! A variant without registered bytes falls back to the standard PDF font of
//! the same family. Arial falls back to Helvetica, which has the same metrics.

pub mod metrics;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use base64::Engine as _;
use serde::Serialize;

use crate::error::PagemarkError;
use crate::model::{FontEntry, FontSpec};
pub use metrics::StandardFontMetrics;

/// Identifies one face of a family, e.g. `Arial#b` for Arial Bold.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct VariantKey(String);

impl VariantKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The family part of the key.
    pub fn family(&self) -> &str {
        self.0.split('#').next().unwrap_or(&self.0)
    }

    pub fn is_bold(&self) -> bool {
        self.suffix().contains('b')
    }

    pub fn is_italic(&self) -> bool {
        self.suffix().contains('i')
    }

    fn suffix(&self) -> &str {
        self.0.rsplit_once('#').map(|(_, s)| s).unwrap_or("")
    }
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File names looked up by [`FontResolver::load_dir`].
const ARIAL_FILES: [(&str, bool, bool); 4] = [
    ("Arial.ttf", false, false),
    ("Arial_Bold.ttf", true, false),
    ("Arial_Italic.ttf", false, true),
    ("Arial_Bold_Italic.ttf", true, true),
];

/// Maps font requests to variant keys and stores registered font bytes.
#[derive(Debug, Default, Clone)]
pub struct FontResolver {
    faces: HashMap<VariantKey, Vec<u8>>,
}

impl FontResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a family and style flags to a variant key.
    ///
    /// Family names are matched case-insensitively and a trailing `#` is
    /// ignored. Known families get their canonical spelling.
    pub fn resolve_typeface(&self, family: &str, bold: bool, italic: bool) -> VariantKey {
        let name = family.trim().trim_end_matches('#');
        let canonical = match name.to_lowercase().as_str() {
            "arial" => "Arial".to_string(),
            "helvetica" => "Helvetica".to_string(),
            "courier" => "Courier".to_string(),
            "courier new" => "Courier New".to_string(),
            _ => name.to_string(),
        };
        let suffix = match (bold, italic) {
            (false, false) => "",
            (true, false) => "b",
            (false, true) => "i",
            (true, true) => "bi",
        };
        VariantKey(format!("{}#{}", canonical, suffix))
    }

    /// Bytes registered for a variant, if any.
    pub fn font_bytes(&self, key: &VariantKey) -> Option<&[u8]> {
        self.faces.get(key).map(|data| data.as_slice())
    }

    /// Register TrueType bytes for a family variant.
    pub fn register(&mut self, family: &str, bold: bool, italic: bool, data: Vec<u8>) {
        let key = self.resolve_typeface(family, bold, italic);
        self.faces.insert(key, data);
    }

    /// Register a config font entry whose `src` is base64 or a data URI.
    pub fn register_entry(&mut self, entry: &FontEntry) -> Result<(), PagemarkError> {
        let payload = match entry.src.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => entry.src.as_str(),
        };
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| {
                PagemarkError::FontError(format!(
                    "Invalid base64 data for font '{}': {}",
                    entry.family, e
                ))
            })?;
        self.register(&entry.family, entry.bold, entry.italic, data);
        Ok(())
    }

    /// Register whichever Arial faces exist in `dir`. Returns how many loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, PagemarkError> {
        if !dir.is_dir() {
            return Err(PagemarkError::FileNotFound {
                path: dir.to_path_buf(),
            });
        }
        let mut loaded = 0;
        for (file, bold, italic) in ARIAL_FILES {
            let path = dir.join(file);
            if path.is_file() {
                self.register("Arial", bold, italic, fs::read(&path)?);
                log::debug!("registered {} from {}", file, dir.display());
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VariantKey, &[u8])> {
        self.faces.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

/// Standard PDF faces used when a variant has no registered bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// Platform-default face for a variant key.
    pub fn for_variant(key: &VariantKey) -> Self {
        let courier = key.family().to_lowercase().starts_with("courier");
        match (courier, key.is_bold(), key.is_italic()) {
            (false, false, false) => Self::Helvetica,
            (false, true, false) => Self::HelveticaBold,
            (false, false, true) => Self::HelveticaOblique,
            (false, true, true) => Self::HelveticaBoldOblique,
            (true, false, false) => Self::Courier,
            (true, true, false) => Self::CourierBold,
            (true, false, true) => Self::CourierOblique,
            (true, true, true) => Self::CourierBoldOblique,
        }
    }

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
            _ => &metrics::COURIER,
        }
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Result<Self, ttf_parser::FaceParsingError> {
        let face = ttf_parser::Face::parse(data, 0)?;
        let units_per_em = face.units_per_em();

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    glyph_ids.insert(ch, glyph_id.0);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            glyph_ids,
        })
    }

    /// Get the advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    pub fn line_height(&self, font_size: f64) -> f64 {
        let units = self.ascender as f64 - self.descender as f64 + self.line_gap as f64;
        units / self.units_per_em as f64 * font_size
    }

    pub fn ascent(&self, font_size: f64) -> f64 {
        self.ascender as f64 / self.units_per_em as f64 * font_size
    }
}

/// A registered face after parsing.
#[derive(Debug, Clone)]
pub struct EmbeddedFace {
    pub data: Vec<u8>,
    pub metrics: CustomFontMetrics,
}

/// What a variant key resolved to.
#[derive(Debug, Clone, Copy)]
pub enum ResolvedFace<'a> {
    Standard(StandardFont),
    Embedded(&'a EmbeddedFace),
}

/// Frozen font configuration used by layout and PDF serialization.
/// Provides text measurement with real glyph metrics.
#[derive(Debug)]
pub struct FontContext {
    resolver: FontResolver,
    embedded: HashMap<VariantKey, EmbeddedFace>,
}

impl Default for FontContext {
    fn default() -> Self {
        Self {
            resolver: FontResolver::new(),
            embedded: HashMap::new(),
        }
    }
}

impl FontContext {
    /// A context with no registered faces; every request uses a standard font.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every registered face once. Unparseable bytes are an error.
    pub fn from_resolver(resolver: FontResolver) -> Result<Self, PagemarkError> {
        let mut embedded = HashMap::new();
        for (key, data) in resolver.iter() {
            let metrics = CustomFontMetrics::from_font_data(data).map_err(|e| {
                PagemarkError::FontError(format!("Failed to parse TTF data for '{}': {}", key, e))
            })?;
            embedded.insert(
                key.clone(),
                EmbeddedFace {
                    data: data.to_vec(),
                    metrics,
                },
            );
        }
        Ok(Self { resolver, embedded })
    }

    pub fn variant(&self, font: &FontSpec) -> VariantKey {
        self.resolver
            .resolve_typeface(&font.family, font.bold, font.italic)
    }

    /// Resolve a font request, falling back to the standard font.
    pub fn resolve(&self, font: &FontSpec) -> ResolvedFace<'_> {
        let key = self.variant(font);
        match self.embedded.get(&key) {
            Some(face) => ResolvedFace::Embedded(face),
            None => ResolvedFace::Standard(StandardFont::for_variant(&key)),
        }
    }

    /// The embedded face for a variant that was laid out with one.
    pub fn embedded_face(&self, key: &VariantKey) -> Result<&EmbeddedFace, PagemarkError> {
        self.embedded.get(key).ok_or_else(|| PagemarkError::MissingFont {
            variant: key.to_string(),
        })
    }

    pub fn is_embedded(&self, key: &VariantKey) -> bool {
        self.embedded.contains_key(key)
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            ResolvedFace::Standard(std_font) => std_font.metrics().char_width(ch, font.size),
            ResolvedFace::Embedded(face) => face.metrics.char_width(ch, font.size),
        }
    }

    /// Unwrapped single-line size of `text`: (width, line height).
    pub fn measure(&self, text: &str, font: &FontSpec) -> (f64, f64) {
        match self.resolve(font) {
            ResolvedFace::Standard(std_font) => {
                let m = std_font.metrics();
                (m.measure_string(text, font.size), m.line_height(font.size))
            }
            ResolvedFace::Embedded(face) => {
                let width = text.chars().map(|ch| face.metrics.char_width(ch, font.size)).sum();
                (width, face.metrics.line_height(font.size))
            }
        }
    }

    /// Distance from the top of a line to its baseline.
    pub fn ascent(&self, font: &FontSpec) -> f64 {
        match self.resolve(font) {
            ResolvedFace::Standard(std_font) => std_font.metrics().ascent(font.size),
            ResolvedFace::Embedded(face) => face.metrics.ascent(font.size),
        }
    }
}
