//! # PDF Serializer
//!
//! Writes a finished [`RenderedPage`] as a single-page PDF 1.7 file.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (catalog, page tree, fonts, content, page)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! ## Font Embedding
//!
//! Variants that resolved to a standard face become Type1 references with
//! WinAnsiEncoding. Variants laid out with a registered TrueType face are
//! embedded whole as CIDFontType2 with Identity-H encoding, producing 5 PDF
//! objects per face: FontFile2, FontDescriptor, CIDFont, ToUnicode CMap, and
//! the root Type0 dictionary.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::PagemarkError;
use crate::font::{EmbeddedFace, FontContext, StandardFont, VariantKey};
use crate::model::Metadata;
use crate::surface::{DrawInstruction, RenderedPage};

#[derive(Debug, Default)]
pub struct PdfWriter;

/// How text in one registered font is encoded in the content stream.
enum FontEncoding {
    WinAnsi,
    Identity { char_to_gid: HashMap<char, u16> },
}

struct RegisteredFont {
    obj_id: usize,
    encoding: FontEncoding,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Registration order gives the /F0, /F1, ... resource names.
    font_order: Vec<VariantKey>,
    fonts: HashMap<VariantKey, RegisteredFont>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_extra: &str, raw: &[u8]) -> usize {
        let compressed = compress_to_vec_zlib(raw, 6);
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< /Length {}{} /Filter /FlateDecode >>\nstream\n",
            compressed.len(),
            dict_extra
        );
        data.extend_from_slice(&compressed);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write a rendered page to a PDF byte vector.
    ///
    /// `fonts` must be the context the page was laid out with. An instruction
    /// measured with an embedded face that `fonts` does not hold is
    /// [`PagemarkError::MissingFont`].
    pub fn write(
        &self,
        page: &RenderedPage,
        metadata: &Metadata,
        fonts: &FontContext,
    ) -> Result<Vec<u8>, PagemarkError> {
        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_order: Vec::new(),
            fonts: HashMap::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, then the content stream and the page
        builder.push(vec![]);
        builder.push(vec![]);
        builder.push(vec![]);

        self.register_fonts(&mut builder, page, fonts)?;

        let content = self.build_content_stream(page, &builder);
        let content_obj_id = builder.push_stream("", content.as_bytes());

        let font_resources = builder
            .font_order
            .iter()
            .enumerate()
            .filter_map(|(i, key)| builder.fonts.get(key).map(|f| format!("/F{} {} 0 R", i, f.obj_id)))
            .collect::<Vec<_>>()
            .join(" ");
        let page_dict = format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
             /Contents {} 0 R /Resources << /Font << {} >> >> >>",
            page.width, page.height, content_obj_id, font_resources
        );
        let page_obj_id = builder.push(page_dict.into_bytes());

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        builder.objects[2].data =
            format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page_obj_id).into_bytes();

        let info_obj_id = builder.push(Self::build_info_dict(metadata).into_bytes());

        log::debug!(
            "pdf: {} object(s), {} font(s), {} instruction(s)",
            builder.objects.len() - 1,
            builder.font_order.len(),
            page.instructions.len()
        );

        Ok(self.serialize(&builder, info_obj_id))
    }

    fn build_info_dict(metadata: &Metadata) -> String {
        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title ({}) ", Self::escape_pdf_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author ({}) ", Self::escape_pdf_string(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject ({}) ", Self::escape_pdf_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (Pagemark {}) /Creator (Pagemark) >>",
            env!("CARGO_PKG_VERSION")
        );
        info
    }

    /// Register one PDF font per variant key used on the page, in first-use order.
    fn register_fonts(
        &self,
        builder: &mut PdfBuilder,
        page: &RenderedPage,
        fonts: &FontContext,
    ) -> Result<(), PagemarkError> {
        let mut used: BTreeMap<&VariantKey, (bool, HashSet<char>)> = BTreeMap::new();
        let mut order: Vec<&VariantKey> = Vec::new();
        for inst in &page.instructions {
            let entry = used.entry(&inst.variant).or_insert_with(|| {
                order.push(&inst.variant);
                (inst.embedded, HashSet::new())
            });
            entry.0 |= inst.embedded;
            entry.1.extend(inst.lines.iter().flat_map(|l| l.text.chars()));
        }

        for key in order {
            let Some((embedded, chars)) = used.get(key) else {
                continue;
            };
            let registered = if *embedded {
                let face = fonts.embedded_face(key)?;
                Self::write_custom_font_objects(builder, key, face, chars)?
            } else {
                let std_font = StandardFont::for_variant(key);
                let font_dict = format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                     /Encoding /WinAnsiEncoding >>",
                    std_font.pdf_name()
                );
                RegisteredFont {
                    obj_id: builder.push(font_dict.into_bytes()),
                    encoding: FontEncoding::WinAnsi,
                }
            };
            builder.font_order.push(key.clone());
            builder.fonts.insert(key.clone(), registered);
        }

        Ok(())
    }

    /// Write the 5 CIDFont PDF objects for an embedded TrueType face.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        key: &VariantKey,
        face: &EmbeddedFace,
        used_chars: &HashSet<char>,
    ) -> Result<RegisteredFont, PagemarkError> {
        let parsed = ttf_parser::Face::parse(&face.data, 0).map_err(|e| {
            PagemarkError::FontError(format!("Failed to parse TTF data for '{}': {}", key, e))
        })?;
        let metrics = &face.metrics;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|ch| metrics.glyph_ids.get(ch).map(|gid| (*ch, *gid)))
            .collect();

        let pdf_font_name = Self::sanitize_font_name(key.family(), key.is_bold(), key.is_italic());

        // 1. FontFile2 stream with the full TTF bytes
        let fontfile2_id = builder.push_stream(&format!(" /Length1 {}", face.data.len()), &face.data);

        // 2. FontDescriptor
        let scale = 1000.0 / metrics.units_per_em as f64;
        let bbox = parsed.global_bounding_box();
        let bbox_str = format!(
            "[{} {} {} {}]",
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
        );
        let cap_height = parsed.capital_height().unwrap_or(metrics.ascender) as f64 * scale;
        let font_descriptor_dict = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 4 \
             /FontBBox {} /ItalicAngle {} \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            bbox_str,
            if key.is_italic() { -12 } else { 0 },
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            cap_height as i32,
            if key.is_bold() { 120 } else { 80 },
            fontfile2_id,
        );
        let font_descriptor_id = builder.push(font_descriptor_dict.into_bytes());

        // 3. CIDFont dictionary (DescendantFont)
        let w_array = Self::build_w_array(&char_to_gid, |ch| {
            metrics.advance_widths.get(&ch).copied().unwrap_or(metrics.default_advance)
        }, metrics.units_per_em);
        let default_width = parsed
            .glyph_hor_advance(ttf_parser::GlyphId(0))
            .map(|adv| (adv as f64 * scale) as u32)
            .unwrap_or(1000);
        let cidfont_dict = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            pdf_font_name, font_descriptor_id, default_width, w_array,
        );
        let cidfont_id = builder.push(cidfont_dict.into_bytes());

        // 4. ToUnicode CMap
        let cmap_content = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let tounicode_id = builder.push_stream("", cmap_content.as_bytes());

        // 5. Type0 font dictionary (the root, referenced by /Resources)
        let type0_dict = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} \
             /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] \
             /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id,
        );
        let type0_id = builder.push(type0_dict.into_bytes());

        Ok(RegisteredFont {
            obj_id: type0_id,
            encoding: FontEncoding::Identity { char_to_gid },
        })
    }

    /// Build the /W array for per-glyph widths in CIDFont.
    /// Format: [gid [width] gid [width] ...]
    fn build_w_array<F>(char_to_gid: &HashMap<char, u16>, advance: F, units_per_em: u16) -> String
    where
        F: Fn(char) -> u16,
    {
        let scale = 1000.0 / units_per_em as f64;

        let mut entries: BTreeMap<u16, u32> = BTreeMap::new();
        for (&ch, &gid) in char_to_gid {
            entries
                .entry(gid)
                .or_insert_with(|| (advance(ch) as f64 * scale) as u32);
        }

        let mut result = String::from("[");
        for (gid, width) in &entries {
            let _ = write!(result, " {} [{}]", gid, width);
        }
        result.push_str(" ]");
        result
    }

    /// Build a ToUnicode CMap for text extraction/copy-paste support.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, u32)> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, ch as u32))
            .collect();
        gid_to_unicode.sort_unstable();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo\n");
        cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // beginbfchar blocks hold at most 100 entries
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, unicode) in chunk {
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, Self::utf16_hex(unicode));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");

        cmap
    }

    fn utf16_hex(unicode: u32) -> String {
        char::from_u32(unicode)
            .map(|ch| {
                let mut buf = [0u16; 2];
                ch.encode_utf16(&mut buf)
                    .iter()
                    .map(|unit| format!("{:04X}", unit))
                    .collect()
            })
            .unwrap_or_else(|| "FFFD".to_string())
    }

    /// Sanitize a font name for use as a PDF name object.
    /// Strips spaces and special characters, appends weight/style suffixes.
    fn sanitize_font_name(family: &str, bold: bool, italic: bool) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();

        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if bold {
            name.push_str("-Bold");
        }
        if italic {
            name.push_str("-Italic");
        }

        name
    }

    /// Build the PDF content stream for the page.
    fn build_content_stream(&self, page: &RenderedPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for inst in &page.instructions {
            self.write_instruction(&mut stream, inst, page.height, builder);
        }
        stream
    }

    /// Write one draw instruction as a text object, one `Tj` per wrapped line.
    fn write_instruction(
        &self,
        stream: &mut String,
        inst: &DrawInstruction,
        page_height: f64,
        builder: &PdfBuilder,
    ) {
        let Some(index) = builder.font_order.iter().position(|k| *k == inst.variant) else {
            return;
        };
        let Some(font) = builder.fonts.get(&inst.variant) else {
            return;
        };
        if inst.lines.is_empty() {
            return;
        }

        let _ = write!(
            stream,
            "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n",
            inst.color.r, inst.color.g, inst.color.b, index, inst.font.size
        );

        // Td is relative to the previous line start within a text object.
        let (mut prev_x, mut prev_y) = (0.0, 0.0);
        for line in &inst.lines {
            let pdf_y = page_height - line.baseline;
            let _ = writeln!(stream, "{:.2} {:.2} Td", line.x - prev_x, pdf_y - prev_y);
            prev_x = line.x;
            prev_y = pdf_y;

            match &font.encoding {
                FontEncoding::Identity { char_to_gid } => {
                    let hex: String = line
                        .text
                        .chars()
                        .map(|ch| format!("{:04X}", char_to_gid.get(&ch).copied().unwrap_or(0)))
                        .collect();
                    let _ = writeln!(stream, "<{}> Tj", hex);
                }
                FontEncoding::WinAnsi => {
                    let _ = writeln!(stream, "({}) Tj", Self::encode_winansi(&line.text));
                }
            }
        }

        stream.push_str("ET\n");
    }

    /// Encode text as a WinAnsi literal string body, escaping as needed.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80),
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85),
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91),
            0x2019 => Some(0x92),
            0x201C => Some(0x93),
            0x201D => Some(0x94),
            0x2022 => Some(0x95), // bullet
            0x2013 => Some(0x96),
            0x2014 => Some(0x97),
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}
