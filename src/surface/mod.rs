//! # Page Surface
//!
//! The drawing capability the layout engine talks to. [`Canvas`] is the
//! boundary: measure a string, or place a string in a rectangle. The layout
//! engine never looks behind it.
//!
//! [`PageSurface`] is the production canvas. It measures with a
//! [`FontContext`], wraps drawn text into lines, and records every placement
//! as a [`DrawInstruction`]. Finishing the surface yields the
//! [`RenderedPage`] handed to the PDF writer.

use serde::Serialize;

use crate::font::{FontContext, VariantKey};
use crate::model::{Alignment, Color, FontSpec, PageGeometry, Rect};
use crate::text::wrap_lines;

/// Unwrapped single-line size of a string.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextSize {
    pub width: f64,
    pub height: f64,
}

/// Measuring and drawing text on one page.
pub trait Canvas {
    /// Size of `text` set on one line in `font`. Deterministic.
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize;

    /// Place `text` inside `rect`.
    fn draw_text(&mut self, text: &str, font: &FontSpec, color: Color, rect: Rect, alignment: Alignment);
}

/// One wrapped line of a draw instruction, in page coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    /// Baseline position measured from the top of the page.
    pub baseline: f64,
    pub width: f64,
}

/// A positioned text placement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawInstruction {
    pub text: String,
    pub font: FontSpec,
    /// Face the text was measured with.
    pub variant: VariantKey,
    /// Whether `variant` was a registered TrueType face.
    pub embedded: bool,
    pub color: Color,
    pub rect: Rect,
    pub alignment: Alignment,
    pub lines: Vec<TextLine>,
}

/// A finished page: its size and everything drawn on it, in draw order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub width: f64,
    pub height: f64,
    pub instructions: Vec<DrawInstruction>,
}

impl RenderedPage {
    /// Layout dump for debugging, as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Canvas backed by real font metrics that records draw instructions.
pub struct PageSurface<'a> {
    geometry: PageGeometry,
    fonts: &'a FontContext,
    instructions: Vec<DrawInstruction>,
}

impl<'a> PageSurface<'a> {
    pub fn new(geometry: PageGeometry, fonts: &'a FontContext) -> Self {
        Self {
            geometry,
            fonts,
            instructions: Vec::new(),
        }
    }

    pub fn instructions(&self) -> &[DrawInstruction] {
        &self.instructions
    }

    pub fn finish(self) -> RenderedPage {
        RenderedPage {
            width: self.geometry.width,
            height: self.geometry.height,
            instructions: self.instructions,
        }
    }
}

impl Canvas for PageSurface<'_> {
    fn measure(&self, text: &str, font: &FontSpec) -> TextSize {
        let (width, height) = self.fonts.measure(text, font);
        TextSize { width, height }
    }

    fn draw_text(&mut self, text: &str, font: &FontSpec, color: Color, rect: Rect, alignment: Alignment) {
        let line_height = self.fonts.measure("", font).1;
        let ascent = self.fonts.ascent(font);
        let fonts = self.fonts;

        // Lines are not clipped to the rectangle height.
        let lines = wrap_lines(text, rect.width, |ch| fonts.char_width(ch, font))
            .into_iter()
            .enumerate()
            .map(|(i, line)| TextLine {
                text: line.text,
                x: rect.x,
                baseline: rect.y + i as f64 * line_height + ascent,
                width: line.width,
            })
            .collect::<Vec<_>>();

        log::trace!(
            "draw {:?} at ({:.1}, {:.1}) in {} line(s)",
            text,
            rect.x,
            rect.y,
            lines.len()
        );

        let variant = fonts.variant(font);
        self.instructions.push(DrawInstruction {
            text: text.to_string(),
            font: font.clone(),
            embedded: fonts.is_embedded(&variant),
            variant,
            color,
            rect,
            alignment,
            lines,
        });
    }
}
