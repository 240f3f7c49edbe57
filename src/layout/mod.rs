//! # Flow Layout Engine
//!
//! Places blocks top to bottom on a single page.
//!
//! ## How It Works
//!
//! 1. Open a page surface and put the cursor at the top margin
//! 2. Dispatch each top-level node on its kind
//! 3. Headings draw and move the cursor by a flat spacing
//! 4. Paragraphs draw and move the cursor by their estimated wrapped height
//!    plus spacing
//! 5. Lists go through the list renderer, which moves the cursor per item
//! 6. Containers recurse; bare text draws nothing
//!
//! There is no pagination. Content past the bottom margin is drawn where it
//! falls.
//!
//! Wrapped height is an estimate: `ceil(width / available) * line_height`.
//! It ignores where words actually break, so it can be one line short for
//! text with long unbreakable words and one line long for text that barely
//! overflows. The drawn lines come from the real line breaker in
//! [`crate::text`], so the two can disagree. The cursor follows the estimate.

pub mod list;

use crate::error::PagemarkError;
use crate::model::*;
use crate::surface::Canvas;

pub use list::{bullet_glyph, draw_list, split_list_items};

/// Estimate the height of `text` wrapped to `available_width`.
pub fn estimate_height<C>(
    canvas: &C,
    text: &str,
    font: &FontSpec,
    available_width: f64,
) -> Result<f64, PagemarkError>
where
    C: Canvas + ?Sized,
{
    if !(available_width.is_finite() && available_width > 0.0) {
        return Err(PagemarkError::InvalidWidth {
            width: available_width,
        });
    }

    let size = canvas.measure(text, font);
    let lines = (size.width / available_width).ceil();
    log::debug!("estimated {} line(s) for {:?}", lines, text);

    Ok(lines * size.height)
}

/// The block dispatcher and page driver for one layout configuration.
pub struct FlowLayout<'a> {
    config: &'a LayoutConfig,
    geometry: PageGeometry,
}

impl<'a> FlowLayout<'a> {
    pub fn new(config: &'a LayoutConfig) -> Self {
        Self {
            config,
            geometry: config.geometry(),
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Lay out the top-level children of `root` onto `canvas`.
    ///
    /// Returns the cursor after the last block.
    pub fn layout<C: Canvas>(
        &self,
        root: &DocumentNode,
        canvas: &mut C,
    ) -> Result<LayoutCursor, PagemarkError> {
        let mut cursor = LayoutCursor::at(self.geometry.margin_vertical);

        for node in &root.children {
            self.dispatch(node, &mut cursor, canvas)?;
        }

        if cursor.y() > self.geometry.height {
            log::info!(
                "content ends at y={:.1}, past the page height {:.1}",
                cursor.y(),
                self.geometry.height
            );
        }

        Ok(cursor)
    }

    /// Draw one node and advance the cursor past it.
    pub fn dispatch<C: Canvas>(
        &self,
        node: &DocumentNode,
        cursor: &mut LayoutCursor,
        canvas: &mut C,
    ) -> Result<(), PagemarkError> {
        match node.kind {
            NodeKind::Heading1 => {
                self.draw_block(canvas, &node.inner_text, &self.config.heading1_font, cursor);
                cursor.advance(self.config.spacing_after_heading1);
            }

            NodeKind::Heading2 => {
                self.draw_block(canvas, &node.inner_text, &self.config.heading2_font, cursor);
                cursor.advance(self.config.spacing_after_heading2);
            }

            NodeKind::Paragraph => {
                let font = &self.config.body_font;
                self.draw_block(canvas, &node.inner_text, font, cursor);
                let height = estimate_height(
                    &*canvas,
                    &node.inner_text,
                    font,
                    self.geometry.content_width(),
                )?;
                // The cursor moves in whole units.
                cursor.advance(height.trunc() + self.config.spacing_after_paragraph);
            }

            NodeKind::UnorderedList => self.layout_list(node, BulletStyle::Dot, cursor, canvas)?,

            NodeKind::OrderedList => {
                self.layout_list(node, BulletStyle::Numbered, cursor, canvas)?
            }

            NodeKind::Generic => {
                for child in &node.children {
                    self.dispatch(child, cursor, canvas)?;
                }
            }

            NodeKind::Text => {}
        }

        Ok(())
    }

    fn draw_block<C: Canvas>(
        &self,
        canvas: &mut C,
        text: &str,
        font: &FontSpec,
        cursor: &LayoutCursor,
    ) {
        let rect = Rect::new(
            self.geometry.margin_horizontal,
            cursor.y(),
            self.geometry.content_width(),
            self.geometry.height,
        );
        canvas.draw_text(text, font, Color::BLACK, rect, Alignment::TopLeft);
    }

    fn layout_list<C: Canvas>(
        &self,
        node: &DocumentNode,
        style: BulletStyle,
        cursor: &mut LayoutCursor,
        canvas: &mut C,
    ) -> Result<(), PagemarkError> {
        let end_y = draw_list(
            canvas,
            &node.inner_markup,
            cursor.y(),
            &self.config.body_font,
            &self.geometry,
            style,
        )?;
        cursor.move_to(end_y.trunc() + self.config.spacing_after_list);
        Ok(())
    }
}
