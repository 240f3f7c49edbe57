//! List rendering.
//!
//! Lists arrive as raw inner markup (`<li>…</li>` fragments). Item extraction
//! is a small tokenizer kept behind [`split_list_items`] so the renderer only
//! ever sees plain item text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::PagemarkError;
use crate::layout::estimate_height;
use crate::markup::decode_entities;
use crate::model::*;
use crate::surface::Canvas;

/// Width of the box the bullet glyph is drawn in.
const BULLET_BOX_WIDTH: f64 = 20.0;
/// Horizontal offset of item text from the left margin.
const ITEM_INDENT: f64 = 15.0;

static RESIDUAL_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]+>|&nbsp;").expect("static pattern")
});

/// Split list markup into plain item texts, in source order.
///
/// Fragments that are only a closing list tag, and items that are blank once
/// tags and `&nbsp;` are removed, are dropped. Escaped `<`, `>` and `&` are
/// decoded.
pub fn split_list_items(markup: &str) -> Vec<String> {
    markup
        .split("<li>")
        .filter(|fragment| !fragment.is_empty())
        .filter(|fragment| !fragment.starts_with("</ul>") && !fragment.starts_with("</ol>"))
        .map(|fragment| {
            let plain = RESIDUAL_MARKUP.replace_all(fragment, "");
            decode_entities(&plain).trim().to_string()
        })
        .filter(|item| !item.is_empty())
        .collect()
}

/// The prefix drawn before the item at `index` among retained items.
pub fn bullet_glyph(style: BulletStyle, index: usize) -> Result<String, PagemarkError> {
    match style {
        BulletStyle::Dot => Ok("• ".to_string()),
        BulletStyle::Numbered => Ok(format!("{}. ", index)),
        BulletStyle::Dash => Err(PagemarkError::UnsupportedBullet { style }),
    }
}

/// Draw every item of a list starting at `start_y`. Returns the y below the
/// last item; the caller adds block spacing.
///
/// Bullet and text boxes are one measured line tall while the cursor moves
/// by the wrapped estimate, so a long item's extra lines can run into the
/// next item.
pub fn draw_list<C: Canvas>(
    canvas: &mut C,
    markup: &str,
    start_y: f64,
    font: &FontSpec,
    geometry: &PageGeometry,
    style: BulletStyle,
) -> Result<f64, PagemarkError> {
    let content_width = geometry.content_width();
    let left = geometry.margin_horizontal;
    let mut current_y = start_y;

    for (index, item) in split_list_items(markup).iter().enumerate() {
        let symbol = bullet_glyph(style, index)?;
        let line_height = canvas.measure(item, font).height;
        log::debug!("list item {} at y={:.1}: {:?}", index, current_y, item);

        canvas.draw_text(
            &symbol,
            font,
            Color::BLACK,
            Rect::new(left, current_y, BULLET_BOX_WIDTH, line_height),
            Alignment::TopLeft,
        );
        canvas.draw_text(
            item,
            font,
            Color::BLACK,
            Rect::new(left + ITEM_INDENT, current_y, content_width - ITEM_INDENT, line_height),
            Alignment::TopLeft,
        );

        current_y += estimate_height(&*canvas, item, font, content_width)?;
    }

    Ok(current_y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::tests::FixedCanvas;

    fn geometry() -> PageGeometry {
        LayoutConfig::default().geometry()
    }

    #[test]
    fn test_split_typical_markdown_output() {
        let items = split_list_items("\n<li>One</li>\n<li>Two</li>\n");
        assert_eq!(items, vec!["One", "Two"]);
    }

    #[test]
    fn test_split_zero_items() {
        assert!(split_list_items("").is_empty());
        assert!(split_list_items("\n  \n").is_empty());
    }

    #[test]
    fn test_split_strips_tags_and_nbsp() {
        let items = split_list_items("<li><strong>Bold</strong>&nbsp;item</li><li><a href=\"x\">link</a></li>");
        assert_eq!(items, vec!["Bolditem", "link"]);
    }

    #[test]
    fn test_split_skips_closing_fragments_and_blanks() {
        let items = split_list_items("<li>First</li><li>   </li><li>&nbsp;</li><li>Second</li></ul>");
        assert_eq!(items, vec!["First", "Second"]);
        assert!(split_list_items("</ol>").is_empty());
    }

    #[test]
    fn test_bullet_glyphs() {
        assert_eq!(bullet_glyph(BulletStyle::Dot, 7).unwrap(), "• ");
        assert_eq!(bullet_glyph(BulletStyle::Numbered, 0).unwrap(), "0. ");
        assert_eq!(bullet_glyph(BulletStyle::Numbered, 12).unwrap(), "12. ");
    }

    #[test]
    fn test_dash_is_an_invariant_error() {
        assert!(matches!(
            bullet_glyph(BulletStyle::Dash, 0),
            Err(PagemarkError::UnsupportedBullet { style: BulletStyle::Dash })
        ));

        let mut canvas = FixedCanvas::new(5.0, 14.0);
        let result = draw_list(
            &mut canvas,
            "<li>A</li>",
            30.0,
            &FontSpec::body(),
            &geometry(),
            BulletStyle::Dash,
        );
        assert!(result.is_err());
        assert!(canvas.draws.is_empty());
    }

    #[test]
    fn test_numbered_list_is_zero_based() {
        let mut canvas = FixedCanvas::new(5.0, 14.0);
        let markup = DocumentNode::ordered_list(&["A", "B", "C"]).inner_markup;
        draw_list(&mut canvas, &markup, 30.0, &FontSpec::body(), &geometry(), BulletStyle::Numbered)
            .unwrap();
        assert_eq!(canvas.texts(), vec!["0. ", "A", "1. ", "B", "2. ", "C"]);
    }

    #[test]
    fn test_blank_items_take_no_space_or_number() {
        let mut canvas = FixedCanvas::new(5.0, 14.0);
        let markup = DocumentNode::ordered_list(&["First", "   ", "Second"]).inner_markup;
        let end = draw_list(&mut canvas, &markup, 30.0, &FontSpec::body(), &geometry(), BulletStyle::Numbered)
            .unwrap();
        assert_eq!(canvas.texts(), vec!["0. ", "First", "1. ", "Second"]);
        assert_eq!(end, 30.0 + 2.0 * 14.0);
    }

    #[test]
    fn test_item_geometry() {
        let mut canvas = FixedCanvas::new(5.0, 14.0);
        draw_list(&mut canvas, "<li>One</li><li>Two</li>", 100.0, &FontSpec::body(), &geometry(), BulletStyle::Dot)
            .unwrap();
        assert_eq!(canvas.draws[0].1, Rect::new(30.0, 100.0, 20.0, 14.0));
        assert_eq!(canvas.draws[1].1, Rect::new(45.0, 100.0, 520.0, 14.0));
        assert_eq!(canvas.draws[2].1.y, 114.0);
    }

    #[test]
    fn test_long_item_advances_by_wrapped_estimate() {
        let mut canvas = FixedCanvas::new(10.0, 14.0);
        // 120 chars * 10 = 1200 over 535: 3 lines
        let long = "z".repeat(120);
        let markup = format!("<li>{}</li><li>next</li>", long);
        let end = draw_list(&mut canvas, &markup, 0.0, &FontSpec::body(), &geometry(), BulletStyle::Dot)
            .unwrap();
        // The box stays one line tall.
        assert_eq!(canvas.draws[1].1.height, 14.0);
        assert_eq!(canvas.draws[2].1.y, 42.0);
        assert_eq!(end, 56.0);
    }
}
