//! # Pagemark
//!
//! A single-page flow layout engine that turns Markdown into a positioned
//! PDF page.
//!
//! A document tree of headings, paragraphs and lists is placed top to bottom
//! with one vertical cursor. Each block draws at the cursor and moves it down
//! by a fixed or estimated amount. There is one page and no pagination:
//! whatever runs past the bottom margin is drawn where it lands.
//!
//! ## Architecture
//!
//! ```text
//! Markdown / JSON
//!       ↓
//!   [markup]   Markdown to document tree
//!   [model]    Document tree, geometry, config
//!       ↓
//!   [layout]   Block dispatch, cursor, list renderer
//!       ↓  (through the Canvas trait)
//!   [surface]  Measures with [font], wraps with [text], records draws
//!       ↓
//!   [pdf]      Serialize the rendered page to PDF bytes
//! ```

pub mod error;
pub mod font;
pub mod layout;
pub mod markup;
pub mod model;
pub mod pdf;
pub mod surface;
pub mod text;

use std::path::Path;

use error::PagemarkError;
use font::{FontContext, FontResolver};
use layout::FlowLayout;
use model::{DocumentNode, LayoutConfig, Metadata};
use pdf::PdfWriter;
use surface::{PageSurface, RenderedPage};

/// Lay out a document tree onto one page.
///
/// This is the primary entry point. The configuration is validated first,
/// then the cursor starts at the top margin and every top-level child of
/// `tree` is dispatched in order.
pub fn generate_page(
    tree: &DocumentNode,
    fonts: &FontContext,
    config: &LayoutConfig,
) -> Result<RenderedPage, PagemarkError> {
    config.validate()?;
    let layout = FlowLayout::new(config);
    let mut surface = PageSurface::new(layout.geometry(), fonts);
    let cursor = layout.layout(tree, &mut surface)?;
    log::info!(
        "page laid out: {} draw(s), cursor at y={:.1}",
        surface.instructions().len(),
        cursor.y()
    );
    Ok(surface.finish())
}

/// Build the font context for a configuration.
///
/// Config font entries are registered first, then any Arial faces found in
/// `font_dir`, which win on conflict.
pub fn build_font_context(
    config: &LayoutConfig,
    font_dir: Option<&Path>,
) -> Result<FontContext, PagemarkError> {
    let mut resolver = FontResolver::new();
    for entry in &config.fonts {
        resolver.register_entry(entry)?;
    }
    if let Some(dir) = font_dir {
        let loaded = resolver.load_dir(dir)?;
        if loaded == 0 {
            log::warn!("no Arial faces found in {}", dir.display());
        }
    }
    FontContext::from_resolver(resolver)
}

/// Render a document tree to PDF bytes.
pub fn render(
    tree: &DocumentNode,
    config: &LayoutConfig,
    metadata: &Metadata,
) -> Result<Vec<u8>, PagemarkError> {
    let fonts = build_font_context(config, None)?;
    let page = generate_page(tree, &fonts, config)?;
    PdfWriter::new().write(&page, metadata, &fonts)
}

/// Render Markdown source to PDF bytes.
pub fn render_markdown(
    source: &str,
    config: &LayoutConfig,
    metadata: &Metadata,
) -> Result<Vec<u8>, PagemarkError> {
    let tree = markup::parse_markdown(source);
    render(&tree, config, metadata)
}

/// Render a document tree described as JSON to PDF bytes.
pub fn render_json(
    json: &str,
    config: &LayoutConfig,
    metadata: &Metadata,
) -> Result<Vec<u8>, PagemarkError> {
    let tree = DocumentNode::from_json(json)?;
    render(&tree, config, metadata)
}
