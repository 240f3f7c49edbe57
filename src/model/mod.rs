//! # Document Model
//!
//! The input representation for the layout engine. A document is a tree of
//! block nodes as produced by the Markdown front end in [`crate::markup`], or
//! deserialized directly from JSON.
//!
//! The tree is deliberately flat in vocabulary: two heading levels,
//! paragraphs, the two list kinds, bare text, and a generic container for
//! everything else. The layout engine reads it and never mutates it.

use serde::{Deserialize, Serialize};

use crate::error::PagemarkError;

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentNode {
    pub kind: NodeKind,

    /// Visible text of this node and its descendants, markup stripped.
    #[serde(default)]
    pub inner_text: String,

    /// Raw markup of the children. Only list nodes consult it.
    #[serde(default)]
    pub inner_markup: String,

    #[serde(default)]
    pub children: Vec<DocumentNode>,
}

/// Block kinds the dispatcher understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Heading1,
    Heading2,
    Paragraph,
    UnorderedList,
    OrderedList,
    Text,
    /// A container or any element without its own drawing rule.
    Generic,
}

impl DocumentNode {
    /// An empty container, typically the document root.
    pub fn root(children: Vec<DocumentNode>) -> Self {
        Self::container(children)
    }

    pub fn container(children: Vec<DocumentNode>) -> Self {
        let inner_text = children.iter().map(|c| c.inner_text.as_str()).collect();
        Self {
            kind: NodeKind::Generic,
            inner_text,
            inner_markup: String::new(),
            children,
        }
    }

    pub fn heading1(text: &str) -> Self {
        Self::leaf(NodeKind::Heading1, text)
    }

    pub fn heading2(text: &str) -> Self {
        Self::leaf(NodeKind::Heading2, text)
    }

    pub fn paragraph(text: &str) -> Self {
        Self::leaf(NodeKind::Paragraph, text)
    }

    pub fn text(text: &str) -> Self {
        Self {
            kind: NodeKind::Text,
            inner_text: text.to_string(),
            inner_markup: text.to_string(),
            children: vec![],
        }
    }

    /// A list node whose markup is built from plain item strings.
    pub fn unordered_list(items: &[&str]) -> Self {
        Self::list(NodeKind::UnorderedList, items)
    }

    pub fn ordered_list(items: &[&str]) -> Self {
        Self::list(NodeKind::OrderedList, items)
    }

    fn leaf(kind: NodeKind, text: &str) -> Self {
        Self {
            kind,
            inner_text: text.to_string(),
            inner_markup: text.to_string(),
            children: vec![DocumentNode::text(text)],
        }
    }

    fn list(kind: NodeKind, items: &[&str]) -> Self {
        let mut inner_markup = String::from("\n");
        for item in items {
            inner_markup.push_str("<li>");
            inner_markup.push_str(item);
            inner_markup.push_str("</li>\n");
        }
        let inner_text = items
            .iter()
            .map(|item| format!("\n{}", item))
            .collect::<String>()
            + "\n";
        Self {
            kind,
            inner_text,
            inner_markup,
            children: vec![],
        }
    }

    /// Parse a document tree from JSON.
    pub fn from_json(json: &str) -> Result<Self, PagemarkError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Immutable per-page constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    /// Left and right margin.
    pub margin_horizontal: f64,
    /// Top margin; the cursor starts here.
    pub margin_vertical: f64,
}

impl PageGeometry {
    /// Width available to a block between the horizontal margins.
    pub fn content_width(&self) -> f64 {
        self.width - 2.0 * self.margin_horizontal
    }
}

/// Current vertical write position on the page.
///
/// One cursor belongs to one layout pass. It only moves down.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct LayoutCursor {
    y: f64,
}

impl LayoutCursor {
    pub fn at(y: f64) -> Self {
        Self { y }
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Move the cursor down by `dy`. Negative amounts leave it in place.
    pub fn advance(&mut self, dy: f64) {
        self.y += dy.max(0.0);
    }

    /// Move the cursor to `y`. A target above the current position is ignored.
    pub fn move_to(&mut self, y: f64) {
        self.y = self.y.max(y);
    }
}

/// A font request: family, point size, weight and slant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: &str, size: f64, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            size,
            bold,
            italic,
        }
    }

    pub fn body() -> Self {
        Self::new("Arial", 12.0, false, false)
    }

    pub fn heading1() -> Self {
        Self::new("Arial", 20.0, true, false)
    }

    pub fn heading2() -> Self {
        Self::new("Arial", 16.0, true, false)
    }
}

/// Glyph scheme used to prefix list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletStyle {
    /// `"• "`, used for unordered lists.
    Dot,
    /// `"<index>. "` with a 0-based index.
    Numbered,
    /// Reserved for a future unordered style. Not drawn yet.
    Dash,
}

/// RGB fill color, components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
}

/// An axis-aligned rectangle in page units, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Text placement inside its rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    TopLeft,
}

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.0, 842.0),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// A custom font to register with the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name (e.g. "Arial").
    pub family: String,
    /// Base64-encoded font data, or a data URI (e.g. "data:font/ttf;base64,...").
    pub src: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

/// Layout and page configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub page: PageSize,
    pub margin_horizontal: f64,
    pub margin_vertical: f64,
    pub spacing_after_heading1: f64,
    pub spacing_after_heading2: f64,
    pub spacing_after_paragraph: f64,
    pub spacing_after_list: f64,
    pub body_font: FontSpec,
    pub heading1_font: FontSpec,
    pub heading2_font: FontSpec,
    pub fonts: Vec<FontEntry>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            page: PageSize::A4,
            margin_horizontal: 30.0,
            margin_vertical: 30.0,
            spacing_after_heading1: 30.0,
            spacing_after_heading2: 30.0,
            spacing_after_paragraph: 30.0,
            spacing_after_list: 30.0,
            body_font: FontSpec::body(),
            heading1_font: FontSpec::heading1(),
            heading2_font: FontSpec::heading2(),
            fonts: vec![],
        }
    }
}

impl LayoutConfig {
    /// Parse a configuration from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, PagemarkError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the layout cannot honor: negative or non-finite margins
    /// and spacings, non-positive font sizes and page dimensions.
    pub fn validate(&self) -> Result<(), PagemarkError> {
        let lengths = [
            ("marginHorizontal", self.margin_horizontal),
            ("marginVertical", self.margin_vertical),
            ("spacingAfterHeading1", self.spacing_after_heading1),
            ("spacingAfterHeading2", self.spacing_after_heading2),
            ("spacingAfterParagraph", self.spacing_after_paragraph),
            ("spacingAfterList", self.spacing_after_list),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(PagemarkError::InvalidConfig(format!(
                    "{name} must be a finite, non-negative number, got {value}"
                )));
            }
        }

        let fonts = [
            ("bodyFont", &self.body_font),
            ("heading1Font", &self.heading1_font),
            ("heading2Font", &self.heading2_font),
        ];
        for (name, font) in fonts {
            if !font.size.is_finite() || font.size <= 0.0 {
                return Err(PagemarkError::InvalidConfig(format!(
                    "{name}.size must be positive, got {}",
                    font.size
                )));
            }
        }

        let (width, height) = self.page.dimensions();
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(PagemarkError::InvalidConfig(format!(
                "page must have positive dimensions, got {width}x{height}"
            )));
        }
        Ok(())
    }

    pub fn geometry(&self) -> PageGeometry {
        let (width, height) = self.page.dimensions();
        PageGeometry {
            width,
            height,
            margin_horizontal: self.margin_horizontal,
            margin_vertical: self.margin_vertical,
        }
    }
}

/// Document metadata embedded in the PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}
