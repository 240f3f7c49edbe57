//! Integration tests for the pagemark pipeline.
//!
//! These tests exercise the public API from document tree (or Markdown) to
//! rendered page and PDF bytes. They verify:
//! - cursor positions for the reference A4 scenario
//! - list numbering and blank-item omission
//! - container pass-through and cursor monotonicity
//! - PDF output is structurally valid
//! - independent passes can share one font context

use pagemark::error::PagemarkError;
use pagemark::font::FontContext;
use pagemark::layout::{estimate_height, FlowLayout};
use pagemark::markup::parse_markdown;
use pagemark::model::*;
use pagemark::surface::{Canvas, PageSurface, TextSize};
use pagemark::{build_font_context, generate_page, render_json, render_markdown};

use proptest::prelude::*;

// ─── Helpers ────────────────────────────────────────────────────

/// Every character is 6pt wide and every line 14pt tall.
#[derive(Default)]
struct RecordingCanvas {
    draws: Vec<(String, Rect)>,
}

impl Canvas for RecordingCanvas {
    fn measure(&self, text: &str, _font: &FontSpec) -> TextSize {
        TextSize {
            width: text.chars().count() as f64 * 6.0,
            height: 14.0,
        }
    }

    fn draw_text(&mut self, text: &str, _font: &FontSpec, _color: Color, rect: Rect, _alignment: Alignment) {
        self.draws.push((text.to_string(), rect));
    }
}

impl RecordingCanvas {
    fn texts(&self) -> Vec<&str> {
        self.draws.iter().map(|(t, _)| t.as_str()).collect()
    }
}

fn reference_tree() -> DocumentNode {
    DocumentNode::root(vec![
        DocumentNode::heading1("Title"),
        DocumentNode::paragraph("Body"),
        DocumentNode::unordered_list(&["One", "Two"]),
    ])
}

fn pdf_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

// ─── Layout scenarios ───────────────────────────────────────────

#[test]
fn test_reference_scenario_with_real_fonts() {
    let config = LayoutConfig::default();
    let fonts = FontContext::new();
    let page = generate_page(&reference_tree(), &fonts, &config).unwrap();

    assert_eq!(page.width, 595.0);
    assert_eq!(page.height, 842.0);

    let placed: Vec<(&str, f64, f64)> = page
        .instructions
        .iter()
        .map(|i| (i.text.as_str(), i.rect.x, i.rect.y))
        .collect();

    // Heading at the top margin; paragraph one flat spacing below.
    assert_eq!(placed[0], ("Title", 30.0, 30.0));
    assert_eq!(placed[1], ("Body", 30.0, 60.0));

    // Body is one line of 12pt Helvetica metrics: 13.8 truncates to 13.
    let body_advance = 13.0 + 30.0;
    let first_item_y = 60.0 + body_advance;
    assert_eq!(placed[2], ("• ", 30.0, first_item_y));
    assert_eq!(placed[3], ("One", 45.0, first_item_y));
    assert_eq!(placed[4].0, "• ");
    assert_eq!(placed[5].0, "Two");
    assert!((placed[5].2 - (first_item_y + 13.8)).abs() < 1e-9);
    assert_eq!(page.instructions.len(), 6);
}

#[test]
fn test_reference_scenario_cursor() {
    let config = LayoutConfig::default();
    let layout = FlowLayout::new(&config);
    let mut canvas = RecordingCanvas::default();
    let cursor = layout.layout(&reference_tree(), &mut canvas).unwrap();

    // 30 + 30 (heading) + 14 + 30 (paragraph) = 104; two items end at 132.
    assert_eq!(canvas.draws[2].1.y, 104.0);
    assert_eq!(canvas.draws[4].1.y, 118.0);
    assert_eq!(cursor.y(), 132.0 + 30.0);
}

#[test]
fn test_ordered_list_numbering_starts_at_zero() {
    let config = LayoutConfig::default();
    let tree = DocumentNode::root(vec![DocumentNode::ordered_list(&["A", "B", "C"])]);
    let mut canvas = RecordingCanvas::default();
    FlowLayout::new(&config).layout(&tree, &mut canvas).unwrap();

    let bullets: Vec<&str> = canvas.texts().into_iter().step_by(2).collect();
    assert_eq!(bullets, vec!["0. ", "1. ", "2. "]);
}

#[test]
fn test_blank_list_items_are_omitted() {
    let config = LayoutConfig::default();
    let tree = DocumentNode::root(vec![DocumentNode::ordered_list(&["First", "   ", "Second"])]);
    let mut canvas = RecordingCanvas::default();
    FlowLayout::new(&config).layout(&tree, &mut canvas).unwrap();

    assert_eq!(canvas.texts(), vec!["0. ", "First", "1. ", "Second"]);
}

#[test]
fn test_blank_unordered_items_are_omitted() {
    let config = LayoutConfig::default();
    let tree = DocumentNode::root(vec![DocumentNode::unordered_list(&["First", "   ", "Second"])]);
    let mut canvas = RecordingCanvas::default();
    let cursor = FlowLayout::new(&config).layout(&tree, &mut canvas).unwrap();

    let lines: Vec<String> = canvas.texts().chunks(2).map(|pair| pair.concat()).collect();
    assert_eq!(lines, vec!["• First", "• Second"]);

    // Two retained items of one 14pt line each, then list spacing.
    let start = config.margin_vertical;
    assert_eq!(canvas.draws[2].1.y, start + 14.0);
    assert_eq!(cursor.y(), start + 2.0 * 14.0 + config.spacing_after_list);
}

#[test]
fn test_container_pass_through_is_equivalent() {
    let config = LayoutConfig::default();
    let layout = FlowLayout::new(&config);

    let flat = DocumentNode::root(vec![
        DocumentNode::heading2("Section"),
        DocumentNode::paragraph("Some text"),
    ]);
    let nested = DocumentNode::root(vec![DocumentNode::container(vec![DocumentNode::container(vec![
        DocumentNode::heading2("Section"),
        DocumentNode::paragraph("Some text"),
    ])])]);

    let mut a = RecordingCanvas::default();
    let mut b = RecordingCanvas::default();
    let end_a = layout.layout(&flat, &mut a).unwrap();
    let end_b = layout.layout(&nested, &mut b).unwrap();

    assert_eq!(a.draws, b.draws);
    assert_eq!(end_a, end_b);
}

#[test]
fn test_cursor_is_monotonic_across_blocks() {
    let config = LayoutConfig::default();
    let layout = FlowLayout::new(&config);
    let tree = DocumentNode::root(vec![
        DocumentNode::heading1("A"),
        DocumentNode::text("ignored"),
        DocumentNode::paragraph(&"long words ".repeat(40)),
        DocumentNode::unordered_list(&[]),
        DocumentNode::container(vec![]),
        DocumentNode::ordered_list(&["x", "y"]),
        DocumentNode::heading2("B"),
    ]);

    let mut canvas = RecordingCanvas::default();
    let mut cursor = LayoutCursor::at(config.margin_vertical);
    let mut previous = cursor.y();
    for node in &tree.children {
        layout.dispatch(node, &mut cursor, &mut canvas).unwrap();
        assert!(cursor.y() >= previous, "cursor moved up at {:?}", node.kind);
        previous = cursor.y();
    }
}

#[test]
fn test_zero_content_width_is_invalid_width() {
    let config = LayoutConfig {
        margin_horizontal: 297.5,
        ..LayoutConfig::default()
    };
    let tree = DocumentNode::root(vec![DocumentNode::paragraph("text")]);
    let result = generate_page(&tree, &FontContext::new(), &config);
    assert!(matches!(result, Err(PagemarkError::InvalidWidth { width }) if width == 0.0));
}

#[test]
fn test_negative_spacing_is_invalid_config() {
    let config = LayoutConfig {
        spacing_after_paragraph: -50.0,
        ..LayoutConfig::default()
    };
    let tree = DocumentNode::root(vec![DocumentNode::paragraph("text")]);
    let result = generate_page(&tree, &FontContext::new(), &config);
    assert!(matches!(result, Err(PagemarkError::InvalidConfig(_))));
}

#[test]
fn test_zero_body_font_size_is_invalid_config() {
    let mut config = LayoutConfig::default();
    config.body_font.size = 0.0;
    let tree = DocumentNode::root(vec![
        DocumentNode::paragraph("one"),
        DocumentNode::paragraph("two"),
    ]);
    let result = generate_page(&tree, &FontContext::new(), &config);
    assert!(matches!(result, Err(PagemarkError::InvalidConfig(_))));

    let json = r#"{ "bodyFont": { "family": "Arial", "size": 0 } }"#;
    assert!(matches!(
        LayoutConfig::from_json(json),
        Err(PagemarkError::InvalidConfig(_))
    ));
}

// ─── Markdown to PDF ────────────────────────────────────────────

#[test]
fn test_markdown_to_pdf() {
    let source = "# Title\n\nSome *body* text.\n\n- One\n- Two\n\n1. First\n2. Second\n";
    let metadata = Metadata {
        title: Some("Notes".to_string()),
        ..Metadata::default()
    };
    let bytes = render_markdown(source, &LayoutConfig::default(), &metadata).unwrap();
    let text = pdf_text(&bytes);

    assert!(bytes.starts_with(b"%PDF-1.7"));
    assert!(text.trim_end().ends_with("%%EOF"));
    assert!(text.contains("/Title (Notes)"));
    assert!(text.contains("/BaseFont /Helvetica-Bold"));
    assert!(text.contains("/BaseFont /Helvetica "));
}

#[test]
fn test_markdown_tree_matches_reference_layout() {
    let tree = parse_markdown("# Title\n\nBody\n\n- One\n- Two\n");
    let config = LayoutConfig::default();
    let fonts = FontContext::new();

    let from_markdown = generate_page(&tree, &fonts, &config).unwrap();
    let from_builders = generate_page(&reference_tree(), &fonts, &config).unwrap();

    let rects = |page: &pagemark::surface::RenderedPage| {
        page.instructions
            .iter()
            .map(|i| (i.text.clone(), i.rect))
            .collect::<Vec<_>>()
    };
    assert_eq!(rects(&from_markdown), rects(&from_builders));
}

#[test]
fn test_json_tree_to_pdf() {
    let json = r#"{
        "kind": "Generic",
        "children": [
            { "kind": "Heading1", "innerText": "Hello" },
            { "kind": "UnorderedList", "innerMarkup": "\n<li>a</li>\n" }
        ]
    }"#;
    let bytes = render_json(json, &LayoutConfig::default(), &Metadata::default()).unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7"));
}

#[test]
fn test_malformed_json_is_parse_error() {
    let result = render_json("{ \"kind\": ", &LayoutConfig::default(), &Metadata::default());
    assert!(matches!(result, Err(PagemarkError::ParseError { .. })));
}

#[test]
fn test_missing_font_dir_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let result = build_font_context(&LayoutConfig::default(), Some(&missing));
    assert!(matches!(result, Err(PagemarkError::FileNotFound { .. })));
}

#[test]
fn test_empty_font_dir_falls_back_to_standard_fonts() {
    let dir = tempfile::tempdir().unwrap();
    let fonts = build_font_context(&LayoutConfig::default(), Some(dir.path())).unwrap();
    assert!(!fonts.is_embedded(&fonts.variant(&FontSpec::body())));
}

#[test]
fn test_unparseable_font_file_is_font_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Arial.ttf"), b"not a font").unwrap();
    let result = build_font_context(&LayoutConfig::default(), Some(dir.path()));
    assert!(matches!(result, Err(PagemarkError::FontError(_))));
}

#[test]
fn test_pdf_written_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.pdf");
    let bytes = render_markdown("# Hi\n", &LayoutConfig::default(), &Metadata::default()).unwrap();
    std::fs::write(&path, &bytes).unwrap();

    let read_back = std::fs::read(&path).unwrap();
    assert_eq!(read_back, bytes);
    assert!(read_back.starts_with(b"%PDF"));
}

#[test]
fn test_config_from_json_changes_geometry() {
    let config = LayoutConfig::from_json(
        r#"{ "page": "Letter", "marginHorizontal": 50, "spacingAfterHeading1": 10 }"#,
    )
    .unwrap();
    let tree = DocumentNode::root(vec![DocumentNode::heading1("A"), DocumentNode::heading1("B")]);
    let page = generate_page(&tree, &FontContext::new(), &config).unwrap();

    assert_eq!((page.width, page.height), (612.0, 792.0));
    assert_eq!(page.instructions[0].rect.x, 50.0);
    assert_eq!(page.instructions[1].rect.y, 40.0);
}

// ─── Concurrency ────────────────────────────────────────────────

#[test]
fn test_independent_passes_share_font_context() {
    let fonts = FontContext::new();
    let config = LayoutConfig::default();
    let trees: Vec<DocumentNode> = (0..4)
        .map(|i| {
            DocumentNode::root(vec![
                DocumentNode::heading1(&format!("Doc {}", i)),
                DocumentNode::paragraph(&"text ".repeat(50 * (i + 1))),
                DocumentNode::ordered_list(&["a", "b"]),
            ])
        })
        .collect();

    let sequential: Vec<_> = trees
        .iter()
        .map(|t| generate_page(t, &fonts, &config).unwrap())
        .collect();

    let (fonts, config) = (&fonts, &config);
    let parallel: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = trees
            .iter()
            .map(|t| scope.spawn(move || generate_page(t, fonts, config).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, parallel);
}

// ─── Properties ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_estimate_positive_for_non_empty_text(text in "[a-zA-Z ]{1,200}", width in 10.0f64..600.0) {
        let fonts = FontContext::new();
        let surface = PageSurface::new(LayoutConfig::default().geometry(), &fonts);
        let height = estimate_height(&surface, &text, &FontSpec::body(), width).unwrap();
        prop_assert!(height > 0.0);
        prop_assert!(surface.measure(&text, &FontSpec::body()).height > 0.0);
    }

    #[test]
    fn prop_estimate_non_decreasing_in_length(text in "[a-zA-Z ]{0,200}", extra in "[a-zA-Z ]{0,50}") {
        let fonts = FontContext::new();
        let surface = PageSurface::new(LayoutConfig::default().geometry(), &fonts);
        let font = FontSpec::body();
        let longer = format!("{}{}", text, extra);
        let short = estimate_height(&surface, &text, &font, 535.0).unwrap();
        let long = estimate_height(&surface, &longer, &font, 535.0).unwrap();
        prop_assert!(long >= short);
    }

    #[test]
    fn prop_non_positive_width_fails(width in -1000.0f64..=0.0) {
        let canvas = RecordingCanvas::default();
        let result = estimate_height(&canvas, "text", &FontSpec::body(), width);
        prop_assert!(
            matches!(result, Err(PagemarkError::InvalidWidth { .. })),
            "width {} was accepted",
            width
        );
    }
}
