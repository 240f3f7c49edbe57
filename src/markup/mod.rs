//! # Markdown Front End
//!
//! Turns Markdown source into the [`DocumentNode`] tree the layout engine
//! consumes. Only block structure matters to layout, so this is a line-based
//! block parser:
//!
//! - ATX headings (`# Title`) and Setext headings (`Title` over `===`/`---`)
//! - paragraphs: consecutive non-blank lines, joined with a space
//! - unordered (`-`, `*`, `+`) and ordered (`1.`, `1)`) lists, with indented
//!   continuation lines
//! - block quotes, parsed recursively into a container
//! - indented code blocks and thematic breaks, kept as containers with no
//!   drawable content
//!
//! Inline emphasis, code spans and links become tags in `inner_markup` and
//! disappear from `inner_text`. Heading levels 3 to 6 have no drawing rule and
//! come out as containers holding bare text.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{DocumentNode, NodeKind};

static ATX_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})(?:[ \t]+(.*?))?(?:[ \t]+#+)?[ \t]*$").expect("static pattern")
});
static SETEXT_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}=+[ \t]*$").expect("static pattern"));
static SETEXT_H2: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}-+[ \t]*$").expect("static pattern"));
static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(?:(?:\*[ \t]*){3,}|(?:-[ \t]*){3,}|(?:_[ \t]*){3,})$").expect("static pattern")
});
static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}[-*+][ \t]+(.*)$").expect("static pattern"));
static ORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}\d{1,9}[.)][ \t]+(.*)$").expect("static pattern"));
static BLOCK_QUOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}> ?(.*)$").expect("static pattern"));

static CODE_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("static pattern"));
static IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]*)[^)]*\)").expect("static pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]*)[^)]*\)").expect("static pattern"));
static STRONG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*\*([^*]+?)\*\*|__([^_]+?)__").expect("static pattern")
});
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\*([^*\s][^*]*?)\*|\b_([^_]+?)_\b").expect("static pattern")
});
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("static pattern"));

/// Parse Markdown source into a document tree rooted at a container node.
pub fn parse_markdown(source: &str) -> DocumentNode {
    let normalized = source.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = normalized.lines().collect();
    DocumentNode::root(parse_blocks(&lines))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

fn list_item(line: &str) -> Option<(ListKind, &str)> {
    if let Some(caps) = UNORDERED_ITEM.captures(line) {
        return caps.get(1).map(|m| (ListKind::Unordered, m.as_str()));
    }
    ORDERED_ITEM
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (ListKind::Ordered, m.as_str()))
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn is_indented(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

fn parse_blocks(lines: &[&str]) -> Vec<DocumentNode> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if is_blank(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            i += 1;
            continue;
        }

        // Setext underline closes the paragraph above it.
        if !paragraph.is_empty() {
            if SETEXT_H1.is_match(line) {
                let text = paragraph.join(" ");
                paragraph.clear();
                blocks.push(block(NodeKind::Heading1, &text));
                i += 1;
                continue;
            }
            if SETEXT_H2.is_match(line) {
                let text = paragraph.join(" ");
                paragraph.clear();
                blocks.push(block(NodeKind::Heading2, &text));
                i += 1;
                continue;
            }
        }

        if let Some(caps) = ATX_HEADING.captures(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let level = caps.get(1).map_or(1, |m| m.as_str().len());
            let text = caps.get(2).map_or("", |m| m.as_str());
            blocks.push(match level {
                1 => block(NodeKind::Heading1, text),
                2 => block(NodeKind::Heading2, text),
                _ => DocumentNode::container(vec![DocumentNode::text(&inline_text(text))]),
            });
            i += 1;
            continue;
        }

        if THEMATIC_BREAK.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(DocumentNode::container(vec![]));
            i += 1;
            continue;
        }

        if let Some((kind, _)) = list_item(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let (node, consumed) = parse_list(&lines[i..], kind);
            blocks.push(node);
            i += consumed;
            continue;
        }

        if BLOCK_QUOTE.is_match(line) {
            flush_paragraph(&mut paragraph, &mut blocks);
            let mut quoted = Vec::new();
            while i < lines.len() {
                match BLOCK_QUOTE.captures(lines[i]) {
                    Some(caps) => quoted.push(caps.get(1).map_or("", |m| m.as_str())),
                    None => break,
                }
                i += 1;
            }
            blocks.push(DocumentNode::container(parse_blocks(&quoted)));
            continue;
        }

        if paragraph.is_empty() && is_indented(line) {
            let mut code = Vec::new();
            while i < lines.len() && (is_indented(lines[i]) || is_blank(lines[i])) {
                code.push(lines[i].trim_start());
                i += 1;
            }
            let text = code.join("\n");
            blocks.push(DocumentNode::container(vec![DocumentNode::text(text.trim_end())]));
            continue;
        }

        paragraph.push(line.trim());
        i += 1;
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<DocumentNode>) {
    if paragraph.is_empty() {
        return;
    }
    let text = paragraph.join(" ");
    paragraph.clear();
    blocks.push(block(NodeKind::Paragraph, &text));
}

/// Collect consecutive items of one list kind. Returns the node and the
/// number of lines consumed.
fn parse_list(lines: &[&str], kind: ListKind) -> (DocumentNode, usize) {
    let mut items: Vec<String> = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if let Some((item_kind, text)) = list_item(line) {
            if item_kind != kind {
                break;
            }
            items.push(text.trim().to_string());
            i += 1;
            continue;
        }

        if is_blank(line) {
            // A blank line continues the list only if more of it follows.
            let next = lines[i + 1..].iter().position(|l| !is_blank(l)).map(|p| i + 1 + p);
            match next {
                Some(n) if matches!(list_item(lines[n]), Some((k, _)) if k == kind) || is_indented(lines[n]) => {
                    i = n;
                    continue;
                }
                _ => break,
            }
        }

        // Any other line that does not open a block continues the item.
        let opens_block = ATX_HEADING.is_match(line)
            || BLOCK_QUOTE.is_match(line)
            || THEMATIC_BREAK.is_match(line);
        if !opens_block {
            if let Some(last) = items.last_mut() {
                last.push(' ');
                last.push_str(line.trim());
                i += 1;
                continue;
            }
        }
        break;
    }

    let mut inner_markup = String::from("\n");
    let mut inner_text = String::from("\n");
    let mut children = Vec::with_capacity(items.len());
    for item in &items {
        let markup = inline_markup(item);
        let text = strip_tags(&markup);
        inner_markup.push_str(&format!("<li>{}</li>\n", markup));
        inner_text.push_str(&text);
        inner_text.push('\n');
        children.push(DocumentNode {
            kind: NodeKind::Generic,
            inner_text: text.clone(),
            inner_markup: markup,
            children: vec![DocumentNode::text(&text)],
        });
    }

    let node_kind = match kind {
        ListKind::Unordered => NodeKind::UnorderedList,
        ListKind::Ordered => NodeKind::OrderedList,
    };
    let node = DocumentNode {
        kind: node_kind,
        inner_text,
        inner_markup,
        children,
    };
    (node, i.max(1))
}

fn block(kind: NodeKind, source: &str) -> DocumentNode {
    let markup = inline_markup(source.trim());
    let text = strip_tags(&markup);
    DocumentNode {
        kind,
        inner_text: text.clone(),
        inner_markup: markup,
        children: vec![DocumentNode::text(&text)],
    }
}

/// Convert inline Markdown to tagged markup.
///
/// Literal `<`, `>` and `&` in the source are escaped first, so the only tags
/// in the result are the ones generated here. `&nbsp;` passes through.
pub fn inline_markup(source: &str) -> String {
    let escaped = escape_text(source);
    let s = CODE_SPAN.replace_all(&escaped, "<code>$1</code>");
    let s = IMAGE.replace_all(&s, "<img src=\"$2\" alt=\"$1\" />");
    let s = LINK.replace_all(&s, "<a href=\"$2\">$1</a>");
    let s = STRONG.replace_all(&s, "<strong>$1$2</strong>");
    let s = EMPHASIS.replace_all(&s, "<em>$1$2</em>");
    s.into_owned()
}

/// Visible text of inline Markdown.
pub fn inline_text(source: &str) -> String {
    strip_tags(&inline_markup(source))
}

fn escape_text(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for (i, ch) in source.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' if !source[i..].starts_with("&nbsp;") => out.push_str("&amp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn strip_tags(markup: &str) -> String {
    decode_entities(&TAG.replace_all(markup, "")).replace("&nbsp;", "\u{00A0}")
}

/// Undo the escaping done by [`inline_markup`]. `&nbsp;` is left alone.
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
