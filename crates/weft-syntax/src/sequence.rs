//! Layout-preserving insertion into array, object and import lists.
//!
//! Items are rendered by the caller relative to column zero. The builders
//! here decide where they go and how they are separated so the surrounding
//! literal keeps its shape: an empty literal expands to one item per line,
//! a multi-line literal reuses the indentation of its first item, and a
//! single-line literal stays on one line.

use tree_sitter::Node;

use crate::document::{SourceDocument, TextEdit};
use crate::position::{line_indent, line_start, reindent};
use crate::query::sequence_items;

/// Indentation unit used when a literal has no items to copy it from.
pub const INDENT_UNIT: &str = "  ";

/// Where new items go relative to existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Placement {
    /// After the last existing item.
    #[default]
    Append,
    /// Before the first existing item.
    Prepend,
}

/// How an empty literal is expanded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// One item per line with a trailing comma.
    #[default]
    Multiline,
    /// All items on the delimiter's line, as in `{ a, b }`.
    Inline,
}

/// Builds the edit inserting `items` into the delimited `literal`.
///
/// `literal` must be a node whose first and last bytes are its delimiters,
/// such as `array`, `object` or `named_imports`. Returns `None` when there is
/// nothing to insert.
#[must_use]
pub fn insert_items(
    doc: &SourceDocument,
    literal: Node<'_>,
    items: &[String],
    placement: Placement,
    layout: Layout,
) -> Option<TextEdit> {
    if items.is_empty() {
        return None;
    }
    let existing = sequence_items(literal);
    match (existing.first(), existing.last()) {
        (Some(first), Some(last)) => Some(insert_beside(doc, literal, *first, *last, items, placement)),
        _ => Some(fill_empty(doc, literal, items, layout)),
    }
}

fn fill_empty(doc: &SourceDocument, literal: Node<'_>, items: &[String], layout: Layout) -> TextEdit {
    let source = doc.text();
    let open = literal.start_byte().saturating_add(1);
    let close = literal.end_byte().saturating_sub(1);

    // Comments inside an otherwise empty literal stay in front of the items.
    let mut cursor = literal.walk();
    let start = literal
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "comment")
        .map(|comment| comment.end_byte())
        .max()
        .unwrap_or(open);

    let body = match layout {
        Layout::Inline => format!(" {} ", items.join(", ")),
        Layout::Multiline => {
            let base = line_indent(source, literal.start_byte());
            let inner = format!("{base}{INDENT_UNIT}");
            let mut body: String = items
                .iter()
                .map(|item| format!("\n{inner}{},", reindent(item, &inner)))
                .collect();
            body.push('\n');
            body.push_str(base);
            body
        }
    };
    TextEdit::replace(start..close.max(start), body)
}

fn insert_beside(
    doc: &SourceDocument,
    literal: Node<'_>,
    first: Node<'_>,
    last: Node<'_>,
    items: &[String],
    placement: Placement,
) -> TextEdit {
    let source = doc.text();
    let multiline = line_start(source, first.start_byte()) != line_start(source, literal.start_byte());
    let indent = if multiline {
        line_indent(source, first.start_byte()).to_owned()
    } else {
        line_indent(source, literal.start_byte()).to_owned()
    };

    match placement {
        Placement::Append => {
            let text: String = items
                .iter()
                .map(|item| {
                    if multiline {
                        format!(",\n{indent}{}", reindent(item, &indent))
                    } else {
                        format!(", {}", reindent(item, &indent))
                    }
                })
                .collect();
            TextEdit::insert_at(last.end_byte(), text)
        }
        Placement::Prepend => {
            let text: String = items
                .iter()
                .map(|item| {
                    if multiline {
                        format!("{},\n{indent}", reindent(item, &indent))
                    } else {
                        format!("{}, ", reindent(item, &indent))
                    }
                })
                .collect();
            TextEdit::insert_at(first.start_byte(), text)
        }
    }
}

/// Builds the edit replacing `item` with `text`.
///
/// Continuation lines of `text` are indented like the line `item` starts on.
#[must_use]
pub fn replace_item(doc: &SourceDocument, item: Node<'_>, text: &str) -> TextEdit {
    let indent = line_indent(doc.text(), item.start_byte());
    TextEdit::replace(item.byte_range(), reindent(text, indent))
}

/// Renders a property holding a fresh literal built along `path`.
///
/// `property_chain(&["tests", "suites"], Delimiter::Array, &items)` yields
/// `tests: {\n  suites: [\n    ...,\n  ],\n}` relative to column zero.
#[must_use]
pub fn property_chain(path: &[String], delimiter: Delimiter, items: &[String]) -> Option<String> {
    let (head, rest) = path.split_first()?;
    let value = if rest.is_empty() {
        delimiter.render(items)
    } else {
        let nested = property_chain(rest, delimiter, items)?;
        Delimiter::Object.render(&[nested])
    };
    Some(format!(
        "{}: {value}",
        crate::query::property_key_source(head)
    ))
}

/// Literal delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `[ ... ]`
    Array,
    /// `{ ... }`
    Object,
}

impl Delimiter {
    /// Renders a literal of this kind holding `items`, one per line.
    #[must_use]
    pub fn render(self, items: &[String]) -> String {
        let (open, close) = match self {
            Self::Array => ('[', ']'),
            Self::Object => ('{', '}'),
        };
        if items.is_empty() {
            return format!("{open}{close}");
        }
        let body: String = items
            .iter()
            .map(|item| format!("\n{INDENT_UNIT}{},", reindent(item, INDENT_UNIT)))
            .collect();
        format!("{open}{body}\n{close}")
    }

    /// Tree-sitter node kind of this literal.
    #[must_use]
    pub const fn node_kind(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn apply(source: &str, kind: &str, items: &[&str], placement: Placement) -> String {
        let mut doc = SourceDocument::parse("start/kernel.ts", source).expect("parse");
        let items: Vec<String> = items.iter().map(|item| (*item).to_owned()).collect();
        let edit = {
            let literal = doc
                .find_all(|node| node.kind() == kind)
                .into_iter()
                .next()
                .expect("literal");
            insert_items(&doc, literal, &items, placement, Layout::Multiline).expect("edit")
        };
        doc.apply(&edit).expect("apply");
        doc.text().to_owned()
    }

    #[test]
    fn empty_array_expands_one_item_per_line() {
        let output = apply("router.use([])", "array", &["a()", "b()"], Placement::Append);
        assert_eq!(output, "router.use([\n  a(),\n  b(),\n])");
    }

    #[test]
    fn empty_object_in_indented_position_uses_line_indent() {
        let output = apply(
            "function f() {\n  return {}\n}",
            "object",
            &["a: 1"],
            Placement::Append,
        );
        assert_eq!(output, "function f() {\n  return {\n    a: 1,\n  }\n}");
    }

    #[rstest]
    #[case("x([\n  a,\n])", "x([\n  a,\n  b,\n])")]
    #[case("x([\n  a\n])", "x([\n  a,\n  b\n])")]
    #[case("x([a])", "x([a, b])")]
    fn append_follows_existing_layout(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(apply(source, "array", &["b"], Placement::Append), expected);
    }

    #[rstest]
    #[case("x([\n  a,\n])", "x([\n  b,\n  a,\n])")]
    #[case("x([a])", "x([b, a])")]
    fn prepend_places_items_before_first(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(apply(source, "array", &["b"], Placement::Prepend), expected);
    }

    #[test]
    fn nested_item_is_reindented() {
        let output = apply(
            "export default {\n  a: 1,\n}",
            "object",
            &["plugins: [\n  vue(),\n]"],
            Placement::Append,
        );
        assert_eq!(
            output,
            "export default {\n  a: 1,\n  plugins: [\n    vue(),\n  ],\n}"
        );
    }

    #[test]
    fn replace_item_reindents_continuation_lines() {
        let mut doc = SourceDocument::parse("adonisrc.ts", "x({\n  a: 1,\n})").expect("parse");
        let edit = {
            let pair = doc
                .find_all(|node| node.kind() == "pair")
                .into_iter()
                .next()
                .expect("pair");
            replace_item(&doc, pair, "a: {\n  b: 2,\n}")
        };
        doc.apply(&edit).expect("apply");
        assert_eq!(doc.text(), "x({\n  a: {\n    b: 2,\n  },\n})");
    }

    #[test]
    fn comment_in_empty_literal_is_kept() {
        let output = apply("x([\n  // keep\n])", "array", &["a"], Placement::Append);
        assert_eq!(output, "x([\n  // keep\n  a,\n])");
    }

    #[test]
    fn property_chain_nests_objects() {
        let rendered = property_chain(
            &[String::from("tests"), String::from("suites")],
            Delimiter::Array,
            &[String::from("{ name: 'unit' }")],
        )
        .expect("chain");
        assert_eq!(rendered, "tests: {\n  suites: [\n    { name: 'unit' },\n  ],\n}");
    }
}
