//! In-memory structured source documents.
//!
//! A [`SourceDocument`] owns the text of one source file together with its
//! syntax tree. Callers locate nodes through [`SourceDocument::find_all`] or
//! the helpers in [`crate::query`], turn them into owned [`TextEdit`] values,
//! and apply those edits. Every applied edit re-parses the document so the
//! next lookup sees the updated tree.

use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::SyntaxError;
use crate::language::SourceLanguage;
use crate::parser::{ParseResult, Parser, SyntaxErrorInfo};

/// A single replacement of a byte range with new text.
///
/// Insertions are zero-length ranges; deletions carry empty text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    range: Range<usize>,
    new_text: String,
}

impl TextEdit {
    /// Builds an edit replacing `range` with `new_text`.
    #[must_use]
    pub fn replace(range: Range<usize>, new_text: impl Into<String>) -> Self {
        Self {
            range,
            new_text: new_text.into(),
        }
    }

    /// Builds an insertion at `offset`.
    #[must_use]
    pub fn insert_at(offset: usize, new_text: impl Into<String>) -> Self {
        Self::replace(offset..offset, new_text)
    }

    /// Byte range being replaced.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Replacement text.
    #[must_use]
    pub fn new_text(&self) -> &str {
        &self.new_text
    }
}

/// Parsed source file held in memory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    parsed: ParseResult,
    original: String,
}

impl SourceDocument {
    /// Parses `source` as the contents of `path`.
    ///
    /// The language is detected from the path's extension.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::UnknownLanguage`] when the extension is not a
    /// supported source language, or a parser error if Tree-sitter fails.
    pub fn parse(path: impl Into<PathBuf>, source: impl Into<String>) -> Result<Self, SyntaxError> {
        let path = path.into();
        let language = SourceLanguage::from_path(&path)
            .ok_or_else(|| SyntaxError::unknown_language(path.clone()))?;
        Self::parse_as(path, language, source)
    }

    /// Parses `source` with an explicit language.
    ///
    /// # Errors
    ///
    /// Returns a parser error if Tree-sitter fails to build a tree.
    pub fn parse_as(
        path: impl Into<PathBuf>,
        language: SourceLanguage,
        source: impl Into<String>,
    ) -> Result<Self, SyntaxError> {
        let original = source.into();
        let parsed = Parser::new(language)?.parse(&original)?;
        Ok(Self {
            path: path.into(),
            parsed,
            original,
        })
    }

    /// Path the document was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Language of the document.
    #[must_use]
    pub const fn language(&self) -> SourceLanguage {
        self.parsed.language()
    }

    /// Current text of the document.
    #[must_use]
    pub fn text(&self) -> &str {
        self.parsed.source()
    }

    /// Text the document was parsed from before any edit was applied.
    #[must_use]
    pub fn original_text(&self) -> &str {
        &self.original
    }

    /// Returns whether applied edits changed the text.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.text() != self.original
    }

    /// Root node of the current syntax tree.
    #[must_use]
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.parsed.root_node()
    }

    /// Syntax errors present in the current tree.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        self.parsed.errors()
    }

    /// Returns whether the current tree contains syntax errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.parsed.has_errors()
    }

    /// Text covered by `node`.
    #[must_use]
    pub fn node_text(&self, node: tree_sitter::Node<'_>) -> &str {
        self.text().get(node.byte_range()).unwrap_or_default()
    }

    /// Collects every node, in document order, for which `predicate` holds.
    pub fn find_all<F>(&self, predicate: F) -> Vec<tree_sitter::Node<'_>>
    where
        F: Fn(tree_sitter::Node<'_>) -> bool,
    {
        let mut found = Vec::new();
        let mut cursor = self.root().walk();
        let mut descending = true;
        loop {
            if descending {
                let node = cursor.node();
                if predicate(node) {
                    found.push(node);
                }
                if cursor.goto_first_child() {
                    continue;
                }
            }
            if cursor.goto_next_sibling() {
                descending = true;
                continue;
            }
            if !cursor.goto_parent() {
                break;
            }
            descending = false;
        }
        found
    }

    /// Applies one edit and re-parses the document.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidEdit`] if the range falls outside the
    /// text or splits a UTF-8 code point.
    pub fn apply(&mut self, edit: &TextEdit) -> Result<(), SyntaxError> {
        let mut text = self.text().to_owned();
        splice(&mut text, edit)?;
        self.reparse(&text)
    }

    /// Applies a batch of non-overlapping edits computed against the current
    /// tree, then re-parses once.
    ///
    /// Edits are spliced from the end of the document towards the start so
    /// earlier offsets stay valid.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::InvalidEdit`] for out-of-range or overlapping
    /// edits. The document is left unchanged in that case.
    pub fn apply_all(&mut self, edits: &[TextEdit]) -> Result<(), SyntaxError> {
        let mut sorted: Vec<&TextEdit> = edits.iter().collect();
        sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));

        let mut text = self.text().to_owned();
        let mut floor = text.len();
        for edit in sorted {
            if edit.range.end > floor {
                return Err(SyntaxError::invalid_edit(
                    edit.range.start,
                    edit.range.end,
                    text.len(),
                ));
            }
            splice(&mut text, edit)?;
            floor = edit.range.start;
        }
        self.reparse(&text)
    }

    fn reparse(&mut self, text: &str) -> Result<(), SyntaxError> {
        self.parsed = Parser::new(self.language())?.parse(text)?;
        Ok(())
    }
}

fn splice(text: &mut String, edit: &TextEdit) -> Result<(), SyntaxError> {
    let Range { start, end } = edit.range;
    if start > end
        || end > text.len()
        || !text.is_char_boundary(start)
        || !text.is_char_boundary(end)
    {
        return Err(SyntaxError::invalid_edit(start, end, text.len()));
    }
    text.replace_range(start..end, &edit.new_text);
    Ok(())
}
