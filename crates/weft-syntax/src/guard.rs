//! Syntactic validation of edited documents.
//!
//! Anchored insertions splice text into files that may already contain
//! syntax errors the user has not fixed yet. [`SyntaxGuard`] therefore does
//! not demand an error-free tree; it rejects an edit only when the edited
//! document carries more errors than the text it started from.

use std::path::PathBuf;

use crate::document::SourceDocument;
use crate::parser::Parser;

/// A syntax error introduced by an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    /// Path to the affected file.
    pub path: PathBuf,
    /// Line number (one-based).
    pub line: u32,
    /// Column number (one-based).
    pub column: u32,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.path.display(),
            self.line,
            self.column,
            self.message
        )
    }
}

/// Compares the syntax errors of a document before and after editing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntaxGuard;

impl SyntaxGuard {
    /// Creates a guard.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the failures the edits introduced.
    ///
    /// An empty list means the document is safe to persist. When the original
    /// text cannot be re-parsed, every current error is reported.
    #[must_use]
    pub fn check(self, document: &SourceDocument) -> Vec<ValidationFailure> {
        if !document.is_modified() || !document.has_errors() {
            return Vec::new();
        }

        let baseline = Parser::new(document.language())
            .and_then(|mut parser| parser.parse(document.original_text()))
            .map(|parsed| parsed.errors().len())
            .unwrap_or_default();

        let errors = document.errors();
        if errors.len() <= baseline {
            return Vec::new();
        }

        errors
            .into_iter()
            .map(|error| ValidationFailure {
                path: document.path().to_path_buf(),
                line: error.line,
                column: error.column,
                message: error.message,
            })
            .collect()
    }
}
