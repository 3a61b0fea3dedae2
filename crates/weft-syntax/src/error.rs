//! Failures raised while parsing or editing a source document.

use std::path::PathBuf;

use thiserror::Error;

use crate::language::SourceLanguage;

/// Errors from structured document operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyntaxError {
    /// The grammar could not be loaded into a Tree-sitter parser.
    #[error("failed to initialise {language} parser: {message}")]
    ParserInit {
        /// Grammar that failed to load.
        language: SourceLanguage,
        /// Tree-sitter's description of the failure.
        message: String,
    },

    /// The path's extension does not name a supported language.
    #[error("unsupported source file: {}", path.display())]
    UnknownLanguage {
        /// Offending path.
        path: PathBuf,
    },

    /// Tree-sitter returned no tree.
    #[error("failed to parse {language} source: {message}")]
    Parse {
        /// Grammar in use.
        language: SourceLanguage,
        /// Description of the failure.
        message: String,
    },

    /// An edit addressed bytes outside the document, split a UTF-8 code
    /// point, or overlapped another edit in the same batch.
    #[error("invalid edit {start}..{end} for a document of {len} bytes")]
    InvalidEdit {
        /// Start offset of the rejected edit.
        start: usize,
        /// End offset of the rejected edit.
        end: usize,
        /// Document length in bytes.
        len: usize,
    },
}

impl SyntaxError {
    pub(crate) fn parser_init(language: SourceLanguage, message: impl Into<String>) -> Self {
        Self::ParserInit {
            language,
            message: message.into(),
        }
    }

    pub(crate) const fn unknown_language(path: PathBuf) -> Self {
        Self::UnknownLanguage { path }
    }

    pub(crate) fn parse(language: SourceLanguage, message: impl Into<String>) -> Self {
        Self::Parse {
            language,
            message: message.into(),
        }
    }

    pub(crate) const fn invalid_edit(start: usize, end: usize, len: usize) -> Self {
        Self::InvalidEdit { start, end, len }
    }
}
