//! Language detection and Tree-sitter grammar selection.
//!
//! Host projects mix plain TypeScript, TSX and JavaScript modules. Plain
//! TypeScript uses the TypeScript grammar so `<T>value` assertions parse;
//! everything that may carry JSX goes through the TSX grammar, which is a
//! superset of JavaScript.

use std::fmt;
use std::path::Path;

/// Languages a [`SourceDocument`](crate::SourceDocument) can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceLanguage {
    /// TypeScript modules (`.ts`, `.mts`, `.cts`).
    #[default]
    TypeScript,
    /// TypeScript with JSX (`.tsx`).
    Tsx,
    /// JavaScript modules (`.js`, `.mjs`, `.cjs`, `.jsx`).
    JavaScript,
}

impl SourceLanguage {
    /// Language for a file extension, compared case-insensitively.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "mjs" | "cjs" | "jsx" => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// Language for `path`, judged by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Grammar used to parse this language.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx | Self::JavaScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
        })
    }
}
