//! Tree-sitter parsing for JavaScript and TypeScript modules.
//!
//! Tree-sitter recovers from malformed input, so a parse nearly always yields
//! a tree. Broken regions show up as `ERROR` nodes or zero-width `MISSING`
//! tokens, which [`ParseResult::errors`] turns into positioned diagnostics.

use crate::error::SyntaxError;
use crate::language::SourceLanguage;
use crate::position::point_to_one_based;

/// Longest source excerpt quoted in an "unexpected" diagnostic.
const EXCERPT_CHARS: usize = 24;

/// A syntax tree together with the text it was built from.
#[derive(Debug, Clone)]
pub struct ParseResult {
    tree: tree_sitter::Tree,
    source: String,
    language: SourceLanguage,
}

impl ParseResult {
    /// Text the tree was built from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Grammar used for the parse.
    #[must_use]
    pub const fn language(&self) -> SourceLanguage {
        self.language
    }

    /// Returns whether the tree contains error or missing nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Diagnostics for every outermost error or missing node, in document
    /// order.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        let mut errors = Vec::new();
        let mut pending = vec![self.tree.root_node()];
        while let Some(node) = pending.pop() {
            if node.is_error() || node.is_missing() {
                errors.push(SyntaxErrorInfo::describe(node, &self.source));
                continue;
            }
            if node.has_error() {
                let mut cursor = node.walk();
                let children: Vec<_> = node.children(&mut cursor).collect();
                pending.extend(children.into_iter().rev());
            }
        }
        errors
    }

    /// Root of the tree.
    #[must_use]
    pub fn root_node(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }
}

/// A positioned syntax diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// One-based line.
    pub line: u32,
    /// One-based column.
    pub column: u32,
    /// `missing <token>` or `unexpected <excerpt>`.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn describe(node: tree_sitter::Node<'_>, source: &str) -> Self {
        let message = if node.is_missing() {
            format!("missing `{}`", node.kind())
        } else {
            let text = source.get(node.byte_range()).unwrap_or_default().trim();
            let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();
            if text.chars().nth(EXCERPT_CHARS).is_some() {
                excerpt.push_str("...");
            }
            format!("unexpected `{excerpt}`")
        };
        let (line, column) = point_to_one_based(node.start_position());
        Self {
            line,
            column,
            message,
        }
    }
}

/// Parser bound to one grammar.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SourceLanguage,
}

impl Parser {
    /// Creates a parser for `language`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::ParserInit`] when the grammar is incompatible
    /// with the linked Tree-sitter runtime.
    pub fn new(language: SourceLanguage) -> Result<Self, SyntaxError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|error| SyntaxError::parser_init(language, error.to_string()))?;
        Ok(Self { inner, language })
    }

    /// Parses `source`.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Parse`] when Tree-sitter produces no tree.
    pub fn parse(&mut self, source: &str) -> Result<ParseResult, SyntaxError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or_else(|| SyntaxError::parse(self.language, "no syntax tree produced"))?;
        Ok(ParseResult {
            tree,
            source: source.to_owned(),
            language: self.language,
        })
    }
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(language: SourceLanguage, source: &str) -> ParseResult {
        Parser::new(language)
            .and_then(|mut parser| parser.parse(source))
            .expect("parse")
    }

    #[rstest]
    #[case(SourceLanguage::TypeScript, "export default defineConfig({})")]
    #[case(SourceLanguage::Tsx, "export const App = () => <div />")]
    #[case(SourceLanguage::JavaScript, "export default { plugins: [] }")]
    fn valid_modules_have_no_errors(#[case] language: SourceLanguage, #[case] source: &str) {
        let result = parse(language, source);
        assert!(!result.has_errors());
        assert!(result.errors().is_empty());
        assert_eq!(result.language(), language);
    }

    #[rstest]
    #[case(SourceLanguage::TypeScript, "router.use([")]
    #[case(SourceLanguage::JavaScript, "export default { plugins: [ }")]
    fn malformed_modules_report_errors(#[case] language: SourceLanguage, #[case] source: &str) {
        let result = parse(language, source);
        assert!(result.has_errors());
        assert!(!result.errors().is_empty());
    }

    #[test]
    fn diagnostics_are_one_based() {
        let result = parse(
            SourceLanguage::TypeScript,
            "export const policies = {\n  a: ,\n}",
        );
        let first = result.errors().into_iter().next().expect("has error");
        assert!((1..=2).contains(&first.line));
        assert!(first.column >= 1);
    }
}
