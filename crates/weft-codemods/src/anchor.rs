//! Locators for the literals anchored insertions extend.
//!
//! An [`InsertionAnchor`] names a location structurally: the array argument
//! of `router.use(...)`, the object bound to `export const policies`, or the
//! `plugins` array of the default export. Resolution must find exactly one
//! node. A property path whose tail does not exist yet resolves to the object
//! that should receive it, so the caller can create the missing properties.

use std::fmt;

use weft_syntax::{Delimiter, ExportTarget, Node, SourceDocument, query};

/// Where inside a source file new content belongs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InsertionAnchor {
    /// Literal argument of the only call to `callee`.
    CallArgument {
        /// Callee as written without whitespace, e.g. `router.use`.
        callee: String,
    },
    /// Literal bound to an exported binding.
    Export(ExportTarget),
    /// Literal reached from an exported object by following property keys.
    ExportProperty {
        /// Exported object.
        export: ExportTarget,
        /// Property keys, outermost first.
        path: Vec<String>,
    },
}

impl InsertionAnchor {
    /// Literal argument of a call.
    #[must_use]
    pub fn call_argument(callee: impl Into<String>) -> Self {
        Self::CallArgument {
            callee: callee.into(),
        }
    }

    /// Literal bound to `export const <name>`.
    #[must_use]
    pub fn named_export(name: impl Into<String>) -> Self {
        Self::Export(ExportTarget::Named(name.into()))
    }

    /// Literal reached from the default export through `path`.
    #[must_use]
    pub fn default_export_property<I, S>(path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::ExportProperty {
            export: ExportTarget::Default,
            path: path.into_iter().map(Into::into).collect(),
        }
    }

    /// Human-readable description of the anchored literal.
    #[must_use]
    pub fn describe(&self, delimiter: Delimiter) -> String {
        AnchorDescription {
            anchor: self,
            delimiter,
        }
        .to_string()
    }

    pub(crate) fn resolve<'d>(
        &self,
        doc: &'d SourceDocument,
        delimiter: Delimiter,
    ) -> Result<Resolution<'d>, AnchorError> {
        match self {
            Self::CallArgument { callee } => {
                let call = single(query::calls_to(doc, callee))?;
                query::call_arguments(call)
                    .into_iter()
                    .map(query::unwrap_expression)
                    .find(|argument| argument.kind() == delimiter.node_kind())
                    .map(Resolution::Found)
                    .ok_or(AnchorError::NotFound)
            }
            Self::Export(target) => {
                let value = query::exported_value(doc, target).ok_or(AnchorError::NotFound)?;
                literal_of(doc, value, delimiter)
                    .map(Resolution::Found)
                    .ok_or(AnchorError::NotFound)
            }
            Self::ExportProperty { export, path } => {
                let value = query::exported_value(doc, export).ok_or(AnchorError::NotFound)?;
                let object = query::object_literal_of(doc, value).ok_or(AnchorError::NotFound)?;
                follow_path(doc, object, path, delimiter)
            }
        }
    }
}

/// Outcome of resolving an anchor.
#[derive(Debug)]
pub(crate) enum Resolution<'d> {
    /// The anchored literal.
    Found(Node<'d>),
    /// `object` lacks `remaining[0]`; the rest of the path is missing too.
    MissingProperty {
        object: Node<'d>,
        remaining: Vec<String>,
    },
}

/// Why an anchor did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnchorError {
    NotFound,
    Ambiguous(usize),
}

fn single(mut nodes: Vec<Node<'_>>) -> Result<Node<'_>, AnchorError> {
    match nodes.len() {
        0 => Err(AnchorError::NotFound),
        1 => nodes.pop().ok_or(AnchorError::NotFound),
        matches => Err(AnchorError::Ambiguous(matches)),
    }
}

fn literal_of<'d>(doc: &'d SourceDocument, node: Node<'d>, delimiter: Delimiter) -> Option<Node<'d>> {
    match delimiter {
        Delimiter::Array => query::array_literal_of(doc, node),
        Delimiter::Object => query::object_literal_of(doc, node),
    }
}

fn follow_path<'d>(
    doc: &'d SourceDocument,
    root: Node<'d>,
    path: &[String],
    delimiter: Delimiter,
) -> Result<Resolution<'d>, AnchorError> {
    let mut object = root;
    for (index, key) in path.iter().enumerate() {
        let Some(member) = query::find_property(doc, object, key) else {
            return Ok(Resolution::MissingProperty {
                object,
                remaining: path.iter().skip(index).cloned().collect(),
            });
        };
        let value = query::property_value(member).ok_or(AnchorError::NotFound)?;
        if index.saturating_add(1) == path.len() {
            return literal_of(doc, value, delimiter)
                .map(Resolution::Found)
                .ok_or(AnchorError::NotFound);
        }
        object = query::object_literal_of(doc, value).ok_or(AnchorError::NotFound)?;
    }
    match delimiter {
        Delimiter::Object => Ok(Resolution::Found(object)),
        Delimiter::Array => Err(AnchorError::NotFound),
    }
}

struct AnchorDescription<'a> {
    anchor: &'a InsertionAnchor,
    delimiter: Delimiter,
}

impl fmt::Display for AnchorDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.delimiter {
            Delimiter::Array => "array",
            Delimiter::Object => "object",
        };
        match self.anchor {
            InsertionAnchor::CallArgument { callee } => {
                write!(f, "{kind} argument of `{callee}(...)`")
            }
            InsertionAnchor::Export(target) => write!(f, "{kind} bound to {target}"),
            InsertionAnchor::ExportProperty { export, path } => {
                write!(f, "`{}` {kind} of {export}", path.join("."))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn document(source: &str) -> SourceDocument {
        SourceDocument::parse("anchor.ts", source).expect("parse")
    }

    fn found_text(source: &str, anchor: &InsertionAnchor, delimiter: Delimiter) -> String {
        let doc = document(source);
        match anchor.resolve(&doc, delimiter).expect("resolve") {
            Resolution::Found(node) => doc.node_text(node).to_owned(),
            Resolution::MissingProperty { .. } => panic!("expected literal"),
        }
    }

    #[test]
    fn call_argument_picks_matching_literal() {
        let anchor = InsertionAnchor::call_argument("Env.create");
        let text = found_text(
            "export default await Env.create(new URL('../', import.meta.url), { A: 1 })",
            &anchor,
            Delimiter::Object,
        );
        assert_eq!(text, "{ A: 1 }");
    }

    #[test]
    fn repeated_call_is_ambiguous() {
        let doc = document("router.use([])\nrouter.use([])");
        let result = InsertionAnchor::call_argument("router.use").resolve(&doc, Delimiter::Array);
        assert!(matches!(result, Err(AnchorError::Ambiguous(2))));
    }

    #[rstest]
    #[case("server.use([])")]
    #[case("router.use({})")]
    #[case("")]
    fn absent_call_argument_is_not_found(#[case] source: &str) {
        let doc = document(source);
        let result = InsertionAnchor::call_argument("router.use").resolve(&doc, Delimiter::Array);
        assert!(matches!(result, Err(AnchorError::NotFound)));
    }

    #[test]
    fn named_export_resolves_object() {
        let anchor = InsertionAnchor::named_export("policies");
        let text = found_text("export const policies = { A: 1 }", &anchor, Delimiter::Object);
        assert_eq!(text, "{ A: 1 }");
    }

    #[test]
    fn missing_tail_reports_remaining_path() {
        let doc = document("export default defineConfig({ tests: {} })");
        let anchor = InsertionAnchor::default_export_property(["tests", "suites"]);
        match anchor.resolve(&doc, Delimiter::Array).expect("resolve") {
            Resolution::MissingProperty { object, remaining } => {
                assert_eq!(doc.node_text(object), "{}");
                assert_eq!(remaining, vec![String::from("suites")]);
            }
            Resolution::Found(_) => panic!("expected missing property"),
        }
    }

    #[test]
    fn property_of_wrong_kind_is_not_found() {
        let doc = document("export default { plugins: 'nope' }");
        let anchor = InsertionAnchor::default_export_property(["plugins"]);
        let result = anchor.resolve(&doc, Delimiter::Array);
        assert!(matches!(result, Err(AnchorError::NotFound)));
    }

    #[rstest]
    #[case(InsertionAnchor::call_argument("router.use"), Delimiter::Array, "array argument of `router.use(...)`")]
    #[case(InsertionAnchor::named_export("policies"), Delimiter::Object, "object bound to export `policies`")]
    #[case(
        InsertionAnchor::default_export_property(["hooks", "onBuildStarting"]),
        Delimiter::Array,
        "`hooks.onBuildStarting` array of default export"
    )]
    fn describes_anchor(
        #[case] anchor: InsertionAnchor,
        #[case] delimiter: Delimiter,
        #[case] expected: &str,
    ) {
        assert_eq!(anchor.describe(delimiter), expected);
    }
}
