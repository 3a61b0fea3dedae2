//! Import declarations required by inserted code.

use tree_sitter::Node;

use crate::document::{SourceDocument, TextEdit};
use crate::error::SyntaxError;
use crate::query::{quote, sequence_items, string_value};
use crate::sequence::{Layout, Placement, insert_items};

/// An identifier that must be imported from a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportRequirement {
    /// Local binding introduced by the import.
    pub identifier: String,
    /// Module specifier, e.g. `@vitejs/plugin-vue`.
    pub module: String,
    /// Named (`import { x }`) rather than default (`import x`) import.
    pub is_named: bool,
}

impl ImportRequirement {
    /// Requirement for `import { identifier } from 'module'`.
    #[must_use]
    pub fn named(identifier: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            module: module.into(),
            is_named: true,
        }
    }

    /// Requirement for `import identifier from 'module'`.
    #[must_use]
    pub fn default_export(identifier: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            module: module.into(),
            is_named: false,
        }
    }

    fn statement(&self, semicolon: bool) -> String {
        let terminator = if semicolon { ";" } else { "" };
        let module = quote(&self.module);
        if self.is_named {
            format!("import {{ {} }} from {module}{terminator}", self.identifier)
        } else {
            format!("import {} from {module}{terminator}", self.identifier)
        }
    }
}

/// Bindings introduced by one import declaration.
struct ImportClause<'d> {
    /// `import type { .. }`: every binding is erased at runtime.
    type_only: bool,
    default: Option<Node<'d>>,
    named: Option<Node<'d>>,
    named_bindings: Vec<String>,
    namespace: bool,
}

impl<'d> ImportClause<'d> {
    fn read(doc: &SourceDocument, statement: Node<'d>) -> Self {
        let mut clause = Self {
            type_only: has_type_keyword(statement),
            default: None,
            named: None,
            named_bindings: Vec::new(),
            namespace: false,
        };
        let Some(import_clause) = sequence_items(statement)
            .into_iter()
            .find(|child| child.kind() == "import_clause")
        else {
            return clause;
        };
        for part in sequence_items(import_clause) {
            match part.kind() {
                "identifier" => clause.default = Some(part),
                "namespace_import" => clause.namespace = true,
                "named_imports" => {
                    clause.named = Some(part);
                    clause.named_bindings = sequence_items(part)
                        .into_iter()
                        .filter(|specifier| specifier.kind() == "import_specifier")
                        .filter_map(|specifier| {
                            specifier
                                .child_by_field_name("alias")
                                .or_else(|| specifier.child_by_field_name("name"))
                        })
                        .map(|binding| doc.node_text(binding).to_owned())
                        .collect();
                }
                _ => {}
            }
        }
        clause
    }

    fn provides(&self, doc: &SourceDocument, requirement: &ImportRequirement) -> bool {
        if self.type_only {
            false
        } else if requirement.is_named {
            self.named_bindings.contains(&requirement.identifier)
        } else {
            self.default
                .is_some_and(|default| doc.node_text(default) == requirement.identifier)
        }
    }

    /// Edit extending this declaration with `requirement`, if it can absorb it.
    fn extend(&self, doc: &SourceDocument, requirement: &ImportRequirement) -> Option<TextEdit> {
        if self.namespace || self.type_only {
            return None;
        }
        match (requirement.is_named, self.named, self.default) {
            (true, Some(named), _) => insert_items(
                doc,
                named,
                &[requirement.identifier.clone()],
                Placement::Append,
                Layout::Inline,
            ),
            (true, None, Some(default)) => Some(TextEdit::insert_at(
                default.end_byte(),
                format!(", {{ {} }}", requirement.identifier),
            )),
            (false, Some(named), None) => Some(TextEdit::insert_at(
                named.start_byte(),
                format!("{}, ", requirement.identifier),
            )),
            _ => None,
        }
    }
}

/// Returns whether the declaration is `import type ...`.
fn has_type_keyword(node: Node<'_>) -> bool {
    let mut cursor = node.walk();
    node.children(&mut cursor).any(|child| child.kind() == "type")
}

/// Ensures `requirement` is imported, extending an existing declaration for
/// the same module when possible.
///
/// Returns `true` when the document changed.
///
/// # Errors
///
/// Returns an error if the computed edit cannot be applied.
pub fn ensure_import(
    doc: &mut SourceDocument,
    requirement: &ImportRequirement,
) -> Result<bool, SyntaxError> {
    let edit = {
        let statements: Vec<Node<'_>> = sequence_items(doc.root())
            .into_iter()
            .filter(|statement| statement.kind() == "import_statement")
            .collect();

        let clauses: Vec<ImportClause<'_>> = statements
            .iter()
            .filter(|statement| {
                statement
                    .child_by_field_name("source")
                    .and_then(|source| string_value(doc, source))
                    .is_some_and(|module| module == requirement.module)
            })
            .map(|statement| ImportClause::read(doc, *statement))
            .collect();

        if clauses.iter().any(|clause| clause.provides(doc, requirement)) {
            return Ok(false);
        }

        match clauses
            .iter()
            .find_map(|clause| clause.extend(doc, requirement))
        {
            Some(edit) => edit,
            None => new_declaration(doc, &statements, requirement),
        }
    };

    doc.apply(&edit)?;
    Ok(true)
}

fn new_declaration(
    doc: &SourceDocument,
    statements: &[Node<'_>],
    requirement: &ImportRequirement,
) -> TextEdit {
    let semicolon = statements
        .iter()
        .any(|statement| doc.node_text(*statement).trim_end().ends_with(';'));
    let declaration = requirement.statement(semicolon);
    match statements.last() {
        Some(last) => TextEdit::insert_at(last.end_byte(), format!("\n{declaration}")),
        None if doc.text().is_empty() => TextEdit::insert_at(0, format!("{declaration}\n")),
        None => TextEdit::insert_at(0, format!("{declaration}\n\n")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ensure(source: &str, requirement: &ImportRequirement) -> (bool, String) {
        let mut doc = SourceDocument::parse("vite.config.ts", source).expect("parse");
        let changed = ensure_import(&mut doc, requirement).expect("ensure");
        (changed, doc.text().to_owned())
    }

    #[test]
    fn inserts_first_import_at_top() {
        let requirement = ImportRequirement::default_export("vue", "@vitejs/plugin-vue");
        let (changed, text) = ensure("export default { plugins: [] }", &requirement);
        assert!(changed);
        assert_eq!(
            text,
            "import vue from '@vitejs/plugin-vue'\n\nexport default { plugins: [] }"
        );
    }

    #[test]
    fn appends_after_last_import_with_semicolons() {
        let requirement = ImportRequirement::named("apiClient", "@japa/api-client");
        let (_, text) = ensure("import { assert } from '@japa/assert';\n\nrun()", &requirement);
        assert_eq!(
            text,
            "import { assert } from '@japa/assert';\nimport { apiClient } from '@japa/api-client';\n\nrun()"
        );
    }

    #[rstest]
    #[case("import { a } from 'm'\n", ImportRequirement::named("a", "m"))]
    #[case("import { x as a } from 'm'\n", ImportRequirement::named("a", "m"))]
    #[case("import a from 'm'\n", ImportRequirement::default_export("a", "m"))]
    fn existing_binding_is_left_alone(#[case] source: &str, #[case] requirement: ImportRequirement) {
        let (changed, text) = ensure(source, &requirement);
        assert!(!changed);
        assert_eq!(text, source);
    }

    #[rstest]
    #[case("import { a } from 'm'", ImportRequirement::named("b", "m"), "import { a, b } from 'm'")]
    #[case("import d from 'm'", ImportRequirement::named("b", "m"), "import d, { b } from 'm'")]
    #[case("import { a } from 'm'", ImportRequirement::default_export("d", "m"), "import d, { a } from 'm'")]
    fn extends_declaration_for_same_module(
        #[case] source: &str,
        #[case] requirement: ImportRequirement,
        #[case] expected: &str,
    ) {
        let (changed, text) = ensure(source, &requirement);
        assert!(changed);
        assert_eq!(text, expected);
    }

    #[rstest]
    #[case(
        "import type { UserConfig } from 'vite'",
        ImportRequirement::named("defineConfig", "vite"),
        "import type { UserConfig } from 'vite'\nimport { defineConfig } from 'vite'"
    )]
    #[case(
        "import type { UserConfig } from 'vite'",
        ImportRequirement::default_export("vite", "vite"),
        "import type { UserConfig } from 'vite'\nimport vite from 'vite'"
    )]
    fn type_only_declaration_is_not_extended(
        #[case] source: &str,
        #[case] requirement: ImportRequirement,
        #[case] expected: &str,
    ) {
        let (changed, text) = ensure(source, &requirement);
        assert!(changed);
        assert_eq!(text, expected);
    }

    #[test]
    fn namespace_import_gets_separate_declaration() {
        let requirement = ImportRequirement::named("b", "m");
        let (_, text) = ensure("import * as m from 'm'", &requirement);
        assert_eq!(text, "import * as m from 'm'\nimport { b } from 'm'");
    }
}
