//! Node lookups over JavaScript and TypeScript syntax trees.
//!
//! These helpers answer the questions anchored insertions ask: which calls
//! target a given callee, what an exported binding evaluates to, which key a
//! property carries, and which module a dynamic `import()` loads.

use tree_sitter::Node;

use crate::document::SourceDocument;

/// Upper bound on identifier indirections followed by [`object_literal_of`].
const MAX_BINDING_DEPTH: usize = 4;

/// Exported binding of a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExportTarget {
    /// `export default <value>`.
    Default,
    /// `export const <name> = <value>`.
    Named(String),
}

impl std::fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => f.write_str("default export"),
            Self::Named(name) => write!(f, "export `{name}`"),
        }
    }
}

/// Named children of a literal or argument list, skipping comments.
#[must_use]
pub fn sequence_items(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect()
}

/// Callee of a call expression with all whitespace removed.
///
/// `router . use([])` and `router.use([])` both yield `router.use`.
#[must_use]
pub fn callee_text(doc: &SourceDocument, call: Node<'_>) -> Option<String> {
    let function = call.child_by_field_name("function")?;
    Some(
        doc.node_text(function)
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect(),
    )
}

/// Every call expression in the document whose callee is `callee`.
#[must_use]
pub fn calls_to<'d>(doc: &'d SourceDocument, callee: &str) -> Vec<Node<'d>> {
    doc.find_all(|node| {
        node.kind() == "call_expression" && callee_text(doc, node).as_deref() == Some(callee)
    })
}

/// Arguments of a call expression.
#[must_use]
pub fn call_arguments(call: Node<'_>) -> Vec<Node<'_>> {
    call.child_by_field_name("arguments")
        .map(sequence_items)
        .unwrap_or_default()
}

/// Value of a plain string literal, without its quotes.
///
/// Template strings are accepted when they contain no substitutions.
#[must_use]
pub fn string_value(doc: &SourceDocument, node: Node<'_>) -> Option<String> {
    match node.kind() {
        "string" => {
            let text = doc.node_text(node);
            let inner = text.get(1..text.len().saturating_sub(1))?;
            Some(inner.to_owned())
        }
        "template_string" => {
            if sequence_items(node)
                .iter()
                .any(|child| child.kind() == "template_substitution")
            {
                return None;
            }
            let text = doc.node_text(node);
            Some(text.trim_matches('`').to_owned())
        }
        _ => None,
    }
}

/// Module specifier of the first dynamic `import('...')` inside `node`.
#[must_use]
pub fn dynamic_import_specifier(doc: &SourceDocument, node: Node<'_>) -> Option<String> {
    if node.kind() == "call_expression"
        && node
            .child_by_field_name("function")
            .is_some_and(|function| function.kind() == "import")
    {
        return call_arguments(node)
            .first()
            .and_then(|argument| string_value(doc, *argument));
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
    children
        .into_iter()
        .find_map(|child| dynamic_import_specifier(doc, child))
}

/// Key of an object member: a `key: value` pair, a shorthand property or a
/// method.
#[must_use]
pub fn property_key(doc: &SourceDocument, member: Node<'_>) -> Option<String> {
    match member.kind() {
        "pair" => {
            let key = member.child_by_field_name("key")?;
            string_value(doc, key).or_else(|| Some(doc.node_text(key).to_owned()))
        }
        "shorthand_property_identifier" => Some(doc.node_text(member).to_owned()),
        "method_definition" => member
            .child_by_field_name("name")
            .map(|name| doc.node_text(name).to_owned()),
        _ => None,
    }
}

/// Member of `object` whose key is `key`.
#[must_use]
pub fn find_property<'d>(doc: &SourceDocument, object: Node<'d>, key: &str) -> Option<Node<'d>> {
    sequence_items(object)
        .into_iter()
        .find(|member| property_key(doc, *member).as_deref() == Some(key))
}

/// Value node of a `key: value` pair.
#[must_use]
pub fn property_value(member: Node<'_>) -> Option<Node<'_>> {
    if member.kind() == "pair" {
        member.child_by_field_name("value")
    } else {
        None
    }
}

/// Strips parentheses, `satisfies`, `as` and non-null wrappers.
#[must_use]
pub fn unwrap_expression(node: Node<'_>) -> Node<'_> {
    let mut current = node;
    while matches!(
        current.kind(),
        "parenthesized_expression" | "satisfies_expression" | "as_expression" | "non_null_expression"
    ) {
        let mut cursor = current.walk();
        let Some(inner) = current.named_children(&mut cursor).next() else {
            break;
        };
        current = inner;
    }
    current
}

/// Value bound to a top-level `const`/`let`/`var` declaration named `name`,
/// exported or not.
#[must_use]
pub fn top_level_binding<'d>(doc: &'d SourceDocument, name: &str) -> Option<Node<'d>> {
    top_level_declarators(doc)
        .into_iter()
        .find(|(declarator, _)| {
            declarator
                .child_by_field_name("name")
                .is_some_and(|binding| doc.node_text(binding) == name)
        })
        .and_then(|(declarator, _)| declarator.child_by_field_name("value"))
}

/// Value of an exported binding.
#[must_use]
pub fn exported_value<'d>(doc: &'d SourceDocument, target: &ExportTarget) -> Option<Node<'d>> {
    match target {
        ExportTarget::Default => sequence_items(doc.root())
            .into_iter()
            .filter(|statement| statement.kind() == "export_statement")
            .find_map(|statement| statement.child_by_field_name("value")),
        ExportTarget::Named(name) => top_level_declarators(doc)
            .into_iter()
            .find(|(declarator, exported)| {
                *exported
                    && declarator
                        .child_by_field_name("name")
                        .is_some_and(|binding| doc.node_text(binding) == name)
            })
            .and_then(|(declarator, _)| declarator.child_by_field_name("value")),
    }
}

/// Object literal an expression evaluates to.
///
/// Follows wrappers, the first object argument of a call such as
/// `defineConfig({...})`, and identifiers bound at the top level.
#[must_use]
pub fn object_literal_of<'d>(doc: &'d SourceDocument, node: Node<'d>) -> Option<Node<'d>> {
    literal_of(doc, node, "object", MAX_BINDING_DEPTH)
}

/// Array literal an expression evaluates to, following the same indirections
/// as [`object_literal_of`].
#[must_use]
pub fn array_literal_of<'d>(doc: &'d SourceDocument, node: Node<'d>) -> Option<Node<'d>> {
    literal_of(doc, node, "array", MAX_BINDING_DEPTH)
}

fn literal_of<'d>(
    doc: &'d SourceDocument,
    node: Node<'d>,
    kind: &str,
    depth: usize,
) -> Option<Node<'d>> {
    let node = unwrap_expression(node);
    match node.kind() {
        found if found == kind => Some(node),
        "call_expression" => call_arguments(node)
            .into_iter()
            .map(unwrap_expression)
            .find(|argument| argument.kind() == kind),
        "identifier" if depth > 0 => {
            let bound = top_level_binding(doc, doc.node_text(node))?;
            literal_of(doc, bound, kind, depth.saturating_sub(1))
        }
        _ => None,
    }
}

/// Top-level variable declarators paired with whether they are exported.
fn top_level_declarators(doc: &SourceDocument) -> Vec<(Node<'_>, bool)> {
    let mut declarators = Vec::new();
    for statement in sequence_items(doc.root()) {
        let (declaration, exported) = match statement.kind() {
            "export_statement" => match statement.child_by_field_name("declaration") {
                Some(declaration) => (declaration, true),
                None => continue,
            },
            "lexical_declaration" | "variable_declaration" => (statement, false),
            _ => continue,
        };
        if !matches!(
            declaration.kind(),
            "lexical_declaration" | "variable_declaration"
        ) {
            continue;
        }
        declarators.extend(
            sequence_items(declaration)
                .into_iter()
                .filter(|child| child.kind() == "variable_declarator")
                .map(|declarator| (declarator, exported)),
        );
    }
    declarators
}

/// Returns whether `name` can be written as a bare property key.
#[must_use]
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

/// Renders `value` as a single-quoted string literal.
#[must_use]
pub fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Renders `name` as a property key, quoting it when it is not an identifier.
#[must_use]
pub fn property_key_source(name: &str) -> String {
    if is_identifier_name(name) {
        name.to_owned()
    } else {
        quote(name)
    }
}
