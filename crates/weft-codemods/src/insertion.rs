//! The shared "locate, deduplicate, insert, import" routine.
//!
//! Every structural operation builds an [`InsertionPlan`]: a list of steps,
//! each pairing an anchor with the elements or properties it should receive,
//! plus the imports the new code needs. [`InsertionPlan::apply`] runs against
//! an in-memory document and re-parses after every edit, so later steps see
//! the result of earlier ones. Nothing touches the disk here; a failed plan
//! leaves the file as it was.

use tracing::debug;
use weft_syntax::{
    Delimiter, ImportRequirement, Layout, Node, Placement, SourceDocument, SyntaxGuard, TextEdit,
    ensure_import, insert_items, property_chain, query, replace_item,
};

use crate::anchor::{AnchorError, InsertionAnchor, Resolution};
use crate::error::CodemodError;

/// Tracing target for anchored insertions.
const INSERTION_TARGET: &str = "weft_codemods::insertion";

/// How an array element is recognised as already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Identity {
    /// Source text with whitespace removed.
    Text(String),
    /// Module loaded by a dynamic `import()` somewhere in the element.
    ImportSpecifier(String),
    /// Object element whose `key` property is the string `value`.
    Keyed { key: String, value: String },
}

impl Identity {
    fn matches(&self, doc: &SourceDocument, item: Node<'_>) -> bool {
        match self {
            Self::Text(text) => normalize(doc.node_text(item)) == *text,
            Self::ImportSpecifier(specifier) => {
                query::dynamic_import_specifier(doc, item).as_deref() == Some(specifier.as_str())
            }
            Self::Keyed { key, value } => {
                item.kind() == "object"
                    && query::find_property(doc, item, key)
                        .and_then(query::property_value)
                        .and_then(|node| query::string_value(doc, node))
                        .is_some_and(|existing| existing == *value)
            }
        }
    }
}

fn normalize(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// An array element and the identity used to deduplicate it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    text: String,
    identity: Identity,
}

impl Element {
    /// Arbitrary expression, deduplicated by its text.
    pub(crate) fn expression(text: impl Into<String>) -> Self {
        let text = text.into();
        let identity = Identity::Text(normalize(&text));
        Self { text, identity }
    }

    /// `() => import('<specifier>')`, deduplicated by specifier.
    pub(crate) fn lazy_import(specifier: &str) -> Self {
        Self::with_specifier(lazy_import(specifier), specifier)
    }

    /// Expression that lazily imports `specifier`, deduplicated by it.
    pub(crate) fn with_specifier(text: impl Into<String>, specifier: &str) -> Self {
        Self {
            text: text.into(),
            identity: Identity::ImportSpecifier(specifier.to_owned()),
        }
    }

    /// Object literal deduplicated by the string value of one property.
    pub(crate) fn keyed(text: impl Into<String>, key: &str, value: &str) -> Self {
        Self {
            text: text.into(),
            identity: Identity::Keyed {
                key: key.to_owned(),
                value: value.to_owned(),
            },
        }
    }
}

/// Renders `() => import('<specifier>')`.
pub(crate) fn lazy_import(specifier: &str) -> String {
    format!("() => import({})", query::quote(specifier))
}

/// What happens when an object already has the property being inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Conflict {
    /// Leave the existing property alone.
    Keep,
    /// Overwrite the existing property.
    Replace,
}

/// An object property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Property {
    key: String,
    value: String,
    conflict: Conflict,
}

impl Property {
    pub(crate) fn new(key: impl Into<String>, value: impl Into<String>, conflict: Conflict) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            conflict,
        }
    }

    fn render(&self) -> String {
        format!("{}: {}", query::property_key_source(&self.key), self.value)
    }
}

/// Content inserted by one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entries {
    Elements(Vec<Element>),
    Properties(Vec<Property>),
}

impl Entries {
    const fn delimiter(&self) -> Delimiter {
        match self {
            Self::Elements(_) => Delimiter::Array,
            Self::Properties(_) => Delimiter::Object,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Elements(elements) => elements.is_empty(),
            Self::Properties(properties) => properties.is_empty(),
        }
    }
}

/// One anchored insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InsertionStep {
    anchors: Vec<InsertionAnchor>,
    entries: Entries,
    placement: Placement,
    leading_comment: Option<String>,
}

impl InsertionStep {
    /// Appends `elements` to the array at `anchor`.
    pub(crate) fn elements(anchor: InsertionAnchor, elements: Vec<Element>) -> Self {
        Self::new(anchor, Entries::Elements(elements))
    }

    /// Adds `properties` to the object at `anchor`.
    pub(crate) fn properties(anchor: InsertionAnchor, properties: Vec<Property>) -> Self {
        Self::new(anchor, Entries::Properties(properties))
    }

    fn new(anchor: InsertionAnchor, entries: Entries) -> Self {
        Self {
            anchors: vec![anchor],
            entries,
            placement: Placement::Append,
            leading_comment: None,
        }
    }

    /// Anchor tried when the earlier ones are not found.
    pub(crate) fn or_anchor(mut self, anchor: InsertionAnchor) -> Self {
        self.anchors.push(anchor);
        self
    }

    pub(crate) const fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Banner comment written above the first new entry.
    pub(crate) fn with_leading_comment(mut self, comment: Option<String>) -> Self {
        self.leading_comment = comment;
        self
    }

    /// Moves the entries of `other` into `self` when both target the same
    /// literal the same way. Hands `other` back otherwise.
    fn absorb(&mut self, other: Self) -> Option<Self> {
        if self.anchors != other.anchors
            || self.placement != other.placement
            || self.leading_comment != other.leading_comment
        {
            return Some(other);
        }
        match (&mut self.entries, other.entries) {
            (Entries::Elements(mine), Entries::Elements(theirs)) => {
                mine.extend(theirs);
                None
            }
            (Entries::Properties(mine), Entries::Properties(theirs)) => {
                mine.extend(theirs);
                None
            }
            (_, entries) => Some(Self { entries, ..other }),
        }
    }

    fn describe(&self) -> String {
        let delimiter = self.entries.delimiter();
        self.anchors
            .iter()
            .map(|anchor| anchor.describe(delimiter))
            .collect::<Vec<_>>()
            .join(" or ")
    }

    fn resolve<'d>(&self, doc: &'d SourceDocument) -> Result<Resolution<'d>, CodemodError> {
        let delimiter = self.entries.delimiter();
        for anchor in &self.anchors {
            match anchor.resolve(doc, delimiter) {
                Ok(resolution) => return Ok(resolution),
                Err(AnchorError::NotFound) => {}
                Err(AnchorError::Ambiguous(matches)) => {
                    return Err(CodemodError::AmbiguousAnchor {
                        path: doc.path().to_path_buf(),
                        anchor: anchor.describe(delimiter),
                        matches,
                    });
                }
            }
        }
        Err(CodemodError::AnchorNotFound {
            path: doc.path().to_path_buf(),
            anchor: self.describe(),
        })
    }

    fn apply(&self, doc: &mut SourceDocument) -> Result<(), CodemodError> {
        if let Entries::Properties(properties) = &self.entries {
            for property in properties
                .iter()
                .filter(|property| property.conflict == Conflict::Replace)
            {
                let edit = {
                    match self.resolve(doc)? {
                        Resolution::Found(object) => query::find_property(doc, object, &property.key)
                            .map(|member| replace_item(doc, member, &property.render())),
                        Resolution::MissingProperty { .. } => None,
                    }
                };
                if let Some(edit) = edit {
                    debug!(
                        target: INSERTION_TARGET,
                        path = %doc.path().display(),
                        key = property.key.as_str(),
                        "replacing property"
                    );
                    apply_edit(doc, &edit)?;
                }
            }
        }

        let edit = {
            let resolution = self.resolve(doc)?;
            let mut fresh = match &resolution {
                Resolution::Found(literal) => self.fresh_items(doc, query::sequence_items(*literal)),
                Resolution::MissingProperty { .. } => self.fresh_items(doc, Vec::new()),
            };
            if let (Some(comment), Some(first)) = (&self.leading_comment, fresh.first_mut()) {
                *first = format!("{}\n{first}", banner(comment));
            }
            debug!(
                target: INSERTION_TARGET,
                path = %doc.path().display(),
                anchor = %self.describe(),
                items = fresh.len(),
                "anchor resolved"
            );
            match resolution {
                Resolution::Found(literal) => {
                    insert_items(doc, literal, &fresh, self.placement, Layout::Multiline)
                }
                Resolution::MissingProperty { object, remaining } => {
                    if fresh.is_empty() {
                        None
                    } else {
                        property_chain(&remaining, self.entries.delimiter(), &fresh).and_then(
                            |chain| {
                                insert_items(doc, object, &[chain], Placement::Append, Layout::Multiline)
                            },
                        )
                    }
                }
            }
        };

        match edit {
            Some(edit) => apply_edit(doc, &edit),
            None => Ok(()),
        }
    }

    /// Renders the entries not already present among `existing`.
    fn fresh_items(&self, doc: &SourceDocument, existing: Vec<Node<'_>>) -> Vec<String> {
        match &self.entries {
            Entries::Elements(elements) => {
                let mut accepted: Vec<&Element> = Vec::new();
                for element in elements {
                    let present = existing
                        .iter()
                        .any(|item| element.identity.matches(doc, *item));
                    let repeated = accepted
                        .iter()
                        .any(|earlier| earlier.identity == element.identity);
                    if !present && !repeated {
                        accepted.push(element);
                    }
                }
                accepted
                    .into_iter()
                    .map(|element| element.text.clone())
                    .collect()
            }
            Entries::Properties(properties) => {
                let mut accepted: Vec<&Property> = Vec::new();
                for property in properties {
                    let present = existing.iter().any(|member| {
                        query::property_key(doc, *member).as_deref() == Some(property.key.as_str())
                    });
                    let repeated = accepted.iter().any(|earlier| earlier.key == property.key);
                    if !present && !repeated {
                        accepted.push(property);
                    }
                }
                accepted.into_iter().map(Property::render).collect()
            }
        }
    }
}

fn apply_edit(doc: &mut SourceDocument, edit: &TextEdit) -> Result<(), CodemodError> {
    let path = doc.path().to_path_buf();
    doc.apply(edit)
        .map_err(|error| CodemodError::syntax(&path, error))
}

/// Renders `comment` as the banner block placed above grouped properties.
fn banner(comment: &str) -> String {
    let rule = format!("|{}", "-".repeat(58));
    let mut text = format!("/*\n{rule}\n");
    for line in comment.lines() {
        text.push_str("| ");
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(&rule);
    text.push_str("\n*/");
    text
}

/// Steps and imports applied to one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InsertionPlan {
    steps: Vec<InsertionStep>,
    imports: Vec<ImportRequirement>,
}

impl InsertionPlan {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn step(mut self, step: InsertionStep) -> Self {
        self.push(step);
        self
    }

    pub(crate) fn push(&mut self, step: InsertionStep) {
        self.steps.push(step);
    }

    /// Adds `step`, folding it into an earlier step on the same literal.
    pub(crate) fn merge(&mut self, step: InsertionStep) {
        let mut pending = Some(step);
        for existing in &mut self.steps {
            let Some(step) = pending.take() else {
                return;
            };
            pending = existing.absorb(step);
        }
        if let Some(step) = pending {
            self.steps.push(step);
        }
    }

    pub(crate) fn imports<'a>(mut self, imports: impl IntoIterator<Item = &'a ImportRequirement>) -> Self {
        self.imports.extend(imports.into_iter().cloned());
        self
    }

    /// Returns whether the plan has nothing to insert.
    pub(crate) fn is_empty(&self) -> bool {
        self.imports.is_empty() && self.steps.iter().all(|step| step.entries.is_empty())
    }

    /// Applies every step, then every import, then validates the result.
    ///
    /// # Errors
    ///
    /// Returns an anchor error when a step cannot be located, or
    /// [`CodemodError::InvalidEdit`] when the edits introduced syntax errors.
    pub(crate) fn apply(&self, doc: &mut SourceDocument) -> Result<(), CodemodError> {
        let path = doc.path().to_path_buf();
        for step in self.steps.iter().filter(|step| !step.entries.is_empty()) {
            step.apply(doc)?;
        }
        for requirement in &self.imports {
            let added = ensure_import(doc, requirement)
                .map_err(|error| CodemodError::syntax(&path, error))?;
            if added {
                debug!(
                    target: INSERTION_TARGET,
                    path = %path.display(),
                    identifier = requirement.identifier.as_str(),
                    module = requirement.module.as_str(),
                    "import added"
                );
            }
        }

        let failures = SyntaxGuard::new().check(doc);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(CodemodError::InvalidEdit { path, failures })
        }
    }
}
