//! Caller-supplied entries for the structural operations.

use strum::{Display, EnumString};

use crate::anchor::InsertionAnchor;
use crate::error::CodemodError;
use crate::insertion::{Conflict, Element, InsertionStep, Property, lazy_import};

/// Middleware stacks declared in the kernel module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MiddlewareStack {
    /// `server.use([...])`, run for every request.
    Server,
    /// `router.use([...])`, run for requests matching a route.
    Router,
    /// `router.named({...})`, assigned to routes by name.
    Named,
}

impl MiddlewareStack {
    fn anchor(self) -> InsertionAnchor {
        match self {
            Self::Server => InsertionAnchor::call_argument("server.use"),
            Self::Router => InsertionAnchor::call_argument("router.use"),
            Self::Named => InsertionAnchor::call_argument("router.named"),
        }
    }
}

/// Where a middleware goes relative to the existing ones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MiddlewarePosition {
    /// Before every existing middleware.
    Before,
    /// After every existing middleware.
    #[default]
    After,
}

/// A middleware module to register.
///
/// Every stack references the module through a lazy `() => import('<path>')`
/// entry. No top-level `import` declaration is added to `start/kernel.ts`,
/// so `path` must be resolvable by a dynamic import.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MiddlewareNode {
    /// Import path of the middleware module.
    pub path: String,
    /// Name under which the middleware is registered; required for the
    /// named stack.
    pub name: Option<String>,
    /// Placement in server and router stacks.
    pub position: MiddlewarePosition,
}

impl MiddlewareNode {
    /// Middleware appended to a server or router stack.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            position: MiddlewarePosition::After,
        }
    }

    /// Named middleware.
    #[must_use]
    pub fn named(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(path)
        }
    }

    /// Places the middleware at `position`.
    #[must_use]
    pub fn at(mut self, position: MiddlewarePosition) -> Self {
        self.position = position;
        self
    }
}

/// Steps registering `nodes` on `stack`.
pub(crate) fn middleware_steps(
    stack: MiddlewareStack,
    nodes: &[MiddlewareNode],
) -> Result<Vec<InsertionStep>, CodemodError> {
    if stack == MiddlewareStack::Named {
        let properties = nodes
            .iter()
            .map(|node| {
                let name = node.name.as_deref().ok_or_else(|| CodemodError::InvalidEntry {
                    message: format!("named middleware `{}` has no name", node.path),
                })?;
                Ok(Property::new(name, lazy_import(&node.path), Conflict::Keep))
            })
            .collect::<Result<Vec<_>, CodemodError>>()?;
        return Ok(vec![InsertionStep::properties(stack.anchor(), properties)]);
    }

    let group = |position: MiddlewarePosition| -> Vec<Element> {
        nodes
            .iter()
            .filter(|node| node.position == position)
            .map(|node| Element::lazy_import(&node.path))
            .collect()
    };
    Ok(vec![
        InsertionStep::elements(stack.anchor(), group(MiddlewarePosition::Before))
            .placed(weft_syntax::Placement::Prepend),
        InsertionStep::elements(stack.anchor(), group(MiddlewarePosition::After)),
    ])
}

/// A policy to register in the policy map.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PolicyNode {
    /// Property name, e.g. `PostPolicy`.
    pub name: String,
    /// Import path, e.g. `#policies/post_policy`.
    pub path: String,
}

impl PolicyNode {
    /// Policy `name` loaded from `path`.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    pub(crate) fn property(&self) -> Property {
        Property::new(&self.name, lazy_import(&self.path), Conflict::Keep)
    }
}

/// Validation rules merged into the environment schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvValidations {
    /// Banner comment written above the new rules.
    pub leading_comment: Option<String>,
    /// `(variable, schema expression)` pairs, e.g.
    /// `("PORT", "Env.schema.number()")`.
    pub variables: Vec<(String, String)>,
}

impl EnvValidations {
    /// Rules without a banner comment.
    #[must_use]
    pub fn new<I, K, V>(variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            leading_comment: None,
            variables: variables
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Adds a banner comment.
    #[must_use]
    pub fn with_leading_comment(mut self, comment: impl Into<String>) -> Self {
        self.leading_comment = Some(comment.into());
        self
    }

    pub(crate) fn properties(&self) -> Vec<Property> {
        self.variables
            .iter()
            .map(|(key, value)| Property::new(key, value, Conflict::Replace))
            .collect()
    }
}
