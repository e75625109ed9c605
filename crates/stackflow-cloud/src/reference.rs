//! Logical references between declarations
//!
//! Declarations never hold each other directly. A [`Reference`] names the
//! target by `(resource_type, id)` plus the attribute being read, and renders
//! to the provisioning engine's interpolation syntax (`${type.id.attr}`).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a declaration is a managed resource or a read-only data lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    #[default]
    Resource,
    Data,
}

/// Reference to an attribute of another declaration in the same stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Reference {
    #[serde(default)]
    pub kind: ResourceKind,

    /// Resource type of the target (e.g., "google_service_account")
    pub resource_type: String,

    /// Logical identifier of the target
    pub id: String,

    /// Attribute read from the target (e.g., "email", "id", "number")
    pub attribute: String,
}

impl Reference {
    pub fn resource(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            kind: ResourceKind::Resource,
            resource_type: resource_type.into(),
            id: id.into(),
            attribute: attribute.into(),
        }
    }

    pub fn data(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            kind: ResourceKind::Data,
            ..Self::resource(resource_type, id, attribute)
        }
    }

    /// Key of the referenced declaration (type:id)
    pub fn target_key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Engine interpolation string, e.g. `${google_service_account.sa.email}`
    pub fn render(&self) -> String {
        match self.kind {
            ResourceKind::Resource => {
                format!("${{{}.{}.{}}}", self.resource_type, self.id, self.attribute)
            }
            ResourceKind::Data => format!(
                "${{data.{}.{}.{}}}",
                self.resource_type, self.id, self.attribute
            ),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// One piece of an [`Interpolation`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Ref(Reference),
}

/// String value assembled from literals and references
///
/// Used wherever a value depends on an attribute only known at apply time,
/// such as the service URL built from the project number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Interpolation {
    tokens: Vec<Token>,
}

impl Interpolation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::new().push_str(value)
    }

    pub fn push_str(mut self, value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            return self;
        }
        // Adjacent literals are merged so equal strings compare equal
        match self.tokens.last_mut() {
            Some(Token::Literal(last)) => last.push_str(&value),
            _ => self.tokens.push(Token::Literal(value)),
        }
        self
    }

    pub fn push_ref(mut self, reference: Reference) -> Self {
        self.tokens.push(Token::Ref(reference));
        self
    }

    /// Append another interpolation
    pub fn concat(mut self, other: &Interpolation) -> Self {
        for token in &other.tokens {
            self = match token {
                Token::Literal(s) => self.push_str(s.clone()),
                Token::Ref(r) => self.push_ref(r.clone()),
            };
        }
        self
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn references(&self) -> impl Iterator<Item = &Reference> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Ref(r) => Some(r),
            Token::Literal(_) => None,
        })
    }

    /// True when the value contains no references
    pub fn is_literal(&self) -> bool {
        self.references().next().is_none()
    }

    /// Render with engine interpolation markers in place of references
    pub fn render(&self) -> String {
        self.tokens
            .iter()
            .map(|t| match t {
                Token::Literal(s) => s.clone(),
                Token::Ref(r) => r.render(),
            })
            .collect()
    }

    /// Substitute every reference using `lookup`
    ///
    /// Returns `None` if any reference cannot be resolved.
    pub fn resolve<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&Reference) -> Option<String>,
    {
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Ref(r) => out.push_str(&lookup(r)?),
            }
        }
        Some(out)
    }
}

impl From<&str> for Interpolation {
    fn from(value: &str) -> Self {
        Self::literal(value)
    }
}

impl From<String> for Interpolation {
    fn from(value: String) -> Self {
        Self::literal(value)
    }
}

impl From<Reference> for Interpolation {
    fn from(reference: Reference) -> Self {
        Self::new().push_ref(reference)
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}
