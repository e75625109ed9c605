//! Resource declarations
//!
//! Provider crates describe their resources as typed structs implementing
//! [`Declare`]. The stack only ever stores the neutral [`ResourceConfig`]
//! produced from them.

use crate::error::StackError;
use crate::reference::{Reference, ResourceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Named feature a declaration depends on
///
/// Gated declarations are dropped from the stack when their feature is
/// disabled (see [`crate::Stack::filtered`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gate(String);

impl Gate {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Set of enabled gates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Features {
    enabled: BTreeSet<Gate>,
}

impl Features {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, gate: Gate) -> Self {
        self.enabled.insert(gate);
        self
    }

    /// Enable `gate` only when `on` is true
    pub fn with_if(self, gate: Gate, on: bool) -> Self {
        if on { self.with(gate) } else { self }
    }

    pub fn is_enabled(&self, gate: &Gate) -> bool {
        self.enabled.contains(gate)
    }

    /// Whether a declaration with this (optional) gate is kept
    pub fn admits(&self, gate: Option<&Gate>) -> bool {
        gate.is_none_or(|g| self.is_enabled(g))
    }
}

/// Neutral description of one declared resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "google_service_account")
    pub resource_type: String,

    /// Logical identifier, unique per type within a stack
    pub id: String,

    /// Provider name
    pub provider: String,

    #[serde(default)]
    pub kind: ResourceKind,

    /// Resource-specific configuration, with references already rendered
    pub config: serde_json::Value,

    /// Every declaration this one reads from, in first-use order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Reference>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        id: impl Into<String>,
        provider: impl Into<String>,
        config: serde_json::Value,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            provider: provider.into(),
            kind: ResourceKind::Resource,
            config,
            references: Vec::new(),
            gate: None,
        }
    }

    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_references(mut self, references: Vec<Reference>) -> Self {
        let mut seen = BTreeSet::new();
        self.references = references
            .into_iter()
            .filter(|r| seen.insert(r.clone()))
            .collect();
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Get the full resource key (type:id)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.id)
    }

    /// Reference to one of this resource's attributes
    pub fn reference(&self, attribute: impl Into<String>) -> Reference {
        Reference {
            kind: self.kind,
            resource_type: self.resource_type.clone(),
            id: self.id.clone(),
            attribute: attribute.into(),
        }
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Typed resource declaration
///
/// Implementations are pure: building the config never touches the network.
pub trait Declare {
    /// Resource type understood by the provisioning engine
    fn resource_type(&self) -> &'static str;

    /// Logical identifier within the stack
    fn id(&self) -> &str;

    /// Provider name (e.g., "google")
    fn provider(&self) -> &'static str;

    fn kind(&self) -> ResourceKind {
        ResourceKind::Resource
    }

    /// Resource-specific configuration
    fn config(&self) -> serde_json::Value;

    /// Declarations this resource reads from
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Structural checks that do not need the rest of the stack
    fn check(&self) -> Result<(), StackError> {
        Ok(())
    }

    /// Reference to one of this declaration's attributes
    fn attr(&self, attribute: &str) -> Reference {
        Reference {
            kind: self.kind(),
            resource_type: self.resource_type().to_string(),
            id: self.id().to_string(),
            attribute: attribute.to_string(),
        }
    }

    fn key(&self) -> String {
        format!("{}:{}", self.resource_type(), self.id())
    }

    /// Build the neutral resource description
    fn declare(&self) -> Result<ResourceConfig, StackError> {
        self.check()?;
        Ok(ResourceConfig::new(
            self.resource_type(),
            self.id(),
            self.provider(),
            self.config(),
        )
        .with_kind(self.kind())
        .with_references(self.references()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Bucket {
        id: String,
        owner: Reference,
    }

    impl Declare for Bucket {
        fn resource_type(&self) -> &'static str {
            "test_bucket"
        }

        fn id(&self) -> &str {
            &self.id
        }

        fn provider(&self) -> &'static str {
            "test"
        }

        fn config(&self) -> serde_json::Value {
            json!({ "name": self.id, "owner": self.owner.render() })
        }

        fn references(&self) -> Vec<Reference> {
            vec![self.owner.clone(), self.owner.clone()]
        }

        fn check(&self) -> Result<(), StackError> {
            if self.id.is_empty() {
                return Err(StackError::invalid(self.key(), "id must not be empty"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_declare_builds_resource_config() {
        let bucket = Bucket {
            id: "assets".to_string(),
            owner: Reference::resource("test_account", "owner", "email"),
        };

        let resource = bucket.declare().unwrap();
        assert_eq!(resource.key(), "test_bucket:assets");
        assert_eq!(resource.provider, "test");
        assert_eq!(resource.kind, ResourceKind::Resource);
        // duplicates are collapsed
        assert_eq!(resource.references.len(), 1);
        assert_eq!(
            resource.get_config::<String>("owner").as_deref(),
            Some("${test_account.owner.email}")
        );
        assert_eq!(
            bucket.attr("id").render(),
            "${test_bucket.assets.id}"
        );
    }

    #[test]
    fn test_declare_runs_check() {
        let bucket = Bucket {
            id: String::new(),
            owner: Reference::resource("test_account", "owner", "email"),
        };

        let err = bucket.declare().unwrap_err();
        assert!(matches!(err, StackError::InvalidDeclaration { .. }));
    }

    #[test]
    fn test_features_admit_ungated_and_enabled() {
        let gate = Gate::new("cloud-run");
        let features = Features::new().with_if(gate.clone(), false);

        assert!(features.admits(None));
        assert!(!features.admits(Some(&gate)));

        let features = features.with(gate.clone());
        assert!(features.admits(Some(&gate)));
    }
}
