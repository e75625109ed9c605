//! Stack: one named declaration graph
//!
//! A stack owns every declaration made during a single composition pass.
//! Declarations are kept in the order they were made, which is also the
//! order the graph is validated and serialized in, so composing the same
//! input twice yields an identical stack.

use crate::error::{ReferenceError, ReferenceErrorReason, StackError};
use crate::reference::{Interpolation, Reference, ResourceKind};
use crate::resource::{Declare, Features, Gate, ResourceConfig};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Named value derived from the graph (e.g., a service URL)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub value: Interpolation,
    pub description: Option<String>,
    pub gate: Option<Gate>,
}

impl Output {
    pub fn new(value: impl Into<Interpolation>) -> Self {
        Self {
            value: value.into(),
            description: None,
            gate: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Provider configuration block (e.g., `google { project, region }`)
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderBlock {
    pub name: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stack {
    name: String,
    providers: Vec<ProviderBlock>,
    resources: Vec<ResourceConfig>,
    outputs: BTreeMap<String, Output>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add or replace a provider block
    pub fn add_provider(&mut self, name: impl Into<String>, config: serde_json::Value) {
        let name = name.into();
        match self.providers.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.config = config,
            None => self.providers.push(ProviderBlock { name, config }),
        }
    }

    pub fn providers(&self) -> &[ProviderBlock] {
        &self.providers
    }

    /// Declare a typed resource and return its config
    pub fn declare<D: Declare>(&mut self, declaration: &D) -> Result<&ResourceConfig, StackError> {
        let resource = declaration.declare()?;
        self.add(resource)
    }

    /// Declare a typed resource that only exists while `gate` is enabled
    pub fn declare_gated<D: Declare>(
        &mut self,
        declaration: &D,
        gate: Gate,
    ) -> Result<&ResourceConfig, StackError> {
        let resource = declaration.declare()?.with_gate(gate);
        self.add(resource)
    }

    /// Add a neutral resource description
    pub fn add(&mut self, resource: ResourceConfig) -> Result<&ResourceConfig, StackError> {
        let key = resource.key();
        if self.resources.iter().any(|r| r.key() == key) {
            return Err(StackError::DuplicateResource(key));
        }
        debug!(resource = %key, gate = ?resource.gate, "Declared resource");
        self.resources.push(resource);
        let last = self.resources.len() - 1;
        Ok(&self.resources[last])
    }

    pub fn add_output(&mut self, name: impl Into<String>, output: Output) -> Result<(), StackError> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(StackError::DuplicateOutput(name));
        }
        self.outputs.insert(name, output);
        Ok(())
    }

    pub fn resources(&self) -> &[ResourceConfig] {
        &self.resources
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    pub fn get(&self, resource_type: &str, id: &str) -> Option<&ResourceConfig> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.id == id)
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .iter()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Keep only declarations and outputs admitted by `features`
    pub fn filtered(&self, features: &Features) -> Stack {
        Stack {
            name: self.name.clone(),
            providers: self.providers.clone(),
            resources: self
                .resources
                .iter()
                .filter(|r| features.admits(r.gate.as_ref()))
                .cloned()
                .collect(),
            outputs: self
                .outputs
                .iter()
                .filter(|(_, o)| features.admits(o.gate.as_ref()))
                .map(|(k, o)| (k.clone(), o.clone()))
                .collect(),
        }
    }

    /// Check that every reference points at a declaration made earlier
    ///
    /// Outputs may reference any declaration in the stack. All failures are
    /// collected before returning.
    pub fn validate(&self) -> Result<(), StackError> {
        let position: HashMap<String, (usize, ResourceKind)> = self
            .resources
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), (i, r.kind)))
            .collect();
        // kind must match as well as type and id
        let locate = |reference: &Reference| {
            position
                .get(&reference.target_key())
                .filter(|(_, kind)| *kind == reference.kind)
                .map(|(at, _)| *at)
        };

        let mut errors = Vec::new();

        for (index, resource) in self.resources.iter().enumerate() {
            for reference in &resource.references {
                let reason = match locate(reference) {
                    None => Some(ReferenceErrorReason::Undeclared),
                    Some(at) if at >= index => Some(ReferenceErrorReason::DeclaredLater),
                    Some(_) => None,
                };
                if let Some(reason) = reason {
                    errors.push(ReferenceError {
                        from: resource.key(),
                        target: reference.target_key(),
                        reason,
                    });
                }
            }
        }

        for (name, output) in &self.outputs {
            for reference in output.value.references() {
                if locate(reference).is_none() {
                    errors.push(ReferenceError {
                        from: format!("output:{}", name),
                        target: reference.target_key(),
                        reason: ReferenceErrorReason::Undeclared,
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(StackError::UnresolvedReferences(errors))
        }
    }

    /// Resolve an output with attribute values known ahead of apply
    pub fn resolve_output(&self, name: &str, known: &KnownAttributes) -> Option<String> {
        self.outputs
            .get(name)
            .and_then(|o| o.value.resolve(|r| known.get(r).map(str::to_string)))
    }
}

/// Attribute values supplied by the operator (e.g., a project number)
#[derive(Debug, Clone, Default)]
pub struct KnownAttributes {
    values: HashMap<Reference, String>,
}

impl KnownAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, reference: Reference, value: impl Into<String>) {
        self.values.insert(reference, value.into());
    }

    pub fn get(&self, reference: &Reference) -> Option<&str> {
        self.values.get(reference).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account() -> ResourceConfig {
        ResourceConfig::new("test_account", "runner", "test", json!({ "name": "runner" }))
    }

    fn binding(target: &ResourceConfig) -> ResourceConfig {
        let email = target.reference("email");
        ResourceConfig::new(
            "test_binding",
            "runner-access",
            "test",
            json!({ "member": email.render() }),
        )
        .with_references(vec![email])
    }

    #[test]
    fn test_add_rejects_duplicate_keys() {
        let mut stack = Stack::new("demo");
        stack.add(account()).unwrap();

        let err = stack.add(account()).unwrap_err();
        assert_eq!(err, StackError::DuplicateResource("test_account:runner".to_string()));
    }

    #[test]
    fn test_validate_accepts_backward_references() {
        let mut stack = Stack::new("demo");
        let account = stack.add(account()).unwrap().clone();
        stack.add(binding(&account)).unwrap();

        assert!(stack.validate().is_ok());
    }

    #[test]
    fn test_validate_reports_undeclared_and_forward_references() {
        let mut stack = Stack::new("demo");
        let account = account();
        stack.add(binding(&account)).unwrap();
        stack
            .add_output(
                "missing",
                Output::new(Reference::resource("test_bucket", "nope", "url")),
            )
            .unwrap();
        stack.add(account).unwrap();

        let Err(StackError::UnresolvedReferences(errors)) = stack.validate() else {
            panic!("expected unresolved references");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].reason, ReferenceErrorReason::DeclaredLater);
        assert_eq!(errors[0].from, "test_binding:runner-access");
        assert_eq!(errors[1].from, "output:missing");
        assert_eq!(errors[1].reason, ReferenceErrorReason::Undeclared);
    }

    #[test]
    fn test_validate_distinguishes_data_lookups_from_resources() {
        let mut stack = Stack::new("demo");
        stack
            .add(
                ResourceConfig::new("test_project", "project", "test", json!({}))
                    .with_kind(ResourceKind::Data),
            )
            .unwrap();
        let as_data = Reference::data("test_project", "project", "number");
        let as_resource = Reference::resource("test_project", "project", "number");
        stack
            .add(
                ResourceConfig::new("test_binding", "ok", "test", json!({}))
                    .with_references(vec![as_data]),
            )
            .unwrap();
        stack
            .add(
                ResourceConfig::new("test_binding", "wrong-kind", "test", json!({}))
                    .with_references(vec![as_resource.clone()]),
            )
            .unwrap();
        stack.add_output("number", Output::new(as_resource)).unwrap();

        let Err(StackError::UnresolvedReferences(errors)) = stack.validate() else {
            panic!("expected unresolved references");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].from, "test_binding:wrong-kind");
        assert_eq!(errors[0].reason, ReferenceErrorReason::Undeclared);
        assert_eq!(errors[1].from, "output:number");
    }

    #[test]
    fn test_filtered_drops_gated_declarations() {
        let gate = Gate::new("extra");
        let mut stack = Stack::new("demo");
        stack.add(account()).unwrap();
        stack
            .add(ResourceConfig::new("test_service", "svc", "test", json!({})).with_gate(gate.clone()))
            .unwrap();
        stack
            .add_output("svc", Output::new("x").with_gate(gate.clone()))
            .unwrap();

        let without = stack.filtered(&Features::new());
        assert_eq!(without.len(), 1);
        assert!(without.output("svc").is_none());

        let with = stack.filtered(&Features::new().with(gate));
        assert_eq!(with, stack);
    }

    #[test]
    fn test_resolve_output_with_known_attributes() {
        let number = Reference::data("test_project", "project", "number");
        let mut stack = Stack::new("demo");
        stack
            .add_output(
                "url",
                Output::new(Interpolation::literal("https://svc-").push_ref(number.clone())),
            )
            .unwrap();

        let mut known = KnownAttributes::new();
        assert_eq!(stack.resolve_output("url", &known), None);

        known.insert(number, "99");
        assert_eq!(stack.resolve_output("url", &known).as_deref(), Some("https://svc-99"));
    }
}
