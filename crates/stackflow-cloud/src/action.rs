//! Change preview between two manifests
//!
//! The provisioning engine owns the real diff against live infrastructure.
//! This plan only compares the previously synthesized manifest with the new
//! one so an operator can see what a synth run changed.

use crate::manifest::Manifest;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Represents a planned change to one declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    /// Type of action to perform
    pub action_type: ActionType,

    /// Resource type (e.g., "google_service_account")
    pub resource_type: String,

    /// Resource identifier
    pub resource_id: String,

    /// Description of the action
    pub description: String,

    /// Top-level config fields that differ (updates only)
    pub details: BTreeMap<String, serde_json::Value>,
}

/// Type of action to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Declaration is new
    Create,
    /// Declaration changed
    Update,
    /// Declaration was removed
    Delete,
    /// No changes needed
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::Delete => write!(f, "delete"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// Plan containing all actions between two manifests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// List of actions, desired declarations first, then deletions
    pub actions: Vec<Action>,

    /// Whether the plan has any changes
    pub has_changes: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_changes = actions.iter().any(|a| a.action_type != ActionType::NoOp);
        Self {
            actions,
            has_changes,
        }
    }

    /// Compare `desired` against the previously synthesized manifest
    pub fn between(previous: Option<&Manifest>, desired: &Manifest) -> Self {
        let mut actions = Vec::new();

        for resource in &desired.resources {
            let key = resource.key();
            let action = match previous.and_then(|p| p.get(&key)) {
                None => Action {
                    id: format!("create-{}", key),
                    action_type: ActionType::Create,
                    resource_type: resource.resource_type.clone(),
                    resource_id: resource.id.clone(),
                    description: format!("{} will be declared", key),
                    details: BTreeMap::new(),
                },
                Some(existing) if existing.config != resource.config => Action {
                    id: format!("update-{}", key),
                    action_type: ActionType::Update,
                    resource_type: resource.resource_type.clone(),
                    resource_id: resource.id.clone(),
                    description: format!("{} changed", key),
                    details: changed_fields(&existing.config, &resource.config),
                },
                Some(_) => Action {
                    id: format!("noop-{}", key),
                    action_type: ActionType::NoOp,
                    resource_type: resource.resource_type.clone(),
                    resource_id: resource.id.clone(),
                    description: format!("{} is unchanged", key),
                    details: BTreeMap::new(),
                },
            };
            actions.push(action);
        }

        if let Some(previous) = previous {
            let desired_keys: HashSet<String> =
                desired.resources.iter().map(|r| r.key()).collect();
            for resource in &previous.resources {
                let key = resource.key();
                if desired_keys.contains(&key) {
                    continue;
                }
                actions.push(Action {
                    id: format!("delete-{}", key),
                    action_type: ActionType::Delete,
                    resource_type: resource.resource_type.clone(),
                    resource_id: resource.id.clone(),
                    description: format!("{} is no longer declared", key),
                    details: BTreeMap::new(),
                });
            }
        }

        Self::new(actions)
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            create: self.actions_by_type(ActionType::Create).len(),
            update: self.actions_by_type(ActionType::Update).len(),
            delete: self.actions_by_type(ActionType::Delete).len(),
            no_change: self.actions_by_type(ActionType::NoOp).len(),
        }
    }
}

/// New values of the top-level config fields that differ
fn changed_fields(
    before: &serde_json::Value,
    after: &serde_json::Value,
) -> BTreeMap<String, serde_json::Value> {
    let (Some(before), Some(after)) = (before.as_object(), after.as_object()) else {
        return [("config".to_string(), after.clone())].into_iter().collect();
    };

    let mut changed = BTreeMap::new();
    for (key, value) in after {
        if before.get(key) != Some(value) {
            changed.insert(key.clone(), value.clone());
        }
    }
    for key in before.keys() {
        if !after.contains_key(key) {
            changed.insert(key.clone(), serde_json::Value::Null);
        }
    }
    changed
}

/// Summary of planned actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub no_change: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete, {} unchanged",
            self.create, self.update, self.delete, self.no_change
        )
    }
}
