//! Secret Manager secrets and their accessor bindings

use crate::iam::Member;
use crate::provider::PROVIDER;
use serde_json::json;
use stackflow_cloud::{Declare, Reference, StackError};

/// Secret replication policy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Replication {
    /// Google-managed replication
    #[default]
    Auto,
    /// Replicas pinned to the given locations
    UserManaged(Vec<String>),
}

impl Replication {
    fn to_json(&self) -> serde_json::Value {
        match self {
            Replication::Auto => json!({ "auto": {} }),
            Replication::UserManaged(locations) => json!({
                "user_managed": {
                    "replicas": locations
                        .iter()
                        .map(|l| json!({ "location": l }))
                        .collect::<Vec<_>>(),
                }
            }),
        }
    }
}

/// Secret declaration (the container only; versions are added out of band)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub id: String,
    pub secret_id: String,
    pub replication: Replication,
}

impl Secret {
    pub const RESOURCE_TYPE: &'static str = "google_secret_manager_secret";

    /// Secret whose logical id and secret id are the same
    pub fn auto(secret_id: impl Into<String>) -> Self {
        let secret_id = secret_id.into();
        Self {
            id: secret_id.clone(),
            secret_id,
            replication: Replication::Auto,
        }
    }

    pub fn with_replication(mut self, replication: Replication) -> Self {
        self.replication = replication;
        self
    }

    /// Fully-qualified secret name, as used by env var bindings
    pub fn name_ref(&self) -> Reference {
        self.attr("id")
    }

    pub fn secret_id_ref(&self) -> Reference {
        self.attr("secret_id")
    }
}

impl Declare for Secret {
    fn resource_type(&self) -> &'static str {
        Self::RESOURCE_TYPE
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn config(&self) -> serde_json::Value {
        json!({
            "secret_id": self.secret_id,
            "replication": self.replication.to_json(),
        })
    }

    fn check(&self) -> Result<(), StackError> {
        let valid = !self.secret_id.is_empty()
            && self.secret_id.len() <= 255
            && self
                .secret_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StackError::invalid(
                self.key(),
                format!("invalid secret_id '{}'", self.secret_id),
            ));
        }
        if let Replication::UserManaged(locations) = &self.replication {
            if locations.is_empty() {
                return Err(StackError::invalid(
                    self.key(),
                    "user-managed replication needs at least one location",
                ));
            }
        }
        Ok(())
    }
}

/// `(secret, role, member)` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretIamMember {
    pub id: String,
    /// Reference to the secret's `secret_id`
    pub secret: Reference,
    pub role: String,
    pub member: Member,
}

impl SecretIamMember {
    pub const RESOURCE_TYPE: &'static str = "google_secret_manager_secret_iam_member";

    /// Grant `member` read access to `secret`
    pub fn accessor(secret: &Secret, member: Member) -> Self {
        Self {
            id: format!("secret-accessor-{}", secret.id),
            secret: secret.secret_id_ref(),
            role: crate::iam::ROLE_SECRET_ACCESSOR.to_string(),
            member,
        }
    }
}

impl Declare for SecretIamMember {
    fn resource_type(&self) -> &'static str {
        Self::RESOURCE_TYPE
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn config(&self) -> serde_json::Value {
        json!({
            "secret_id": self.secret.render(),
            "role": self.role,
            "member": self.member.to_interpolation().render(),
        })
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![self.secret.clone()];
        refs.extend(self.member.references());
        refs
    }
}
