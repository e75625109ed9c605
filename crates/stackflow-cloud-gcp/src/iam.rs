//! Service accounts and IAM members

use crate::provider::PROVIDER;
use serde_json::json;
use stackflow_cloud::{Declare, Interpolation, Reference, StackError};

pub const ROLE_SECRET_ACCESSOR: &str = "roles/secretmanager.secretAccessor";
pub const ROLE_RUN_INVOKER: &str = "roles/run.invoker";

/// Service account declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub id: String,
    pub account_id: String,
    pub display_name: String,
}

impl ServiceAccount {
    pub const RESOURCE_TYPE: &'static str = "google_service_account";

    pub fn new(
        id: impl Into<String>,
        account_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            account_id: account_id.into(),
            display_name: display_name.into(),
        }
    }

    pub fn email(&self) -> Reference {
        self.attr("email")
    }

    /// `serviceAccount:<email>` member for IAM bindings
    pub fn member(&self) -> Member {
        Member::ServiceAccount(self.email())
    }
}

impl Declare for ServiceAccount {
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
            "account_id": self.account_id,
            "display_name": self.display_name,
        })
    }

    fn check(&self) -> Result<(), StackError> {
        if !is_valid_account_id(&self.account_id) {
            return Err(StackError::invalid(
                self.key(),
                format!(
                    "account_id '{}' must be 6-30 lowercase letters, digits or hyphens, starting with a letter",
                    self.account_id
                ),
            ));
        }
        Ok(())
    }
}

fn is_valid_account_id(id: &str) -> bool {
    (6..=30).contains(&id.len())
        && id.starts_with(|c: char| c.is_ascii_lowercase())
        && !id.ends_with('-')
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// IAM member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// `serviceAccount:<email>`, email read from a declared service account
    ServiceAccount(Reference),
    /// `allUsers`, i.e. unauthenticated public access
    AllUsers,
    /// `user:<email>`
    User(String),
}

impl Member {
    pub fn to_interpolation(&self) -> Interpolation {
        match self {
            Member::ServiceAccount(email) => {
                Interpolation::literal("serviceAccount:").push_ref(email.clone())
            }
            Member::AllUsers => Interpolation::literal("allUsers"),
            Member::User(email) => Interpolation::literal(format!("user:{}", email)),
        }
    }

    pub fn references(&self) -> Vec<Reference> {
        match self {
            Member::ServiceAccount(email) => vec![email.clone()],
            Member::AllUsers | Member::User(_) => Vec::new(),
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Member::AllUsers)
    }
}
