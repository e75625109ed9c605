//! Google provider block

use serde_json::json;
use stackflow_cloud::Stack;

/// Provider name used by every declaration in this crate
pub const PROVIDER: &str = "google";

/// Google provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProvider {
    pub project: String,
    pub region: String,
}

impl GoogleProvider {
    pub fn new(project: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            region: region.into(),
        }
    }

    pub fn config(&self) -> serde_json::Value {
        json!({
            "project": self.project,
            "region": self.region,
        })
    }

    /// Register this provider on a stack
    pub fn register(&self, stack: &mut Stack) {
        tracing::debug!(project = %self.project, region = %self.region, "Registering google provider");
        stack.add_provider(PROVIDER, self.config());
    }
}
