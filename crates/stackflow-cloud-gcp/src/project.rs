//! Project data lookup

use crate::provider::PROVIDER;
use serde_json::json;
use stackflow_cloud::{Declare, Reference, ResourceKind};

/// Read-only lookup of a project's metadata (notably its number)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLookup {
    pub id: String,
    pub project_id: String,
}

impl ProjectLookup {
    pub const RESOURCE_TYPE: &'static str = "google_project";

    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
        }
    }

    /// Numeric project identifier, known only once the engine reads it
    pub fn number(&self) -> Reference {
        self.attr("number")
    }
}

impl Declare for ProjectLookup {
    fn resource_type(&self) -> &'static str {
        Self::RESOURCE_TYPE
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Data
    }

    fn config(&self) -> serde_json::Value {
        json!({ "project_id": self.project_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_lookup_is_data_source() {
        let project = ProjectLookup::new("project", "my-project");
        let resource = project.declare().unwrap();

        assert_eq!(resource.kind, ResourceKind::Data);
        assert_eq!(resource.config["project_id"], "my-project");
        assert_eq!(project.number().render(), "${data.google_project.project.number}");
    }
}
