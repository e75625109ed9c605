//! Artifact Registry repositories

use crate::provider::PROVIDER;
use serde_json::json;
use stackflow_cloud::{Declare, Reference, StackError};

/// How the repository gets its images
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryMode {
    /// Images are pushed into the repository
    Standard,
    /// Pull-through cache in front of an upstream registry
    Remote {
        description: String,
        upstream_uri: String,
    },
}

/// Docker repository declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRepository {
    pub id: String,
    pub repository_id: String,
    pub description: Option<String>,
    pub mode: RepositoryMode,
}

impl ArtifactRepository {
    pub const RESOURCE_TYPE: &'static str = "google_artifact_registry_repository";

    pub fn standard(id: impl Into<String>, repository_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            repository_id: repository_id.into(),
            description: None,
            mode: RepositoryMode::Standard,
        }
    }

    pub fn remote(
        id: impl Into<String>,
        repository_id: impl Into<String>,
        upstream_description: impl Into<String>,
        upstream_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            repository_id: repository_id.into(),
            description: None,
            mode: RepositoryMode::Remote {
                description: upstream_description.into(),
                upstream_uri: upstream_uri.into(),
            },
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn repository_id_ref(&self) -> Reference {
        self.attr("repository_id")
    }
}

impl Declare for ArtifactRepository {
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
        let mut config = json!({
            "repository_id": self.repository_id,
            "format": "DOCKER",
        });
        if let Some(description) = &self.description {
            config["description"] = json!(description);
        }
        match &self.mode {
            RepositoryMode::Standard => {
                config["mode"] = json!("STANDARD_REPOSITORY");
            }
            RepositoryMode::Remote {
                description,
                upstream_uri,
            } => {
                config["mode"] = json!("REMOTE_REPOSITORY");
                config["remote_repository_config"] = json!({
                    "description": description,
                    "common_repository": { "uri": upstream_uri },
                });
                // Upstream images are scanned by their publishers
                config["vulnerability_scanning_config"] = json!({
                    "enablement_config": "DISABLED",
                });
            }
        }
        config
    }

    fn check(&self) -> Result<(), StackError> {
        let id = &self.repository_id;
        let valid = !id.is_empty()
            && id.len() <= 63
            && id.starts_with(|c: char| c.is_ascii_lowercase())
            && id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(StackError::invalid(
                self.key(),
                format!("invalid repository_id '{}'", id),
            ));
        }
        if let RepositoryMode::Remote { upstream_uri, .. } = &self.mode {
            if !upstream_uri.starts_with("https://") {
                return Err(StackError::invalid(
                    self.key(),
                    format!("upstream uri '{}' must use https", upstream_uri),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_repository_config() {
        let repo = ArtifactRepository::remote(
            "bolt-diy-repository",
            "bolt-diy",
            "GitHub Container Registry",
            "https://ghcr.io",
        )
        .with_description("bolt.diy repository");

        let resource = repo.declare().unwrap();
        assert_eq!(resource.config["mode"], "REMOTE_REPOSITORY");
        assert_eq!(resource.config["format"], "DOCKER");
        assert_eq!(
            resource.config["remote_repository_config"]["common_repository"]["uri"],
            "https://ghcr.io"
        );
        assert_eq!(
            resource.config["vulnerability_scanning_config"]["enablement_config"],
            "DISABLED"
        );
        assert_eq!(resource.config["description"], "bolt.diy repository");
    }

    #[test]
    fn test_standard_repository_config() {
        let resource = ArtifactRepository::standard("repo", "bolt-diy")
            .declare()
            .unwrap();

        assert_eq!(resource.config["mode"], "STANDARD_REPOSITORY");
        assert!(resource.config.get("remote_repository_config").is_none());
        assert!(resource.config.get("description").is_none());
    }

    #[test]
    fn test_repository_validation() {
        assert!(ArtifactRepository::standard("repo", "Bolt").declare().is_err());
        assert!(
            ArtifactRepository::remote("repo", "quay", "Quay", "http://quay.io")
                .declare()
                .is_err()
        );
    }
}
