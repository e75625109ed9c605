//! Google Cloud naming conventions
//!
//! Values here must match what the platform generates, since other
//! declarations (OAuth redirect URLs, image paths) are built from them.

use stackflow_cloud::{Interpolation, Reference};

/// Deterministic Cloud Run URL: `https://<name>-<project-number>.<region>.run.app`
pub fn service_url(name: &str, project_number: &str, region: &str) -> String {
    format!("https://{}-{}.{}.run.app", name, project_number, region)
}

/// Same URL with the project number left as a reference for the engine
pub fn service_url_interpolation(
    name: &str,
    project_number: Reference,
    region: &str,
) -> Interpolation {
    Interpolation::literal(format!("https://{}-", name))
        .push_ref(project_number)
        .push_str(format!(".{}.run.app", region))
}

/// Artifact Registry docker host for a region
pub fn artifact_registry_host(region: &str) -> String {
    format!("{}-docker.pkg.dev", region)
}

/// Container image stored in (or proxied through) an Artifact Registry repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub region: String,
    pub project: String,
    /// Reference to the repository's `repository_id`
    pub repository: Reference,
    /// Image path inside the repository (e.g., "oauth2-proxy/oauth2-proxy")
    pub path: String,
    pub tag: String,
}

impl ImageRef {
    pub fn to_interpolation(&self) -> Interpolation {
        Interpolation::literal(format!(
            "{}/{}/",
            artifact_registry_host(&self.region),
            self.project
        ))
        .push_ref(self.repository.clone())
        .push_str(format!("/{}:{}", self.path, self.tag))
    }

    /// Image string with the repository id filled in
    pub fn resolved(&self, repository_id: &str) -> String {
        format!(
            "{}/{}/{}/{}:{}",
            artifact_registry_host(&self.region),
            self.project,
            repository_id,
            self.path,
            self.tag
        )
    }
}
