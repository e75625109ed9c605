//! Google Cloud declarations for StackFlow
//!
//! Typed declarations for the Google Cloud resources a Cloud Run
//! deployment needs. Every type implements [`stackflow_cloud::Declare`];
//! none of them talk to Google APIs.
//!
//! # Resources
//!
//! - Artifact Registry docker repositories (standard or remote)
//! - Secret Manager secrets and accessor bindings
//! - Service accounts
//! - Cloud Run v2 services and invoker bindings
//! - `google_project` data lookup
//!
//! # Example
//!
//! ```ignore
//! use stackflow_cloud::Stack;
//! use stackflow_cloud_gcp::{GoogleProvider, Secret, SecretIamMember, ServiceAccount};
//!
//! let mut stack = Stack::new("demo");
//! GoogleProvider::new("my-project", "us-central1").register(&mut stack);
//!
//! let sa = ServiceAccount::new("runner", "demo-runner", "Demo runner");
//! let secret = Secret::auto("api-token");
//! stack.declare(&sa)?;
//! stack.declare(&secret)?;
//! stack.declare(&SecretIamMember::accessor(&secret, sa.member()))?;
//! stack.validate()?;
//! ```

pub mod artifact_registry;
pub mod cloud_run;
pub mod iam;
pub mod naming;
pub mod project;
pub mod provider;
pub mod secret_manager;

pub use artifact_registry::{ArtifactRepository, RepositoryMode};
pub use cloud_run::{
    CloudRunService, CloudRunServiceIamMember, Container, EnvBinding, IngressPolicy,
    ResourceLimits, Scaling,
};
pub use iam::{Member, ROLE_RUN_INVOKER, ROLE_SECRET_ACCESSOR, ServiceAccount};
pub use naming::{ImageRef, artifact_registry_host, service_url, service_url_interpolation};
pub use project::ProjectLookup;
pub use provider::{GoogleProvider, PROVIDER};
pub use secret_manager::{Replication, Secret, SecretIamMember};
