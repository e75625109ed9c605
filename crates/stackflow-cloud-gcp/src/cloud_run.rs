//! Cloud Run v2 services

use crate::iam::{Member, ROLE_RUN_INVOKER};
use crate::provider::PROVIDER;
use serde_json::json;
use stackflow_cloud::{Declare, Interpolation, Reference, StackError};
use std::collections::HashSet;

/// Which sources may reach the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngressPolicy {
    /// Public internet
    #[default]
    All,
    /// VPC and same-project traffic only
    InternalOnly,
    /// Internal traffic plus external load balancers
    InternalAndLoadBalancer,
}

impl IngressPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngressPolicy::All => "INGRESS_TRAFFIC_ALL",
            IngressPolicy::InternalOnly => "INGRESS_TRAFFIC_INTERNAL_ONLY",
            IngressPolicy::InternalAndLoadBalancer => {
                "INGRESS_TRAFFIC_INTERNAL_LOAD_BALANCER"
            }
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, IngressPolicy::All)
    }
}

/// Instance count envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaling {
    pub min_instances: u32,
    pub max_instances: u32,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            min_instances: 0,
            max_instances: 2,
        }
    }
}

/// Per-container resource limits (e.g., cpu "1000m", memory "512Mi")
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu: String,
    pub memory: String,
}

impl ResourceLimits {
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            memory: memory.into(),
        }
    }
}

/// Container environment variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvBinding {
    Literal {
        name: String,
        value: Interpolation,
    },
    /// Value read from a Secret Manager secret at container start
    Secret {
        name: String,
        /// Reference to the secret's `id`
        secret: Reference,
        version: String,
    },
}

impl EnvBinding {
    pub fn literal(name: impl Into<String>, value: impl Into<Interpolation>) -> Self {
        EnvBinding::Literal {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn secret(name: impl Into<String>, secret: Reference, version: impl Into<String>) -> Self {
        EnvBinding::Secret {
            name: name.into(),
            secret,
            version: version.into(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EnvBinding::Literal { name, .. } | EnvBinding::Secret { name, .. } => name,
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            EnvBinding::Literal { name, value } => json!({
                "name": name,
                "value": value.render(),
            }),
            EnvBinding::Secret {
                name,
                secret,
                version,
            } => json!({
                "name": name,
                "value_source": {
                    "secret_key_ref": {
                        "secret": secret.render(),
                        "version": version,
                    }
                },
            }),
        }
    }

    fn references(&self) -> Vec<Reference> {
        match self {
            EnvBinding::Literal { value, .. } => value.references().cloned().collect(),
            EnvBinding::Secret { secret, .. } => vec![secret.clone()],
        }
    }
}

/// One container of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
    pub image: Interpolation,
    /// Port receiving traffic; only the ingress container has one
    pub port: Option<u16>,
    pub limits: ResourceLimits,
    pub env: Vec<EnvBinding>,
}

impl Container {
    pub fn new(
        name: impl Into<String>,
        image: impl Into<Interpolation>,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            port: None,
            limits,
            env: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_env(mut self, binding: EnvBinding) -> Self {
        self.env.push(binding);
        self
    }

    fn to_json(&self) -> serde_json::Value {
        let mut container = json!({
            "name": self.name,
            "image": self.image.render(),
            "resources": {
                "limits": {
                    "cpu": self.limits.cpu,
                    "memory": self.limits.memory,
                }
            },
            "env": self.env.iter().map(EnvBinding::to_json).collect::<Vec<_>>(),
        });
        if let Some(port) = self.port {
            container["ports"] = json!({ "container_port": port });
        }
        container
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self.image.references().cloned().collect();
        for binding in &self.env {
            refs.extend(binding.references());
        }
        refs
    }
}

/// Cloud Run v2 service declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRunService {
    pub id: String,
    pub name: String,
    pub location: String,
    pub ingress: IngressPolicy,
    /// Client tag; "cloud-console" keeps console edits from showing as drift
    pub client: Option<String>,
    /// Reference to the executing service account's `email`
    pub service_account: Reference,
    pub scaling: Scaling,
    /// Ordered; the first container with a port receives traffic
    pub containers: Vec<Container>,
}

impl CloudRunService {
    pub const RESOURCE_TYPE: &'static str = "google_cloud_run_v2_service";

    pub fn name_ref(&self) -> Reference {
        self.attr("name")
    }
}

impl Declare for CloudRunService {
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
            "name": self.name,
            "location": self.location,
            "ingress": self.ingress.as_str(),
            "template": {
                "service_account": self.service_account.render(),
                "scaling": {
                    "min_instance_count": self.scaling.min_instances,
                    "max_instance_count": self.scaling.max_instances,
                },
                "containers": self.containers.iter().map(Container::to_json).collect::<Vec<_>>(),
            },
        });
        if let Some(client) = &self.client {
            config["client"] = json!(client);
        }
        config
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![self.service_account.clone()];
        for container in &self.containers {
            refs.extend(container.references());
        }
        refs
    }

    fn check(&self) -> Result<(), StackError> {
        let key = self.key();
        if self.containers.is_empty() {
            return Err(StackError::invalid(key, "at least one container is required"));
        }
        if self.scaling.min_instances > self.scaling.max_instances {
            return Err(StackError::invalid(
                key,
                format!(
                    "min instances ({}) exceeds max instances ({})",
                    self.scaling.min_instances, self.scaling.max_instances
                ),
            ));
        }

        let mut names = HashSet::new();
        for container in &self.containers {
            if !names.insert(container.name.as_str()) {
                return Err(StackError::invalid(
                    key,
                    format!("duplicate container name '{}'", container.name),
                ));
            }
            let mut env_names = HashSet::new();
            for binding in &container.env {
                if !env_names.insert(binding.name()) {
                    return Err(StackError::invalid(
                        key,
                        format!(
                            "container '{}' sets env '{}' twice",
                            container.name,
                            binding.name()
                        ),
                    ));
                }
            }
        }

        let ingress_containers = self.containers.iter().filter(|c| c.port.is_some()).count();
        if self.containers.len() > 1 && ingress_containers != 1 {
            return Err(StackError::invalid(
                key,
                format!(
                    "multi-container services need exactly one container with a port, found {}",
                    ingress_containers
                ),
            ));
        }
        Ok(())
    }
}

/// `(service, role, member)` binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudRunServiceIamMember {
    pub id: String,
    /// Reference to the service's `name`
    pub service: Reference,
    pub location: String,
    pub role: String,
    pub member: Member,
}

impl CloudRunServiceIamMember {
    pub const RESOURCE_TYPE: &'static str = "google_cloud_run_v2_service_iam_member";

    /// Allow unauthenticated invocations
    pub fn public_invoker(id: impl Into<String>, service: &CloudRunService) -> Self {
        Self {
            id: id.into(),
            service: service.name_ref(),
            location: service.location.clone(),
            role: ROLE_RUN_INVOKER.to_string(),
            member: Member::AllUsers,
        }
    }

    pub fn is_public_invoker(&self) -> bool {
        self.role == ROLE_RUN_INVOKER && self.member.is_public()
    }
}

impl Declare for CloudRunServiceIamMember {
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
            "name": self.service.render(),
            "location": self.location,
            "role": self.role,
            "member": self.member.to_interpolation().render(),
        })
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs = vec![self.service.clone()];
        refs.extend(self.member.references());
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service_account() -> Reference {
        Reference::resource("google_service_account", "runner", "email")
    }

    fn secret() -> Reference {
        Reference::resource("google_secret_manager_secret", "token", "id")
    }

    fn service(containers: Vec<Container>) -> CloudRunService {
        CloudRunService {
            id: "service".to_string(),
            name: "bolt-diy".to_string(),
            location: "us-central1".to_string(),
            ingress: IngressPolicy::All,
            client: Some("cloud-console".to_string()),
            service_account: service_account(),
            scaling: Scaling::default(),
            containers,
        }
    }

    fn proxy() -> Container {
        Container::new("proxy", "quay.io/oauth2-proxy:v1", ResourceLimits::new("1000m", "512Mi"))
            .with_port(4180)
            .with_env(EnvBinding::literal("OAUTH2_PROXY_PROVIDER", "google"))
            .with_env(EnvBinding::secret("OAUTH2_PROXY_CLIENT_ID", secret(), "latest"))
    }

    fn app() -> Container {
        Container::new("app", "ghcr.io/app:v1", ResourceLimits::new("1000m", "1Gi"))
            .with_env(EnvBinding::literal("PORT", "5173"))
    }

    #[test]
    fn test_service_config_keeps_container_order() {
        let resource = service(vec![proxy(), app()]).declare().unwrap();

        let containers = resource.config["template"]["containers"].as_array().unwrap();
        assert_eq!(containers[0]["name"], "proxy");
        assert_eq!(containers[1]["name"], "app");
        assert_eq!(containers[0]["ports"]["container_port"], 4180);
        assert!(containers[1].get("ports").is_none());
        assert_eq!(resource.config["ingress"], "INGRESS_TRAFFIC_ALL");
        assert_eq!(resource.config["client"], "cloud-console");
        assert_eq!(
            resource.config["template"]["scaling"],
            json!({ "min_instance_count": 0, "max_instance_count": 2 })
        );
    }

    #[test]
    fn test_secret_env_binding_is_referenced() {
        let resource = service(vec![proxy(), app()]).declare().unwrap();

        let env = &resource.config["template"]["containers"][0]["env"][1];
        assert_eq!(
            env["value_source"]["secret_key_ref"]["secret"],
            "${google_secret_manager_secret.token.id}"
        );
        assert_eq!(env["value_source"]["secret_key_ref"]["version"], "latest");
        assert!(resource.references.contains(&secret()));
        assert!(resource.references.contains(&service_account()));
    }

    #[test]
    fn test_service_checks() {
        assert!(service(vec![]).declare().is_err());
        // duplicate names
        assert!(service(vec![app(), app().with_port(8080)]).declare().is_err());
        // two containers, no ingress port
        let other = Container {
            name: "other".into(),
            ..app()
        };
        assert!(service(vec![app(), other]).declare().is_err());

        let mut bad_scaling = service(vec![proxy()]);
        bad_scaling.scaling = Scaling {
            min_instances: 3,
            max_instances: 1,
        };
        assert!(bad_scaling.declare().is_err());

        let twice = proxy().with_env(EnvBinding::literal("OAUTH2_PROXY_PROVIDER", "github"));
        assert!(service(vec![twice]).declare().is_err());
    }

    #[test]
    fn test_public_invoker() {
        let svc = service(vec![proxy(), app()]);
        let invoker = CloudRunServiceIamMember::public_invoker("allow-unauthenticated-invocations", &svc);
        assert!(invoker.is_public_invoker());

        let resource = invoker.declare().unwrap();
        assert_eq!(resource.config["member"], "allUsers");
        assert_eq!(resource.config["role"], "roles/run.invoker");
        assert_eq!(resource.config["name"], "${google_cloud_run_v2_service.service.name}");
        assert_eq!(resource.references, vec![svc.name_ref()]);
    }

    #[test]
    fn test_ingress_policy_strings() {
        assert!(IngressPolicy::All.is_public());
        assert!(!IngressPolicy::InternalOnly.is_public());
        assert_eq!(
            IngressPolicy::InternalAndLoadBalancer.as_str(),
            "INGRESS_TRAFFIC_INTERNAL_LOAD_BALANCER"
        );
    }
}
