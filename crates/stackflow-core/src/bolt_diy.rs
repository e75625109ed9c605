//! bolt.diy スタック
//!
//! oauth2-proxy をサイドカーにした bolt.diy を Cloud Run に載せる構成を宣言します。
//!
//! 宣言順:
//! 1. google プロバイダー
//! 2. Artifact Registry リポジトリ
//! 3. Secret Manager シークレット（3つ）
//! 4. サービスアカウント
//! 5. シークレットのアクセサー権限（シークレットごとに1つ）
//! 6. プロジェクト情報の参照と `service-url` 出力
//! 7. Cloud Run サービスと公開 invoker 権限（`cloud-run` ゲート）
//!
//! ゲート付きの宣言も全て作った上で、最後に [`Features`] でフィルタします。

use crate::props::StackProps;
use stackflow_cloud::{Features, Gate, Interpolation, KnownAttributes, Output, Stack, StackError};
use stackflow_cloud_gcp::{
    ArtifactRepository, CloudRunService, CloudRunServiceIamMember, Container, EnvBinding,
    GoogleProvider, ImageRef, ProjectLookup, Secret, SecretIamMember, ServiceAccount,
    service_url_interpolation,
};
use stackflow_config::{DeploymentConfig, RegistryLayout};
use tracing::{debug, info, instrument};

/// Cloud Run サービス一式のゲート名
pub const CLOUD_RUN_GATE: &str = "cloud-run";

/// サービスURLの出力名
pub const SERVICE_URL_OUTPUT: &str = "service-url";

pub const CLIENT_ID_SECRET: &str = "oauth2-client-id";
pub const CLIENT_SECRET_SECRET: &str = "oauth2-client-secret";
pub const COOKIE_SECRET_SECRET: &str = "oauth2-proxy-cookie-secret";

const SERVICE_ACCOUNT_ID: &str = "cloud-run-service-account";
const PROJECT_LOOKUP_ID: &str = "project";
const SERVICE_ID: &str = "service";
const PUBLIC_INVOKER_ID: &str = "allow-unauthenticated-invocations";

const PROXY_PORT: u16 = 4180;
const APP_PORT: u16 = 5173;
const SECRET_VERSION: &str = "latest";

pub fn cloud_run_gate() -> Gate {
    Gate::new(CLOUD_RUN_GATE)
}

/// 宣言済みリポジトリから見たイメージの置き場所
struct Repositories {
    declared: Vec<ArtifactRepository>,
    bolt_diy: usize,
    oauth2_proxy: usize,
}

impl Repositories {
    fn for_layout(props: &StackProps) -> Self {
        match props.registry_layout {
            RegistryLayout::Remote => Self {
                declared: vec![
                    ArtifactRepository::remote(
                        "bolt-diy-repository",
                        "bolt-diy",
                        "GitHub Container Registry",
                        "https://ghcr.io",
                    )
                    .with_description("bolt.diy repository"),
                    ArtifactRepository::remote(
                        "oauth2-proxy-repository",
                        "oauth2-proxy",
                        "Red Hat Quay",
                        "https://quay.io",
                    ),
                ],
                bolt_diy: 0,
                oauth2_proxy: 1,
            },
            RegistryLayout::Shared => Self {
                declared: vec![
                    ArtifactRepository::standard("repository", props.name.clone())
                        .with_description(format!("{} repository", props.name)),
                ],
                bolt_diy: 0,
                oauth2_proxy: 0,
            },
        }
    }

    fn image(&self, index: usize, props: &StackProps, path: &str, tag: &str) -> ImageRef {
        ImageRef {
            region: props.region.clone(),
            project: props.project.clone(),
            repository: self.declared[index].repository_id_ref(),
            path: path.to_string(),
            tag: tag.to_string(),
        }
    }
}

/// bolt.diy スタックの組み立て
#[derive(Debug, Clone)]
pub struct BoltDiyStack {
    props: StackProps,
}

impl BoltDiyStack {
    pub fn new(props: StackProps) -> Self {
        Self { props }
    }

    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self::new(StackProps::from(config))
    }

    pub fn props(&self) -> &StackProps {
        &self.props
    }

    /// 有効なゲート
    pub fn features(&self) -> Features {
        Features::new().with_if(cloud_run_gate(), !self.props.no_cloud_run)
    }

    /// スタックを組み立て、ゲートでフィルタし、参照を検証する
    #[instrument(skip(self), fields(stack = %self.props.name, no_cloud_run = self.props.no_cloud_run))]
    pub fn compose(&self) -> Result<Stack, StackError> {
        let stack = self.declare_all()?.filtered(&self.features());
        stack.validate()?;
        info!(
            resources = stack.len(),
            outputs = stack.outputs().len(),
            "Stack composed"
        );
        Ok(stack)
    }

    /// ゲートを適用する前の全宣言
    pub fn declare_all(&self) -> Result<Stack, StackError> {
        let props = &self.props;
        let mut stack = Stack::new(props.name.clone());

        GoogleProvider::new(&props.project, &props.region).register(&mut stack);

        // Artifact Registry
        let repositories = Repositories::for_layout(props);
        for repository in &repositories.declared {
            stack.declare(repository)?;
        }

        // Secret Manager
        let client_id = Secret::auto(CLIENT_ID_SECRET);
        let client_secret = Secret::auto(CLIENT_SECRET_SECRET);
        let cookie_secret = Secret::auto(COOKIE_SECRET_SECRET);
        let secrets = [&client_id, &client_secret, &cookie_secret];
        for secret in secrets {
            stack.declare(secret)?;
        }

        // Service Account
        let service_account = ServiceAccount::new(
            SERVICE_ACCOUNT_ID,
            props.name.clone(),
            format!("{} Service Account", title_case(&props.name)),
        );
        stack.declare(&service_account)?;

        // Secret Manager IAM
        for secret in secrets {
            stack.declare(&SecretIamMember::accessor(secret, service_account.member()))?;
        }

        // Service URL
        let project = ProjectLookup::new(PROJECT_LOOKUP_ID, &props.project);
        stack.declare(&project)?;
        let service_url = service_url_interpolation(&props.name, project.number(), &props.region);
        stack.add_output(
            SERVICE_URL_OUTPUT,
            Output::new(service_url.clone()).with_description("The URL of the service"),
        )?;

        // Cloud Run
        let service = CloudRunService {
            id: SERVICE_ID.to_string(),
            name: props.name.clone(),
            location: props.region.clone(),
            ingress: props.ingress,
            client: Some("cloud-console".to_string()),
            service_account: service_account.email(),
            scaling: props.scaling,
            containers: vec![
                self.proxy_container(&repositories, &service_url, [
                    &client_id,
                    &client_secret,
                    &cookie_secret,
                ]),
                self.app_container(&repositories),
            ],
        };
        stack.declare_gated(&service, cloud_run_gate())?;

        if props.ingress.is_public() {
            let invoker = CloudRunServiceIamMember::public_invoker(PUBLIC_INVOKER_ID, &service);
            stack.declare_gated(&invoker, cloud_run_gate())?;
        }

        debug!(declared = stack.len(), "All declarations made");
        Ok(stack)
    }

    /// `PROJECT_NUMBER` など事前に分かっている属性値
    pub fn known_attributes(&self, project_number: Option<&str>) -> KnownAttributes {
        let mut known = KnownAttributes::new();
        if let Some(number) = project_number {
            let project = ProjectLookup::new(PROJECT_LOOKUP_ID, &self.props.project);
            known.insert(project.number(), number);
        }
        known
    }

    fn proxy_container(
        &self,
        repositories: &Repositories,
        service_url: &Interpolation,
        [client_id, client_secret, cookie_secret]: [&Secret; 3],
    ) -> Container {
        let props = &self.props;
        let image = repositories.image(
            repositories.oauth2_proxy,
            props,
            "oauth2-proxy/oauth2-proxy",
            &props.images.oauth2_proxy,
        );

        Container::new(
            "oauth2-proxy-container",
            image.to_interpolation(),
            props.proxy_limits.clone(),
        )
        .with_port(PROXY_PORT)
        .with_env(EnvBinding::literal(
            "OAUTH2_PROXY_HTTP_ADDRESS",
            format!("http://0.0.0.0:{}", PROXY_PORT),
        ))
        .with_env(EnvBinding::literal(
            "OAUTH2_PROXY_UPSTREAMS",
            format!("http://localhost:{}", APP_PORT),
        ))
        .with_env(EnvBinding::literal("OAUTH2_PROXY_PROVIDER", "google"))
        .with_env(EnvBinding::literal("OAUTH2_PROXY_EMAIL_DOMAINS", "*"))
        .with_env(EnvBinding::literal("OAUTH2_PROXY_COOKIE_REFRESH", "1h"))
        .with_env(EnvBinding::literal("OAUTH2_PROXY_COOKIE_SECURE", "true"))
        .with_env(EnvBinding::literal(
            "OAUTH2_PROXY_REDIRECT_URL",
            service_url
                .clone()
                .concat(&Interpolation::literal("/oauth2/callback")),
        ))
        .with_env(EnvBinding::secret(
            "OAUTH2_PROXY_CLIENT_ID",
            client_id.name_ref(),
            SECRET_VERSION,
        ))
        .with_env(EnvBinding::secret(
            "OAUTH2_PROXY_CLIENT_SECRET",
            client_secret.name_ref(),
            SECRET_VERSION,
        ))
        .with_env(EnvBinding::secret(
            "OAUTH2_PROXY_COOKIE_SECRET",
            cookie_secret.name_ref(),
            SECRET_VERSION,
        ))
    }

    fn app_container(&self, repositories: &Repositories) -> Container {
        let props = &self.props;
        let image = repositories.image(
            repositories.bolt_diy,
            props,
            "stackblitz-labs/bolt.diy",
            &props.images.bolt_diy,
        );

        Container::new(
            "bolt-diy-container",
            image.to_interpolation(),
            props.app_limits.clone(),
        )
        .with_env(EnvBinding::literal("NODE_ENV", "production"))
        .with_env(EnvBinding::literal("PORT", APP_PORT.to_string()))
        .with_env(EnvBinding::literal("RUNNING_IN_DOCKER", "true"))
    }
}

/// 設定からスタックを組み立てる
pub fn compose(config: &DeploymentConfig) -> Result<Stack, StackError> {
    BoltDiyStack::from_config(config).compose()
}

/// "bolt-diy" -> "Bolt Diy"
fn title_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
