//! スタック入力

use stackflow_cloud_gcp::{IngressPolicy, ResourceLimits, Scaling};
use stackflow_config::{DeploymentConfig, ImageTags, RegistryLayout};

/// bolt.diy スタックの入力パラメータ
///
/// [`DeploymentConfig`] の値に、環境変数では変えないコンテナ設定を加えたもの。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackProps {
    /// アプリケーション名（サービス名・サービスアカウントIDにも使用）
    pub name: String,
    pub project: String,
    pub region: String,
    pub images: ImageTags,
    pub no_cloud_run: bool,
    pub registry_layout: RegistryLayout,
    pub ingress: IngressPolicy,
    pub scaling: Scaling,
    /// oauth2-proxy コンテナのリソース上限
    pub proxy_limits: ResourceLimits,
    /// bolt.diy コンテナのリソース上限
    pub app_limits: ResourceLimits,
}

impl From<&DeploymentConfig> for StackProps {
    fn from(config: &DeploymentConfig) -> Self {
        Self {
            name: config.name.clone(),
            project: config.project.clone(),
            region: config.region.clone(),
            images: config.images.clone(),
            no_cloud_run: config.no_cloud_run,
            registry_layout: config.registry_layout,
            ingress: IngressPolicy::All,
            scaling: Scaling::default(),
            proxy_limits: ResourceLimits::new("1000m", "512Mi"),
            app_limits: ResourceLimits::new("1000m", "1Gi"),
        }
    }
}
