//! デプロイ設定モデル

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// アプリケーション名のデフォルト（リポジトリ名・サービス名にも使用）
pub const DEFAULT_NAME: &str = "bolt-diy";

/// bolt.diy イメージタグのデフォルト
pub const DEFAULT_BOLT_DIY_IMAGE_TAG: &str = "6a8449e";

/// oauth2-proxy イメージタグのデフォルト
pub const DEFAULT_OAUTH2_PROXY_IMAGE_TAG: &str = "v7.8.1";

/// 検証済みのデプロイ設定
///
/// 環境変数から一度だけ読み込まれ、以降は値として各コンポーネントに渡されます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// アプリケーション名（サービス名・サービスアカウントIDにも使用）
    pub name: String,

    /// デプロイ先プロジェクトID
    pub project: String,

    /// デプロイ先リージョン（us-central1 など）
    pub region: String,

    /// コンテナイメージのタグ
    pub images: ImageTags,

    /// true の場合 Cloud Run サービスを宣言しない
    pub no_cloud_run: bool,

    /// Artifact Registry の構成
    pub registry_layout: RegistryLayout,

    /// プロジェクト番号（既知の場合のみ。出力値のローカル解決に使用）
    pub project_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTags {
    pub bolt_diy: String,
    pub oauth2_proxy: String,
}

impl Default for ImageTags {
    fn default() -> Self {
        Self {
            bolt_diy: DEFAULT_BOLT_DIY_IMAGE_TAG.to_string(),
            oauth2_proxy: DEFAULT_OAUTH2_PROXY_IMAGE_TAG.to_string(),
        }
    }
}

/// Artifact Registry リポジトリの構成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryLayout {
    /// イメージごとのリモートリポジトリ（ghcr.io / quay.io のプロキシ）
    #[default]
    Remote,
    /// アプリ名の標準リポジトリ1つに両イメージを push する
    Shared,
}

impl fmt::Display for RegistryLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryLayout::Remote => write!(f, "remote"),
            RegistryLayout::Shared => write!(f, "shared"),
        }
    }
}

impl FromStr for RegistryLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remote" => Ok(RegistryLayout::Remote),
            "shared" => Ok(RegistryLayout::Shared),
            other => Err(format!(
                "'{}' は未対応です（remote または shared を指定してください）",
                other
            )),
        }
    }
}
