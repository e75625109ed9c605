//! StackFlow スタック構築
//!
//! [`stackflow_config::DeploymentConfig`] を受け取り、宣言グラフ
//! ([`stackflow_cloud::Stack`]) を一度に組み立てます。I/O は行いません。

pub mod bolt_diy;
pub mod props;

pub use bolt_diy::{
    BoltDiyStack, CLIENT_ID_SECRET, CLIENT_SECRET_SECRET, CLOUD_RUN_GATE, COOKIE_SECRET_SECRET,
    SERVICE_URL_OUTPUT, cloud_run_gate, compose,
};
pub use props::StackProps;
