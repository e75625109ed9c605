//! StackFlow デプロイ設定
//!
//! 環境変数（および任意の .env ファイル）から [`DeploymentConfig`] を作ります。
//! スタック構築の前に全項目を検証し、不正な項目はまとめて報告します。

pub mod deployment;
pub mod env_file;
pub mod error;
pub mod loader;

pub use deployment::*;
pub use env_file::{merge_env, parse_env_content, read_env_file};
pub use error::*;
pub use loader::{load_from_env, load_from_map, load_with_env_file, parse_flag};
