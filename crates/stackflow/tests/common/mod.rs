#![allow(deprecated)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }

    pub fn out_dir(&self) -> PathBuf {
        self.root.path().join("stackflow.out")
    }

    #[allow(dead_code)]
    pub fn write_env_file(&self, content: &str) -> PathBuf {
        let path = self.root.path().join(".env");
        fs::write(&path, content).unwrap();
        path
    }

    pub fn manifest_path(&self, stack: &str) -> PathBuf {
        self.out_dir()
            .join("stacks")
            .join(stack)
            .join("manifest.json")
    }

    #[allow(dead_code)]
    pub fn read_manifest(&self, stack: &str) -> serde_json::Value {
        let content = fs::read_to_string(self.manifest_path(stack)).unwrap();
        serde_json::from_str(&content).unwrap()
    }

    /// 親プロセスの環境を引き継がない `stackflow` コマンド
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("stackflow").unwrap();
        cmd.current_dir(self.path())
            .env_clear()
            .env("STACKFLOW_OUT", self.out_dir())
            .env("NO_COLOR", "1");
        cmd
    }

    /// PROJECT_ID, REGION, NO_CLOUD_RUN を設定済みのコマンド
    #[allow(dead_code)]
    pub fn configured_cmd(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("PROJECT_ID", "demo-project")
            .env("REGION", "asia-northeast1")
            .env("NO_CLOUD_RUN", "false");
        cmd
    }
}
