//! Synthesized stack manifests
//!
//! A manifest is the JSON form of a [`Stack`] handed to the provisioning
//! engine. Manifests are written to `<out>/stacks/<stack>/manifest.json`;
//! the previous manifest is kept next to it as a backup so the next run can
//! show what changed.

use crate::error::{CloudError, Result};
use crate::resource::ResourceConfig;
use crate::stack::Stack;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

const MANIFEST_VERSION: u32 = 1;
const STACKS_DIR: &str = "stacks";
const MANIFEST_FILE: &str = "manifest.json";
const MANIFEST_BACKUP: &str = "manifest.json.backup";

/// JSON form of a synthesized stack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Manifest format version
    pub version: u32,

    pub stack: String,

    pub synthesized_at: DateTime<Utc>,

    /// Provider blocks indexed by provider name
    pub providers: BTreeMap<String, serde_json::Value>,

    /// Declarations in declaration order
    pub resources: Vec<ResourceConfig>,

    pub outputs: BTreeMap<String, ManifestOutput>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestOutput {
    /// Value with references rendered as engine interpolations
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Manifest {
    pub fn from_stack(stack: &Stack) -> Self {
        Self {
            version: MANIFEST_VERSION,
            stack: stack.name().to_string(),
            synthesized_at: Utc::now(),
            providers: stack
                .providers()
                .iter()
                .map(|p| (p.name.clone(), p.config.clone()))
                .collect(),
            resources: stack.resources().to_vec(),
            outputs: stack
                .outputs()
                .iter()
                .map(|(name, output)| {
                    (
                        name.clone(),
                        ManifestOutput {
                            value: output.value.render(),
                            description: output.description.clone(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Compare everything except the synthesis timestamp
    pub fn same_content(&self, other: &Manifest) -> bool {
        self.stack == other.stack
            && self.providers == other.providers
            && self.resources == other.resources
            && self.outputs == other.outputs
    }

    pub fn get(&self, key: &str) -> Option<&ResourceConfig> {
        self.resources.iter().find(|r| r.key() == key)
    }
}

/// Reads and writes manifests under an output directory
pub struct ManifestStore {
    out_dir: PathBuf,
}

impl ManifestStore {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    fn stack_dir(&self, stack: &str) -> PathBuf {
        self.out_dir.join(STACKS_DIR).join(stack)
    }

    /// Get the manifest file path for a stack
    pub fn manifest_path(&self, stack: &str) -> PathBuf {
        self.stack_dir(stack).join(MANIFEST_FILE)
    }

    fn backup_path(&self, stack: &str) -> PathBuf {
        self.stack_dir(stack).join(MANIFEST_BACKUP)
    }

    async fn ensure_stack_dir(&self, stack: &str) -> Result<()> {
        let dir = self.stack_dir(stack);
        if !dir.exists() {
            fs::create_dir_all(&dir).await?;
            tracing::debug!("Created stack directory: {}", dir.display());
        }
        Ok(())
    }

    /// Load the last synthesized manifest, if any
    pub async fn load(&self, stack: &str) -> Result<Option<Manifest>> {
        let path = self.manifest_path(stack);
        if !path.exists() {
            tracing::debug!("No previous manifest for stack {}", stack);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let manifest: Manifest = serde_json::from_str(&content)?;

        if manifest.version > MANIFEST_VERSION {
            return Err(CloudError::ManifestError(format!(
                "Manifest version {} is newer than supported version {}",
                manifest.version, MANIFEST_VERSION
            )));
        }

        tracing::debug!(
            "Loaded manifest with {} resources",
            manifest.resources.len()
        );
        Ok(Some(manifest))
    }

    /// Write the manifest, moving any existing one to the backup slot
    pub async fn save(&self, manifest: &Manifest) -> Result<PathBuf> {
        self.ensure_stack_dir(&manifest.stack).await?;

        let path = self.manifest_path(&manifest.stack);
        let backup = self.backup_path(&manifest.stack);

        if path.exists() {
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&path, &backup).await?;
            tracing::debug!("Created manifest backup");
        }

        let content = serde_json::to_string_pretty(manifest)?;
        fs::write(&path, content).await?;

        tracing::debug!(
            "Saved manifest with {} resources",
            manifest.resources.len()
        );
        Ok(path)
    }
}
