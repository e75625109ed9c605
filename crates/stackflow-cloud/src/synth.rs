//! Synthesis boundary
//!
//! A [`Synthesizer`] receives the finished stack and hands it to whatever
//! the external provisioning engine consumes. Everything after this point
//! (diffing against live infrastructure, apply, retries) belongs to the
//! engine.

use crate::action::Plan;
use crate::error::Result;
use crate::manifest::{Manifest, ManifestStore};
use crate::stack::Stack;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hands a composed stack to the provisioning engine
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Returns the synthesizer name (e.g., "manifest")
    fn name(&self) -> &str;

    /// Submit the stack. Called once per run, after validation.
    async fn synthesize(&self, stack: &Stack) -> Result<SynthReport>;
}

/// Result of a synthesis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthReport {
    pub stack: String,

    /// Where the manifest was written, if the synthesizer writes one
    pub location: Option<PathBuf>,

    pub resource_count: usize,

    pub output_count: usize,

    /// Changes relative to the previous synthesis
    pub plan: Plan,
}

/// Writes stacks as JSON manifests for the engine to pick up
pub struct ManifestSynthesizer {
    store: ManifestStore,
}

impl ManifestSynthesizer {
    pub fn new(store: ManifestStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Preview the changes a synth run would write, without writing
    pub async fn plan(&self, stack: &Stack) -> Result<Plan> {
        let previous = self.store.load(stack.name()).await?;
        let desired = Manifest::from_stack(stack);
        Ok(Plan::between(previous.as_ref(), &desired))
    }
}

#[async_trait]
impl Synthesizer for ManifestSynthesizer {
    fn name(&self) -> &str {
        "manifest"
    }

    #[tracing::instrument(skip(self, stack), fields(stack = %stack.name()))]
    async fn synthesize(&self, stack: &Stack) -> Result<SynthReport> {
        stack.validate()?;

        let previous = self.store.load(stack.name()).await?;
        let manifest = Manifest::from_stack(stack);
        let plan = Plan::between(previous.as_ref(), &manifest);
        let location = self.store.save(&manifest).await?;

        tracing::info!(
            resources = manifest.resources.len(),
            outputs = manifest.outputs.len(),
            summary = %plan.summary(),
            "Stack synthesized"
        );

        Ok(SynthReport {
            stack: manifest.stack,
            location: Some(location),
            resource_count: manifest.resources.len(),
            output_count: manifest.outputs.len(),
            plan,
        })
    }
}
