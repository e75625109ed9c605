//! StackFlow Cloud declarations
//!
//! This crate provides the provider-neutral model for declaring cloud
//! resources: typed declarations are turned into [`ResourceConfig`]s, held
//! in a [`Stack`] together with derived [`Output`]s, validated, and handed
//! to a [`Synthesizer`] for the external provisioning engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                 StackFlow CLI                    │
//! │           (stackflow synth / plan)               │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               stackflow-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  Stack: declarations, outputs, gates      │   │
//! │  │  trait Declare { ... }                    │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ Ref checking │  │  Manifests   │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ google cloud  │
//! │ declarations  │
//! └───────────────┘
//! ```

pub mod action;
pub mod error;
pub mod manifest;
pub mod reference;
pub mod resource;
pub mod stack;
pub mod synth;

// Re-exports
pub use action::{Action, ActionType, Plan, PlanSummary};
pub use error::{CloudError, ReferenceError, ReferenceErrorReason, Result, StackError};
pub use manifest::{Manifest, ManifestOutput, ManifestStore};
pub use reference::{Interpolation, Reference, ResourceKind, Token};
pub use resource::{Declare, Features, Gate, ResourceConfig};
pub use stack::{KnownAttributes, Output, ProviderBlock, Stack};
pub use synth::{ManifestSynthesizer, SynthReport, Synthesizer};
