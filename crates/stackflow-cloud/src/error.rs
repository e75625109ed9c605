//! Stack and synthesis error types

use std::fmt;
use thiserror::Error;

/// Errors raised while assembling a declaration graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("Duplicate resource declaration: {0}")]
    DuplicateResource(String),

    #[error("Duplicate output: {0}")]
    DuplicateOutput(String),

    #[error("Invalid declaration {key}: {message}")]
    InvalidDeclaration { key: String, message: String },

    #[error("Unresolved references:\n{}", format_reference_errors(.0))]
    UnresolvedReferences(Vec<ReferenceError>),
}

impl StackError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// A declaration that points at a resource the stack cannot resolve
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{from} -> {target}: {reason}")]
pub struct ReferenceError {
    /// Key of the declaration (or `output:<name>`) holding the reference
    pub from: String,

    /// Key of the referenced resource
    pub target: String,

    pub reason: ReferenceErrorReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceErrorReason {
    /// Target is not part of the stack
    Undeclared,
    /// Target exists but is declared after the referencing resource
    DeclaredLater,
}

impl fmt::Display for ReferenceErrorReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceErrorReason::Undeclared => write!(f, "not declared in this stack"),
            ReferenceErrorReason::DeclaredLater => write!(f, "declared after its first use"),
        }
    }
}

fn format_reference_errors(errors: &[ReferenceError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Errors raised at the synthesis boundary (manifest I/O)
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Stack error: {0}")]
    Stack(#[from] StackError),

    #[error("Manifest error: {0}")]
    ManifestError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudError>;
