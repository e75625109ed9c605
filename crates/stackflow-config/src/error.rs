use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("デプロイ設定が不正です ({} 件):\n{}", .0.len(), format_field_errors(.0))]
    Invalid(Vec<FieldError>),

    #[error("環境変数ファイルの読み込みエラー: {path}\n理由: {message}")]
    EnvFile { path: PathBuf, message: String },
}

impl ConfigError {
    /// Names of every parameter that failed validation
    pub fn fields(&self) -> Vec<&str> {
        match self {
            ConfigError::Invalid(errors) => errors.iter().map(FieldError::field).collect(),
            ConfigError::EnvFile { .. } => Vec::new(),
        }
    }
}

/// One rejected parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Missing(&'static str),
    Empty(&'static str),
    Malformed {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl FieldError {
    pub fn field(&self) -> &'static str {
        match self {
            FieldError::Missing(field) | FieldError::Empty(field) => field,
            FieldError::Malformed { field, .. } => field,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::Missing(field) => write!(f, "{} が設定されていません", field),
            FieldError::Empty(field) => write!(f, "{} が空です", field),
            FieldError::Malformed {
                field,
                value,
                reason,
            } => write!(f, "{} の値 '{}' が不正です: {}", field, value, reason),
        }
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, ConfigError>;
