//! 環境変数マップからのデプロイ設定ロード
//!
//! 全フィールドを検証してからエラーをまとめて返します（最初のエラーで止まらない）。

use crate::deployment::{
    DEFAULT_BOLT_DIY_IMAGE_TAG, DEFAULT_NAME, DEFAULT_OAUTH2_PROXY_IMAGE_TAG, DeploymentConfig,
    ImageTags, RegistryLayout,
};
use crate::env_file::{merge_env, read_env_file};
use crate::error::{ConfigError, FieldError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

pub const PROJECT_ID: &str = "PROJECT_ID";
pub const REGION: &str = "REGION";
pub const NO_CLOUD_RUN: &str = "NO_CLOUD_RUN";
pub const STACK_NAME: &str = "STACK_NAME";
pub const BOLT_DIY_IMAGE_TAG: &str = "BOLT_DIY_IMAGE_TAG";
pub const OAUTH2_PROXY_IMAGE_TAG: &str = "OAUTH2_PROXY_IMAGE_TAG";
pub const REGISTRY_LAYOUT: &str = "REGISTRY_LAYOUT";
pub const PROJECT_NUMBER: &str = "PROJECT_NUMBER";

/// 真偽値フラグの解釈
///
/// `"true"` のみ true。`"false"`, `""`, `"yes"`, `"TRUE"` などは全て false。
pub fn parse_flag(value: &str) -> bool {
    value == "true"
}

/// 環境変数マップから設定をロード
#[tracing::instrument(skip(vars), fields(var_count = vars.len()))]
pub fn load_from_map(vars: &HashMap<String, String>) -> Result<DeploymentConfig> {
    let mut errors = Vec::new();

    let project = required(vars, PROJECT_ID, &mut errors, validate_project_id);
    let region = required(vars, REGION, &mut errors, validate_region);
    let name = optional(vars, STACK_NAME, DEFAULT_NAME, &mut errors, validate_name);
    let bolt_diy = optional(
        vars,
        BOLT_DIY_IMAGE_TAG,
        DEFAULT_BOLT_DIY_IMAGE_TAG,
        &mut errors,
        validate_image_tag,
    );
    let oauth2_proxy = optional(
        vars,
        OAUTH2_PROXY_IMAGE_TAG,
        DEFAULT_OAUTH2_PROXY_IMAGE_TAG,
        &mut errors,
        validate_image_tag,
    );

    // 値があれば "true" 以外は false。未設定はエラー
    let no_cloud_run = match vars.get(NO_CLOUD_RUN) {
        Some(value) => parse_flag(value),
        None => {
            errors.push(FieldError::Missing(NO_CLOUD_RUN));
            false
        }
    };

    let registry_layout = match vars.get(REGISTRY_LAYOUT) {
        None => RegistryLayout::default(),
        Some(value) => value.parse().unwrap_or_else(|reason| {
            errors.push(FieldError::Malformed {
                field: REGISTRY_LAYOUT,
                value: value.clone(),
                reason,
            });
            RegistryLayout::default()
        }),
    };

    let project_number = match vars.get(PROJECT_NUMBER) {
        None => None,
        Some(value) => match validate_project_number(value) {
            Ok(()) => Some(value.clone()),
            Err(reason) => {
                errors.push(FieldError::Malformed {
                    field: PROJECT_NUMBER,
                    value: value.clone(),
                    reason,
                });
                None
            }
        },
    };

    if !errors.is_empty() {
        debug!(error_count = errors.len(), "Configuration rejected");
        return Err(ConfigError::Invalid(errors));
    }

    let config = DeploymentConfig {
        name,
        project,
        region,
        images: ImageTags {
            bolt_diy,
            oauth2_proxy,
        },
        no_cloud_run,
        registry_layout,
        project_number,
    };
    info!(
        project = %config.project,
        region = %config.region,
        no_cloud_run = config.no_cloud_run,
        "Deployment configuration loaded"
    );
    Ok(config)
}

/// プロセス環境変数から設定をロード
///
/// 環境変数は一度だけスナップショットされ、以降の処理は値として受け渡されます。
pub fn load_from_env() -> Result<DeploymentConfig> {
    let vars: HashMap<String, String> = std::env::vars().collect();
    load_from_map(&vars)
}

/// .env ファイルとプロセス環境変数から設定をロード（プロセス側が優先）
pub fn load_with_env_file(path: &Path) -> Result<DeploymentConfig> {
    let file_vars = read_env_file(path)?;
    let vars = merge_env(file_vars, std::env::vars());
    load_from_map(&vars)
}

fn required(
    vars: &HashMap<String, String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
    validate: fn(&str) -> std::result::Result<(), String>,
) -> String {
    match vars.get(field) {
        None => {
            errors.push(FieldError::Missing(field));
            String::new()
        }
        Some(value) if value.trim().is_empty() => {
            errors.push(FieldError::Empty(field));
            String::new()
        }
        Some(value) => check(field, value, errors, validate),
    }
}

fn optional(
    vars: &HashMap<String, String>,
    field: &'static str,
    default: &str,
    errors: &mut Vec<FieldError>,
    validate: fn(&str) -> std::result::Result<(), String>,
) -> String {
    match vars.get(field) {
        None => default.to_string(),
        Some(value) if value.is_empty() => default.to_string(),
        Some(value) => check(field, value, errors, validate),
    }
}

fn check(
    field: &'static str,
    value: &str,
    errors: &mut Vec<FieldError>,
    validate: fn(&str) -> std::result::Result<(), String>,
) -> String {
    if let Err(reason) = validate(value) {
        errors.push(FieldError::Malformed {
            field,
            value: value.to_string(),
            reason,
        });
    }
    value.to_string()
}

fn is_lower_alnum_dash(value: &str) -> bool {
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn validate_project_id(value: &str) -> std::result::Result<(), String> {
    if !(6..=30).contains(&value.len()) {
        return Err("6〜30文字で指定してください".to_string());
    }
    if !value.starts_with(|c: char| c.is_ascii_lowercase()) || value.ends_with('-') {
        return Err("英小文字で始まり、ハイフン以外で終わる必要があります".to_string());
    }
    if !is_lower_alnum_dash(value) {
        return Err("英小文字・数字・ハイフンのみ使用できます".to_string());
    }
    Ok(())
}

fn validate_region(value: &str) -> std::result::Result<(), String> {
    if !is_lower_alnum_dash(value) || !value.contains('-') || value.starts_with('-') {
        return Err("us-central1 のような形式で指定してください".to_string());
    }
    Ok(())
}

/// サービスアカウント ID にも使うため、その制約（6〜30文字）に合わせる
fn validate_name(value: &str) -> std::result::Result<(), String> {
    if !(6..=30).contains(&value.len()) {
        return Err("6〜30文字で指定してください".to_string());
    }
    if !value.starts_with(|c: char| c.is_ascii_lowercase())
        || value.ends_with('-')
        || !is_lower_alnum_dash(value)
    {
        return Err("英小文字で始まる英小文字・数字・ハイフンで指定してください".to_string());
    }
    Ok(())
}

fn validate_image_tag(value: &str) -> std::result::Result<(), String> {
    let valid = value.len() <= 128
        && value.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !valid {
        return Err("Docker イメージタグとして不正です".to_string());
    }
    Ok(())
}

fn validate_project_number(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_digit()) {
        return Err("数字のみで指定してください".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base() -> HashMap<String, String> {
        vars(&[
            (PROJECT_ID, "my-project"),
            (REGION, "us-central1"),
            (NO_CLOUD_RUN, "false"),
        ])
    }

    #[test]
    fn test_load_minimal_config() {
        let config = load_from_map(&base()).unwrap();

        assert_eq!(config.name, "bolt-diy");
        assert_eq!(config.project, "my-project");
        assert_eq!(config.region, "us-central1");
        assert_eq!(config.images, ImageTags::default());
        assert!(!config.no_cloud_run);
        assert_eq!(config.registry_layout, RegistryLayout::Remote);
        assert_eq!(config.project_number, None);
    }

    #[test]
    fn test_load_is_idempotent() {
        let mut input = base();
        input.insert(NO_CLOUD_RUN.to_string(), "true".to_string());
        input.insert(PROJECT_NUMBER.to_string(), "123456789012".to_string());

        assert_eq!(load_from_map(&input).unwrap(), load_from_map(&input).unwrap());
    }

    #[test]
    fn test_no_cloud_run_flag_coercion() {
        let cases = [
            ("true", true),
            ("false", false),
            ("", false),
            ("yes", false),
            ("TRUE", false),
            ("1", false),
        ];
        for (value, expected) in cases {
            let mut input = base();
            input.insert(NO_CLOUD_RUN.to_string(), value.to_string());
            let config = load_from_map(&input).unwrap();
            assert_eq!(config.no_cloud_run, expected, "NO_CLOUD_RUN={:?}", value);
        }
    }

    #[test]
    fn test_every_missing_parameter_is_reported() {
        let err = load_from_map(&HashMap::new()).unwrap_err();

        assert_eq!(err.fields(), vec![PROJECT_ID, REGION, NO_CLOUD_RUN]);
        let message = err.to_string();
        assert!(message.contains("PROJECT_ID"));
        assert!(message.contains("REGION"));
        assert!(message.contains("NO_CLOUD_RUN"));
    }

    #[test]
    fn test_missing_no_cloud_run_is_rejected() {
        let mut input = base();
        input.remove(NO_CLOUD_RUN);

        let ConfigError::Invalid(errors) = load_from_map(&input).unwrap_err() else {
            panic!("expected aggregated field errors");
        };
        assert_eq!(errors, vec![FieldError::Missing(NO_CLOUD_RUN)]);
    }

    #[test]
    fn test_stack_name_must_fit_service_account_id() {
        for name in ["bolt", "b".repeat(31).as_str(), "bolt-diy-", "1bolt-diy"] {
            let mut input = base();
            input.insert(STACK_NAME.to_string(), name.to_string());

            let ConfigError::Invalid(errors) = load_from_map(&input).unwrap_err() else {
                panic!("expected aggregated field errors");
            };
            assert!(
                matches!(&errors[..], [FieldError::Malformed { field: STACK_NAME, .. }]),
                "STACK_NAME={:?}: {:?}",
                name,
                errors
            );
        }

        for name in ["bolt-d", "b".repeat(30).as_str()] {
            let mut input = base();
            input.insert(STACK_NAME.to_string(), name.to_string());
            assert_eq!(load_from_map(&input).unwrap().name, name);
        }
    }

    #[test]
    fn test_every_malformed_field_is_reported() {
        let input = vars(&[
            (PROJECT_ID, "My Project"),
            (REGION, ""),
            (BOLT_DIY_IMAGE_TAG, "-bad"),
            (REGISTRY_LAYOUT, "hybrid"),
            (PROJECT_NUMBER, "12ab"),
            (NO_CLOUD_RUN, "false"),
        ]);

        let ConfigError::Invalid(errors) = load_from_map(&input).unwrap_err() else {
            panic!("expected aggregated field errors");
        };
        assert_eq!(errors.len(), 5);
        assert_eq!(errors[1], FieldError::Empty(REGION));
        let fields: Vec<&str> = errors.iter().map(FieldError::field).collect();
        assert_eq!(
            fields,
            vec![PROJECT_ID, REGION, BOLT_DIY_IMAGE_TAG, REGISTRY_LAYOUT, PROJECT_NUMBER]
        );
    }

    #[test]
    fn test_optional_overrides() {
        let mut input = base();
        input.insert(STACK_NAME.to_string(), "bolt-staging".to_string());
        input.insert(OAUTH2_PROXY_IMAGE_TAG.to_string(), "v7.9.0".to_string());
        input.insert(REGISTRY_LAYOUT.to_string(), "shared".to_string());

        let config = load_from_map(&input).unwrap();
        assert_eq!(config.name, "bolt-staging");
        assert_eq!(config.images.oauth2_proxy, "v7.9.0");
        assert_eq!(config.images.bolt_diy, "6a8449e");
        assert_eq!(config.registry_layout, RegistryLayout::Shared);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(!parse_flag("True"));
        assert!(!parse_flag(" true"));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        temp_env::with_vars(
            [
                (PROJECT_ID, Some("env-project")),
                (REGION, Some("europe-west1")),
                (NO_CLOUD_RUN, Some("true")),
                (STACK_NAME, None::<&str>),
                (BOLT_DIY_IMAGE_TAG, None),
                (OAUTH2_PROXY_IMAGE_TAG, None),
                (REGISTRY_LAYOUT, None),
                (PROJECT_NUMBER, None),
            ],
            || {
                let config = load_from_env().unwrap();
                assert_eq!(config.project, "env-project");
                assert_eq!(config.region, "europe-west1");
                assert!(config.no_cloud_run);
            },
        );
    }

    #[test]
    #[serial]
    fn test_load_with_env_file_prefers_process_env() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join(".env");
        std::fs::write(
            &path,
            "PROJECT_ID=file-project\nREGION=us-east1\nNO_CLOUD_RUN=false\n",
        )
        .unwrap();

        temp_env::with_vars(
            [
                (PROJECT_ID, None::<&str>),
                (REGION, Some("us-central1")),
                (NO_CLOUD_RUN, None),
                (STACK_NAME, None),
                (BOLT_DIY_IMAGE_TAG, None),
                (OAUTH2_PROXY_IMAGE_TAG, None),
                (REGISTRY_LAYOUT, None),
                (PROJECT_NUMBER, None),
            ],
            || {
                let config = load_with_env_file(&path).unwrap();
                assert_eq!(config.project, "file-project");
                assert_eq!(config.region, "us-central1");
            },
        );
    }
}
