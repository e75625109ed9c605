//! .env ファイルの読み込み

use crate::error::{ConfigError, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// .env ファイルを KEY=VALUE のマップとして読み込む
///
/// 空行と `#` で始まる行は無視し、値を囲むクォートは除去します。
#[tracing::instrument]
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EnvFile {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vars = parse_env_content(&content);
    info!(
        env_file = %path.display(),
        variable_count = vars.len(),
        "Loaded variables from .env file"
    );
    Ok(vars)
}

/// .env 形式の文字列をパース
pub fn parse_env_content(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();

        // 空行とコメント行をスキップ
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line = line.strip_prefix("export ").unwrap_or(line);

        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                let key = key.trim();
                let value = strip_quotes(value.trim());
                debug!(key = %key, "Read variable from .env");
                vars.insert(key.to_string(), value.to_string());
            }
            _ => {
                warn!(line = index + 1, "Skipping malformed .env line");
            }
        }
    }

    vars
}

/// "value" や 'value' のクォートを除去
fn strip_quotes(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// .env の値にプロセス環境変数を上書きしたマップを作る
pub fn merge_env(
    file_vars: HashMap<String, String>,
    process_vars: impl IntoIterator<Item = (String, String)>,
) -> HashMap<String, String> {
    let mut merged = file_vars;
    merged.extend(process_vars);
    merged
}
