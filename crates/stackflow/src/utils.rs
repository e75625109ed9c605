use colored::Colorize;
use stackflow_cloud::Stack;
use stackflow_config::{ConfigError, DeploymentConfig};
use stackflow_core::BoltDiyStack;
use std::path::Path;

/// 設定をロードし、失敗したら全項目を表示して終了する
///
/// スタックの宣言はこの後にしか始まらないため、設定エラー時は何も生成されない。
pub fn load_config_or_exit(env_file: Option<&Path>) -> DeploymentConfig {
    let result = match env_file {
        Some(path) => stackflow_config::load_with_env_file(path),
        None => stackflow_config::load_from_env(),
    };

    match result {
        Ok(config) => config,
        Err(e) => {
            print_config_error(&e);
            std::process::exit(1);
        }
    }
}

fn print_config_error(error: &ConfigError) {
    eprintln!();
    eprintln!("{}", "✗ 設定エラー".red().bold());
    eprintln!("  {}", error);
    if !error.fields().is_empty() {
        eprintln!();
        eprintln!(
            "{}",
            "ヒント: PROJECT_ID, REGION, NO_CLOUD_RUN は必須です（例: PROJECT_ID=my-project REGION=us-central1 NO_CLOUD_RUN=false）"
                .yellow()
        );
    }
}

/// 出力値を表示（プロジェクト番号が分かっていれば解決済みの値も）
pub fn print_outputs(stack: &Stack, stack_def: &BoltDiyStack, project_number: Option<&str>) {
    if stack.outputs().is_empty() {
        return;
    }

    let known = stack_def.known_attributes(project_number);
    println!();
    println!("{}", "出力:".bold());
    for (name, output) in stack.outputs() {
        match stack.resolve_output(name, &known) {
            Some(resolved) => println!("  {} = {}", name.cyan(), resolved),
            None => println!("  {} = {}", name.cyan(), output.value.render().dimmed()),
        }
    }
}
