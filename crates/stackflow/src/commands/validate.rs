use crate::utils;
use colored::Colorize;
use stackflow_config::DeploymentConfig;
use stackflow_core::BoltDiyStack;
use std::collections::BTreeMap;

pub fn handle(config: &DeploymentConfig) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());

    let stack_def = BoltDiyStack::from_config(config);
    let stack = match stack_def.compose() {
        Ok(stack) => stack,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ スタックエラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", "✓ スタックは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  スタック: {}", stack.name().cyan());
    println!(
        "  プロジェクト: {} ({})",
        config.project.cyan(),
        config.region
    );
    println!("  レジストリ構成: {}", config.registry_layout);

    let mut by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for resource in stack.resources() {
        *by_type.entry(resource.resource_type.as_str()).or_default() += 1;
    }
    println!("  リソース: {}個", stack.len());
    for (resource_type, count) in &by_type {
        println!("    - {} ×{}", resource_type.cyan(), count);
    }

    let cloud_run = if stack_def.features().is_enabled(&stackflow_core::cloud_run_gate()) {
        "有効".green()
    } else {
        "無効 (NO_CLOUD_RUN=true)".yellow()
    };
    println!("  Cloud Run: {}", cloud_run);

    utils::print_outputs(&stack, &stack_def, config.project_number.as_deref());

    Ok(())
}
