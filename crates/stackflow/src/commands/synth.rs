use crate::utils;
use colored::Colorize;
use stackflow_cloud::{ManifestStore, ManifestSynthesizer, Synthesizer};
use stackflow_config::DeploymentConfig;
use stackflow_core::BoltDiyStack;
use std::path::Path;

pub async fn handle(config: &DeploymentConfig, out_dir: &Path) -> anyhow::Result<()> {
    println!("{}", "スタックを構築中...".blue());

    let stack_def = BoltDiyStack::from_config(config);
    let stack = stack_def.compose()?;

    tracing::debug!(out = %out_dir.display(), "Writing manifest");
    let synthesizer = ManifestSynthesizer::new(ManifestStore::new(out_dir));
    let report = synthesizer.synthesize(&stack).await?;

    println!(
        "{} {} ({}個のリソース, {}個の出力)",
        "✓ スタックを書き出しました:".green().bold(),
        report.stack.cyan(),
        report.resource_count,
        report.output_count
    );
    if let Some(location) = &report.location {
        println!("  {}", location.display());
    }
    if config.no_cloud_run {
        println!(
            "  {}",
            "NO_CLOUD_RUN=true のため Cloud Run サービスは宣言していません".yellow()
        );
    }
    println!("  前回との差分: {}", report.plan.summary());

    utils::print_outputs(&stack, &stack_def, config.project_number.as_deref());

    Ok(())
}
