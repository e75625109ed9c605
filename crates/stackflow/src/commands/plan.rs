use colored::Colorize;
use stackflow_cloud::{ActionType, ManifestStore, ManifestSynthesizer};
use stackflow_config::DeploymentConfig;
use stackflow_core::BoltDiyStack;
use std::path::Path;

pub async fn handle(config: &DeploymentConfig, out_dir: &Path) -> anyhow::Result<()> {
    let stack = BoltDiyStack::from_config(config).compose()?;
    let synthesizer = ManifestSynthesizer::new(ManifestStore::new(out_dir));
    let plan = synthesizer.plan(&stack).await?;

    if !plan.has_changes {
        println!("{}", "✓ 前回のマニフェストから変更はありません".green());
        println!("  {}", plan.summary());
        return Ok(());
    }

    println!("{}", "変更予定:".bold());
    for action in &plan.actions {
        let key = format!("{}.{}", action.resource_type, action.resource_id);
        match action.action_type {
            ActionType::Create => println!("  {} {}", "+".green(), key),
            ActionType::Update => {
                println!("  {} {}", "~".yellow(), key);
                for field in action.details.keys() {
                    println!("      {}", field.dimmed());
                }
            }
            ActionType::Delete => println!("  {} {}", "-".red(), key),
            ActionType::NoOp => {}
        }
    }
    println!();
    println!("{}", plan.summary());

    Ok(())
}
