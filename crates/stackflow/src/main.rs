mod commands;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "stackflow")]
#[command(about = "bolt.diy を Cloud Run に載せるスタックを宣言する", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// スタックを組み立ててマニフェストを書き出す
    Synth {
        /// 出力ディレクトリ
        #[arg(short, long, env = "STACKFLOW_OUT", default_value = "stackflow.out")]
        out: PathBuf,
        /// 追加で読み込む .env ファイル（環境変数が優先）
        #[arg(short, long)]
        env_file: Option<PathBuf>,
    },
    /// 前回のマニフェストとの差分を表示
    Plan {
        /// 出力ディレクトリ
        #[arg(short, long, env = "STACKFLOW_OUT", default_value = "stackflow.out")]
        out: PathBuf,
        /// 追加で読み込む .env ファイル（環境変数が優先）
        #[arg(short, long)]
        env_file: Option<PathBuf>,
    },
    /// 設定とスタックを検証
    Validate {
        /// 追加で読み込む .env ファイル（環境変数が優先）
        #[arg(short, long)]
        env_file: Option<PathBuf>,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrに出力（stdoutは結果表示用）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Versionコマンドは設定不要
    if matches!(cli.command, Commands::Version) {
        println!("stackflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    match cli.command {
        Commands::Synth { out, env_file } => {
            let config = utils::load_config_or_exit(env_file.as_deref());
            commands::synth::handle(&config, &out).await?;
        }
        Commands::Plan { out, env_file } => {
            let config = utils::load_config_or_exit(env_file.as_deref());
            commands::plan::handle(&config, &out).await?;
        }
        Commands::Validate { env_file } => {
            let config = utils::load_config_or_exit(env_file.as_deref());
            commands::validate::handle(&config)?;
        }
        Commands::Version => {
            unreachable!("Version is handled before config loading");
        }
    }

    Ok(())
}
