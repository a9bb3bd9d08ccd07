mod commands;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tenantflow")]
#[command(about = "テナント構成から Kubernetes マニフェストを生成する", long_about = None)]
struct Cli {
    /// デバッグログを出力
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// マニフェストを生成
    Render {
        #[command(flatten)]
        inputs: commands::InputArgs,
        /// 出力ディレクトリ（省略時は標準出力に複数ドキュメント YAML を出力）
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Namespace に付ける作成日時（RFC 3339）
        #[arg(long, value_parser = parse_timestamp)]
        created_at: Option<DateTime<Utc>>,
    },
    /// 入力を検証（生成は行わない）
    Validate {
        #[command(flatten)]
        inputs: commands::InputArgs,
    },
    /// バージョン情報を表示
    Version,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("RFC 3339 形式で指定してください: {}", e))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 標準出力は YAML に使うので、ログは stderr に出す
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Render {
            inputs,
            out,
            created_at,
        } => commands::render::handle(&inputs, out.as_deref(), created_at),
        Commands::Validate { inputs } => commands::validate::handle(&inputs),
        Commands::Version => {
            println!("tenantflow {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
