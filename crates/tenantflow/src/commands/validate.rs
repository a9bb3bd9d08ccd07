use super::InputArgs;
use colored::Colorize;
use tenantflow_manifest::ManifestAssembler;

pub fn handle(inputs: &InputArgs) -> anyhow::Result<()> {
    println!("{}", "入力を検証中...".blue());

    let loaded = match inputs.load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 入力ファイルを読み込めません".red().bold());
            eprintln!("  {:#}", e);
            std::process::exit(1);
        }
    };

    match ManifestAssembler::new(&loaded.platform).assemble(&loaded.tenant, &loaded.hardware) {
        Ok(manifests) => {
            let tenant = &loaded.tenant;
            println!("{}", "✓ 入力は正常です！".green().bold());
            println!();
            println!("サマリー:");
            println!("  テナント: {} ({})", tenant.tenant_id.cyan(), tenant.tenant_name);
            println!("  デプロイモード: {}", tenant.deployment_mode.as_str());
            println!("  ホスト: {}", manifests.hosts.root);
            println!("  サーバー: {}台", manifests.servers.len());
            for plan in &manifests.servers {
                let gpu = if plan.gpu_count > 0 {
                    format!(", GPU {}", plan.gpu_count)
                } else {
                    String::new()
                };
                println!(
                    "    - {} (CPU {}, メモリ {}GB{}, replicas {})",
                    plan.server_name.cyan(),
                    plan.cpu_cores,
                    plan.memory_gb,
                    gpu,
                    plan.replicas
                );
            }
            println!("  アーティファクト: {}件", manifests.artifacts().len());
        }
        Err(e) => {
            eprintln!();
            eprintln!("{}", "✗ 検証エラー".red().bold());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
