use super::InputArgs;
use anyhow::Context;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::Path;
use tenantflow_manifest::{ManifestAssembler, RenderOptions};

pub fn handle(
    inputs: &InputArgs,
    out: Option<&Path>,
    created_at: Option<DateTime<Utc>>,
) -> anyhow::Result<()> {
    let loaded = inputs.load()?;
    let bundle = ManifestAssembler::new(&loaded.platform)
        .with_options(RenderOptions { created_at })
        .generate(&loaded.tenant, &loaded.hardware)?;

    let Some(out_dir) = out else {
        print!("{}", bundle.to_multi_document());
        return Ok(());
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("出力ディレクトリを作成できません: {}", out_dir.display()))?;
    for (key, yaml) in bundle.iter() {
        let path = out_dir.join(format!("{}.yaml", key));
        std::fs::write(&path, yaml)
            .with_context(|| format!("書き込みに失敗しました: {}", path.display()))?;
        println!("  {} {}", "✓".green(), path.display().to_string().cyan());
    }

    println!();
    println!(
        "{}",
        format!(
            "✓ {} のマニフェストを {}件 生成しました",
            loaded.tenant.tenant_id,
            bundle.len()
        )
        .green()
        .bold()
    );
    Ok(())
}
