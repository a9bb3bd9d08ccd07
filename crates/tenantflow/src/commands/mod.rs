pub mod render;
pub mod validate;

use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use tenantflow_config::PlatformSettings;
use tenantflow_core::{HardwareAllocation, TenantConfig};

/// render / validate 共通の入力
#[derive(Args, Debug)]
pub struct InputArgs {
    /// テナント設定ファイル（JSON / YAML）
    #[arg(short, long)]
    pub tenant: PathBuf,
    /// ハードウェア割り当てファイル（JSON / YAML）
    #[arg(short = 'w', long)]
    pub hardware: PathBuf,
    /// プラットフォーム設定ファイル（省略時は自動検出）
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

pub struct Inputs {
    pub tenant: TenantConfig,
    pub hardware: HardwareAllocation,
    pub platform: PlatformSettings,
}

impl InputArgs {
    pub fn load(&self) -> anyhow::Result<Inputs> {
        let tenant = tenantflow_core::load_tenant(&self.tenant)?;
        let hardware = tenantflow_core::load_hardware(&self.hardware)?;
        let platform = load_platform(self.config.as_deref())?;
        Ok(Inputs {
            tenant,
            hardware,
            platform,
        })
    }
}

fn load_platform(path: Option<&Path>) -> anyhow::Result<PlatformSettings> {
    match path {
        Some(path) => tenantflow_config::load_settings_from(path)
            .with_context(|| format!("プラットフォーム設定を読み込めません: {}", path.display())),
        None => Ok(tenantflow_config::load_settings()?),
    }
}
