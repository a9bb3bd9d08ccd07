//! 入力ローダー
//!
//! ウィザードから書き出されたテナント設定・ハードウェア割り当てのスナップショットを
//! JSON または YAML ファイルから読み込む。形式は拡張子で判定する。

use crate::error::{Result, TenantError};
use crate::model::{HardwareAllocation, TenantConfig};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info, instrument};

/// 入力ファイル形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Yaml,
}

impl InputFormat {
    /// 拡張子から形式を判定
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => Ok(Self::Json),
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            _ => Err(TenantError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// テナント設定を読み込む
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_tenant(path: &Path) -> Result<TenantConfig> {
    let tenant: TenantConfig = load_snapshot(path)?;
    info!(
        tenant_id = %tenant.tenant_id,
        mode = tenant.deployment_mode.as_str(),
        "Tenant config loaded"
    );
    Ok(tenant)
}

/// ハードウェア割り当てを読み込む
#[instrument(skip(path), fields(path = %path.display()))]
pub fn load_hardware(path: &Path) -> Result<HardwareAllocation> {
    let hardware: HardwareAllocation = load_snapshot(path)?;
    info!(
        server_roles = hardware.server_roles.len(),
        custom_servers = hardware.custom_servers.len(),
        "Hardware allocation loaded"
    );
    Ok(hardware)
}

/// スナップショットを読み込んでデシリアライズ
pub fn load_snapshot<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let format = InputFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| TenantError::IoError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    debug!(bytes = content.len(), ?format, "Parsing snapshot");

    let parsed = match format {
        InputFormat::Json => serde_json::from_str(&content).map_err(|e| e.to_string()),
        InputFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| TenantError::ParseError {
        path: path.to_path_buf(),
        message,
    })
}
