pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 設定ファイルのパスを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "TENANTFLOW_CONFIG_PATH";

const CANDIDATES: [&str; 2] = ["tenantflow.yaml", ".tenantflow.yaml"];

/// プラットフォーム設定
///
/// テナントではなくプラットフォーム運用側が持つ値。全項目にデフォルトがあるため、
/// 設定ファイルが無くても動作する。
///
/// YAML形式：
/// ```yaml
/// domain: aicc.example.com
/// imageTag: "1.4.2"
/// gpuAccelerator: nvidia-tesla-t4
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformSettings {
    /// プラットフォームのベースドメイン
    pub domain: String,
    /// ルートホストのテンプレート（Tera形式）
    pub host_template: String,
    /// API ホストのテンプレート（Tera形式）
    pub api_host_template: String,
    /// コンテナイメージのタグ
    pub image_tag: String,
    /// GPU ノードの `accelerator` ラベル値
    pub gpu_accelerator: String,
    /// cert-manager の ClusterIssuer 名
    pub cluster_issuer: String,
    pub ingress_class: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            domain: "aicc.example.com".to_string(),
            host_template: "{{ tenant_id }}.{{ cloud_provider }}.{{ domain }}".to_string(),
            api_host_template: "api.{{ tenant_id }}.{{ cloud_provider }}.{{ domain }}".to_string(),
            image_tag: "latest".to_string(),
            gpu_accelerator: "nvidia-tesla-t4".to_string(),
            cluster_issuer: "letsencrypt-prod".to_string(),
            ingress_class: "nginx".to_string(),
        }
    }
}

/// グローバル設定ディレクトリ（~/.config/tenantflow）
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tenantflow"))
}

/// 設定ファイルを探す
///
/// 以下の優先順位で設定ファイルを検索:
/// 1. 環境変数 TENANTFLOW_CONFIG_PATH (直接パス指定、存在しなければエラー)
/// 2. カレントディレクトリ: tenantflow.yaml, .tenantflow.yaml
/// 3. ./.tenantflow/ ディレクトリ内: tenantflow.yaml
/// 4. ~/.config/tenantflow/tenantflow.yaml (グローバル設定)
///
/// どれも無い場合は `None`（デフォルト設定を使う）。
pub fn find_config_file() -> Result<Option<PathBuf>> {
    // 1. 環境変数で直接指定
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(ConfigError::ConfigFileNotFound(path));
    }

    let current_dir = std::env::current_dir()?;

    // 2. カレントディレクトリで検索
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    // 3. ./.tenantflow/ ディレクトリで検索
    let local_dir = current_dir.join(".tenantflow").join("tenantflow.yaml");
    if local_dir.exists() {
        return Ok(Some(local_dir));
    }

    // 4. グローバル設定ファイル
    if let Some(dir) = config_dir() {
        let global_config = dir.join("tenantflow.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// 設定ファイルを探して読み込む（見つからなければデフォルト）
pub fn load_settings() -> Result<PlatformSettings> {
    match find_config_file()? {
        Some(path) => load_settings_from(&path),
        None => {
            debug!("No config file found, using default platform settings");
            Ok(PlatformSettings::default())
        }
    }
}

/// 指定パスの設定ファイルを読み込む
pub fn load_settings_from(path: &Path) -> Result<PlatformSettings> {
    let content = std::fs::read_to_string(path)?;
    // 空ファイルはデフォルト扱い
    if content.trim().is_empty() {
        return Ok(PlatformSettings::default());
    }
    let settings: PlatformSettings =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    info!(path = %path.display(), domain = %settings.domain, "Loaded platform settings");
    Ok(settings)
}
