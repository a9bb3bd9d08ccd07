//! テナント ConfigMap
//!
//! デプロイモードでキー構成が変わる。
//! - auto-calculate: advancedSettings を `{種別}-{kebab-key}` に平坦化
//! - custom: サーバー構成の集計値
//!
//! 末尾の共通キーはどちらのモードでも同じ。

use crate::context::GenerationContext;
use crate::resources::ConfigMap;
use serde_json::Value;
use std::collections::BTreeMap;
use tenantflow_core::{
    AdvancedSettings, DeploymentMode, ServerPlan, ServiceKind, TenantError, setting_to_string,
};

pub type ConfigData = BTreeMap<String, String>;

/// ConfigMap キーの最大長
const MAX_KEY_LEN: usize = 253;

pub fn generate_configmap(ctx: &GenerationContext<'_>, plans: &[ServerPlan]) -> ConfigMap {
    let mut data = match ctx.tenant.deployment_mode {
        DeploymentMode::AutoCalculate => ctx.settings_data.clone(),
        DeploymentMode::Custom => custom_summary_data(plans),
    };
    data.extend(shared_data(ctx));

    ConfigMap {
        metadata: ctx.meta(ctx.names.tenant_resource("config"), ctx.tenant_labels()),
        data: Some(data),
        ..Default::default()
    }
}

/// advancedSettings の全セクションを平坦化
///
/// 別々の設定キーが同じ ConfigMap キーになる場合はエラーにする。
pub fn flatten_settings(settings: &AdvancedSettings) -> tenantflow_core::Result<ConfigData> {
    let mut flattener = Flattener::default();
    for kind in ServiceKind::SETTINGS_SECTIONS {
        let Some(section) = settings.section(kind) else {
            continue;
        };
        for (key, value) in section.iter() {
            let path = format!("{}.{}", kind.as_str(), key);
            let config_key = format!("{}-{}", kind.as_str(), config_key_segment(key, &path)?);
            flattener.flatten(config_key, path, value)?;
        }
    }
    Ok(flattener.data)
}

/// 平坦化の途中状態（キーごとに元の設定パスを覚えておく）
#[derive(Default)]
struct Flattener {
    data: ConfigData,
    sources: BTreeMap<String, String>,
}

impl Flattener {
    /// ネストしたオブジェクトは `-` でキーを連結し、配列はカンマ区切りにする
    fn flatten(&mut self, key: String, path: String, value: &Value) -> tenantflow_core::Result<()> {
        match value {
            Value::Object(map) => {
                for (nested_key, nested) in map {
                    let nested_path = format!("{}.{}", path, nested_key);
                    let segment = config_key_segment(nested_key, &nested_path)?;
                    self.flatten(format!("{}-{}", key, segment), nested_path, nested)?;
                }
                Ok(())
            }
            Value::Array(items) => {
                let joined = items
                    .iter()
                    .map(setting_to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                self.insert(key, path, joined)
            }
            scalar => self.insert(key, path, setting_to_string(scalar)),
        }
    }

    fn insert(&mut self, key: String, path: String, value: String) -> tenantflow_core::Result<()> {
        if key.len() > MAX_KEY_LEN {
            return Err(TenantError::InvalidConfigKey(path));
        }
        if let Some(first) = self.sources.get(&key) {
            return Err(TenantError::ConfigKeyCollision {
                key,
                first: first.clone(),
                second: path,
            });
        }
        self.sources.insert(key.clone(), path);
        self.data.insert(key, value);
        Ok(())
    }
}

fn config_key_segment(key: &str, path: &str) -> tenantflow_core::Result<String> {
    let segment = kebab_case(key);
    if segment.is_empty() {
        return Err(TenantError::InvalidConfigKey(path.to_string()));
    }
    Ok(segment)
}

fn custom_summary_data(plans: &[ServerPlan]) -> ConfigData {
    let total_cpu: f64 = plans.iter().map(|p| p.cpu_cores).sum();
    let total_memory: f64 = plans.iter().map(|p| p.memory_gb).sum();
    let total_gpu = plans
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(u64::from(p.gpu_count)));
    let total_replicas = plans
        .iter()
        .fold(0u64, |acc, p| acc.saturating_add(u64::from(p.replicas)));
    let server_names = plans
        .iter()
        .map(|p| p.server_name.as_str())
        .collect::<Vec<_>>()
        .join(",");

    ConfigData::from([
        ("server-count".to_string(), plans.len().to_string()),
        ("total-cpu".to_string(), format_total(total_cpu)),
        ("total-memory".to_string(), format_total(total_memory)),
        ("total-gpu".to_string(), total_gpu.to_string()),
        ("total-replicas".to_string(), total_replicas.to_string()),
        ("server-names".to_string(), server_names),
    ])
}

fn shared_data(ctx: &GenerationContext<'_>) -> ConfigData {
    let tenant = ctx.tenant;
    let common = &tenant.advanced_settings.common;
    ConfigData::from([
        ("tenant-id".to_string(), tenant.tenant_id.clone()),
        ("tenant-name".to_string(), tenant.tenant_name.clone()),
        ("environment".to_string(), tenant.environment.clone()),
        ("cloud-provider".to_string(), tenant.cloud_provider.clone()),
        ("region".to_string(), tenant.region.clone()),
        ("deployment-mode".to_string(), tenant.deployment_mode.as_str().to_string()),
        ("registry-url".to_string(), tenant.registry.url.clone()),
        ("registry-type".to_string(), tenant.registry.kind.clone()),
        (
            "deployment-strategy".to_string(),
            tenant.deployment_strategy.as_str().to_string(),
        ),
        ("auto-scaling-enabled".to_string(), tenant.auto_scaling.to_string()),
        ("monitoring-enabled".to_string(), tenant.monitoring.to_string()),
        ("log-level".to_string(), "info".to_string()),
        ("log-format".to_string(), "json".to_string()),
        ("network-policy-enabled".to_string(), common.network_policy.to_string()),
        ("backup-enabled".to_string(), common.backup.to_string()),
    ])
}

/// 設定キーを ConfigMap キーに使える kebab-case に変換
///
/// `sttEndpoint` → `stt-endpoint`、`knowledgeBaseURL` → `knowledge-base-url`。
/// 英数字と `.` 以外の文字は区切りとして扱う（`max calls!` → `max-calls`）。
pub fn kebab_case(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let mut out = String::with_capacity(key.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_ascii_alphanumeric() && ch != '.' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if ch.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
            let boundary = prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower);
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
        }
        out.push(ch.to_ascii_lowercase());
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// 小数第3位で丸め、末尾の0を落とす
fn format_total(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let text = format!("{:.3}", rounded);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
