//! テナント定義

use super::resource::ResourceValue;
use super::server::MAX_RESOURCE_AMOUNT;
use crate::error::{Result, TenantError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// DNS-1123 ラベルの最大長
pub const MAX_DNS_LABEL_LEN: usize = 63;

static DNS_1123_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("DNS-1123 pattern is valid")
});

/// DNS-1123 サブドメインの最大長
pub const MAX_DNS_SUBDOMAIN_LEN: usize = 253;

/// ドット区切りの各ラベルが DNS-1123 ラベルであるホスト名か
pub fn is_dns_subdomain(host: &str) -> bool {
    host.len() <= MAX_DNS_SUBDOMAIN_LEN
        && host
            .split('.')
            .all(|label| label.len() <= MAX_DNS_LABEL_LEN && DNS_1123_LABEL.is_match(label))
}

/// テナント設定
///
/// テナント作成ウィザードから渡されるスナップショット。
/// `tenant_id` は Namespace 名とラベル値を兼ねる。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: String,
    #[serde(default)]
    pub environment: String,
    #[serde(default)]
    pub cloud_provider: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub deployment_mode: DeploymentMode,
    #[serde(default)]
    pub deployment_strategy: DeploymentStrategy,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub auto_scaling: bool,
    #[serde(default)]
    pub monitoring: bool,
    #[serde(default)]
    pub advanced_settings: AdvancedSettings,
}

impl TenantConfig {
    /// 生成前の境界チェック
    ///
    /// tenantId の存在と DNS-1123 準拠、リソースクォータの数値性のみを検証する。
    /// advancedSettings の各サービス値は検証しない（欠損は空文字列として扱う）。
    pub fn validate(&self) -> Result<()> {
        if self.tenant_id.trim().is_empty() {
            return Err(TenantError::MissingTenantId);
        }
        if self.tenant_id.len() > MAX_DNS_LABEL_LEN || !DNS_1123_LABEL.is_match(&self.tenant_id) {
            return Err(TenantError::InvalidTenantId(self.tenant_id.clone()));
        }
        self.advanced_settings.common.resource_quota.resolve()?;
        Ok(())
    }
}

/// デプロイモード
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    /// サイジングサービスの算出結果を使う（デフォルト）
    #[default]
    #[serde(alias = "auto")]
    AutoCalculate,
    /// オペレーターが直接定義したサーバー仕様を使う
    Custom,
}

impl DeploymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoCalculate => "auto-calculate",
            Self::Custom => "custom",
        }
    }
}

/// デプロイ戦略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStrategy {
    #[default]
    Rolling,
    Recreate,
}

impl DeploymentStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rolling => "rolling",
            Self::Recreate => "recreate",
        }
    }
}

/// コンテナレジストリ
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// サービス種別
///
/// `SETTINGS_SECTIONS` の順序は ConfigMap のキー順にも使われる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    Callbot,
    Chatbot,
    Advisor,
    Stt,
    Tts,
    Ta,
    Qa,
    Monitoring,
}

impl ServiceKind {
    /// advancedSettings にセクションを持つサービス種別
    pub const SETTINGS_SECTIONS: [ServiceKind; 7] = [
        Self::Callbot,
        Self::Chatbot,
        Self::Advisor,
        Self::Stt,
        Self::Tts,
        Self::Ta,
        Self::Qa,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Callbot => "callbot",
            Self::Chatbot => "chatbot",
            Self::Advisor => "advisor",
            Self::Stt => "stt",
            Self::Tts => "tts",
            Self::Ta => "ta",
            Self::Qa => "qa",
            Self::Monitoring => "monitoring",
        }
    }
}

/// サービス別の詳細設定ツリー
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvancedSettings {
    #[serde(default)]
    pub callbot: ServiceSettings,
    #[serde(default)]
    pub chatbot: ServiceSettings,
    #[serde(default)]
    pub advisor: ServiceSettings,
    #[serde(default)]
    pub stt: ServiceSettings,
    #[serde(default)]
    pub tts: ServiceSettings,
    #[serde(default)]
    pub ta: ServiceSettings,
    #[serde(default)]
    pub qa: ServiceSettings,
    #[serde(default)]
    pub common: CommonSettings,
}

impl AdvancedSettings {
    /// サービス種別に対応するセクションを取得（monitoring はセクションを持たない）
    pub fn section(&self, kind: ServiceKind) -> Option<&ServiceSettings> {
        match kind {
            ServiceKind::Callbot => Some(&self.callbot),
            ServiceKind::Chatbot => Some(&self.chatbot),
            ServiceKind::Advisor => Some(&self.advisor),
            ServiceKind::Stt => Some(&self.stt),
            ServiceKind::Tts => Some(&self.tts),
            ServiceKind::Ta => Some(&self.ta),
            ServiceKind::Qa => Some(&self.qa),
            ServiceKind::Monitoring => None,
        }
    }
}

/// 1サービス分のチューニング値（キーはウィザードの camelCase のまま）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceSettings(BTreeMap<String, serde_json::Value>);

impl ServiceSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.0.insert(key.into(), value);
    }

    /// 値を文字列として取得
    ///
    /// キーが無い場合は空文字列を返す。ウィザードの途中保存データを
    /// そのまま受け取るため、欠損はエラーにしない。
    pub fn value(&self, key: &str) -> String {
        self.0.get(key).map(setting_to_string).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, serde_json::Value)> for ServiceSettings {
    fn from_iter<I: IntoIterator<Item = (String, serde_json::Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 設定値を環境変数・ConfigMap 用の文字列に変換
pub fn setting_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// テナント共通設定
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonSettings {
    #[serde(default)]
    pub resource_quota: ResourceQuotaSettings,
    #[serde(default)]
    pub network_policy: bool,
    #[serde(default)]
    pub backup: bool,
}

/// リソースクォータ（CPU はコア数、memory / storage は GB）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceQuotaSettings {
    #[serde(default)]
    pub cpu: Option<ResourceValue>,
    #[serde(default)]
    pub memory: Option<ResourceValue>,
    #[serde(default)]
    pub storage: Option<ResourceValue>,
}

/// 数値化済みのクォータ（未指定の項目は None）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuotaValues {
    pub cpu: Option<f64>,
    pub memory_gb: Option<f64>,
    pub storage_gb: Option<f64>,
}

impl ResourceQuotaSettings {
    pub fn resolve(&self) -> Result<QuotaValues> {
        Ok(QuotaValues {
            cpu: quota_field("cpu", self.cpu.as_ref())?,
            memory_gb: quota_field("memory", self.memory.as_ref())?,
            storage_gb: quota_field("storage", self.storage.as_ref())?,
        })
    }
}

fn quota_field(field: &'static str, value: Option<&ResourceValue>) -> Result<Option<f64>> {
    let Some(value) = value.filter(|v| !v.is_unset()) else {
        return Ok(None);
    };
    let number = value
        .as_number()
        .ok_or_else(|| TenantError::NonNumericResource {
            server: "common.resourceQuota".to_string(),
            field,
            value: value.to_string(),
        })?;
    if number <= 0.0 || number > MAX_RESOURCE_AMOUNT {
        return Err(TenantError::ResourceOutOfRange {
            server: "common.resourceQuota".to_string(),
            field,
            value: number,
        });
    }
    Ok(Some(number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant(id: &str) -> TenantConfig {
        TenantConfig {
            tenant_id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_wizard_snapshot() {
        let tenant: TenantConfig = serde_json::from_value(json!({
            "tenantId": "acme01",
            "tenantName": "Acme Corp",
            "environment": "production",
            "cloudProvider": "aws",
            "region": "ap-northeast-2",
            "deploymentMode": "custom",
            "deploymentStrategy": "recreate",
            "registry": { "url": "registry.acme.io", "type": "harbor" },
            "autoScaling": true,
            "monitoring": true,
            "advancedSettings": {
                "callbot": { "sttEndpoint": "http://stt:8080", "maxConcurrentCalls": 100 },
                "common": {
                    "resourceQuota": { "cpu": 16, "memory": "64", "storage": 500 },
                    "networkPolicy": true
                }
            }
        }))
        .unwrap();

        assert_eq!(tenant.tenant_id, "acme01");
        assert_eq!(tenant.deployment_mode, DeploymentMode::Custom);
        assert_eq!(tenant.deployment_strategy, DeploymentStrategy::Recreate);
        assert_eq!(tenant.registry.kind, "harbor");
        assert_eq!(
            tenant.advanced_settings.callbot.value("sttEndpoint"),
            "http://stt:8080"
        );
        assert_eq!(
            tenant.advanced_settings.callbot.value("maxConcurrentCalls"),
            "100"
        );
        assert!(tenant.advanced_settings.common.network_policy);
        assert!(!tenant.advanced_settings.common.backup);
    }

    #[test]
    fn test_auto_mode_aliases() {
        let mode: DeploymentMode = serde_json::from_str(r#""auto-calculate""#).unwrap();
        assert_eq!(mode, DeploymentMode::AutoCalculate);
        let mode: DeploymentMode = serde_json::from_str(r#""auto""#).unwrap();
        assert_eq!(mode, DeploymentMode::AutoCalculate);
    }

    #[test]
    fn test_missing_setting_is_empty_string() {
        let settings = ServiceSettings::new();
        assert_eq!(settings.value("sttEndpoint"), "");

        let mut settings = ServiceSettings::new();
        settings.insert("timeout", serde_json::Value::Null);
        assert_eq!(settings.value("timeout"), "");
    }

    #[test]
    fn test_validate_tenant_id() {
        assert!(tenant("acme01").validate().is_ok());
        assert!(tenant("a").validate().is_ok());
        assert!(matches!(
            tenant("").validate(),
            Err(TenantError::MissingTenantId)
        ));
        assert!(matches!(
            tenant("   ").validate(),
            Err(TenantError::MissingTenantId)
        ));
        for invalid in ["Acme01", "acme_01", "-acme", "acme-", "acme.io"] {
            assert!(
                matches!(tenant(invalid).validate(), Err(TenantError::InvalidTenantId(_))),
                "{} should be rejected",
                invalid
            );
        }
        let too_long = "a".repeat(64);
        assert!(tenant(&too_long).validate().is_err());
    }

    #[test]
    fn test_dns_subdomain() {
        assert!(is_dns_subdomain("acme01.aws.aicc.example.com"));
        assert!(is_dns_subdomain("localhost"));
        assert!(!is_dns_subdomain("acme01..aicc.example.com"));
        assert!(!is_dns_subdomain(".example.com"));
        assert!(!is_dns_subdomain("api.Acme01.example.com"));
        assert!(!is_dns_subdomain(""));
        assert!(!is_dns_subdomain(&format!("{}.example.com", "a".repeat(64))));
    }

    #[test]
    fn test_validate_rejects_non_numeric_quota() {
        let mut t = tenant("acme01");
        t.advanced_settings.common.resource_quota.cpu = Some(ResourceValue::from("lots"));

        let result = t.validate();
        assert!(matches!(
            result,
            Err(TenantError::NonNumericResource { field: "cpu", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_huge_quota() {
        let mut t = tenant("acme01");
        t.advanced_settings.common.resource_quota.memory = Some(ResourceValue::from(1e17));

        assert!(matches!(
            t.validate(),
            Err(TenantError::ResourceOutOfRange { field: "memory", .. })
        ));
    }

    #[test]
    fn test_quota_resolve_partial() {
        let quota = ResourceQuotaSettings {
            cpu: Some(ResourceValue::from(8u32)),
            memory: None,
            storage: Some(ResourceValue::from("-")),
        };
        let values = quota.resolve().unwrap();
        assert_eq!(values.cpu, Some(8.0));
        assert_eq!(values.memory_gb, None);
        assert_eq!(values.storage_gb, None);
    }
}
