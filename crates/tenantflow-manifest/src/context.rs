//! 生成コンテキスト
//!
//! 生成前の検証（テナントID、クォータ、Ingress ホスト、ラベル値、ConfigMap キー）を済ませた状態を持つ。
//! ここを作れた時点で、以降のジェネレーターは失敗しない。

use crate::generators::configmap::{ConfigData, flatten_settings};
use crate::resources::{Labels, labels, namespaced_meta};
use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tenantflow_config::PlatformSettings;
use tenantflow_core::{
    DeploymentMode, MAX_DNS_LABEL_LEN, NameResolver, QuotaValues, TemplateProcessor, TenantConfig,
    TenantError, is_dns_subdomain, slugify,
};
use tracing::debug;

pub const MANAGED_BY: &str = "tenantflow";

/// テンプレート展開済みの Ingress ホスト
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressHosts {
    pub root: String,
    pub api: String,
}

#[derive(Debug, Clone)]
pub struct GenerationContext<'a> {
    pub tenant: &'a TenantConfig,
    pub platform: &'a PlatformSettings,
    pub names: NameResolver,
    pub hosts: IngressHosts,
    pub quota: QuotaValues,
    pub created_at: Option<DateTime<Utc>>,
    /// auto-calculate モードで ConfigMap に載せる平坦化済みの設定（custom モードでは空）
    pub settings_data: ConfigData,
    environment_label: String,
    cloud_provider_label: String,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        tenant: &'a TenantConfig,
        platform: &'a PlatformSettings,
        created_at: Option<DateTime<Utc>>,
    ) -> tenantflow_core::Result<Self> {
        tenant.validate()?;
        let quota = tenant.advanced_settings.common.resource_quota.resolve()?;
        let environment_label = label_value("environment", &tenant.environment)?;
        let cloud_provider_label = label_value("cloudProvider", &tenant.cloud_provider)?;
        let hosts = render_hosts(tenant, platform, &cloud_provider_label)?;
        debug!(root = %hosts.root, api = %hosts.api, "Rendered ingress hosts");

        let settings_data = match tenant.deployment_mode {
            DeploymentMode::AutoCalculate => flatten_settings(&tenant.advanced_settings)?,
            DeploymentMode::Custom => ConfigData::new(),
        };

        Ok(Self {
            tenant,
            platform,
            names: NameResolver::new(tenant.tenant_id.as_str()),
            hosts,
            quota,
            created_at,
            settings_data,
            environment_label,
            cloud_provider_label,
        })
    }

    /// Namespace 名（= tenantId）
    pub fn namespace(&self) -> &str {
        self.names.tenant_id()
    }

    /// ラベル値として使える環境名
    pub fn environment_label(&self) -> &str {
        &self.environment_label
    }

    /// ラベル値として使えるクラウドプロバイダー名
    pub fn cloud_provider_label(&self) -> &str {
        &self.cloud_provider_label
    }

    /// テナント単位リソースの共通ラベル
    pub fn tenant_labels(&self) -> Labels {
        labels([
            ("tenant", self.namespace()),
            ("environment", self.environment_label()),
            ("managed-by", MANAGED_BY),
        ])
    }

    /// テナント Namespace に属するリソースのメタデータ
    pub fn meta(&self, name: impl Into<String>, labels: Labels) -> ObjectMeta {
        namespaced_meta(name, self.namespace(), labels)
    }

    /// `created-at` アノテーション用（明示的に指定された場合のみ）
    pub fn created_at_rfc3339(&self) -> Option<String> {
        self.created_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

fn label_value(field: &'static str, raw: &str) -> tenantflow_core::Result<String> {
    let value = slugify(raw);
    if value.len() > MAX_DNS_LABEL_LEN {
        return Err(TenantError::LabelValueTooLong {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn render_hosts(
    tenant: &TenantConfig,
    platform: &PlatformSettings,
    cloud_provider: &str,
) -> tenantflow_core::Result<IngressHosts> {
    let mut processor = TemplateProcessor::new();
    processor.add_variable("tenant_id", tenant.tenant_id.clone().into());
    processor.add_variable("cloud_provider", cloud_provider.into());
    processor.add_variable("domain", platform.domain.clone().into());

    let hosts = IngressHosts {
        root: processor.render_str(&platform.host_template)?,
        api: processor.render_str(&platform.api_host_template)?,
    };
    for host in [&hosts.root, &hosts.api] {
        if !is_dns_subdomain(host) {
            return Err(TenantError::InvalidHost(host.clone()));
        }
    }
    Ok(hosts)
}
