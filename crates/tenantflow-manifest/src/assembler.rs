//! マニフェストの組み立て
//!
//! 1. 検証と正規化（テナント、サーバー一覧、名前の衝突、Ingress ホスト）
//! 2. サーバーごとのワークロード（キー `{serverName}-{index+1}`）
//! 3. テナント単位のリソース（`namespace`, `configmap`, `service`, `ingress`, `monitoring`）
//!
//! 1 で失敗した場合は何も生成しない。

use crate::context::{GenerationContext, IngressHosts};
use crate::error::Result;
use crate::generators::*;
use crate::render::{DOCUMENT_SEPARATOR, render_documents};
use crate::resources::*;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tenantflow_config::PlatformSettings;
use tenantflow_core::{HardwareAllocation, ServerPlan, TenantConfig, artifact_key};
use tracing::{debug, info, instrument};

pub const NAMESPACE_KEY: &str = "namespace";
pub const CONFIGMAP_KEY: &str = "configmap";
pub const SERVICE_KEY: &str = "service";
pub const INGRESS_KEY: &str = "ingress";
pub const MONITORING_KEY: &str = "monitoring";

/// 出力オプション
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Namespace の `created-at` アノテーション。None なら付けない（出力が入力だけで決まる）
    pub created_at: Option<DateTime<Utc>>,
}

/// 型付きの生成結果
#[derive(Debug, Clone, PartialEq)]
pub struct TenantManifests {
    pub servers: Vec<ServerPlan>,
    pub hosts: IngressHosts,
    pub workloads: Vec<WorkloadSet>,
    pub namespace: Namespace,
    pub resource_quota: ResourceQuota,
    pub network_policy: NetworkPolicy,
    pub configmap: ConfigMap,
    pub load_balancer: Service,
    pub ingress: Ingress,
    pub service_monitor: ServiceMonitor,
    pub alert_rules: PrometheusRule,
}

impl TenantManifests {
    /// キーごとのリソース群
    pub fn artifacts(&self) -> Vec<(String, Vec<Resource>)> {
        let mut artifacts: Vec<(String, Vec<Resource>)> = self
            .workloads
            .iter()
            .enumerate()
            .map(|(index, set)| (artifact_key(&set.server_name, index), set.resources()))
            .collect();

        artifacts.push((
            NAMESPACE_KEY.to_string(),
            vec![
                self.namespace.clone().into(),
                self.resource_quota.clone().into(),
                self.network_policy.clone().into(),
            ],
        ));
        artifacts.push((CONFIGMAP_KEY.to_string(), vec![self.configmap.clone().into()]));
        artifacts.push((SERVICE_KEY.to_string(), vec![self.load_balancer.clone().into()]));
        artifacts.push((INGRESS_KEY.to_string(), vec![self.ingress.clone().into()]));
        artifacts.push((
            MONITORING_KEY.to_string(),
            vec![
                self.service_monitor.clone().into(),
                self.alert_rules.clone().into(),
            ],
        ));
        artifacts
    }

    /// YAML テキストに変換
    pub fn render(&self) -> Result<ManifestBundle> {
        let artifacts = self
            .artifacts()
            .into_iter()
            .map(|(key, resources)| Ok((key, render_documents(&resources)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Ok(ManifestBundle { artifacts })
    }
}

/// キー → YAML テキストの出力マップ（キー順で決定的）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestBundle {
    artifacts: BTreeMap<String, String>,
}

impl ManifestBundle {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.artifacts.get(key).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.artifacts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.artifacts.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// 全アーティファクトを1つの複数ドキュメント YAML に連結
    pub fn to_multi_document(&self) -> String {
        self.artifacts
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }
}

/// テナント1つ分のマニフェストを組み立てる
#[derive(Debug, Clone)]
pub struct ManifestAssembler<'a> {
    platform: &'a PlatformSettings,
    options: RenderOptions,
}

impl<'a> ManifestAssembler<'a> {
    pub fn new(platform: &'a PlatformSettings) -> Self {
        Self {
            platform,
            options: RenderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    #[instrument(skip_all, fields(tenant = %tenant.tenant_id, mode = tenant.deployment_mode.as_str()))]
    pub fn assemble(
        &self,
        tenant: &TenantConfig,
        hardware: &HardwareAllocation,
    ) -> Result<TenantManifests> {
        // 検証と正規化
        let ctx = GenerationContext::new(tenant, self.platform, self.options.created_at)?;
        let servers = hardware.source(tenant.deployment_mode).normalize()?;
        for plan in &servers {
            ctx.names.check_length(&plan.server_name)?;
        }

        // サーバーごと
        let workloads: Vec<WorkloadSet> = servers
            .iter()
            .map(|plan| {
                debug!(server = %plan.server_name, replicas = plan.replicas, "Generating workload");
                generate_workload(&ctx, plan)
            })
            .collect();

        // テナント単位
        let manifests = TenantManifests {
            namespace: generate_namespace(&ctx),
            resource_quota: generate_resource_quota(&ctx, &servers),
            network_policy: generate_network_policy(&ctx),
            configmap: generate_configmap(&ctx, &servers),
            load_balancer: generate_load_balancer(&ctx),
            ingress: generate_ingress(&ctx),
            service_monitor: generate_service_monitor(&ctx),
            alert_rules: generate_alert_rules(&ctx),
            hosts: ctx.hosts.clone(),
            workloads,
            servers,
        };

        info!(workloads = manifests.workloads.len(), "Assembled tenant manifests");
        Ok(manifests)
    }

    /// 組み立てて YAML に変換
    pub fn generate(
        &self,
        tenant: &TenantConfig,
        hardware: &HardwareAllocation,
    ) -> Result<ManifestBundle> {
        self.assemble(tenant, hardware)?.render()
    }
}

/// デフォルト設定でマニフェストを生成
pub fn generate_manifests(
    tenant: &TenantConfig,
    hardware: &HardwareAllocation,
) -> Result<ManifestBundle> {
    let platform = PlatformSettings::default();
    ManifestAssembler::new(&platform).generate(tenant, hardware)
}
