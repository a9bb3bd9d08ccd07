//! テナント Namespace とその境界（ResourceQuota, NetworkPolicy）

use crate::context::{GenerationContext, MANAGED_BY};
use crate::quantity::{CpuQuantity, MemoryQuantity, count};
use crate::resources::*;
use k8s_openapi::api::core::v1::ResourceQuotaSpec;
use k8s_openapi::api::networking::v1::{
    NetworkPolicyEgressRule, NetworkPolicyIngressRule, NetworkPolicyPeer, NetworkPolicyPort,
    NetworkPolicySpec,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use tenantflow_core::ServerPlan;

const NAMESPACE_NAME_LABEL: &str = "kubernetes.io/metadata.name";

/// オブジェクト数の上限
const OBJECT_COUNT_LIMITS: [(&str, u32); 5] = [
    ("persistentvolumeclaims", 20),
    ("services", 50),
    ("secrets", 20),
    ("configmaps", 20),
    ("pods", 100),
];

/// Namespace の受信を許可する Namespace（テナント自身を除く）
const TRUSTED_NAMESPACES: [&str; 2] = ["kube-system", "monitoring"];

pub fn generate_namespace(ctx: &GenerationContext<'_>) -> Namespace {
    let mut annotations = labels([
        ("tenantflow.io/tenant-name", ctx.tenant.tenant_name.as_str()),
        ("tenantflow.io/region", ctx.tenant.region.as_str()),
    ]);
    if let Some(created_at) = ctx.created_at_rfc3339() {
        annotations.insert("tenantflow.io/created-at".to_string(), created_at);
    }

    Namespace {
        metadata: ObjectMeta {
            name: Some(ctx.namespace().to_string()),
            labels: Some(labels([
                ("tenant", ctx.namespace()),
                ("environment", ctx.environment_label()),
                ("cloud-provider", ctx.cloud_provider_label()),
                ("managed-by", MANAGED_BY),
                (NAMESPACE_NAME_LABEL, ctx.namespace()),
            ])),
            annotations: Some(annotations),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// 全サーバーの合計（値 × replicas）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateResources {
    pub cpu: f64,
    pub memory_gb: f64,
    pub storage_gb: f64,
    pub gpu: u64,
    pub replicas: u64,
}

impl AggregateResources {
    pub fn sum(plans: &[ServerPlan]) -> Self {
        plans.iter().fold(Self::default(), |acc, plan| {
            let replicas = u64::from(plan.replicas);
            let weight = f64::from(plan.replicas);
            Self {
                cpu: acc.cpu + plan.cpu_cores * weight,
                memory_gb: acc.memory_gb + plan.memory_gb * weight,
                storage_gb: acc.storage_gb + plan.storage_gb * weight,
                gpu: acc
                    .gpu
                    .saturating_add(u64::from(plan.gpu_count).saturating_mul(replicas)),
                replicas: acc.replicas.saturating_add(replicas),
            }
        })
    }
}

/// クォータ未指定の項目はサーバー合計で埋める
pub fn generate_resource_quota(ctx: &GenerationContext<'_>, plans: &[ServerPlan]) -> ResourceQuota {
    let aggregate = AggregateResources::sum(plans);
    let cpu = CpuQuantity::from_cores(ctx.quota.cpu.unwrap_or(aggregate.cpu));
    let memory = MemoryQuantity::from_gib(ctx.quota.memory_gb.unwrap_or(aggregate.memory_gb));
    let storage = MemoryQuantity::from_gib(ctx.quota.storage_gb.unwrap_or(aggregate.storage_gb));

    let mut hard: BTreeMap<String, Quantity> = BTreeMap::from([
        ("requests.cpu".to_string(), cpu.into()),
        ("limits.cpu".to_string(), cpu.doubled().into()),
        ("requests.memory".to_string(), memory.into()),
        ("limits.memory".to_string(), memory.doubled().into()),
        ("requests.storage".to_string(), storage.into()),
    ]);
    for (resource, limit) in OBJECT_COUNT_LIMITS {
        hard.insert(resource.to_string(), count(limit));
    }

    ResourceQuota {
        metadata: ctx.meta(ctx.names.tenant_resource("quota"), ctx.tenant_labels()),
        spec: Some(ResourceQuotaSpec {
            hard: Some(hard),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// 受信は自 Namespace と kube-system / monitoring のみ、送信は DNS・Namespace 内・80/443
pub fn generate_network_policy(ctx: &GenerationContext<'_>) -> NetworkPolicy {
    let allowed_sources = std::iter::once(ctx.namespace())
        .chain(TRUSTED_NAMESPACES)
        .map(|ns| NetworkPolicyPeer {
            namespace_selector: Some(match_labels(labels([(NAMESPACE_NAME_LABEL, ns)]))),
            ..Default::default()
        })
        .collect();

    NetworkPolicy {
        metadata: ctx.meta(ctx.names.tenant_resource("network-policy"), ctx.tenant_labels()),
        spec: Some(NetworkPolicySpec {
            pod_selector: LabelSelector::default(),
            policy_types: Some(vec!["Ingress".to_string(), "Egress".to_string()]),
            ingress: Some(vec![NetworkPolicyIngressRule {
                from: Some(allowed_sources),
                ports: None,
            }]),
            egress: Some(vec![
                NetworkPolicyEgressRule {
                    ports: Some(vec![port("UDP", 53), port("TCP", 53)]),
                    to: None,
                },
                NetworkPolicyEgressRule {
                    ports: None,
                    to: Some(vec![NetworkPolicyPeer {
                        pod_selector: Some(LabelSelector::default()),
                        ..Default::default()
                    }]),
                },
                NetworkPolicyEgressRule {
                    ports: Some(vec![port("TCP", 80), port("TCP", 443)]),
                    to: None,
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn port(protocol: &str, number: i32) -> NetworkPolicyPort {
    NetworkPolicyPort {
        protocol: Some(protocol.to_string()),
        port: Some(IntOrString::Int(number)),
        end_port: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tenantflow_config::PlatformSettings;
    use tenantflow_core::{ResourceValue, TenantConfig};

    fn tenant() -> TenantConfig {
        TenantConfig {
            tenant_id: "acme01".to_string(),
            tenant_name: "Acme Corp".to_string(),
            environment: "production".to_string(),
            cloud_provider: "aws".to_string(),
            region: "ap-northeast-1".to_string(),
            ..Default::default()
        }
    }

    fn plan(cpu: f64, memory: f64, storage: f64, replicas: u32) -> ServerPlan {
        ServerPlan {
            server_name: "worker".to_string(),
            server_type: "worker".to_string(),
            cpu_cores: cpu,
            memory_gb: memory,
            gpu_count: 0,
            storage_gb: storage,
            replicas,
            services: Vec::new(),
        }
    }

    fn hard(quota: &ResourceQuota) -> BTreeMap<&str, &str> {
        quota
            .spec
            .as_ref()
            .and_then(|spec| spec.hard.as_ref())
            .unwrap()
            .iter()
            .map(|(k, v)| (k.as_str(), v.0.as_str()))
            .collect()
    }

    #[test]
    fn test_namespace_without_created_at() {
        let tenant = tenant();
        let platform = PlatformSettings::default();
        let ctx = GenerationContext::new(&tenant, &platform, None).unwrap();
        let ns = generate_namespace(&ctx);

        let labels = ns.metadata.labels.as_ref().unwrap();
        let annotations = ns.metadata.annotations.as_ref().unwrap();
        assert_eq!(ns.metadata.name.as_deref(), Some("acme01"));
        assert!(ns.metadata.namespace.is_none());
        assert_eq!(labels[NAMESPACE_NAME_LABEL], "acme01");
        assert_eq!(labels["cloud-provider"], "aws");
        assert_eq!(annotations["tenantflow.io/tenant-name"], "Acme Corp");
        assert!(!annotations.contains_key("tenantflow.io/created-at"));
    }

    #[test]
    fn test_namespace_with_created_at() {
        let tenant = tenant();
        let platform = PlatformSettings::default();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ctx = GenerationContext::new(&tenant, &platform, Some(at)).unwrap();
        let ns = generate_namespace(&ctx);

        assert_eq!(
            ns.metadata.annotations.unwrap()["tenantflow.io/created-at"],
            "2024-01-02T03:04:05Z"
        );
    }

    #[test]
    fn test_quota_from_settings() {
        let mut tenant = tenant();
        let quota = &mut tenant.advanced_settings.common.resource_quota;
        quota.cpu = Some(ResourceValue::from(16.0));
        quota.memory = Some(ResourceValue::from("64"));
        quota.storage = Some(ResourceValue::from(500.0));
        let platform = PlatformSettings::default();
        let ctx = GenerationContext::new(&tenant, &platform, None).unwrap();

        let quota = generate_resource_quota(&ctx, &[plan(2.0, 4.0, 100.0, 1)]);
        let hard = hard(&quota);
        assert_eq!(quota.metadata.name.as_deref(), Some("acme01-quota"));
        assert_eq!(hard["requests.cpu"], "16");
        assert_eq!(hard["limits.cpu"], "32");
        assert_eq!(hard["requests.memory"], "64Gi");
        assert_eq!(hard["limits.memory"], "128Gi");
        assert_eq!(hard["requests.storage"], "500Gi");
        assert_eq!(hard["persistentvolumeclaims"], "20");
        assert_eq!(hard["services"], "50");
        assert_eq!(hard["secrets"], "20");
        assert_eq!(hard["configmaps"], "20");
        assert_eq!(hard["pods"], "100");
    }

    #[test]
    fn test_quota_falls_back_to_aggregate() {
        let tenant = tenant();
        let platform = PlatformSettings::default();
        let ctx = GenerationContext::new(&tenant, &platform, None).unwrap();

        let plans = [plan(2.0, 4.0, 100.0, 2), plan(0.5, 1.5, 50.0, 1)];
        let quota = generate_resource_quota(&ctx, &plans);
        let hard = hard(&quota);
        assert_eq!(hard["requests.cpu"], "4500m");
        assert_eq!(hard["limits.cpu"], "9");
        assert_eq!(hard["requests.memory"], "9728Mi");
        assert_eq!(hard["limits.memory"], "19Gi");
        assert_eq!(hard["requests.storage"], "250Gi");
    }

    #[test]
    fn test_aggregate() {
        let plans = [plan(2.0, 4.0, 100.0, 3)];
        let aggregate = AggregateResources::sum(&plans);
        assert_eq!(aggregate.cpu, 6.0);
        assert_eq!(aggregate.memory_gb, 12.0);
        assert_eq!(aggregate.replicas, 3);
        assert_eq!(AggregateResources::sum(&[]), AggregateResources::default());
    }

    #[test]
    fn test_aggregate_large_counts() {
        let mut big = plan(1.0, 1.0, 1.0, 100_000);
        big.gpu_count = 100_000;
        let aggregate = AggregateResources::sum(&[big.clone(), big]);
        assert_eq!(aggregate.gpu, 20_000_000_000);
        assert_eq!(aggregate.replicas, 200_000);
    }

    #[test]
    fn test_network_policy() {
        let tenant = tenant();
        let platform = PlatformSettings::default();
        let ctx = GenerationContext::new(&tenant, &platform, None).unwrap();
        let policy = generate_network_policy(&ctx);
        let spec = policy.spec.as_ref().unwrap();

        assert_eq!(policy.metadata.name.as_deref(), Some("acme01-network-policy"));
        assert_eq!(spec.pod_selector, LabelSelector::default());
        assert_eq!(
            spec.policy_types.as_deref(),
            Some(&["Ingress".to_string(), "Egress".to_string()][..])
        );

        let ingress = spec.ingress.as_ref().unwrap();
        let sources: Vec<&str> = ingress[0]
            .from
            .as_ref()
            .unwrap()
            .iter()
            .map(|peer| {
                peer.namespace_selector
                    .as_ref()
                    .and_then(|s| s.match_labels.as_ref())
                    .unwrap()[NAMESPACE_NAME_LABEL]
                    .as_str()
            })
            .collect();
        assert_eq!(sources, ["acme01", "kube-system", "monitoring"]);

        let egress = spec.egress.as_ref().unwrap();
        let egress_ports: Vec<(&str, i32)> = egress
            .iter()
            .flat_map(|rule| rule.ports.iter().flatten())
            .map(|p| match (&p.protocol, &p.port) {
                (Some(protocol), Some(IntOrString::Int(n))) => (protocol.as_str(), *n),
                other => panic!("unexpected port {:?}", other),
            })
            .collect();
        assert_eq!(
            egress_ports,
            [("UDP", 53), ("TCP", 53), ("TCP", 80), ("TCP", 443)]
        );

        // Namespace 内の Pod への送信は全 Pod 一致のセレクタ
        let intra = &egress[1];
        assert!(intra.ports.is_none());
        let peers = intra.to.as_ref().unwrap();
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].pod_selector, Some(LabelSelector::default()));
        assert!(peers[0].namespace_selector.is_none());
    }
}
