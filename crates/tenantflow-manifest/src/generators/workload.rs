//! サーバー1台分のワークロード
//!
//! Deployment / Service / PVC / HPA を同じ語幹 `{tenantId}-{serverName}` で生成する。

use crate::context::{GenerationContext, MANAGED_BY};
use crate::quantity::{CpuQuantity, MemoryQuantity, count};
use crate::resources::*;
use k8s_openapi::api::apps::v1::{
    DeploymentSpec, DeploymentStrategy as K8sDeploymentStrategy, RollingUpdateDeployment,
};
use k8s_openapi::api::autoscaling::v2::{
    CrossVersionObjectReference, HPAScalingPolicy, HPAScalingRules,
    HorizontalPodAutoscalerBehavior, HorizontalPodAutoscalerSpec, MetricSpec, MetricTarget,
    ResourceMetricSource,
};
use k8s_openapi::api::core::v1::{
    Affinity, ConfigMapEnvSource, Container, ContainerPort, EnvFromSource, EnvVar, HTTPGetAction,
    LocalObjectReference, PersistentVolumeClaimSpec, PersistentVolumeClaimVolumeSource,
    PodAffinityTerm, PodAntiAffinity, PodSpec, PodTemplateSpec, Probe,
    ResourceRequirements as K8sResourceRequirements, ServicePort, ServiceSpec, Toleration, Volume,
    VolumeMount, VolumeResourceRequirements, WeightedPodAffinityTerm,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use std::collections::BTreeMap;
use tenantflow_core::{DeploymentStrategy, ServerPlan, WorkloadResource, resolve_service_env};

pub const HTTP_PORT: i32 = 8080;
pub const METRICS_PORT: i32 = 9090;
pub const HTTPS_PORT: i32 = 8443;

const GPU_RESOURCE: &str = "nvidia.com/gpu";
const DATA_VOLUME: &str = "data";
const DATA_MOUNT_PATH: &str = "/data";
const HOSTNAME_TOPOLOGY: &str = "kubernetes.io/hostname";

/// 1サーバー分の生成結果
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSet {
    pub server_name: String,
    pub deployment: Deployment,
    pub service: Service,
    pub pvc: PersistentVolumeClaim,
    pub hpa: HorizontalPodAutoscaler,
}

impl WorkloadSet {
    /// 出力順（Deployment, Service, PVC, HPA）に並べる
    pub fn resources(&self) -> Vec<Resource> {
        vec![
            self.deployment.clone().into(),
            self.service.clone().into(),
            self.pvc.clone().into(),
            self.hpa.clone().into(),
        ]
    }
}

pub fn generate_workload(ctx: &GenerationContext<'_>, plan: &ServerPlan) -> WorkloadSet {
    let stem = ctx.names.stem(&plan.server_name);
    let workload_labels = workload_labels(ctx, plan, &stem);

    WorkloadSet {
        server_name: plan.server_name.clone(),
        deployment: deployment(ctx, plan, &stem, &workload_labels),
        service: cluster_service(ctx, plan, &stem, &workload_labels),
        pvc: volume_claim(ctx, plan, &workload_labels),
        hpa: autoscaler(ctx, plan, &stem, &workload_labels),
    }
}

fn workload_labels(ctx: &GenerationContext<'_>, plan: &ServerPlan, stem: &str) -> Labels {
    labels([
        ("app", stem),
        ("tenant", ctx.namespace()),
        ("component", plan.server_name.as_str()),
        ("environment", ctx.environment_label()),
        ("managed-by", MANAGED_BY),
    ])
}

fn selector_labels(ctx: &GenerationContext<'_>, stem: &str) -> Labels {
    labels([("app", stem), ("tenant", ctx.namespace())])
}

/// 検証済みの replicas を Kubernetes の整数型に変換
fn replica_count(replicas: u32) -> i32 {
    i32::try_from(replicas).unwrap_or(i32::MAX)
}

// --- Deployment ---

fn deployment(
    ctx: &GenerationContext<'_>,
    plan: &ServerPlan,
    stem: &str,
    workload_labels: &Labels,
) -> Deployment {
    let strategy = match ctx.tenant.deployment_strategy {
        DeploymentStrategy::Rolling => K8sDeploymentStrategy {
            type_: Some("RollingUpdate".to_string()),
            rolling_update: Some(RollingUpdateDeployment {
                max_surge: Some(IntOrString::Int(1)),
                max_unavailable: Some(IntOrString::Int(0)),
            }),
        },
        DeploymentStrategy::Recreate => K8sDeploymentStrategy {
            type_: Some("Recreate".to_string()),
            rolling_update: None,
        },
    };

    let registry_url = ctx.tenant.registry.url.trim().trim_end_matches('/');
    let image = if registry_url.is_empty() {
        format!("{}:{}", plan.server_name, ctx.platform.image_tag)
    } else {
        format!(
            "{}/{}/{}:{}",
            registry_url,
            ctx.namespace(),
            plan.server_name,
            ctx.platform.image_tag
        )
    };
    let image_pull_secrets = (!registry_url.is_empty()).then(|| {
        vec![LocalObjectReference {
            name: ctx.names.tenant_resource("registry-secret"),
        }]
    });

    let container = Container {
        name: plan.server_name.clone(),
        image: Some(image),
        image_pull_policy: Some("IfNotPresent".to_string()),
        ports: Some(vec![
            container_port("http", HTTP_PORT),
            container_port("metrics", METRICS_PORT),
            container_port("https", HTTPS_PORT),
        ]),
        env: Some(container_env(ctx, plan)),
        env_from: Some(vec![EnvFromSource {
            config_map_ref: Some(ConfigMapEnvSource {
                name: ctx.names.tenant_resource("config"),
                optional: None,
            }),
            ..Default::default()
        }]),
        resources: Some(resource_requirements(plan)),
        volume_mounts: Some(vec![VolumeMount {
            name: DATA_VOLUME.to_string(),
            mount_path: DATA_MOUNT_PATH.to_string(),
            ..Default::default()
        }]),
        liveness_probe: Some(http_check("/health", 30, 10, None)),
        readiness_probe: Some(http_check("/ready", 5, 5, None)),
        startup_probe: Some(http_check("/startup", 10, 10, Some(30))),
        ..Default::default()
    };

    let (node_selector, tolerations) = if plan.gpu_count > 0 {
        (
            labels([("accelerator", ctx.platform.gpu_accelerator.as_str())]),
            Some(vec![Toleration {
                key: Some(GPU_RESOURCE.to_string()),
                operator: Some("Exists".to_string()),
                effect: Some("NoSchedule".to_string()),
                ..Default::default()
            }]),
        )
    } else {
        (labels([("node-type", "standard")]), None)
    };

    let pod_spec = PodSpec {
        image_pull_secrets,
        containers: vec![container],
        volumes: Some(vec![Volume {
            name: DATA_VOLUME.to_string(),
            persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
                claim_name: ctx
                    .names
                    .resource_name(&plan.server_name, WorkloadResource::Pvc),
                read_only: None,
            }),
            ..Default::default()
        }]),
        node_selector: Some(node_selector),
        tolerations,
        affinity: Some(spread_across_hosts(stem)),
        ..Default::default()
    };

    Deployment {
        metadata: ctx.meta(
            ctx.names.resource_name(&plan.server_name, WorkloadResource::Deployment),
            workload_labels.clone(),
        ),
        spec: Some(DeploymentSpec {
            replicas: Some(replica_count(plan.replicas)),
            selector: match_labels(selector_labels(ctx, stem)),
            strategy: Some(strategy),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(workload_labels.clone()),
                    ..Default::default()
                }),
                spec: Some(pod_spec),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn container_port(name: &str, port: i32) -> ContainerPort {
    ContainerPort {
        name: Some(name.to_string()),
        container_port: port,
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}

fn http_check(path: &str, initial_delay: i32, period: i32, failure_threshold: Option<i32>) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::Int(HTTP_PORT),
            ..Default::default()
        }),
        initial_delay_seconds: Some(initial_delay),
        period_seconds: Some(period),
        failure_threshold,
        ..Default::default()
    }
}

/// 同じ Deployment の Pod をなるべく別ノードに分散させる
fn spread_across_hosts(stem: &str) -> Affinity {
    Affinity {
        pod_anti_affinity: Some(PodAntiAffinity {
            preferred_during_scheduling_ignored_during_execution: Some(vec![
                WeightedPodAffinityTerm {
                    weight: 100,
                    pod_affinity_term: PodAffinityTerm {
                        label_selector: Some(match_labels(labels([("app", stem)]))),
                        topology_key: HOSTNAME_TOPOLOGY.to_string(),
                        ..Default::default()
                    },
                },
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env_var(name: &str, value: impl Into<String>) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.into()),
        ..Default::default()
    }
}

/// 共通変数のあとにサービス固有の変数を並べる
fn container_env(ctx: &GenerationContext<'_>, plan: &ServerPlan) -> Vec<EnvVar> {
    let tenant = ctx.tenant;
    let mut env = vec![
        env_var("ENVIRONMENT", tenant.environment.as_str()),
        env_var("TENANT_ID", tenant.tenant_id.as_str()),
        env_var("COMPONENT_NAME", plan.server_name.as_str()),
        env_var("CLOUD_PROVIDER", tenant.cloud_provider.as_str()),
        env_var("REGION", tenant.region.as_str()),
        env_var("SERVER_TYPE", plan.server_type.as_str()),
        env_var("DEPLOYMENT_MODE", tenant.deployment_mode.as_str()),
    ];
    env.extend(
        resolve_service_env(plan, tenant.deployment_mode, &tenant.advanced_settings)
            .into_iter()
            .map(|var| env_var(&var.name, var.value)),
    );
    env
}

fn resource_requirements(plan: &ServerPlan) -> K8sResourceRequirements {
    let cpu = CpuQuantity::from_cores(plan.cpu_cores);
    let memory = MemoryQuantity::from_gib(plan.memory_gb);

    let mut requests: BTreeMap<String, Quantity> = BTreeMap::from([
        ("cpu".to_string(), cpu.into()),
        ("memory".to_string(), memory.into()),
    ]);
    let mut limits: BTreeMap<String, Quantity> = BTreeMap::from([
        ("cpu".to_string(), cpu.doubled().into()),
        ("memory".to_string(), memory.doubled().into()),
    ]);
    if plan.gpu_count > 0 {
        requests.insert(GPU_RESOURCE.to_string(), count(plan.gpu_count));
        limits.insert(GPU_RESOURCE.to_string(), count(plan.gpu_count));
    }

    K8sResourceRequirements {
        claims: None,
        requests: Some(requests),
        limits: Some(limits),
    }
}

// --- Service / PVC / HPA ---

fn cluster_service(
    ctx: &GenerationContext<'_>,
    plan: &ServerPlan,
    stem: &str,
    workload_labels: &Labels,
) -> Service {
    let port = |name: &str, number: i32| ServicePort {
        name: Some(name.to_string()),
        port: number,
        target_port: Some(IntOrString::Int(number)),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    };

    Service {
        metadata: ctx.meta(
            ctx.names.resource_name(&plan.server_name, WorkloadResource::Service),
            workload_labels.clone(),
        ),
        spec: Some(ServiceSpec {
            type_: Some("ClusterIP".to_string()),
            selector: Some(selector_labels(ctx, stem)),
            ports: Some(vec![
                port("http", HTTP_PORT),
                port("metrics", METRICS_PORT),
                port("https", HTTPS_PORT),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// クラウドごとのストレージクラス
pub fn storage_class(cloud_provider: &str) -> &'static str {
    match cloud_provider.trim().to_ascii_lowercase().as_str() {
        "aws" => "gp3",
        "gcp" => "ssd",
        _ => "fast-ssd",
    }
}

fn volume_claim(
    ctx: &GenerationContext<'_>,
    plan: &ServerPlan,
    workload_labels: &Labels,
) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ctx.meta(
            ctx.names.resource_name(&plan.server_name, WorkloadResource::Pvc),
            workload_labels.clone(),
        ),
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: Some(storage_class(&ctx.tenant.cloud_provider).to_string()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    MemoryQuantity::from_gib(plan.storage_gb).into(),
                )])),
                limits: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// HPA の上限（replicas の3倍、最低3）
pub fn max_replicas(replicas: u32) -> u32 {
    replicas.saturating_mul(3).max(3)
}

fn utilization(resource: &str, percent: i32) -> MetricSpec {
    MetricSpec {
        type_: "Resource".to_string(),
        resource: Some(ResourceMetricSource {
            name: resource.to_string(),
            target: MetricTarget {
                type_: "Utilization".to_string(),
                average_utilization: Some(percent),
                ..Default::default()
            },
        }),
        ..Default::default()
    }
}

fn scaling_policy(kind: &str, value: i32) -> HPAScalingPolicy {
    HPAScalingPolicy {
        type_: kind.to_string(),
        value,
        period_seconds: 60,
    }
}

fn autoscaler(
    ctx: &GenerationContext<'_>,
    plan: &ServerPlan,
    stem: &str,
    workload_labels: &Labels,
) -> HorizontalPodAutoscaler {
    HorizontalPodAutoscaler {
        metadata: ctx.meta(
            ctx.names.resource_name(&plan.server_name, WorkloadResource::Hpa),
            workload_labels.clone(),
        ),
        spec: Some(HorizontalPodAutoscalerSpec {
            scale_target_ref: CrossVersionObjectReference {
                api_version: Some("apps/v1".to_string()),
                kind: "Deployment".to_string(),
                name: stem.to_string(),
            },
            min_replicas: Some(replica_count(plan.replicas)),
            max_replicas: replica_count(max_replicas(plan.replicas)),
            metrics: Some(vec![utilization("cpu", 70), utilization("memory", 80)]),
            behavior: Some(HorizontalPodAutoscalerBehavior {
                scale_up: Some(HPAScalingRules {
                    stabilization_window_seconds: Some(60),
                    policies: Some(vec![
                        scaling_policy("Percent", 50),
                        scaling_policy("Pods", 2),
                    ]),
                    select_policy: Some("Max".to_string()),
                    ..Default::default()
                }),
                scale_down: Some(HPAScalingRules {
                    stabilization_window_seconds: Some(300),
                    policies: Some(vec![scaling_policy("Percent", 25)]),
                    ..Default::default()
                }),
            }),
        }),
        ..Default::default()
    }
}
