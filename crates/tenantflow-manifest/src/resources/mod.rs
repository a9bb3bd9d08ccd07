//! 出力対象の Kubernetes リソース
//!
//! 標準リソースは k8s-openapi の型をそのまま使い、
//! Prometheus Operator のカスタムリソースだけを [`monitoring`] で定義する。

mod meta;
mod monitoring;

pub use meta::*;
pub use monitoring::*;

pub use k8s_openapi::api::apps::v1::Deployment;
pub use k8s_openapi::api::autoscaling::v2::HorizontalPodAutoscaler;
pub use k8s_openapi::api::core::v1::{
    ConfigMap, Namespace, PersistentVolumeClaim, ResourceQuota, Service,
};
pub use k8s_openapi::api::networking::v1::{Ingress, NetworkPolicy};

use serde::Serialize;

/// 出力対象のリソース
///
/// k8s-openapi の型は apiVersion, kind, metadata, spec の順で直列化される。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Resource {
    Namespace(Namespace),
    ResourceQuota(ResourceQuota),
    NetworkPolicy(NetworkPolicy),
    ConfigMap(ConfigMap),
    Deployment(Box<Deployment>),
    Service(Service),
    PersistentVolumeClaim(PersistentVolumeClaim),
    HorizontalPodAutoscaler(HorizontalPodAutoscaler),
    Ingress(Ingress),
    ServiceMonitor(ServiceMonitor),
    PrometheusRule(PrometheusRule),
}

macro_rules! impl_from_resource {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Resource {
                fn from(resource: $ty) -> Self {
                    Self::$ty(resource)
                }
            }
        )*
    };
}

impl_from_resource!(
    Namespace,
    ResourceQuota,
    NetworkPolicy,
    ConfigMap,
    Service,
    PersistentVolumeClaim,
    HorizontalPodAutoscaler,
    Ingress,
    ServiceMonitor,
    PrometheusRule,
);

impl From<Deployment> for Resource {
    fn from(resource: Deployment) -> Self {
        Self::Deployment(Box::new(resource))
    }
}
