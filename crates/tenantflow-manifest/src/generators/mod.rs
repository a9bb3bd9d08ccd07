//! リソースジェネレーター
//!
//! どれも [`GenerationContext`](crate::context::GenerationContext) を受け取る純粋関数で、失敗しない。

pub mod configmap;
pub mod exposure;
pub mod namespace;
pub mod observability;
pub mod workload;

pub use configmap::generate_configmap;
pub use exposure::{generate_ingress, generate_load_balancer};
pub use namespace::{AggregateResources, generate_namespace, generate_network_policy, generate_resource_quota};
pub use observability::{generate_alert_rules, generate_service_monitor};
pub use workload::{WorkloadSet, generate_workload};
