//! メトリクス収集（ServiceMonitor）とアラート（PrometheusRule）

use crate::context::GenerationContext;
use crate::resources::*;

pub fn generate_service_monitor(ctx: &GenerationContext<'_>) -> ServiceMonitor {
    let name = ctx.names.tenant_resource("monitor");
    let mut monitor = ServiceMonitor::new(
        &name,
        ServiceMonitorSpec {
            selector: match_labels(labels([("tenant", ctx.namespace())])),
            endpoints: vec![Endpoint {
                port: "metrics".to_string(),
                path: "/metrics".to_string(),
                interval: "30s".to_string(),
                scrape_timeout: "10s".to_string(),
            }],
        },
    );
    monitor.metadata = ctx.meta(name, ctx.tenant_labels());
    monitor
}

pub fn generate_alert_rules(ctx: &GenerationContext<'_>) -> PrometheusRule {
    let ns = ctx.namespace();
    let rules = vec![
        alert(
            "HighCPUUsage",
            format!(
                "sum(rate(container_cpu_usage_seconds_total{{namespace=\"{ns}\"}}[5m])) by (pod) \
                 / sum(kube_pod_container_resource_limits{{namespace=\"{ns}\",resource=\"cpu\"}}) by (pod) > 0.8"
            ),
            "warning",
            "CPU 使用率が 80% を超えています",
        ),
        alert(
            "HighMemoryUsage",
            format!(
                "sum(container_memory_working_set_bytes{{namespace=\"{ns}\"}}) by (pod) \
                 / sum(kube_pod_container_resource_limits{{namespace=\"{ns}\",resource=\"memory\"}}) by (pod) > 0.85"
            ),
            "warning",
            "メモリ使用率が 85% を超えています",
        ),
        AlertRule {
            for_duration: "0m".to_string(),
            ..alert(
                "PodRestartingTooOften",
                format!("increase(kube_pod_container_status_restarts_total{{namespace=\"{ns}\"}}[1h]) > 5"),
                "critical",
                "1時間に5回を超えて再起動しています",
            )
        },
    ];

    let name = ctx.names.tenant_resource("alerts");
    let mut rule = PrometheusRule::new(
        &name,
        PrometheusRuleSpec {
            groups: vec![RuleGroup {
                name: format!("{}.rules", ns),
                rules,
            }],
        },
    );
    rule.metadata = ctx.meta(name, ctx.tenant_labels());
    rule
}

fn alert(name: &str, expr: String, severity: &str, summary: &str) -> AlertRule {
    AlertRule {
        alert: name.to_string(),
        expr,
        for_duration: "5m".to_string(),
        labels: labels([("severity", severity)]),
        annotations: labels([("summary", summary)]),
    }
}
