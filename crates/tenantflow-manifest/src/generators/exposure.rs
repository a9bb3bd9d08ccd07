//! テナント外部公開（LoadBalancer Service と TLS 付き Ingress）

use super::workload::{HTTP_PORT, HTTPS_PORT};
use crate::context::GenerationContext;
use crate::resources::*;
use k8s_openapi::api::core::v1::{ClientIPConfig, ServicePort, ServiceSpec, SessionAffinityConfig};
use k8s_openapi::api::networking::v1::{
    HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule, IngressServiceBackend,
    IngressSpec, IngressTLS, ServiceBackendPort,
};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

const HTTP_LB_PORT: i32 = 80;
const HTTPS_LB_PORT: i32 = 443;
const CLIENT_IP_TIMEOUT_SECONDS: i32 = 3600;

/// Ingress コントローラー向けのアノテーション
const INGRESS_ANNOTATIONS: [(&str, &str); 5] = [
    ("nginx.ingress.kubernetes.io/force-ssl-redirect", "true"),
    ("nginx.ingress.kubernetes.io/proxy-body-size", "50m"),
    ("nginx.ingress.kubernetes.io/proxy-read-timeout", "600"),
    ("nginx.ingress.kubernetes.io/proxy-send-timeout", "600"),
    ("nginx.ingress.kubernetes.io/limit-rpm", "100"),
];

pub fn generate_load_balancer(ctx: &GenerationContext<'_>) -> Service {
    Service {
        metadata: ctx.meta(ctx.names.tenant_resource("lb"), ctx.tenant_labels()),
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            selector: Some(labels([("tenant", ctx.namespace())])),
            ports: Some(vec![
                lb_port("http", HTTP_LB_PORT, HTTP_PORT),
                lb_port("https", HTTPS_LB_PORT, HTTPS_PORT),
            ]),
            session_affinity: Some("ClientIP".to_string()),
            session_affinity_config: Some(SessionAffinityConfig {
                client_ip: Some(ClientIPConfig {
                    timeout_seconds: Some(CLIENT_IP_TIMEOUT_SECONDS),
                }),
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn lb_port(name: &str, port: i32, target: i32) -> ServicePort {
    ServicePort {
        name: Some(name.to_string()),
        port,
        target_port: Some(IntOrString::Int(target)),
        protocol: Some("TCP".to_string()),
        ..Default::default()
    }
}

pub fn generate_ingress(ctx: &GenerationContext<'_>) -> Ingress {
    let lb = ctx.names.tenant_resource("lb");
    let hosts = &ctx.hosts;

    let mut meta = ctx.meta(ctx.names.tenant_resource("ingress"), ctx.tenant_labels());
    let mut annotations = labels(INGRESS_ANNOTATIONS);
    annotations.insert(
        "cert-manager.io/cluster-issuer".to_string(),
        ctx.platform.cluster_issuer.clone(),
    );
    meta.annotations = Some(annotations);

    Ingress {
        metadata: meta,
        spec: Some(IngressSpec {
            ingress_class_name: Some(ctx.platform.ingress_class.clone()),
            tls: Some(vec![IngressTLS {
                hosts: Some(vec![hosts.root.clone(), hosts.api.clone()]),
                secret_name: Some(ctx.names.tenant_resource("tls")),
            }]),
            rules: Some(vec![
                prefix_rule(&hosts.root, "/", &lb),
                prefix_rule(&hosts.api, "/api", &lb),
            ]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn prefix_rule(host: &str, path: &str, service: &str) -> IngressRule {
    IngressRule {
        host: Some(host.to_string()),
        http: Some(HTTPIngressRuleValue {
            paths: vec![HTTPIngressPath {
                path: Some(path.to_string()),
                path_type: "Prefix".to_string(),
                backend: IngressBackend {
                    service: Some(IngressServiceBackend {
                        name: service.to_string(),
                        port: Some(ServiceBackendPort {
                            number: Some(HTTP_LB_PORT),
                            ..Default::default()
                        }),
                    }),
                    ..Default::default()
                },
            }],
        }),
    }
}
