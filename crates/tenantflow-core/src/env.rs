//! 環境変数の解決
//!
//! サーバー名からサービス種別を推定し、そのワークロードに渡す環境変数を
//! advancedSettings から組み立てる。
//!
//! 推定は [`SERVICE_RULES`] を上から順に評価し、最初に一致した規則を採用する。
//! `callbot-stt-gateway` のように複数の種別名を含む場合は先に宣言された callbot が勝つ。

use crate::model::{AdvancedSettings, DeploymentMode, ServerPlan, ServiceKind};
use serde::Serialize;
use tracing::debug;

/// コンテナに渡す環境変数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// 環境変数の値の出どころ
#[derive(Debug, Clone, Copy)]
enum ValueSource {
    /// advancedSettings.{種別}.{キー}
    Setting(&'static str),
    /// 固定値
    Fixed(&'static str),
}

/// サービス種別の推定規則（判定関数と変数定義の組）
struct ServiceRule {
    kind: ServiceKind,
    matches: fn(&str) -> bool,
    variables: &'static [(&'static str, ValueSource)],
}

use ValueSource::{Fixed, Setting};

/// 評価順＝優先順位
const SERVICE_RULES: &[ServiceRule] = &[
    ServiceRule {
        kind: ServiceKind::Callbot,
        matches: |name: &str| name.contains("callbot"),
        variables: &[
            ("STT_ENDPOINT", Setting("sttEndpoint")),
            ("TTS_ENDPOINT", Setting("ttsEndpoint")),
            ("MAX_CONCURRENT_CALLS", Setting("maxConcurrentCalls")),
            ("CALL_TIMEOUT", Setting("callTimeout")),
            ("RECORDING_ENABLED", Setting("recordingEnabled")),
        ],
    },
    ServiceRule {
        kind: ServiceKind::Chatbot,
        matches: |name: &str| name.contains("chatbot"),
        variables: &[
            ("NLP_ENDPOINT", Setting("nlpEndpoint")),
            ("MAX_SESSIONS", Setting("maxSessions")),
            ("SESSION_TIMEOUT", Setting("sessionTimeout")),
            ("LANGUAGE_MODEL", Setting("languageModel")),
        ],
    },
    ServiceRule {
        kind: ServiceKind::Advisor,
        matches: |name: &str| name.contains("advisor"),
        variables: &[
            ("LLM_ENDPOINT", Setting("llmEndpoint")),
            ("KNOWLEDGE_BASE_URL", Setting("knowledgeBaseUrl")),
            ("MAX_TOKENS", Setting("maxTokens")),
            ("TEMPERATURE", Setting("temperature")),
        ],
    },
    ServiceRule {
        kind: ServiceKind::Stt,
        matches: |name: &str| name.contains("stt"),
        variables: &[
            ("STT_MODEL_PATH", Setting("modelPath")),
            ("STT_LANGUAGE", Setting("language")),
            ("SAMPLE_RATE", Setting("sampleRate")),
            ("BEAM_SIZE", Setting("beamSize")),
        ],
    },
    ServiceRule {
        kind: ServiceKind::Tts,
        matches: |name: &str| name.contains("tts"),
        variables: &[
            ("TTS_VOICE_MODEL", Setting("voiceModel")),
            ("SPEAKING_RATE", Setting("speakingRate")),
            ("OUTPUT_FORMAT", Setting("outputFormat")),
        ],
    },
    // "ta" / "qa" は普通の単語（data, standard など）に含まれるためセグメント一致
    ServiceRule {
        kind: ServiceKind::Ta,
        matches: |name: &str| has_segment(name, "ta"),
        variables: &[
            ("TA_ANALYSIS_MODE", Setting("analysisMode")),
            ("TA_BATCH_SIZE", Setting("batchSize")),
            ("SENTIMENT_THRESHOLD", Setting("sentimentThreshold")),
        ],
    },
    ServiceRule {
        kind: ServiceKind::Qa,
        matches: |name: &str| has_segment(name, "qa"),
        variables: &[
            ("QA_EVALUATION_CRITERIA", Setting("evaluationCriteria")),
            ("QA_SCORING_THRESHOLD", Setting("scoringThreshold")),
            ("QA_REPORT_SCHEDULE", Setting("reportSchedule")),
        ],
    },
    ServiceRule {
        kind: ServiceKind::Monitoring,
        matches: |name: &str| name.contains("monitoring"),
        variables: &[
            ("METRICS_PORT", Fixed("9090")),
            ("METRICS_PATH", Fixed("/metrics")),
        ],
    },
];

fn has_segment(name: &str, segment: &str) -> bool {
    name.split('-').any(|s| s == segment)
}

/// サーバー名からサービス種別を推定
pub fn infer_service_kind(server_name: &str) -> Option<ServiceKind> {
    SERVICE_RULES
        .iter()
        .find(|rule| (rule.matches)(server_name))
        .map(|rule| rule.kind)
}

/// サービス固有の環境変数を解決
///
/// - auto-calculate: 推定したサービス種別の変数を advancedSettings から埋める。
///   一致する種別が無ければ空。
/// - custom: `SERVER_NAME`, `ALLOCATED_SERVICES`, `CUSTOM_MODE` の3つだけ。
///   advancedSettings 由来の変数は含めない。
///
/// ワークロード共通の変数（TENANT_ID など）はここでは扱わない。
pub fn resolve_service_env(
    plan: &ServerPlan,
    mode: DeploymentMode,
    settings: &AdvancedSettings,
) -> Vec<EnvVar> {
    match mode {
        DeploymentMode::Custom => vec![
            EnvVar::new("SERVER_NAME", plan.server_name.as_str()),
            EnvVar::new("ALLOCATED_SERVICES", plan.services.join(",")),
            EnvVar::new("CUSTOM_MODE", "true"),
        ],
        DeploymentMode::AutoCalculate => {
            let Some(rule) = SERVICE_RULES
                .iter()
                .find(|rule| (rule.matches)(&plan.server_name))
            else {
                debug!(server = %plan.server_name, "No service type matched");
                return Vec::new();
            };
            debug!(server = %plan.server_name, service = rule.kind.as_str(), "Inferred service type");

            let section = settings.section(rule.kind);
            rule.variables
                .iter()
                .map(|(name, source)| {
                    let value = match source {
                        Setting(key) => section.map(|s| s.value(key)).unwrap_or_default(),
                        Fixed(value) => value.to_string(),
                    };
                    EnvVar::new(*name, value)
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServiceSettings;
    use serde_json::json;

    fn plan(name: &str) -> ServerPlan {
        ServerPlan {
            server_name: name.to_string(),
            server_type: name.to_string(),
            cpu_cores: 2.0,
            memory_gb: 4.0,
            gpu_count: 0,
            storage_gb: 20.0,
            replicas: 1,
            services: Vec::new(),
        }
    }

    fn settings() -> AdvancedSettings {
        let mut settings = AdvancedSettings::default();
        settings.callbot = [
            ("sttEndpoint".to_string(), json!("http://stt.acme:8080")),
            ("maxConcurrentCalls".to_string(), json!(100)),
            ("recordingEnabled".to_string(), json!(true)),
        ]
        .into_iter()
        .collect::<ServiceSettings>();
        settings.chatbot.insert("nlpEndpoint", json!("http://nlp.acme"));
        settings
    }

    fn value_of<'a>(vars: &'a [EnvVar], name: &str) -> Option<&'a str> {
        vars.iter()
            .find(|v| v.name == name)
            .map(|v| v.value.as_str())
    }

    #[test]
    fn test_infer_service_kind() {
        assert_eq!(infer_service_kind("callbot-server"), Some(ServiceKind::Callbot));
        assert_eq!(infer_service_kind("chatbot-api"), Some(ServiceKind::Chatbot));
        assert_eq!(infer_service_kind("ai-advisor"), Some(ServiceKind::Advisor));
        assert_eq!(infer_service_kind("stt-gpu-node"), Some(ServiceKind::Stt));
        assert_eq!(infer_service_kind("tts-server"), Some(ServiceKind::Tts));
        assert_eq!(infer_service_kind("ta-server"), Some(ServiceKind::Ta));
        assert_eq!(infer_service_kind("qa-server"), Some(ServiceKind::Qa));
        assert_eq!(infer_service_kind("monitoring-server"), Some(ServiceKind::Monitoring));
        assert_eq!(infer_service_kind("database-server"), None);
    }

    #[test]
    fn test_precedence_follows_declaration_order() {
        // callbot と stt の両方を含む
        assert_eq!(infer_service_kind("callbot-stt-gateway"), Some(ServiceKind::Callbot));
        // stt と tts の両方を含む
        assert_eq!(infer_service_kind("tts-stt-combo"), Some(ServiceKind::Stt));
    }

    #[test]
    fn test_ta_qa_require_whole_segment() {
        assert_eq!(infer_service_kind("data-node"), None);
        assert_eq!(infer_service_kind("standard-node"), None);
        assert_eq!(infer_service_kind("aqua-node"), None);
    }

    #[test]
    fn test_auto_mode_callbot_variables() {
        let vars = resolve_service_env(
            &plan("callbot-server"),
            DeploymentMode::AutoCalculate,
            &settings(),
        );

        assert_eq!(value_of(&vars, "STT_ENDPOINT"), Some("http://stt.acme:8080"));
        assert_eq!(value_of(&vars, "MAX_CONCURRENT_CALLS"), Some("100"));
        assert_eq!(value_of(&vars, "RECORDING_ENABLED"), Some("true"));
        // 未設定のキーは空文字列
        assert_eq!(value_of(&vars, "TTS_ENDPOINT"), Some(""));
        assert_eq!(value_of(&vars, "CALL_TIMEOUT"), Some(""));
    }

    #[test]
    fn test_auto_mode_no_match() {
        let vars = resolve_service_env(
            &plan("database-server"),
            DeploymentMode::AutoCalculate,
            &settings(),
        );
        assert!(vars.is_empty());
    }

    #[test]
    fn test_monitoring_fixed_values() {
        let vars = resolve_service_env(
            &plan("monitoring-server"),
            DeploymentMode::AutoCalculate,
            &AdvancedSettings::default(),
        );
        assert_eq!(value_of(&vars, "METRICS_PORT"), Some("9090"));
        assert_eq!(value_of(&vars, "METRICS_PATH"), Some("/metrics"));
    }

    #[test]
    fn test_custom_mode_generic_triple() {
        let mut p = plan("chatbot-worker");
        p.services = vec!["chatbot".to_string(), "advisor".to_string()];

        let vars = resolve_service_env(&p, DeploymentMode::Custom, &settings());

        assert_eq!(vars.len(), 3);
        assert_eq!(value_of(&vars, "SERVER_NAME"), Some("chatbot-worker"));
        assert_eq!(value_of(&vars, "ALLOCATED_SERVICES"), Some("chatbot,advisor"));
        assert_eq!(value_of(&vars, "CUSTOM_MODE"), Some("true"));
        // サーバー名に chatbot を含んでも advancedSettings 由来の変数は出ない
        assert_eq!(value_of(&vars, "NLP_ENDPOINT"), None);
    }
}
