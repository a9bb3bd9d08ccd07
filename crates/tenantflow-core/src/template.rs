//! テンプレート展開機能
//!
//! Teraを使用してプラットフォーム設定中のホスト名パターンなどを展開します。

use crate::error::{Result, TenantError};
use std::error::Error as _;
use tera::{Context, Tera};
use tracing::debug;

/// テンプレートプロセッサ
pub struct TemplateProcessor {
    tera: Tera,
    context: Context,
}

impl TemplateProcessor {
    /// 新しいテンプレートプロセッサを作成
    pub fn new() -> Self {
        Self {
            tera: Tera::default(),
            context: Context::new(),
        }
    }

    /// 変数を追加
    pub fn add_variable(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.context.insert(key.into(), &value);
    }

    /// 文字列をテンプレートとして展開
    pub fn render_str(&mut self, template: &str) -> Result<String> {
        debug!(template = %template, "Rendering template");
        self.tera
            .render_str(template, &self.context)
            .map_err(|e| TenantError::TemplateRenderError(extract_tera_error_detail(&e)))
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Teraのエラーチェーンから原因を含めたメッセージを組み立てる
fn extract_tera_error_detail(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_variable() {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("tenant_id", serde_json::Value::String("acme01".to_string()));

        let result = processor.render_str("{{ tenant_id }}.example.com").unwrap();
        assert_eq!(result, "acme01.example.com");
    }

    #[test]
    fn test_multiple_variables() {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("tenant_id", "acme01".into());
        processor.add_variable("cloud_provider", "aws".into());

        let result = processor
            .render_str("api.{{ tenant_id }}.{{ cloud_provider }}")
            .unwrap();
        assert_eq!(result, "api.acme01.aws");
    }

    #[test]
    fn test_filter_lower() {
        let mut processor = TemplateProcessor::new();
        processor.add_variable("cloud_provider", "AWS".into());

        let result = processor.render_str("{{ cloud_provider | lower }}").unwrap();
        assert_eq!(result, "aws");
    }

    #[test]
    fn test_undefined_variable_error() {
        let mut processor = TemplateProcessor::new();

        let result = processor.render_str("{{ undefined }}.example.com");
        assert!(matches!(result, Err(TenantError::TemplateRenderError(_))));
    }
}
