//! 型付きリソースから複数ドキュメント YAML への変換

use crate::error::Result;
use crate::resources::Resource;

pub const DOCUMENT_SEPARATOR: &str = "---\n";

/// リソース群を `---` 区切りの YAML に変換
pub fn render_documents(resources: &[Resource]) -> Result<String> {
    let documents = resources
        .iter()
        .map(serde_yaml::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(documents.join(DOCUMENT_SEPARATOR))
}

/// 複数ドキュメント YAML を分割（空ドキュメントは除く）
///
/// 区切りは行全体が `---` の行だけ。ブロックスカラー内の `---` はインデントされるので分割しない。
pub fn split_documents(text: &str) -> Vec<&str> {
    let mut documents = Vec::new();
    let mut start = 0;
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            documents.push(&text[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    documents.push(&text[start..]);
    documents.retain(|doc| !doc.trim().is_empty());
    documents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{ConfigMap, Namespace, labels, namespaced_meta};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn namespace() -> Namespace {
        Namespace {
            metadata: ObjectMeta {
                name: Some("acme01".to_string()),
                labels: Some(labels([("tenant", "acme01")])),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn configmap(value: &str) -> ConfigMap {
        ConfigMap {
            metadata: namespaced_meta("acme01-config", "acme01", labels([("tenant", "acme01")])),
            data: Some(BTreeMap::from([("callbot-stt-endpoint".to_string(), value.to_string())])),
            ..Default::default()
        }
    }

    #[test]
    fn test_render_documents_field_order() {
        let text = render_documents(&[namespace().into()]).unwrap();
        let api = text.find("apiVersion").unwrap();
        let kind = text.find("kind").unwrap();
        let meta = text.find("metadata").unwrap();
        assert!(api < kind && kind < meta);
        assert!(!text.contains("namespace:"));
        assert!(!text.contains("annotations"));
        assert!(!text.contains("status"));
    }

    #[test]
    fn test_render_documents_separator() {
        let text = render_documents(&[namespace().into(), configmap("http://stt:8000").into()]).unwrap();
        let docs = split_documents(&text);
        assert_eq!(docs.len(), 2);

        let parsed: serde_yaml::Value = serde_yaml::from_str(docs[1]).unwrap();
        assert_eq!(parsed["kind"], "ConfigMap");
        assert_eq!(parsed["data"]["callbot-stt-endpoint"], "http://stt:8000");
    }

    #[test]
    fn test_separator_inside_block_scalar() {
        let text = render_documents(&[configmap("a\n---\nb").into(), namespace().into()]).unwrap();
        let docs = split_documents(&text);
        assert_eq!(docs.len(), 2);

        let parsed: serde_yaml::Value = serde_yaml::from_str(docs[0]).unwrap();
        assert_eq!(parsed["data"]["callbot-stt-endpoint"], "a\n---\nb");
    }

    #[test]
    fn test_split_documents_ignores_empty() {
        assert_eq!(split_documents("---\na: 1\n---\n---\nb: 2\n"), ["a: 1\n", "b: 2\n"]);
        assert!(split_documents("").is_empty());
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_documents(&[]).unwrap(), "");
    }
}
