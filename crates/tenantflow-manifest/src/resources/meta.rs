//! メタデータとセレクタの組み立て

use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use std::collections::BTreeMap;

/// ラベル・アノテーション（キー順で出力して差分を安定させる）
pub type Labels = BTreeMap<String, String>;

/// `("key", "value")` の並びからラベルを作る
pub fn labels<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Labels {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Namespace 付きのメタデータ
pub fn namespaced_meta(
    name: impl Into<String>,
    namespace: impl Into<String>,
    labels: Labels,
) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.into()),
        namespace: Some(namespace.into()),
        labels: Some(labels),
        ..Default::default()
    }
}

/// `matchLabels` のみのセレクタ
pub fn match_labels(labels: Labels) -> LabelSelector {
    LabelSelector {
        match_labels: Some(labels),
        ..Default::default()
    }
}
