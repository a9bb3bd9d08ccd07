//! リソース名の解決
//!
//! 全ジェネレーターはここで決めた名前とラベルだけを使う。
//! Deployment / Service / PVC / HPA は同じ `{tenant_id}-{server_name}` を語幹に持つ。

use crate::error::{Result, TenantError};
use crate::model::MAX_DNS_LABEL_LEN;

/// ロール名・サーバー名をリソース名に使えるスラッグへ変換
///
/// 小文字化し、空白をハイフンに置き換え、`[a-z0-9-]` 以外（括弧など）を除去する。
/// 連続するハイフンは1つにまとめ、先頭と末尾のハイフンは取り除く。
///
/// ```
/// use tenantflow_core::naming::server_name;
/// assert_eq!(server_name("GPU Inference Node (A)"), "gpu-inference-node-a");
/// ```
pub fn server_name(raw: &str) -> String {
    slugify(raw)
}

/// ラベル値などに使える DNS 安全なスラッグへ変換（規則は [`server_name`] と同じ）
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        let mapped = if ch.is_whitespace() || ch == '-' {
            '-'
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            continue;
        };
        if mapped == '-' && (slug.is_empty() || slug.ends_with('-')) {
            continue;
        }
        slug.push(mapped);
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// ワークロード単位のリソース種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadResource {
    Deployment,
    Service,
    Pvc,
    Hpa,
}

impl WorkloadResource {
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::Deployment => None,
            Self::Service => Some("service"),
            Self::Pvc => Some("pvc"),
            Self::Hpa => Some("hpa"),
        }
    }
}

/// 最も長いワークロードのサフィックス（"-service"）
const LONGEST_SUFFIX_LEN: usize = "-service".len();

/// テナント単位の名前解決
#[derive(Debug, Clone)]
pub struct NameResolver {
    tenant_id: String,
}

impl NameResolver {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
        }
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// `{tenant_id}-{server_name}`（Deployment 名であり `app` ラベルの値）
    pub fn stem(&self, server_name: &str) -> String {
        format!("{}-{}", self.tenant_id, server_name)
    }

    /// `{tenant_id}-{server_name}[-kind]`
    pub fn resource_name(&self, server_name: &str, kind: WorkloadResource) -> String {
        match kind.suffix() {
            Some(suffix) => format!("{}-{}", self.stem(server_name), suffix),
            None => self.stem(server_name),
        }
    }

    /// テナント全体で1つのリソース名 `{tenant_id}-{kind}`
    pub fn tenant_resource(&self, kind: &str) -> String {
        format!("{}-{}", self.tenant_id, kind)
    }

    /// 生成される全ての名前が DNS ラベル長に収まるか検証
    pub fn check_length(&self, server_name: &str) -> Result<()> {
        let stem = self.stem(server_name);
        if stem.len() + LONGEST_SUFFIX_LEN > MAX_DNS_LABEL_LEN {
            return Err(TenantError::NameTooLong(self.resource_name(
                server_name,
                WorkloadResource::Service,
            )));
        }
        Ok(())
    }
}

/// アーティファクトマップのキー `{server_name}-{index+1}`
pub fn artifact_key(server_name: &str, index: usize) -> String {
    format!("{}-{}", server_name, index + 1)
}
