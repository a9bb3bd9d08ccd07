//! TenantFlow コア
//!
//! テナント設定とハードウェア割り当ての入力モデル、リソース名の解決、
//! サービス種別ごとの環境変数の解決を提供します。

pub mod env;
pub mod error;
pub mod loader;
pub mod model;
pub mod naming;
pub mod template;

pub use env::{EnvVar, infer_service_kind, resolve_service_env};
pub use error::{Result, TenantError};
pub use loader::{InputFormat, load_hardware, load_snapshot, load_tenant};
pub use model::*;
pub use naming::{NameResolver, WorkloadResource, artifact_key, server_name, slugify};
pub use template::TemplateProcessor;
