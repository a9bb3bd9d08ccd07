use tenantflow_core::TenantError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error(transparent)]
    Input(#[from] TenantError),

    #[error("YAML出力エラー: {0}")]
    Render(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ManifestError>;
