//! TenantFlow マニフェスト生成
//!
//! テナント設定とハードウェア割り当てから、テナント1つ分の Kubernetes マニフェスト一式を生成します。
//! 入出力を持たない純粋な処理で、同じ入力からは常に同じ出力が得られます。
//!
//! ```no_run
//! use tenantflow_config::PlatformSettings;
//! use tenantflow_core::{load_hardware, load_tenant};
//! use tenantflow_manifest::ManifestAssembler;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tenant = load_tenant(Path::new("tenant.json"))?;
//! let hardware = load_hardware(Path::new("hardware.json"))?;
//! let platform = PlatformSettings::default();
//!
//! let bundle = ManifestAssembler::new(&platform).generate(&tenant, &hardware)?;
//! for (key, yaml) in bundle.iter() {
//!     println!("# {key}\n{yaml}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod assembler;
pub mod context;
pub mod error;
pub mod generators;
pub mod quantity;
pub mod render;
pub mod resources;

pub use assembler::{
    CONFIGMAP_KEY, INGRESS_KEY, MONITORING_KEY, ManifestAssembler, ManifestBundle, NAMESPACE_KEY,
    RenderOptions, SERVICE_KEY, TenantManifests, generate_manifests,
};
pub use context::{GenerationContext, IngressHosts};
pub use error::{ManifestError, Result};
pub use quantity::{CpuQuantity, MemoryQuantity};
pub use render::{render_documents, split_documents};
pub use resources::Resource;
