//! 正規化済みサーバー
//!
//! auto / custom どちらのリストからも同じ形の [`ServerPlan`] を作り、
//! 以降のジェネレーターがモードを意識せずに済むようにする。

use super::hardware::{CustomServerSpec, ServerRole, ServerSource};
use super::resource::ResourceValue;
use crate::error::{Result, TenantError};
use crate::naming::server_name;
use std::collections::HashMap;
use tracing::debug;

/// CPU・メモリ・ストレージの上限（コア数 / GB）
///
/// limits（× 2）や replicas を掛けた合計を整数単位に直しても溢れない範囲に収める。
pub const MAX_RESOURCE_AMOUNT: f64 = 1_000_000.0;

/// 1サーバーあたりの GPU 数の上限
pub const MAX_GPU_COUNT: u32 = 1_024;

/// replicas の上限
pub const MAX_REPLICAS: u32 = 10_000;

/// 1サーバー分の正規化済みビュー
#[derive(Debug, Clone, PartialEq)]
pub struct ServerPlan {
    /// 正規化済みのサーバー名（小文字・ハイフン区切り）
    pub server_name: String,
    /// 元のロール名またはサーバー種別（SERVER_TYPE に使う）
    pub server_type: String,
    pub cpu_cores: f64,
    pub memory_gb: f64,
    pub gpu_count: u32,
    pub storage_gb: f64,
    pub replicas: u32,
    /// custom モードで割り当てられたサービス
    pub services: Vec<String>,
}

impl ServerPlan {
    /// サイジング結果のロールから作成（replicas は常に 1）
    pub fn from_role(role: &ServerRole) -> Result<Self> {
        let label = role.role.as_str();
        let name = normalized_name(label)?;
        Ok(Self {
            server_name: name,
            server_type: label.to_string(),
            cpu_cores: positive(label, "cpu_cores", &role.cpu_cores)?,
            memory_gb: positive(label, "ram_gb", &role.ram_gb)?,
            gpu_count: gpu_count(label, "gpu_quantity", &role.gpu_quantity)?,
            storage_gb: positive(label, "instance_storage_gb", &role.instance_storage_gb)?,
            replicas: 1,
            services: Vec::new(),
        })
    }

    /// カスタム仕様から作成
    pub fn from_custom(spec: &CustomServerSpec) -> Result<Self> {
        let label = spec.name.as_str();
        let name = normalized_name(label)?;
        Ok(Self {
            server_name: name,
            server_type: spec.server_type.clone(),
            cpu_cores: positive(label, "cpu", &spec.cpu)?,
            memory_gb: positive(label, "memory", &spec.memory)?,
            gpu_count: gpu_count(label, "gpu", &spec.gpu)?,
            storage_gb: positive(label, "storage", &spec.storage)?,
            replicas: replicas(label, &spec.replicas)?,
            services: spec.services.clone(),
        })
    }
}

impl ServerSource<'_> {
    /// 全エントリを正規化し、サーバー名の衝突を検出する
    ///
    /// 1件でも不正な値があれば何も返さずにエラーにする。
    pub fn normalize(&self) -> Result<Vec<ServerPlan>> {
        let (plans, labels): (Vec<ServerPlan>, Vec<&str>) = match self {
            Self::Auto(roles) => roles
                .iter()
                .map(|r| Ok((ServerPlan::from_role(r)?, r.role.as_str())))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .unzip(),
            Self::Custom(specs) => specs
                .iter()
                .map(|s| Ok((ServerPlan::from_custom(s)?, s.name.as_str())))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .unzip(),
        };

        let mut seen: HashMap<&str, &str> = HashMap::new();
        for (plan, label) in plans.iter().zip(&labels) {
            if let Some(first) = seen.insert(plan.server_name.as_str(), label) {
                return Err(TenantError::DuplicateServerName {
                    name: plan.server_name.clone(),
                    first: first.to_string(),
                    second: label.to_string(),
                });
            }
        }

        debug!(mode = self.mode().as_str(), servers = plans.len(), "Normalized server list");
        Ok(plans)
    }
}

fn normalized_name(label: &str) -> Result<String> {
    let name = server_name(label);
    if name.is_empty() {
        return Err(TenantError::EmptyServerName(label.to_string()));
    }
    Ok(name)
}

fn number(server: &str, field: &'static str, value: &ResourceValue) -> Result<f64> {
    value.as_number().ok_or_else(|| TenantError::NonNumericResource {
        server: server.to_string(),
        field,
        value: value.to_string(),
    })
}

/// 0 より大きく [`MAX_RESOURCE_AMOUNT`] 以下の値
fn positive(server: &str, field: &'static str, value: &ResourceValue) -> Result<f64> {
    let n = number(server, field, value)?;
    if n <= 0.0 || n > MAX_RESOURCE_AMOUNT {
        return Err(TenantError::ResourceOutOfRange {
            server: server.to_string(),
            field,
            value: n,
        });
    }
    Ok(n)
}

fn whole(server: &str, field: &'static str, n: f64, max: u32) -> Result<u32> {
    if n < 0.0 || n.fract() != 0.0 || n > f64::from(max) {
        return Err(TenantError::ResourceOutOfRange {
            server: server.to_string(),
            field,
            value: n,
        });
    }
    Ok(n as u32)
}

fn gpu_count(server: &str, field: &'static str, value: &ResourceValue) -> Result<u32> {
    // サイジングサービスは GPU なしを "-" で返す
    if value.is_unset() {
        return Ok(0);
    }
    whole(server, field, number(server, field, value)?, MAX_GPU_COUNT)
}

fn replicas(server: &str, value: &ResourceValue) -> Result<u32> {
    let count = whole(
        server,
        "replicas",
        number(server, "replicas", value)?,
        MAX_REPLICAS,
    )?;
    if count == 0 {
        return Err(TenantError::InvalidReplicas(server.to_string()));
    }
    Ok(count)
}
