//! Kubernetes のリソース量表記
//!
//! 内部では整数単位（ミリコア、MiB）で持つため、limits = requests × 2 が丸め誤差なく成り立つ。
//! 入力値は正規化の段階で上限を検証済みなので、ここでの演算は溢れない。

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::fmt;

/// CPU 量（ミリコア）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CpuQuantity(u64);

impl CpuQuantity {
    pub fn from_cores(cores: f64) -> Self {
        Self((cores * 1000.0).round().max(0.0) as u64)
    }

    pub fn doubled(&self) -> Self {
        Self(self.0.saturating_mul(2))
    }
}

impl fmt::Display for CpuQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1000 == 0 {
            write!(f, "{}", self.0 / 1000)
        } else {
            write!(f, "{}m", self.0)
        }
    }
}

impl From<CpuQuantity> for Quantity {
    fn from(cpu: CpuQuantity) -> Self {
        Quantity(cpu.to_string())
    }
}

/// メモリ・ストレージ量（MiB）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemoryQuantity(u64);

impl MemoryQuantity {
    pub fn from_gib(gib: f64) -> Self {
        Self((gib * 1024.0).round().max(0.0) as u64)
    }

    pub fn doubled(&self) -> Self {
        Self(self.0.saturating_mul(2))
    }
}

impl fmt::Display for MemoryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 1024 == 0 {
            write!(f, "{}Gi", self.0 / 1024)
        } else {
            write!(f, "{}Mi", self.0)
        }
    }
}

impl From<MemoryQuantity> for Quantity {
    fn from(memory: MemoryQuantity) -> Self {
        Quantity(memory.to_string())
    }
}

/// 個数（GPU 数やオブジェクト数）
pub fn count(n: impl fmt::Display) -> Quantity {
    Quantity(n.to_string())
}
