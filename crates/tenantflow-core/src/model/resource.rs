//! リソース値
//!
//! サイジングサービスとウィザードは CPU やメモリを数値でも文字列でも返すため、
//! 入力時点では両方を受け付け、正規化時に数値へ変換する。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 数値または数値文字列のリソース値
///
/// JSON形式：
/// ```json
/// { "cpu_cores": 2, "ram_gb": "4", "gpu_quantity": "-" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceValue {
    Number(f64),
    Text(String),
}

impl ResourceValue {
    /// 有限の数値として解釈する（解釈できない場合は None）
    pub fn as_number(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// 未設定を表す値か（空文字列または "-"）
    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Text(s) if matches!(s.trim(), "" | "-"))
    }
}

impl Default for ResourceValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for ResourceValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u32> for ResourceValue {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for ResourceValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}
