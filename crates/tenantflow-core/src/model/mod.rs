//! モデル定義
//!
//! TenantFlowで使用される入力モデルと正規化済みモデルを定義します。
//! 各モデルは機能ごとにモジュールに分離されています。

mod hardware;
mod resource;
mod server;
mod tenant;

// Re-exports
pub use hardware::*;
pub use resource::*;
pub use server::*;
pub use tenant::*;
