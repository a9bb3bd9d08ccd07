use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "TENANTFLOW_CONFIG_PATH で指定された設定ファイルが見つかりません: {0}\n\nヒント:\n  • パスを確認してください\n  • 環境変数を外すとデフォルト設定で動作します"
    )]
    ConfigFileNotFound(PathBuf),

    #[error("設定ファイルのパースに失敗しました: {path}\n理由: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
