use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TenantError {
    #[error("ファイル読み込みエラー: {path}\n理由: {message}")]
    IoError { path: PathBuf, message: String },

    #[error("入力パースエラー: {path}\n理由: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("サポートされていない入力形式です: {0}\nヒント: .json / .yaml / .yml を使用してください")]
    UnsupportedFormat(PathBuf),

    #[error("tenantId が指定されていません")]
    MissingTenantId,

    #[error(
        "tenantId '{0}' は DNS-1123 ラベルとして無効です\nヒント: 英小文字・数字・ハイフンのみ、63文字以内、先頭と末尾は英数字"
    )]
    InvalidTenantId(String),

    #[error("サーバー '{server}' の {field} が数値ではありません: '{value}'")]
    NonNumericResource {
        server: String,
        field: &'static str,
        value: String,
    },

    #[error("サーバー '{server}' の {field} が範囲外です: {value}")]
    ResourceOutOfRange {
        server: String,
        field: &'static str,
        value: f64,
    },

    #[error("サーバー '{0}' の replicas は 1 以上である必要があります")]
    InvalidReplicas(String),

    #[error("サーバー名 '{0}' から有効なリソース名を生成できません")]
    EmptyServerName(String),

    #[error(
        "サーバー名が重複しています: '{first}' と '{second}' はどちらも '{name}' に正規化されます"
    )]
    DuplicateServerName {
        name: String,
        first: String,
        second: String,
    },

    #[error("リソース名 '{0}' が 63 文字を超えています")]
    NameTooLong(String),

    #[error(
        "Ingress ホスト '{0}' は DNS-1123 サブドメインとして無効です\nヒント: cloudProvider とホスト名テンプレートを確認してください"
    )]
    InvalidHost(String),

    #[error("{field} '{value}' はラベル値として 63 文字を超えています")]
    LabelValueTooLong { field: &'static str, value: String },

    #[error("設定キー '{0}' から有効な ConfigMap キーを生成できません")]
    InvalidConfigKey(String),

    #[error("ConfigMap キーが重複しています: '{first}' と '{second}' はどちらも '{key}' になります")]
    ConfigKeyCollision {
        key: String,
        first: String,
        second: String,
    },

    #[error("テンプレート展開エラー: {0}")]
    TemplateRenderError(String),
}

pub type Result<T> = std::result::Result<T, TenantError>;
