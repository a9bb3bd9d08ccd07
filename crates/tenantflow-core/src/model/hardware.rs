//! ハードウェア割り当て定義

use super::resource::ResourceValue;
use super::tenant::DeploymentMode;
use serde::{Deserialize, Serialize};

/// ハードウェア割り当て
///
/// auto-calculate モードでは `server_roles`、custom モードでは `custom_servers` のみが有効。
/// もう一方のリストは内容に関わらず無視される。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareAllocation {
    #[serde(default, alias = "servers")]
    pub server_roles: Vec<ServerRole>,
    #[serde(default)]
    pub custom_servers: Vec<CustomServerSpec>,
}

impl HardwareAllocation {
    /// デプロイモードに対応するサーバーリストを選択
    pub fn source(&self, mode: DeploymentMode) -> ServerSource<'_> {
        match mode {
            DeploymentMode::AutoCalculate => ServerSource::Auto(&self.server_roles),
            DeploymentMode::Custom => ServerSource::Custom(&self.custom_servers),
        }
    }
}

/// サイジングサービスが算出したサーバーロール
///
/// JSON形式（サイジングサービスの出力そのまま）：
/// ```json
/// { "role": "Callbot Server", "cpu_cores": 2, "ram_gb": 4, "gpu_quantity": "-", "instance_storage_gb": 20 }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerRole {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub cpu_cores: ResourceValue,
    #[serde(default)]
    pub ram_gb: ResourceValue,
    #[serde(default)]
    pub gpu_quantity: ResourceValue,
    #[serde(default)]
    pub instance_storage_gb: ResourceValue,
}

/// オペレーターが直接定義したサーバー仕様
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomServerSpec {
    #[serde(default)]
    pub name: String,
    /// サーバー種別（gpu, cpu, general など自由記述）
    #[serde(default, rename = "type")]
    pub server_type: String,
    #[serde(default)]
    pub cpu: ResourceValue,
    #[serde(default)]
    pub memory: ResourceValue,
    #[serde(default)]
    pub gpu: ResourceValue,
    #[serde(default)]
    pub storage: ResourceValue,
    #[serde(default = "default_replicas")]
    pub replicas: ResourceValue,
    /// このサーバーに配置するサービス名
    #[serde(default)]
    pub services: Vec<String>,
}

fn default_replicas() -> ResourceValue {
    ResourceValue::Number(1.0)
}

impl Default for CustomServerSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            server_type: String::new(),
            cpu: ResourceValue::default(),
            memory: ResourceValue::default(),
            gpu: ResourceValue::default(),
            storage: ResourceValue::default(),
            replicas: default_replicas(),
            services: Vec::new(),
        }
    }
}

/// モード別のサーバーリスト
#[derive(Debug, Clone, Copy)]
pub enum ServerSource<'a> {
    Auto(&'a [ServerRole]),
    Custom(&'a [CustomServerSpec]),
}

impl ServerSource<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Auto(roles) => roles.len(),
            Self::Custom(specs) => specs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mode(&self) -> DeploymentMode {
        match self {
            Self::Auto(_) => DeploymentMode::AutoCalculate,
            Self::Custom(_) => DeploymentMode::Custom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_allocation() {
        let hardware: HardwareAllocation = serde_json::from_value(json!({
            "serverRoles": [
                { "role": "Callbot Server", "cpu_cores": 2, "ram_gb": 4, "gpu_quantity": "-", "instance_storage_gb": 20 }
            ],
            "customServers": [
                { "name": "worker-a", "type": "cpu", "cpu": 1, "memory": 2, "gpu": 0, "storage": 10, "services": ["chatbot"] }
            ]
        }))
        .unwrap();

        assert_eq!(hardware.server_roles.len(), 1);
        assert_eq!(hardware.server_roles[0].role, "Callbot Server");
        assert!(hardware.server_roles[0].gpu_quantity.is_unset());

        let custom = &hardware.custom_servers[0];
        assert_eq!(custom.server_type, "cpu");
        // replicas 未指定時は 1
        assert_eq!(custom.replicas.as_number(), Some(1.0));
    }

    #[test]
    fn test_servers_alias() {
        let hardware: HardwareAllocation =
            serde_json::from_value(json!({ "servers": [{ "role": "STT Server" }] })).unwrap();
        assert_eq!(hardware.server_roles.len(), 1);
    }

    #[test]
    fn test_source_selection_by_mode() {
        let hardware = HardwareAllocation {
            server_roles: vec![ServerRole::default(), ServerRole::default()],
            custom_servers: vec![CustomServerSpec::default()],
        };

        let auto = hardware.source(DeploymentMode::AutoCalculate);
        assert!(matches!(auto, ServerSource::Auto(_)));
        assert_eq!(auto.len(), 2);

        let custom = hardware.source(DeploymentMode::Custom);
        assert!(matches!(custom, ServerSource::Custom(_)));
        assert_eq!(custom.len(), 1);
        assert_eq!(custom.mode(), DeploymentMode::Custom);
    }
}
