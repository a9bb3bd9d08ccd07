use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const AUTO_TENANT: &str = r#"{
  "tenantId": "acme01",
  "tenantName": "Acme Corporation",
  "environment": "production",
  "cloudProvider": "aws",
  "region": "ap-northeast-1",
  "deploymentMode": "auto-calculate",
  "registry": { "url": "registry.acme.io", "type": "harbor" },
  "advancedSettings": {
    "callbot": { "sttEndpoint": "http://stt.internal:8000" }
  }
}"#;

pub const AUTO_HARDWARE: &str = r#"{
  "serverRoles": [
    { "role": "Callbot Server", "cpu_cores": 2, "ram_gb": 4, "gpu_quantity": "-", "instance_storage_gb": 20 }
  ]
}"#;

pub struct TestProject {
    pub root: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    /// 自動算出モードの標準的な入力を書き込む
    pub fn with_auto_inputs() -> Self {
        let project = Self::new();
        project.write_file("tenant.json", AUTO_TENANT);
        project.write_file("hardware.json", AUTO_HARDWARE);
        project
    }

    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }

    #[allow(dead_code)]
    pub fn read_file(&self, name: &str) -> String {
        fs::read_to_string(self.root.path().join(name)).unwrap()
    }
}
