//! Application configuration module / 应用配置模块
//!
//! Hosts and upload settings are read from config.json. The file is never
//! written by picbed. / 配置文件只读

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::host::{registry, Host, HostType};
use crate::upload::{ImageCompressor, UploaderContext};

/// Environment variable overriding the config path / 配置文件路径环境变量
pub const CONFIG_ENV: &str = "PICBED_CONFIG";

/// Application configuration / 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Id of the host used when none is given / 默认图床
    #[serde(default, rename = "defaultHost", skip_serializing_if = "Option::is_none")]
    pub default_host: Option<String>,
    /// Configured hosts / 图床列表
    #[serde(default)]
    pub hosts: Vec<HostEntry>,
    /// Upload settings / 上传设置
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Persisted host record / 持久化的图床记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEntry {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub host_type: HostType,
    /// Serialized provider configuration / 序列化后的图床配置
    #[serde(default)]
    pub data: String,
}

/// Upload settings / 上传设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// HTTP request timeout in seconds / 请求超时（秒）
    #[serde(default = "default_timeout_secs", rename = "timeoutSecs")]
    pub timeout_secs: u64,
    /// Lifetime of signed upload policies in seconds / 签名有效期（秒）
    #[serde(default = "default_policy_ttl_secs", rename = "policyTtlSecs")]
    pub policy_ttl_secs: i64,
    #[serde(default = "default_user_agent", rename = "userAgent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_policy_ttl_secs() -> i64 {
    3600
}

fn default_user_agent() -> String {
    format!("picbed/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            policy_ttl_secs: default_policy_ttl_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl HostEntry {
    /// Deserialize the stored configuration into a host / 转换为图床
    pub fn to_host(&self) -> Host {
        Host {
            id: self.id.clone(),
            name: self.name.clone(),
            host_type: self.host_type,
            data: registry::deserialize(self.host_type, &self.data),
        }
    }
}

impl AppConfig {
    /// Find a host by id, falling back to the default host, then the first one / 查找图床
    pub fn find_host(&self, id: Option<&str>) -> Option<&HostEntry> {
        match id.or(self.default_host.as_deref()) {
            Some(id) => self.hosts.iter().find(|h| h.id == id),
            None => self.hosts.first(),
        }
    }

    /// Build the shared uploader resources / 构建上传器共享资源
    pub fn uploader_context(
        &self,
        compressor: Arc<dyn ImageCompressor>,
    ) -> Result<UploaderContext, String> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.upload.timeout_secs))
            .user_agent(self.upload.user_agent.clone())
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(UploaderContext {
            client,
            compressor,
            policy_ttl: chrono::Duration::seconds(self.upload.policy_ttl_secs.max(1)),
            cancel: None,
        })
    }
}

/// Get the config file path: explicit path, then `PICBED_CONFIG`, then cwd / 获取配置文件路径
pub fn get_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
        .unwrap_or_else(|| {
            std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join("config.json")
        })
}

/// Load configuration from file; a missing file yields the defaults / 加载配置文件
pub fn load_config(config_path: &Path) -> Result<AppConfig, String> {
    if !config_path.exists() {
        tracing::info!("No configuration at {:?}, using defaults", config_path);
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(config_path)
        .map_err(|e| format!("Failed to read config file: {}", e))?;

    let config: AppConfig = serde_json::from_str(&content)
        .map_err(|e| format!("Failed to parse config file: {}", e))?;

    tracing::info!("Loaded configuration from {:?}", config_path);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::NoopCompressor;

    const SAMPLE: &str = r#"{
        "defaultHost": "s3",
        "hosts": [
            {"id": "gh", "name": "GitHub", "type": 6, "data": "{\"repo\":\"me/pics\"}"},
            {"id": "s3", "name": "S3", "type": 9,
             "data": "{\"bucket\":\"shots\",\"accessKey\":\"AKID\",\"secretKey\":\"secret\",\"region\":\"eu-west-1\",\"saveKey\":\"filename\"}"},
            {"id": "sm", "name": "SM.MS", "type": 1}
        ],
        "upload": {"timeoutSecs": 30}
    }"#;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_config() {
        let (_dir, path) = write_config(SAMPLE);
        let config = load_config(&path).unwrap();

        assert_eq!(config.hosts.len(), 3);
        assert_eq!(config.upload.timeout_secs, 30);
        assert_eq!(config.upload.policy_ttl_secs, 3600);

        let host = config.find_host(None).unwrap().to_host();
        assert_eq!(host.host_type, HostType::AmazonS3);
        let s3 = host.data.as_ref().and_then(|d| d.as_amazon_s3()).unwrap();
        assert_eq!(s3.bucket.as_deref(), Some("shots"));

        assert_eq!(config.find_host(Some("gh")).unwrap().host_type, HostType::Github);
        assert!(config.find_host(Some("nope")).is_none());
        assert_eq!(config.find_host(Some("sm")).unwrap().to_host().data, None);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("config.json")).unwrap();
        assert!(config.hosts.is_empty());
        assert!(config.find_host(None).is_none());
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_invalid_file() {
        let (_dir, path) = write_config("{\"hosts\": [{\"id\": 1}]}");
        assert!(load_config(&path).unwrap_err().starts_with("Failed to parse config file"));

        let (_dir, path) = write_config("{\"hosts\": [{\"id\":\"x\",\"name\":\"x\",\"type\":42}]}");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = get_config_path(Some(PathBuf::from("/tmp/picbed.json")));
        assert_eq!(path, PathBuf::from("/tmp/picbed.json"));
    }

    #[test]
    fn test_uploader_context() {
        let config = AppConfig::default();
        let context = config.uploader_context(Arc::new(NoopCompressor)).unwrap();
        assert_eq!(context.policy_ttl, chrono::Duration::hours(1));
        assert!(!context.compressor.is_enabled());
    }
}
