//! Host configuration model / 图床配置模型
//!
//! Every image host is identified by a [`HostType`] tag and carries one
//! provider-specific configuration variant ([`HostConfig`]).

mod config;
mod notifier;
pub mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{
    AliyunHostConfig, AmazonS3HostConfig, CustomHostConfig, GiteeHostConfig, GithubHostConfig,
    HostConfig, ImgurHostConfig, ProviderConfig, QiniuHostConfig, TencentHostConfig, UpYunHostConfig,
    WeiboHostConfig,
};
pub use notifier::{ConfigEvent, ConfigNotifier, HostSettings};

/// Host type tag / 图床类型
///
/// The numeric codes are persisted together with user configuration, so they
/// must never be renumbered. / 数值会被持久化，不可修改
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum HostType {
    Custom,
    Smms,
    Qiniu,
    UpYun,
    Aliyun,
    Tencent,
    Github,
    Gitee,
    Weibo,
    AmazonS3,
    Imgur,
    Minio,
}

impl HostType {
    const ALL: [HostType; 12] = [
        HostType::Custom,
        HostType::Smms,
        HostType::Qiniu,
        HostType::UpYun,
        HostType::Aliyun,
        HostType::Tencent,
        HostType::Github,
        HostType::Gitee,
        HostType::Weibo,
        HostType::AmazonS3,
        HostType::Imgur,
        HostType::Minio,
    ];

    /// Persisted numeric code / 持久化数值
    pub fn code(self) -> i32 {
        match self {
            HostType::Custom => -1,
            HostType::Smms => 1,
            HostType::Qiniu => 2,
            HostType::UpYun => 3,
            HostType::Aliyun => 4,
            HostType::Tencent => 5,
            HostType::Github => 6,
            HostType::Gitee => 7,
            HostType::Weibo => 8,
            HostType::AmazonS3 => 9,
            HostType::Imgur => 10,
            HostType::Minio => 11,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }

    /// All known host types / 所有图床类型
    pub fn all() -> &'static [HostType] {
        &Self::ALL
    }

    /// Display name / 显示名称
    pub fn name(self) -> &'static str {
        match self {
            HostType::Custom => "Custom",
            HostType::Smms => "SM.MS",
            HostType::Qiniu => "Qiniu KODO",
            HostType::UpYun => "UpYun USS",
            HostType::Aliyun => "Aliyun OSS",
            HostType::Tencent => "Tencent COS",
            HostType::Github => "GitHub",
            HostType::Gitee => "Gitee",
            HostType::Weibo => "Weibo",
            HostType::AmazonS3 => "Amazon S3",
            HostType::Imgur => "Imgur",
            HostType::Minio => "MinIO",
        }
    }

    /// Only one host of this type may exist (built-in endpoint, no config)
    pub fn is_only_one(self) -> bool {
        matches!(self, HostType::Smms)
    }
}

impl From<HostType> for i32 {
    fn from(value: HostType) -> Self {
        value.code()
    }
}

impl TryFrom<i32> for HostType {
    type Error = String;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        HostType::from_code(code).ok_or_else(|| format!("unknown host type: {}", code))
    }
}

impl std::fmt::Display for HostType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Config model errors / 配置模型错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("unknown configuration field: {0}")]
    UnknownField(String),
}

/// Configuration item definition / 配置项定义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigItem {
    pub name: String,
    /// Display title (friendly name) / 显示标题
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl ConfigItem {
    pub fn new(name: &str, item_type: &str) -> Self {
        Self {
            name: name.to_string(),
            title: None,
            item_type: item_type.to_string(),
            default: None,
            options: None,
            required: false,
            help: None,
        }
    }

    pub fn title(mut self, val: &str) -> Self {
        self.title = Some(val.to_string());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default(mut self, val: &str) -> Self {
        self.default = Some(val.to_string());
        self
    }

    pub fn help(mut self, val: &str) -> Self {
        self.help = Some(val.to_string());
        self
    }

    pub fn options(mut self, val: &str) -> Self {
        self.options = Some(val.to_string());
        self
    }
}

/// A configured image host / 已配置的图床
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub id: String,
    pub name: String,
    pub host_type: HostType,
    /// `None` for host types without configuration (SM.MS)
    pub data: Option<HostConfig>,
}

impl Host {
    pub fn new(id: impl Into<String>, name: impl Into<String>, host_type: HostType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            host_type,
            data: registry::create(host_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_type_codes_are_stable() {
        assert_eq!(HostType::Custom.code(), -1);
        assert_eq!(HostType::Smms.code(), 1);
        assert_eq!(HostType::Qiniu.code(), 2);
        assert_eq!(HostType::UpYun.code(), 3);
        assert_eq!(HostType::AmazonS3.code(), 9);
        assert_eq!(HostType::Minio.code(), 11);
        for t in HostType::all() {
            assert_eq!(HostType::from_code(t.code()), Some(*t));
        }
        assert_eq!(HostType::from_code(42), None);
    }

    #[test]
    fn test_host_type_serializes_as_code() {
        assert_eq!(serde_json::to_string(&HostType::Minio).unwrap(), "11");
        let t: HostType = serde_json::from_str("-1").unwrap();
        assert_eq!(t, HostType::Custom);
        assert!(serde_json::from_str::<HostType>("99").is_err());
    }

    #[test]
    fn test_host_new_creates_empty_config() {
        let host = Host::new("1", "s3", HostType::AmazonS3);
        assert!(matches!(host.data, Some(HostConfig::AmazonS3(_))));

        let host = Host::new("2", "smms", HostType::Smms);
        assert!(host.data.is_none());
        assert!(HostType::Smms.is_only_one());
    }
}
