//! HostType → constructor / parser table / 图床类型映射表

use super::config::{empty_variant, parse_variant};
use super::{
    AliyunHostConfig, AmazonS3HostConfig, CustomHostConfig, GiteeHostConfig, GithubHostConfig,
    HostConfig, HostType, ImgurHostConfig, QiniuHostConfig, TencentHostConfig, UpYunHostConfig,
    WeiboHostConfig,
};

/// One row of the table / 映射项
struct HostTypeEntry {
    host_type: HostType,
    create: fn() -> Option<HostConfig>,
    deserialize: fn(&str) -> Option<HostConfig>,
}

fn no_config() -> Option<HostConfig> {
    None
}

fn no_config_from(_: &str) -> Option<HostConfig> {
    None
}

static HOST_TYPES: &[HostTypeEntry] = &[
    HostTypeEntry {
        host_type: HostType::Custom,
        create: empty_variant::<CustomHostConfig>,
        deserialize: parse_variant::<CustomHostConfig>,
    },
    // SM.MS uses a fixed built-in endpoint / SM.MS无需配置
    HostTypeEntry {
        host_type: HostType::Smms,
        create: no_config,
        deserialize: no_config_from,
    },
    HostTypeEntry {
        host_type: HostType::Qiniu,
        create: empty_variant::<QiniuHostConfig>,
        deserialize: parse_variant::<QiniuHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::UpYun,
        create: empty_variant::<UpYunHostConfig>,
        deserialize: parse_variant::<UpYunHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::Aliyun,
        create: empty_variant::<AliyunHostConfig>,
        deserialize: parse_variant::<AliyunHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::Tencent,
        create: empty_variant::<TencentHostConfig>,
        deserialize: parse_variant::<TencentHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::Github,
        create: empty_variant::<GithubHostConfig>,
        deserialize: parse_variant::<GithubHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::Gitee,
        create: empty_variant::<GiteeHostConfig>,
        deserialize: parse_variant::<GiteeHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::Weibo,
        create: empty_variant::<WeiboHostConfig>,
        deserialize: parse_variant::<WeiboHostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::AmazonS3,
        create: empty_variant::<AmazonS3HostConfig>,
        deserialize: parse_variant::<AmazonS3HostConfig>,
    },
    HostTypeEntry {
        host_type: HostType::Imgur,
        create: empty_variant::<ImgurHostConfig>,
        deserialize: parse_variant::<ImgurHostConfig>,
    },
    // MinIO shares the S3 configuration / MinIO复用S3配置
    HostTypeEntry {
        host_type: HostType::Minio,
        create: empty_variant::<AmazonS3HostConfig>,
        deserialize: parse_variant::<AmazonS3HostConfig>,
    },
];

fn entry(host_type: HostType) -> Option<&'static HostTypeEntry> {
    HOST_TYPES.iter().find(|e| e.host_type == host_type)
}

/// Fresh empty configuration, `None` for types that need none / 创建空配置
pub fn create(host_type: HostType) -> Option<HostConfig> {
    entry(host_type).and_then(|e| (e.create)())
}

/// Parse a persisted configuration; malformed text yields `None` / 反序列化配置
pub fn deserialize(host_type: HostType, text: &str) -> Option<HostConfig> {
    entry(host_type).and_then(|e| (e.deserialize)(text))
}
