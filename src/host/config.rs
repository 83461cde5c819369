//! Provider configuration variants / 各图床配置

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{ConfigItem, HostError};

const SAVE_KEY_OPTIONS: &str = "filename,timestamp,dateFilename,random";

/// Capability set shared by every provider configuration / 配置通用能力
pub trait ProviderConfig: Serialize + DeserializeOwned + Default {
    /// Persisted field names / 持久化字段名
    const FIELDS: &'static [&'static str];

    /// UI descriptors for every field / 字段描述
    fn items() -> Vec<ConfigItem>;

    fn get(&self, key: &str) -> Option<&str>;

    /// Returns false when `key` is not a field of this variant
    fn set(&mut self, key: &str, value: Option<String>) -> bool;

    /// Required fields that are absent or blank / 缺失的必填项
    fn missing_required(&self) -> Vec<String> {
        Self::items()
            .into_iter()
            .filter(|item| item.required)
            .filter(|item| self.get(&item.name).map_or(true, |v| v.trim().is_empty()))
            .map(|item| item.name)
            .collect()
    }
}

macro_rules! host_config {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $field:ident ($key:literal, $kind:literal) $( . $method:ident ( $($arg:expr),* ) )* ; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $key, default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<String>,
            )*
        }

        impl ProviderConfig for $name {
            const FIELDS: &'static [&'static str] = &[$($key),*];

            fn items() -> Vec<ConfigItem> {
                vec![$( ConfigItem::new($key, $kind) $( .$method($($arg),*) )* ),*]
            }

            fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $( $key => self.$field.as_deref(), )*
                    _ => None,
                }
            }

            fn set(&mut self, key: &str, value: Option<String>) -> bool {
                match key {
                    $( $key => {
                        self.$field = value;
                        true
                    } )*
                    _ => false,
                }
            }
        }
    };
}

host_config! {
    /// Custom HTTP endpoint / 自定义图床
    CustomHostConfig {
        url("url", "string").title("API URL").required();
        method("method", "select").title("Method").options("POST,PUT").default("POST");
        field("field", "string").title("File field").default("file");
        extensions("extensions", "text").title("Extra headers and body").help("JSON encoded");
        result_path("resultPath", "string").title("URL path").help("Path of the URL in the JSON response");
        domain("domain", "string").title("Domain");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename");
    }
}

host_config! {
    /// UpYun USS / 又拍云
    UpYunHostConfig {
        bucket("bucket", "string").title("Service").required();
        operator("operator", "string").title("Operator").required();
        password("password", "password").title("Password").required();
        domain("domain", "string").title("Domain").required();
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
        suffix("suffix", "string").title("URL suffix");
    }
}

host_config! {
    /// Qiniu KODO / 七牛云
    QiniuHostConfig {
        region("region", "string").title("Region").required();
        bucket("bucket", "string").title("Bucket").required();
        access_key("accessKey", "string").title("Access Key").required();
        secret_key("secretKey", "password").title("Secret Key").required();
        domain("domain", "string").title("Domain").required();
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
        suffix("suffix", "string").title("URL suffix");
    }
}

host_config! {
    /// Aliyun OSS / 阿里云
    AliyunHostConfig {
        region("region", "string").title("Region").required();
        bucket("bucket", "string").title("Bucket").required();
        access_key("accessKey", "string").title("AccessKey ID").required();
        secret_key("secretKey", "password").title("AccessKey Secret").required();
        domain("domain", "string").title("Domain");
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
        suffix("suffix", "string").title("URL suffix");
    }
}

host_config! {
    /// Tencent COS / 腾讯云
    TencentHostConfig {
        region("region", "string").title("Region").required();
        bucket("bucket", "string").title("Bucket").required();
        secret_id("secretId", "string").title("SecretId").required();
        secret_key("secretKey", "password").title("SecretKey").required();
        domain("domain", "string").title("Domain");
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
        suffix("suffix", "string").title("URL suffix");
    }
}

host_config! {
    /// GitHub repository / GitHub仓库
    GithubHostConfig {
        owner("owner", "string").title("Owner").required();
        repo("repo", "string").title("Repository").required();
        branch("branch", "string").title("Branch").default("master").required();
        token("token", "password").title("Token").required();
        domain("domain", "string").title("Domain");
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
        use_cdn("useCdn", "bool").title("Use jsDelivr CDN").default("false");
    }
}

host_config! {
    /// Gitee repository / 码云仓库
    GiteeHostConfig {
        owner("owner", "string").title("Owner").required();
        repo("repo", "string").title("Repository").required();
        branch("branch", "string").title("Branch").default("master").required();
        token("token", "password").title("Token").required();
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
    }
}

host_config! {
    /// Weibo image bed / 微博图床
    WeiboHostConfig {
        username("username", "string").title("Username");
        password("password", "password").title("Password");
        quality("quality", "select").title("Quality").options("thumbnail,mw690,large").default("large");
        cookie_mode("cookieMode", "bool").title("Cookie mode").default("false");
        cookie("cookie", "text").title("Cookie");
    }
}

host_config! {
    /// Amazon S3 and S3-compatible gateways (MinIO) / S3及兼容服务
    AmazonS3HostConfig {
        region("region", "string").title("Region").default("us-east-1");
        bucket("bucket", "string").title("Bucket").required();
        access_key("accessKey", "string").title("Access Key ID").required();
        secret_key("secretKey", "password").title("Secret Access Key").required();
        domain("domain", "string").title("Domain").help("Custom public URL prefix, or the gateway endpoint for MinIO");
        folder("folder", "string").title("Folder");
        save_key("saveKey", "select").title("Save key").options(SAVE_KEY_OPTIONS).default("filename").required();
        suffix("suffix", "string").title("URL suffix").help("Appended to the final URL, e.g. an image-processing query");
    }
}

host_config! {
    /// Imgur / Imgur图床
    ImgurHostConfig {
        client_id("clientId", "string").title("Client ID").required();
    }
}

/// Provider configuration, one variant per provider / 图床配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostConfig {
    Custom(CustomHostConfig),
    UpYun(UpYunHostConfig),
    Qiniu(QiniuHostConfig),
    Aliyun(AliyunHostConfig),
    Tencent(TencentHostConfig),
    Github(GithubHostConfig),
    Gitee(GiteeHostConfig),
    Weibo(WeiboHostConfig),
    AmazonS3(AmazonS3HostConfig),
    Imgur(ImgurHostConfig),
}

macro_rules! each_variant {
    ($value:expr, $c:ident => $body:expr) => {
        match $value {
            HostConfig::Custom($c) => $body,
            HostConfig::UpYun($c) => $body,
            HostConfig::Qiniu($c) => $body,
            HostConfig::Aliyun($c) => $body,
            HostConfig::Tencent($c) => $body,
            HostConfig::Github($c) => $body,
            HostConfig::Gitee($c) => $body,
            HostConfig::Weibo($c) => $body,
            HostConfig::AmazonS3($c) => $body,
            HostConfig::Imgur($c) => $body,
        }
    };
}

macro_rules! impl_from_variant {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for HostConfig {
                fn from(value: $ty) -> Self {
                    HostConfig::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    Custom(CustomHostConfig),
    UpYun(UpYunHostConfig),
    Qiniu(QiniuHostConfig),
    Aliyun(AliyunHostConfig),
    Tencent(TencentHostConfig),
    Github(GithubHostConfig),
    Gitee(GiteeHostConfig),
    Weibo(WeiboHostConfig),
    AmazonS3(AmazonS3HostConfig),
    Imgur(ImgurHostConfig),
);

fn fields_of<T: ProviderConfig>(_: &T) -> &'static [&'static str] {
    T::FIELDS
}

fn items_of<T: ProviderConfig>(_: &T) -> Vec<ConfigItem> {
    T::items()
}

impl HostConfig {
    /// Configurable field names / 可配置字段
    pub fn field_names(&self) -> &'static [&'static str] {
        each_variant!(self, c => fields_of(c))
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.field_names().contains(&name)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        each_variant!(self, c => c.get(name))
    }

    pub fn items(&self) -> Vec<ConfigItem> {
        each_variant!(self, c => items_of(c))
    }

    /// Display title of a field / 字段显示名
    pub fn display_name(&self, name: &str) -> Option<String> {
        self.items()
            .into_iter()
            .find(|item| item.name == name)
            .and_then(|item| item.title)
    }

    /// Required fields that are absent or blank
    pub fn missing_required(&self) -> Vec<String> {
        each_variant!(self, c => c.missing_required())
    }

    /// Persisted text form (compact JSON, absent fields omitted) / 序列化
    pub fn serialize(&self) -> String {
        each_variant!(self, c => serde_json::to_string(c)).unwrap_or_default()
    }

    pub(super) fn set_field(&mut self, name: &str, value: Option<String>) -> Result<(), HostError> {
        if each_variant!(self, c => c.set(name, value)) {
            Ok(())
        } else {
            Err(HostError::UnknownField(name.to_string()))
        }
    }

    pub fn as_amazon_s3(&self) -> Option<&AmazonS3HostConfig> {
        match self {
            HostConfig::AmazonS3(c) => Some(c),
            _ => None,
        }
    }
}

/// Parse persisted text into a variant; malformed input yields `None`
pub(super) fn parse_variant<T>(text: &str) -> Option<HostConfig>
where
    T: ProviderConfig + Into<HostConfig>,
{
    if text.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<T>(text) {
        Ok(config) => Some(config.into()),
        Err(e) => {
            tracing::debug!("Failed to parse host config: {}", e);
            None
        }
    }
}

pub(super) fn empty_variant<T>() -> Option<HostConfig>
where
    T: ProviderConfig + Into<HostConfig>,
{
    Some(T::default().into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_s3() -> AmazonS3HostConfig {
        AmazonS3HostConfig {
            region: Some("eu-west-1".to_string()),
            bucket: Some("shots".to_string()),
            access_key: Some("AKID".to_string()),
            secret_key: Some("secret".to_string()),
            domain: Some("https://cdn.example.com/".to_string()),
            folder: Some("a/b".to_string()),
            suffix: Some("?x=1".to_string()),
            save_key: Some("filename".to_string()),
        }
    }

    #[test]
    fn test_serialize_uses_persisted_names() {
        let config = HostConfig::from(full_s3());
        let text = config.serialize();
        assert!(text.contains("\"accessKey\":\"AKID\""));
        assert!(text.contains("\"saveKey\":\"filename\""));

        let empty = HostConfig::from(AmazonS3HostConfig::default());
        assert_eq!(empty.serialize(), "{}");
    }

    #[test]
    fn test_round_trip_with_absent_fields() {
        let full = full_s3();
        // drop each optional field in turn, plus the fully empty config
        let mut cases = vec![full.clone(), AmazonS3HostConfig::default()];
        for key in AmazonS3HostConfig::FIELDS {
            let mut c = full.clone();
            c.set(key, None);
            cases.push(c);
        }
        for case in cases {
            let config = HostConfig::from(case);
            let text = config.serialize();
            let back = parse_variant::<AmazonS3HostConfig>(&text).unwrap();
            assert_eq!(back, config);
        }
    }

    #[test]
    fn test_parse_malformed_is_none() {
        assert!(parse_variant::<AmazonS3HostConfig>("not json").is_none());
        assert!(parse_variant::<AmazonS3HostConfig>("").is_none());
        assert!(parse_variant::<AmazonS3HostConfig>("{\"bucket\": 3}").is_none());
    }

    #[test]
    fn test_field_enumeration() {
        let config = HostConfig::from(full_s3());
        assert_eq!(
            config.field_names(),
            &["region", "bucket", "accessKey", "secretKey", "domain", "folder", "saveKey", "suffix"]
        );
        assert!(config.contains_field("secretKey"));
        assert!(!config.contains_field("secret_key"));
        assert_eq!(config.field("folder"), Some("a/b"));
        assert_eq!(config.display_name("accessKey").as_deref(), Some("Access Key ID"));
    }

    #[test]
    fn test_missing_required() {
        let mut s3 = full_s3();
        s3.secret_key = None;
        s3.bucket = Some("  ".to_string());
        let config = HostConfig::from(s3);
        assert_eq!(config.missing_required(), vec!["bucket".to_string(), "secretKey".to_string()]);
    }

    #[test]
    fn test_set_unknown_field() {
        let mut config = HostConfig::from(ImgurHostConfig::default());
        assert!(config.set_field("clientId", Some("abc".to_string())).is_ok());
        assert_eq!(config.field("clientId"), Some("abc"));
        assert_eq!(
            config.set_field("bucket", None),
            Err(HostError::UnknownField("bucket".to_string()))
        );
    }
}
