//! S3 区域与端点

use once_cell::sync::Lazy;
use regex::Regex;

use crate::upload::UploadError;

/// 默认区域，MinIO 等兼容网关固定使用该区域签名
pub const DEFAULT_REGION: &str = "us-east-1";

/// `us-east-1` / `us-gov-west-1` / `cn-northwest-1` 形式
static REGION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]*)?-[a-z]+-\d+$").expect("region pattern is valid")
});

/// 规范化区域: `US_EAST_1` / ` us-east-1 ` → `us-east-1`，空值为默认区域
pub fn normalize_region(raw: Option<&str>) -> Result<String, UploadError> {
    let raw = raw.map(str::trim).unwrap_or("");
    if raw.is_empty() {
        return Ok(DEFAULT_REGION.to_string());
    }
    let region = raw.to_ascii_lowercase().replace('_', "-");
    if REGION_PATTERN.is_match(&region) {
        Ok(region)
    } else {
        Err(UploadError::configuration(format!("Unknown S3 region: {}", raw)))
    }
}

fn is_china(region: &str) -> bool {
    region.starts_with("cn-")
}

/// 计算上传端点
///
/// 默认使用虚拟主机风格 (`bucket.s3...`)；桶名含 `.` 时证书无法匹配，改用路径风格。
/// 桶名为空时返回空字符串。
pub fn endpoint(bucket: &str, region: &str) -> String {
    if bucket.is_empty() || region.is_empty() {
        return String::new();
    }
    let tld = if is_china(region) { "amazonaws.com.cn" } else { "amazonaws.com" };

    if bucket.contains('.') {
        return format!("https://s3.{}.{}/{}", region, tld, bucket);
    }
    if region == DEFAULT_REGION {
        format!("https://{}.s3.{}", bucket, tld)
    } else {
        format!("https://{}.s3.{}.{}", bucket, region, tld)
    }
}
