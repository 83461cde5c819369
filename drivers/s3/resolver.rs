//! 上传地址、对象 key 与公开链接

use crate::upload::{UploadError, CONFIG_ERROR_MESSAGE};

use super::region::{endpoint, DEFAULT_REGION};

/// 寻址方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// AWS 标准端点
    Standard,
    /// 兼容网关 (MinIO)：`{domain}/{bucket}`
    Gateway,
}

/// 上传目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub url: String,
    /// 签名使用的区域
    pub region: String,
}

/// 去掉域名末尾的一个 `/`
pub fn trim_domain(domain: &str) -> &str {
    let domain = domain.trim();
    domain.strip_suffix('/').unwrap_or(domain)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// `{folder}/{filename}`，folder 为空时只有文件名
pub fn object_key(folder: Option<&str>, filename: &str) -> String {
    match non_blank(folder).map(|f| f.trim_matches('/')).filter(|f| !f.is_empty()) {
        Some(folder) => format!("{}/{}", folder, filename),
        None => filename.to_string(),
    }
}

/// 计算上传目标
///
/// `region` 须已规范化；网关模式忽略它并固定使用默认区域。
pub fn resolve_target(
    mode: AddressingMode,
    bucket: &str,
    region: &str,
    domain: Option<&str>,
) -> Result<Target, UploadError> {
    let target = match mode {
        AddressingMode::Standard => Target {
            url: endpoint(bucket, region),
            region: region.to_string(),
        },
        AddressingMode::Gateway => {
            let domain = non_blank(domain)
                .map(trim_domain)
                .ok_or_else(|| UploadError::configuration(CONFIG_ERROR_MESSAGE))?;
            if url::Url::parse(domain).is_err() {
                tracing::debug!("Invalid gateway domain: {}", domain);
                return Err(UploadError::configuration(CONFIG_ERROR_MESSAGE));
            }
            Target {
                url: format!("{}/{}", domain, bucket),
                region: DEFAULT_REGION.to_string(),
            }
        }
    };

    if target.url.is_empty() {
        return Err(UploadError::configuration(CONFIG_ERROR_MESSAGE));
    }
    Ok(target)
}

/// 只转义会破坏 URL 路径的字符，其余原样保留
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            ' ' => encoded.push_str("%20"),
            '%' => encoded.push_str("%25"),
            '#' => encoded.push_str("%23"),
            '?' => encoded.push_str("%3F"),
            c => encoded.push(c),
        }
    }
    encoded
}

/// 上传成功后返回给用户的链接
///
/// 自定义域名仅在标准模式下生效；网关模式的 domain 是上传端点。
pub fn public_url(
    mode: AddressingMode,
    target_url: &str,
    domain: Option<&str>,
    key: &str,
    suffix: Option<&str>,
) -> String {
    let base = match (mode, non_blank(domain)) {
        (AddressingMode::Standard, Some(domain)) => trim_domain(domain),
        _ => target_url,
    };
    format!("{}/{}{}", base, encode_key(key), suffix.unwrap_or(""))
}
