//! S3 响应类型

use serde::Deserialize;

/// S3 错误响应
///
/// ```xml
/// <Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename = "Error")]
pub struct S3ErrorResp {
    #[serde(default, rename = "Code")]
    pub code: String,
    #[serde(default, rename = "Message")]
    pub message: String,
    #[serde(default, rename = "RequestId")]
    pub request_id: String,
}

/// 从响应体中提取 `Error/Message`，不是错误 XML 时返回 None
pub fn parse_error_message(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    // 根元素可能带命名空间或属性: <Error xmlns="...">
    if !text.contains("<Error") {
        return None;
    }
    match quick_xml::de::from_str::<S3ErrorResp>(text) {
        Ok(resp) if !resp.message.trim().is_empty() => {
            tracing::debug!("S3 error: code={}, request_id={}", resp.code, resp.request_id);
            Some(resp.message.trim().to_string())
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Failed to parse S3 error XML: {}", e);
            None
        }
    }
}
