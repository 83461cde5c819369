//! File name and content type utility functions / 文件名与类型工具函数

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::path::Path;

/// Fallback extension for data whose type cannot be detected / 无法识别时的默认扩展名
pub const DEFAULT_IMAGE_EXT: &str = "png";

/// Get file extension (keeps original case) / 获取文件扩展名
pub fn get_ext(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string()
}

/// Get file name without extension / 获取不带扩展名的文件名
pub fn get_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_string()
}

/// Join a base name and an extension, skipping the dot when there is no extension
pub fn join_ext(stem: &str, ext: &str) -> String {
    if ext.is_empty() {
        stem.to_string()
    } else {
        format!("{}.{}", stem, ext)
    }
}

/// MIME type for an extension / 根据扩展名获取MIME类型
pub fn mime_for_ext(ext: &str) -> String {
    mime_guess::from_ext(ext)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Detect image type from magic bytes, returns an extension / 根据文件头识别图片类型
pub fn detect_image_type(data: &[u8]) -> Option<&'static str> {
    match data {
        [0x89, b'P', b'N', b'G', ..] => Some("png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("jpg"),
        [b'G', b'I', b'F', b'8', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        [b'B', b'M', ..] => Some("bmp"),
        [b'I', b'I', 0x2A, 0x00, ..] | [b'M', b'M', 0x00, 0x2A, ..] => Some("tiff"),
        [0x00, 0x00, 0x01, 0x00, ..] => Some("ico"),
        _ => None,
    }
}

/// Random lowercase alphanumeric name / 随机文件名
pub fn random_name(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|c| (c as char).to_ascii_lowercase())
        .collect()
}
