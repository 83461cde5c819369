use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::UploadError;
use crate::utils::random_name;

const RANDOM_NAME_LEN: usize = 16;

/// Naming rule for stored objects / 文件命名规则
///
/// No uniqueness check is made; a colliding key overwrites the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveKeyStrategy {
    /// Keep the original base name / 原文件名
    Filename,
    /// Unix milliseconds / 时间戳
    Timestamp,
    /// `yyyyMMddHHmmss_` + original base name / 日期+文件名
    DateFilename,
    /// Random alphanumerics / 随机字符串
    Random,
}

impl SaveKeyStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaveKeyStrategy::Filename => "filename",
            SaveKeyStrategy::Timestamp => "timestamp",
            SaveKeyStrategy::DateFilename => "dateFilename",
            SaveKeyStrategy::Random => "random",
        }
    }

    /// Base name (without extension) for the stored object.
    /// `original` is `None` for in-memory data, which gets a random base name.
    pub fn file_name(&self, original: Option<&str>, now: DateTime<Utc>) -> String {
        let base = || {
            original
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| random_name(RANDOM_NAME_LEN))
        };
        match self {
            SaveKeyStrategy::Filename => base(),
            SaveKeyStrategy::Timestamp => now.timestamp_millis().to_string(),
            SaveKeyStrategy::DateFilename => format!("{}_{}", now.format("%Y%m%d%H%M%S"), base()),
            SaveKeyStrategy::Random => random_name(RANDOM_NAME_LEN),
        }
    }
}

impl FromStr for SaveKeyStrategy {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "filename" => Ok(SaveKeyStrategy::Filename),
            "timestamp" => Ok(SaveKeyStrategy::Timestamp),
            "dateFilename" => Ok(SaveKeyStrategy::DateFilename),
            "random" => Ok(SaveKeyStrategy::Random),
            other => Err(UploadError::configuration(format!("Unknown save key: {}", other))),
        }
    }
}
