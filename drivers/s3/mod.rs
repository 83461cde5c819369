//! Amazon S3 / MinIO 上传驱动
//!
//! 使用浏览器表单直传 (POST policy)，不依赖 SDK。

pub mod region;
pub mod resolver;
pub mod sign;
pub mod types;
mod uploader;

pub use resolver::AddressingMode;
pub use uploader::{default_policy_ttl, S3Uploader};

use crate::host::{HostConfig, HostType};
use crate::upload::{Uploader, UploaderContext, UploaderFactory};

fn configure(uploader: S3Uploader, context: &UploaderContext) -> S3Uploader {
    let uploader = uploader
        .with_client(context.client.clone())
        .with_compressor(context.compressor.clone())
        .with_policy_ttl(context.policy_ttl);
    match &context.cancel {
        Some(token) => uploader.with_cancellation(token.clone()),
        None => uploader,
    }
}

/// Amazon S3 上传器工厂
pub struct S3UploaderFactory;

impl UploaderFactory for S3UploaderFactory {
    fn host_type(&self) -> HostType {
        HostType::AmazonS3
    }

    fn create_uploader(&self, config: Option<&HostConfig>, context: &UploaderContext) -> Box<dyn Uploader> {
        let config = config.and_then(HostConfig::as_amazon_s3).cloned();
        Box::new(configure(S3Uploader::new(config), context))
    }
}

/// MinIO 上传器工厂，复用 S3 配置，按网关模式上传
pub struct MinioUploaderFactory;

impl UploaderFactory for MinioUploaderFactory {
    fn host_type(&self) -> HostType {
        HostType::Minio
    }

    fn create_uploader(&self, config: Option<&HostConfig>, context: &UploaderContext) -> Box<dyn Uploader> {
        let config = config.and_then(HostConfig::as_amazon_s3).cloned();
        Box::new(configure(S3Uploader::gateway(config), context))
    }
}
