// Uploader drivers / 上传驱动
pub mod s3;

use crate::upload::UploaderManager;

/// Register all uploaders to UploaderManager / 注册所有上传器
pub async fn register_all(manager: &UploaderManager) {
    // Register Amazon S3 uploader / 注册Amazon S3上传器
    manager.register_factory(Box::new(s3::S3UploaderFactory)).await;
    // Register MinIO uploader (S3-compatible gateway) / 注册MinIO上传器
    manager.register_factory(Box::new(s3::MinioUploaderFactory)).await;
}
