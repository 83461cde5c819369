pub mod config;
pub mod host;
pub mod upload;
pub mod utils;

// Driver modules (point to project root drivers via path attribute) / 驱动模块
#[path = "../drivers/mod.rs"]
pub mod drivers;

use upload::{UploaderContext, UploaderManager};

/// Create a manager with all uploaders registered / 创建并注册所有上传器
pub async fn create_uploader_manager(context: UploaderContext) -> UploaderManager {
    let manager = UploaderManager::new(context);
    drivers::register_all(&manager).await;
    manager
}
