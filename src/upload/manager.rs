use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::{
    ImageCompressor, NoopCompressor, UploadError, UploadObserver, UploadSession, UploadSource,
    Uploader, CONFIG_ERROR_MESSAGE,
};
use crate::host::{Host, HostConfig, HostType};

/// Shared resources handed to every uploader / 上传器共享资源
#[derive(Clone)]
pub struct UploaderContext {
    pub client: reqwest::Client,
    pub compressor: Arc<dyn ImageCompressor>,
    /// Lifetime of signed upload policies / 签名有效期
    pub policy_ttl: Duration,
    pub cancel: Option<CancellationToken>,
}

impl Default for UploaderContext {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
            compressor: Arc::new(NoopCompressor),
            policy_ttl: Duration::hours(1),
            cancel: None,
        }
    }
}

/// Uploader factory trait / 上传器工厂 trait
pub trait UploaderFactory: Send + Sync {
    /// Host type served by this factory / 对应的图床类型
    fn host_type(&self) -> HostType;

    /// Create an uploader for one configuration snapshot / 创建上传器实例
    ///
    /// The configuration is validated when uploading, so a missing or
    /// mismatched one still yields an uploader that reports the failure.
    fn create_uploader(&self, config: Option<&HostConfig>, context: &UploaderContext) -> Box<dyn Uploader>;
}

/// Uploader manager (maps host types to factories) / 上传管理器
#[derive(Clone)]
pub struct UploaderManager {
    factories: Arc<RwLock<HashMap<HostType, Arc<Box<dyn UploaderFactory>>>>>,
    context: UploaderContext,
}

impl UploaderManager {
    pub fn new(context: UploaderContext) -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
            context,
        }
    }

    /// Register uploader factory / 注册上传器工厂
    pub async fn register_factory(&self, factory: Box<dyn UploaderFactory>) {
        let host_type = factory.host_type();
        let mut factories = self.factories.write().await;
        factories.insert(host_type, Arc::new(factory));

        tracing::info!("Uploader factory registered: {}", host_type.name());
    }

    /// Registered host types, ordered by code / 已注册的图床类型
    pub async fn supported_types(&self) -> Vec<HostType> {
        let factories = self.factories.read().await;
        let mut types: Vec<HostType> = factories.keys().copied().collect();
        types.sort_by_key(|t| t.code());
        types
    }

    /// Create the uploader for a host / 获取图床对应的上传器
    pub async fn uploader_for(&self, host: &Host) -> Result<Box<dyn Uploader>, UploadError> {
        let factories = self.factories.read().await;
        let factory = factories.get(&host.host_type).ok_or_else(|| {
            UploadError::configuration(format!("Unsupported image host: {}", host.host_type.name()))
        })?;
        Ok(factory.create_uploader(host.data.as_ref(), &self.context))
    }

    /// Upload through the given host / 通过指定图床上传
    ///
    /// Failures to find an uploader are reported through `observer` like any
    /// other failed upload.
    pub async fn upload(
        &self,
        host: Option<&Host>,
        source: UploadSource,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<String, UploadError> {
        let uploader = match host {
            Some(host) => self.uploader_for(host).await,
            None => Err(UploadError::configuration(CONFIG_ERROR_MESSAGE)),
        };
        match uploader {
            Ok(uploader) => {
                tracing::debug!("Uploading with {}", uploader.name());
                uploader.upload(source, observer).await
            }
            Err(e) => {
                tracing::warn!("No uploader available: {}", e);
                UploadSession::start(observer).finish(Err(e))
            }
        }
    }
}

impl Default for UploaderManager {
    fn default() -> Self {
        Self::new(UploaderContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::UploadEvent;
    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::mpsc;

    struct EchoUploader;

    #[async_trait]
    impl Uploader for EchoUploader {
        fn name(&self) -> &str {
            "echo"
        }

        async fn upload(
            &self,
            _source: UploadSource,
            observer: Arc<dyn UploadObserver>,
        ) -> Result<String, UploadError> {
            UploadSession::start(observer).finish(Ok("https://echo/1.png".to_string()))
        }
    }

    struct EchoFactory;

    impl UploaderFactory for EchoFactory {
        fn host_type(&self) -> HostType {
            HostType::Imgur
        }

        fn create_uploader(&self, _config: Option<&HostConfig>, _context: &UploaderContext) -> Box<dyn Uploader> {
            Box::new(EchoUploader)
        }
    }

    fn events(rx: &mut mpsc::UnboundedReceiver<UploadEvent>) -> Vec<UploadEvent> {
        let mut out = Vec::new();
        while let Ok(e) = rx.try_recv() {
            out.push(e);
        }
        out
    }

    #[tokio::test]
    async fn test_dispatch_by_host_type() {
        let manager = UploaderManager::default();
        manager.register_factory(Box::new(EchoFactory)).await;
        assert_eq!(manager.supported_types().await, vec![HostType::Imgur]);

        let host = Host::new("1", "imgur", HostType::Imgur);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let url = manager
            .upload(Some(&host), UploadSource::Data(Bytes::from_static(b"x")), Arc::new(tx))
            .await
            .unwrap();
        assert_eq!(url, "https://echo/1.png");
        assert_eq!(events(&mut rx), vec![UploadEvent::Started, UploadEvent::Completed(url)]);
    }

    #[tokio::test]
    async fn test_unsupported_type_fails_cleanly() {
        let manager = UploaderManager::default();
        let host = Host::new("2", "weibo", HostType::Weibo);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let err = manager
            .upload(Some(&host), UploadSource::Data(Bytes::from_static(b"x")), Arc::new(tx))
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Configuration(_)));
        assert_eq!(
            events(&mut rx),
            vec![UploadEvent::Started, UploadEvent::Failed(err.to_string())]
        );
    }

    #[tokio::test]
    async fn test_missing_host_fails_cleanly() {
        let manager = UploaderManager::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let err = manager
            .upload(None, UploadSource::Data(Bytes::from_static(b"x")), Arc::new(tx))
            .await
            .unwrap_err();
        assert_eq!(err, UploadError::configuration(CONFIG_ERROR_MESSAGE));
        assert_eq!(events(&mut rx).len(), 2);
    }
}
