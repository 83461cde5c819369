//! Uploader contract / 上传器约定
//!
//! Every uploader reports the same lifecycle to its caller:
//! `on_start` once, any number of `on_progress`, then exactly one of
//! `on_completed` / `on_failed`. [`UploadSession`] enforces it.

mod compress;
mod manager;
mod save_key;
mod session;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::sync::mpsc;

pub use compress::{ImageCompressor, NoopCompressor};
pub use manager::{UploaderContext, UploaderFactory, UploaderManager};
pub use save_key::SaveKeyStrategy;
pub use session::{ProgressTracker, UploadSession};

/// Generic message for an unusable host configuration / 图床配置错误
pub const CONFIG_ERROR_MESSAGE: &str =
    "There is a problem with the map bed configuration, please check!";

/// Upload errors; `Display` is the message shown to the user / 上传错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    /// Missing or invalid configuration, detected before any network call
    #[error("{0}")]
    Configuration(String),
    /// No usable input
    #[error("{0}")]
    Input(String),
    /// Network or HTTP failure without a structured message
    #[error("{0}")]
    Transport(String),
    /// Message extracted from the provider's error body
    #[error("{0}")]
    Provider(String),
    #[error("Upload cancelled")]
    Cancelled,
}

impl UploadError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }
}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// What to upload: a file on disk or an in-memory buffer / 上传内容
#[derive(Debug, Clone)]
pub enum UploadSource {
    File(PathBuf),
    Data(Bytes),
}

impl UploadSource {
    /// Build from the optional inputs of the caller; exactly one must be present
    pub fn from_parts(file: Option<PathBuf>, data: Option<Bytes>) -> Result<Self, UploadError> {
        match (file, data) {
            (Some(path), None) => Ok(Self::File(path)),
            (None, Some(data)) => Ok(Self::Data(data)),
            (Some(_), Some(_)) => Err(UploadError::input("Both a file and data were supplied")),
            (None, None) => Err(UploadError::input("Invalid file")),
        }
    }
}

/// Lifecycle event, for observers that prefer a channel / 上传事件
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Started,
    Progress(f64),
    Completed(String),
    Failed(String),
}

/// Lifecycle callbacks consumed by the caller (UI layer) / 上传回调
pub trait UploadObserver: Send + Sync {
    fn on_start(&self) {}

    fn on_progress(&self, _fraction: f64) {}

    fn on_completed(&self, url: &str);

    fn on_failed(&self, message: &str);
}

impl UploadObserver for mpsc::UnboundedSender<UploadEvent> {
    fn on_start(&self) {
        let _ = self.send(UploadEvent::Started);
    }

    fn on_progress(&self, fraction: f64) {
        let _ = self.send(UploadEvent::Progress(fraction));
    }

    fn on_completed(&self, url: &str) {
        let _ = self.send(UploadEvent::Completed(url.to_string()));
    }

    fn on_failed(&self, message: &str) {
        let _ = self.send(UploadEvent::Failed(message.to_string()));
    }
}

/// Uploader interface / 上传器接口
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Uploader name / 上传器名称
    fn name(&self) -> &str;

    /// Upload and report the lifecycle to `observer`; returns the public URL
    async fn upload(
        &self,
        source: UploadSource,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<String, UploadError>;

    async fn upload_file(
        &self,
        path: PathBuf,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<String, UploadError> {
        self.upload(UploadSource::File(path), observer).await
    }

    async fn upload_data(
        &self,
        data: Bytes,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<String, UploadError> {
        self.upload(UploadSource::Data(data), observer).await
    }
}
