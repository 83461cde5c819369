//! S3 表单直传上传器

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use futures::{Stream, StreamExt};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, StatusCode};
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;

use crate::host::{AmazonS3HostConfig, ProviderConfig};
use crate::upload::{
    ImageCompressor, NoopCompressor, ProgressTracker, SaveKeyStrategy, UploadError,
    UploadObserver, UploadSession, UploadSource, Uploader, CONFIG_ERROR_MESSAGE,
};
use crate::utils::{
    detect_image_type, get_ext, get_stem, is_image_mime, join_ext, mime_for_ext,
    DEFAULT_IMAGE_EXT,
};

use super::region::normalize_region;
use super::resolver::{object_key, public_url, resolve_target, AddressingMode};
use super::sign::{sign_post_policy, PolicyRequest, ACL, ALGORITHM};
use super::types::parse_error_message;

/// 内存数据分块大小
const CHUNK_SIZE: usize = 64 * 1024;

/// 默认 policy 有效期
pub fn default_policy_ttl() -> Duration {
    Duration::hours(1)
}

/// 校验后的上传配置
#[derive(Debug, Clone)]
struct S3Settings {
    bucket: String,
    access_key: String,
    secret_key: String,
    region: String,
    domain: Option<String>,
    folder: Option<String>,
    suffix: Option<String>,
    save_key: SaveKeyStrategy,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl S3Settings {
    fn from_config(
        config: Option<&AmazonS3HostConfig>,
        mode: AddressingMode,
    ) -> Result<Self, UploadError> {
        let config = config.ok_or_else(|| {
            tracing::warn!("S3 upload without an Amazon S3 configuration");
            UploadError::configuration(CONFIG_ERROR_MESSAGE)
        })?;

        let missing = config.missing_required();
        if !missing.is_empty() {
            tracing::warn!("S3 configuration missing fields: {}", missing.join(", "));
            return Err(UploadError::configuration(CONFIG_ERROR_MESSAGE));
        }
        let field = |value: &Option<String>| non_blank(value).unwrap_or_default().to_string();

        let region = match mode {
            // 网关模式不使用配置中的区域
            AddressingMode::Gateway => String::new(),
            AddressingMode::Standard => normalize_region(config.region.as_deref())?,
        };

        Ok(Self {
            bucket: field(&config.bucket),
            access_key: field(&config.access_key),
            secret_key: field(&config.secret_key),
            region,
            domain: non_blank(&config.domain).map(str::to_string),
            folder: non_blank(&config.folder).map(str::to_string),
            suffix: config.suffix.clone().filter(|s| !s.is_empty()),
            save_key: field(&config.save_key).parse()?,
        })
    }
}

/// 待发送的文件内容
enum PayloadBody {
    File(tokio::fs::File),
    Memory(Bytes),
}

struct Payload {
    file_name: String,
    mime: String,
    len: u64,
    body: PayloadBody,
}

impl Payload {
    /// 构造 multipart 的 file 部分，发送过程中按字节上报进度
    fn into_part(self, tracker: ProgressTracker) -> Result<Part, UploadError> {
        let total = self.len;
        let body = match self.body {
            PayloadBody::File(file) => counted_body(ReaderStream::new(file), total, tracker),
            PayloadBody::Memory(data) => {
                let chunks: Vec<Result<Bytes, std::io::Error>> = (0..data.len())
                    .step_by(CHUNK_SIZE)
                    .map(|start| Ok(data.slice(start..(start + CHUNK_SIZE).min(data.len()))))
                    .collect();
                counted_body(futures::stream::iter(chunks), total, tracker)
            }
        };
        Ok(Part::stream_with_length(body, total)
            .file_name(self.file_name)
            .mime_str(&self.mime)?)
    }
}

fn counted_body<S>(stream: S, total: u64, tracker: ProgressTracker) -> Body
where
    S: Stream<Item = Result<Bytes, std::io::Error>> + Send + Sync + 'static,
{
    let mut sent = 0u64;
    tracker.report_bytes(0, total);
    Body::wrap_stream(stream.map(move |chunk| {
        if let Ok(bytes) = &chunk {
            sent += bytes.len() as u64;
            tracker.report_bytes(sent, total);
        }
        chunk
    }))
}

/// S3 上传器
///
/// 标准模式直接向 AWS 端点 POST 表单；网关模式 (MinIO) 向 `{domain}/{bucket}` POST。
pub struct S3Uploader {
    config: Option<AmazonS3HostConfig>,
    mode: AddressingMode,
    client: reqwest::Client,
    compressor: Arc<dyn ImageCompressor>,
    policy_ttl: Duration,
    cancel: Option<CancellationToken>,
}

impl S3Uploader {
    pub fn new(config: Option<AmazonS3HostConfig>) -> Self {
        Self {
            config,
            mode: AddressingMode::Standard,
            client: reqwest::Client::new(),
            compressor: Arc::new(NoopCompressor),
            policy_ttl: default_policy_ttl(),
            cancel: None,
        }
    }

    /// 兼容网关上传器
    pub fn gateway(config: Option<AmazonS3HostConfig>) -> Self {
        Self {
            mode: AddressingMode::Gateway,
            ..Self::new(config)
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_compressor(mut self, compressor: Arc<dyn ImageCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn with_policy_ttl(mut self, ttl: Duration) -> Self {
        self.policy_ttl = ttl;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn mode(&self) -> AddressingMode {
        self.mode
    }

    /// 按网关模式上传，忽略配置的区域
    pub async fn upload_to_gateway(
        &self,
        source: UploadSource,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<String, UploadError> {
        self.run(source, observer, AddressingMode::Gateway).await
    }

    async fn run(
        &self,
        source: UploadSource,
        observer: Arc<dyn UploadObserver>,
        mode: AddressingMode,
    ) -> Result<String, UploadError> {
        let session = UploadSession::start(observer);
        let result = self.execute(source, mode, session.tracker()).await;
        match &result {
            Ok(url) => tracing::info!("S3 upload completed: {}", url),
            Err(e) => tracing::warn!("S3 upload failed: {}", e),
        }
        session.finish(result)
    }

    async fn execute(
        &self,
        source: UploadSource,
        mode: AddressingMode,
        tracker: ProgressTracker,
    ) -> Result<String, UploadError> {
        let settings = S3Settings::from_config(self.config.as_ref(), mode)?;
        let target = resolve_target(mode, &settings.bucket, &settings.region, settings.domain.as_deref())?;
        let now = Utc::now();

        let payload = self.prepare(source, settings.save_key, now).await?;
        let key = object_key(settings.folder.as_deref(), &payload.file_name);
        tracing::info!("S3 upload start: {} -> {} ({} bytes)", key, target.url, payload.len);

        let signed = sign_post_policy(&PolicyRequest {
            access_key: &settings.access_key,
            secret_key: &settings.secret_key,
            region: &target.region,
            bucket: &settings.bucket,
            mime_type: &payload.mime,
            now,
            ttl: self.policy_ttl,
        });

        // 字段顺序固定，file 必须在最后
        let mime = payload.mime.clone();
        let form = Form::new()
            .text("key", key.clone())
            .text("acl", ACL)
            .text("X-Amz-Credential", signed.credential)
            .text("X-Amz-Algorithm", ALGORITHM)
            .text("X-Amz-Date", signed.iso_date)
            .text("policy", signed.policy)
            .text("X-Amz-Signature", signed.signature)
            .text("content-type", mime)
            .part("file", payload.into_part(tracker.clone())?);

        let request = self.client.post(&target.url).multipart(form).send();
        let response = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(UploadError::Cancelled),
                response = request => response,
            },
            None => request.await,
        };
        tracker.complete();

        let response = response?;
        let status = response.status();
        let body = match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => return Err(UploadError::Cancelled),
                body = response.bytes() => body?,
            },
            None => response.bytes().await?,
        };
        check_response(status, &body)?;

        Ok(public_url(
            mode,
            &target.url,
            settings.domain.as_deref(),
            &key,
            settings.suffix.as_deref(),
        ))
    }

    /// 解析文件名 / MIME，并按需压缩
    async fn prepare(
        &self,
        source: UploadSource,
        save_key: SaveKeyStrategy,
        now: DateTime<Utc>,
    ) -> Result<Payload, UploadError> {
        match source {
            UploadSource::File(path) => self.prepare_file(&path, save_key, now).await,
            UploadSource::Data(data) => {
                let ext = detect_image_type(&data).unwrap_or(DEFAULT_IMAGE_EXT);
                let mime = mime_for_ext(ext);
                let data = self.compress(data, &mime);
                Ok(Payload {
                    file_name: join_ext(&save_key.file_name(None, now), ext),
                    mime,
                    len: data.len() as u64,
                    body: PayloadBody::Memory(data),
                })
            }
        }
    }

    async fn prepare_file(
        &self,
        path: &Path,
        save_key: SaveKeyStrategy,
        now: DateTime<Utc>,
    ) -> Result<Payload, UploadError> {
        let ext = get_ext(path);
        let mime = mime_for_ext(&ext);
        let file_name = join_ext(&save_key.file_name(Some(&get_stem(path)), now), &ext);

        if is_image_mime(&mime) && self.compressor.is_enabled() {
            let data = tokio::fs::read(path).await.map_err(|e| {
                tracing::debug!("Failed to read {}: {}", path.display(), e);
                UploadError::input("Invalid file")
            })?;
            let data = self.compress(Bytes::from(data), &mime);
            return Ok(Payload {
                file_name,
                mime,
                len: data.len() as u64,
                body: PayloadBody::Memory(data),
            });
        }

        let file = tokio::fs::File::open(path).await.map_err(|e| {
            tracing::debug!("Failed to open {}: {}", path.display(), e);
            UploadError::input("Invalid file")
        })?;
        let meta = file
            .metadata()
            .await
            .map_err(|e| UploadError::input(e.to_string()))?;
        if !meta.is_file() {
            return Err(UploadError::input("Invalid file"));
        }
        Ok(Payload {
            file_name,
            mime,
            len: meta.len(),
            body: PayloadBody::File(file),
        })
    }

    fn compress(&self, data: Bytes, mime: &str) -> Bytes {
        if !is_image_mime(mime) || !self.compressor.is_enabled() {
            return data;
        }
        match self.compressor.compress(&data, mime) {
            Some(compressed) => {
                tracing::debug!("Image compressed: {} -> {} bytes", data.len(), compressed.len());
                compressed
            }
            None => data,
        }
    }
}

/// 2xx 且没有错误 XML 才算成功
fn check_response(status: StatusCode, body: &[u8]) -> Result<(), UploadError> {
    if let Some(message) = parse_error_message(body) {
        return Err(UploadError::provider(message));
    }
    if !status.is_success() {
        return Err(UploadError::transport(format!(
            "Response status code was unacceptable: {}.",
            status.as_u16()
        )));
    }
    Ok(())
}

#[async_trait]
impl Uploader for S3Uploader {
    fn name(&self) -> &str {
        match self.mode {
            AddressingMode::Standard => "Amazon S3",
            AddressingMode::Gateway => "MinIO",
        }
    }

    async fn upload(
        &self,
        source: UploadSource,
        observer: Arc<dyn UploadObserver>,
    ) -> Result<String, UploadError> {
        self.run(source, observer, self.mode).await
    }
}
