//! 附件代理：本地缓存优先，未命中时回源远程附件存储
//!
//! 缓存内容是 blob 字节的 base64 编码；上传不写缓存。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use data_encoding::BASE64;
use domain::{AttachmentSet, BlobStore};
use image::ImageFormat;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApplicationError;

/// 本地附件缓存，键唯一，写入即覆盖
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    async fn has(&self, key: &str) -> Result<bool, ApplicationError>;
    /// 键不存在时返回 `ApplicationError::NotFound`
    async fn read(&self, key: &str) -> Result<String, ApplicationError>;
    async fn write(&self, key: &str, payload: String) -> Result<(), ApplicationError>;
    async fn clear(&self) -> Result<(), ApplicationError>;
}

/// 通过文件头识别出的图片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageType(ImageFormat);

impl ImageType {
    pub fn mime(&self) -> &'static str {
        self.0.to_mime_type()
    }

    pub fn extension(&self) -> &'static str {
        self.0.extensions_str().first().copied().unwrap_or("png")
    }
}

/// 按魔数识别图片格式，无法识别时按 PNG 处理
pub fn sniff_image_type(bytes: &[u8]) -> ImageType {
    ImageType(image::guess_format(bytes).unwrap_or(ImageFormat::Png))
}

pub struct AttachmentServiceDependencies {
    pub store: Arc<dyn AttachmentStore>,
    pub blob_store: Arc<dyn BlobStore>,
}

pub struct AttachmentService {
    deps: AttachmentServiceDependencies,
    /// 正在回源的键，同一键的并发请求只下载一次
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AttachmentService {
    pub fn new(deps: AttachmentServiceDependencies) -> Self {
        Self {
            deps,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// 取附件的 base64 内容：缓存命中直接返回，否则下载、写缓存后返回
    pub async fn resolve(&self, key: &str) -> Result<String, ApplicationError> {
        if key.is_empty() {
            return Err(ApplicationError::validation("attachment key is empty"));
        }

        if self.deps.store.has(key).await? {
            return self.deps.store.read(key).await;
        }

        let key_lock = self
            .inflight
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone();
        let result = {
            let _guard = key_lock.lock().await;
            self.fetch_into_cache(key).await
        };
        self.inflight.lock().await.remove(key);
        result
    }

    async fn fetch_into_cache(&self, key: &str) -> Result<String, ApplicationError> {
        // 等锁期间可能已被其他请求写入缓存
        if self.deps.store.has(key).await? {
            return self.deps.store.read(key).await;
        }

        let bytes = self
            .deps
            .blob_store
            .download(key.to_string())
            .await
            .map_err(|err| {
                warn!(attachment = %key, error = %err, "远程附件下载失败");
                ApplicationError::from(err)
            })?;

        let payload = BASE64.encode(&bytes);
        self.deps.store.write(key, payload.clone()).await?;

        info!(attachment = %key, size = bytes.len(), "附件已缓存");
        Ok(payload)
    }

    /// 取附件原始字节，供 HTTP 直出
    pub async fn resolve_bytes(&self, key: &str) -> Result<Vec<u8>, ApplicationError> {
        let payload = self.resolve(key).await?;
        BASE64
            .decode(payload.as_bytes())
            .map_err(|err| ApplicationError::storage(format!("corrupt cache entry {key}: {err}")))
    }

    /// 上传到远程存储，返回三档引用；不写本地缓存
    pub async fn upload(&self, bytes: Vec<u8>) -> Result<AttachmentSet, ApplicationError> {
        if bytes.is_empty() {
            return Err(ApplicationError::validation("attachment payload is empty"));
        }

        let image_type = sniff_image_type(&bytes);
        let file_name = format!("{}.{}", Uuid::new_v4(), image_type.extension());
        let size = bytes.len();

        let variants = self
            .deps
            .blob_store
            .upload(file_name.clone(), bytes)
            .await
            .map_err(|err| {
                warn!(file_name = %file_name, error = %err, "附件上传失败");
                ApplicationError::from(err)
            })?;

        let attachments = AttachmentSet::from_variants(variants).ok_or_else(|| {
            ApplicationError::RemoteUnavailable("upload returned no variants".to_string())
        })?;

        info!(file_name = %file_name, size, large = %attachments.large, "附件上传完成");
        Ok(attachments)
    }
}
