//! 远程附件存储接口

use async_trait::async_trait;

use crate::entities::BlobVariant;
use crate::errors::BlobStoreError;

pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

/// 远程附件服务：上传返回多个尺寸版本，下载返回原始字节
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, file_name: String, bytes: Vec<u8>) -> BlobStoreResult<Vec<BlobVariant>>;
    async fn download(&self, file_id: String) -> BlobStoreResult<Vec<u8>>;
}
