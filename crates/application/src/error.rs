use domain::{BlobStoreError, RepositoryError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("remote store unavailable: {0}")]
    RemoteUnavailable(String),
    #[error("repository error: {0:?}")]
    Repository(RepositoryError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ApplicationError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApplicationError::Validation(message.into())
    }

    pub fn not_found(key: impl Into<String>) -> Self {
        ApplicationError::NotFound(key.into())
    }

    /// 本地缓存文件读写错误
    pub fn storage(message: impl Into<String>) -> Self {
        ApplicationError::Storage(message.into())
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Repository(value)
    }
}

impl From<BlobStoreError> for ApplicationError {
    fn from(value: BlobStoreError) -> Self {
        ApplicationError::RemoteUnavailable(value.to_string())
    }
}
