//! 领域模型错误定义
//!
//! 校验错误在处理器入口被静默丢弃；仓储与附件存储错误由应用层决定是否上报。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 载荷缺失或格式错误
    #[error("验证失败: {field}: {message}")]
    ValidationError { field: String, message: String },

    /// 用户对自己的操作不产生通知
    #[error("自身操作被忽略: uid {uid}")]
    SelfAction { uid: i64 },
}

impl DomainError {
    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn self_action(uid: i64) -> Self {
        Self::SelfAction { uid }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;

/// 文档存储访问错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

/// 远程附件存储错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BlobStoreError {
    /// 远端不存在该引用
    #[error("blob not found: {0}")]
    NotFound(String),

    /// 网络或服务不可用
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    /// 服务端拒绝请求（返回 ok = false）
    #[error("blob store rejected request: {0}")]
    Rejected(String),
}

impl BlobStoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }
}
