//! kbus-errors - 统一错误处理
//!
//! 两类错误：
//! - [`AppError`]：基础设施与配置层面的错误，向调用方传播
//! - [`MessageError`]：单条消息处理结果的分类标签，由消费循环按标签分派

use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Topic is blacklisted: {0}")]
    Blacklisted(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn broker(msg: impl Into<String>) -> Self {
        Self::Broker(msg.into())
    }

    pub fn blacklisted(topic: impl Into<String>) -> Self {
        Self::Blacklisted(topic.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// 错误类别名称（用于日志字段）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Configuration(_) => "configuration",
            Self::Broker(_) => "broker",
            Self::Blacklisted(_) => "blacklisted",
            Self::Internal(_) => "internal",
        }
    }
}

/// 消息处理错误
///
/// 解码或业务处理一条消息的结果标签：
/// - `Validation`：消息本身无效，永久失败，不重试
/// - `Recoverable`：暂时性失败，按退避策略重试
/// - `Fatal`：未分类错误，终止整个消费循环，原样向上传播
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("Invalid message: {0}")]
    Validation(String),

    #[error("Recoverable failure: {0}")]
    Recoverable(String),

    #[error(transparent)]
    Fatal(#[from] AppError),
}

impl MessageError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn recoverable(msg: impl Into<String>) -> Self {
        Self::Recoverable(msg.into())
    }

    pub fn fatal(err: AppError) -> Self {
        Self::Fatal(err)
    }
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;
