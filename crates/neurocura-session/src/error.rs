//! # Session Error Types
//!
//! 定义会话模型与存储相关的错误类型。

use thiserror::Error;

/// 会话错误类型
#[derive(Error, Debug)]
pub enum SessionError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 会话不存在
    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    /// 消息下标越界
    #[error("Message index {index} out of range (session has {len} messages)")]
    MessageIndexOutOfRange { index: usize, len: usize },

    /// 只有用户消息可以编辑
    #[error("Message {index} was written by the assistant and cannot be edited")]
    NotEditable { index: usize },

    /// 配置错误
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// 其他错误
    #[error("Session error: {message}")]
    Other { message: String },
}

impl SessionError {
    /// 创建其他错误
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// 创建会话不存在错误
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { id: id.into() }
    }
}

/// 会话结果类型
pub type SessionResult<T> = Result<T, SessionError>;
