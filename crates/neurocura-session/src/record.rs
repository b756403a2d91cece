//! # Session Records
//!
//! 会话的 JSON 持久化格式：
//!
//! ```json
//! {
//!   "id": "…",
//!   "title": "…",
//!   "created_at": "2024-05-01T10:00:00Z",
//!   "messages": [
//!     { "text": "…", "is_user": true, "edit_history": ["…"] }
//!   ]
//! }
//! ```
//!
//! 加载时缺失的可选字段取默认值：`is_user = true`，`edit_history = []`。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ChatSession, Message};

/// 单条消息记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub text: String,
    #[serde(default = "default_is_user")]
    pub is_user: bool,
    #[serde(default)]
    pub edit_history: Vec<String>,
}

fn default_is_user() -> bool {
    true
}

/// 会话记录（一个会话对应一个 JSON 文件）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            text: message.text().to_string(),
            is_user: message.is_user(),
            edit_history: message.edit_history().to_vec(),
        }
    }
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Message::from_parts(record.text, record.is_user, record.edit_history)
    }
}

impl ChatSession {
    /// 转换为持久化记录
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            id: self.id().to_string(),
            title: self.title().to_string(),
            created_at: self.created_at(),
            messages: self.messages().iter().map(MessageRecord::from).collect(),
        }
    }

    /// 从持久化记录恢复
    pub fn from_record(record: SessionRecord) -> Self {
        let mut session =
            ChatSession::new(record.id, record.title).with_created_at(record.created_at);
        for message in record.messages {
            session.add_message(message.into());
        }
        session
    }
}
