//! # Neurocura Session Types
//!
//! 定义会话相关的核心类型：消息、会话，以及编辑消息后的再生成结果。

use chrono::{DateTime, Local, Utc};

use crate::error::{SessionError, SessionResult};

/// 消息作者
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Assistant,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Author::User => write!(f, "You"),
            Author::Assistant => write!(f, "AI"),
        }
    }
}

/// 消息结构
///
/// `is_user` 创建后不可变；`edit_history` 只追加，且从不包含当前 `text`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    text: String,
    is_user: bool,
    edit_history: Vec<String>,
}

impl Message {
    /// 创建用户消息
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: true,
            edit_history: Vec::new(),
        }
    }

    /// 创建助手消息
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            edit_history: Vec::new(),
        }
    }

    /// 从持久化字段重建消息
    pub(crate) fn from_parts(text: String, is_user: bool, edit_history: Vec<String>) -> Self {
        Self {
            text,
            is_user,
            edit_history,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_user(&self) -> bool {
        self.is_user
    }

    pub fn author(&self) -> Author {
        if self.is_user {
            Author::User
        } else {
            Author::Assistant
        }
    }

    /// 之前的所有版本，最早的在前
    pub fn edit_history(&self) -> &[String] {
        &self.edit_history
    }

    pub fn is_edited(&self) -> bool {
        !self.edit_history.is_empty()
    }

    /// 修改消息文本
    ///
    /// 新文本与当前文本相同时不做任何事并返回 `false`。
    pub fn edit(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        if text == self.text {
            return false;
        }
        let previous = std::mem::replace(&mut self.text, text);
        self.edit_history.push(previous);
        true
    }
}

/// 编辑后需要重新生成的回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regeneration {
    /// 新请求使用的提示词（编辑后的文本）
    pub prompt: String,
    /// 旧回复原来所在的位置，新回复插入到这里
    pub reply_index: usize,
    /// 被丢弃的旧回复
    pub discarded: Message,
}

/// 编辑消息的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// 文本没有变化
    Unchanged,
    /// 已编辑，后面没有可替换的回复
    Edited,
    /// 已编辑，并且紧随其后的助手回复已被移除，等待重新生成
    Regenerate(Regeneration),
}

/// 完整会话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    messages: Vec<Message>,
}

impl ChatSession {
    /// 创建新会话
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// 使用指定的创建时间（用于从记录恢复）
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// 根据当前本地时间生成默认标题
    pub fn default_title() -> String {
        format!("Chat {}", Local::now().format("%Y-%m-%d %H:%M"))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// 修改标题
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// 添加消息
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// 在指定位置插入消息，越界时追加到末尾
    ///
    /// 返回实际插入的位置。
    pub fn insert_message(&mut self, index: usize, message: Message) -> usize {
        let index = index.min(self.messages.len());
        self.messages.insert(index, message);
        index
    }

    /// 删除指定位置的消息，不影响相邻消息
    pub fn remove_message(&mut self, index: usize) -> Option<Message> {
        if index < self.messages.len() {
            Some(self.messages.remove(index))
        } else {
            None
        }
    }

    /// 清空所有消息
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 编辑消息
    ///
    /// 只能编辑用户消息，助手消息返回 [`SessionError::NotEditable`]。
    /// 紧随其后是一条助手回复时，旧回复被移除，
    /// 返回 [`EditOutcome::Regenerate`]，由调用方发起新请求。
    pub fn edit_message(
        &mut self,
        index: usize,
        text: impl Into<String>,
    ) -> SessionResult<EditOutcome> {
        let len = self.messages.len();
        let message = self
            .messages
            .get_mut(index)
            .ok_or(SessionError::MessageIndexOutOfRange { index, len })?;

        if !message.is_user() {
            return Err(SessionError::NotEditable { index });
        }
        if !message.edit(text) {
            return Ok(EditOutcome::Unchanged);
        }
        let prompt = message.text().to_string();

        let reply_index = index + 1;
        match self.messages.get(reply_index) {
            Some(next) if !next.is_user() => {
                let discarded = self.messages.remove(reply_index);
                Ok(EditOutcome::Regenerate(Regeneration {
                    prompt,
                    reply_index,
                    discarded,
                }))
            }
            _ => Ok(EditOutcome::Edited),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_session() -> ChatSession {
        let mut session = ChatSession::new("demo", "Demo");
        session.add_message(Message::user("Hello"));
        session.add_message(Message::assistant("Hi there"));
        session
    }

    #[test]
    fn test_edit_history_is_append_only() {
        let mut message = Message::user("v0");
        for k in 1..=4 {
            assert!(message.edit(format!("v{}", k)));
            assert_eq!(message.edit_history().len(), k);
            assert_eq!(message.edit_history().last().unwrap(), &format!("v{}", k - 1));
            assert!(!message.edit_history().contains(&message.text().to_string()));
        }
        assert_eq!(message.edit_history(), ["v0", "v1", "v2", "v3"]);
        assert_eq!(message.text(), "v4");
    }

    #[test]
    fn test_edit_with_same_text_is_noop() {
        let mut message = Message::user("same");
        assert!(!message.edit("same"));
        assert!(message.edit_history().is_empty());
        assert!(!message.is_edited());
    }

    #[test]
    fn test_edit_user_message_with_reply_regenerates() {
        let mut session = demo_session();

        let outcome = session.edit_message(0, "Hello!").unwrap();
        match outcome {
            EditOutcome::Regenerate(regen) => {
                assert_eq!(regen.prompt, "Hello!");
                assert_eq!(regen.reply_index, 1);
                assert_eq!(regen.discarded.text(), "Hi there");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0].text(), "Hello!");
        assert_eq!(session.messages()[0].edit_history(), ["Hello"]);
    }

    #[test]
    fn test_edit_last_user_message_does_not_regenerate() {
        let mut session = demo_session();
        session.add_message(Message::user("Follow up"));

        let outcome = session.edit_message(2, "Follow up, edited").unwrap();
        assert_eq!(outcome, EditOutcome::Edited);
        assert_eq!(session.len(), 3);
    }

    #[test]
    fn test_edit_user_message_followed_by_user_does_not_regenerate() {
        let mut session = ChatSession::new("s", "S");
        session.add_message(Message::user("one"));
        session.add_message(Message::user("two"));

        assert_eq!(session.edit_message(0, "uno").unwrap(), EditOutcome::Edited);
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn test_edit_assistant_message_is_rejected() {
        let mut session = demo_session();

        let err = session.edit_message(1, "Hi!").unwrap_err();
        assert!(matches!(err, SessionError::NotEditable { index: 1 }));
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[1].text(), "Hi there");
        assert!(session.messages()[1].edit_history().is_empty());
    }

    #[test]
    fn test_edit_out_of_range() {
        let mut session = demo_session();
        let err = session.edit_message(5, "x").unwrap_err();
        assert!(matches!(
            err,
            SessionError::MessageIndexOutOfRange { index: 5, len: 2 }
        ));
    }

    #[test]
    fn test_remove_message_keeps_order() {
        let mut session = ChatSession::new("s", "S");
        for text in ["a", "b", "c", "d"] {
            session.add_message(Message::user(text));
        }

        let removed = session.remove_message(1).unwrap();
        assert_eq!(removed.text(), "b");

        let texts: Vec<_> = session.messages().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["a", "c", "d"]);
        assert!(session.remove_message(10).is_none());
    }

    #[test]
    fn test_insert_message_clamps_index() {
        let mut session = demo_session();
        let at = session.insert_message(99, Message::assistant("tail"));
        assert_eq!(at, 2);
        assert_eq!(session.messages()[2].text(), "tail");
    }

    #[test]
    fn test_author_display() {
        assert_eq!(Message::user("x").author().to_string(), "You");
        assert_eq!(Message::assistant("x").author().to_string(), "AI");
    }
}
