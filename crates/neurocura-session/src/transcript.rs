//! # Transcript Format
//!
//! 纯文本对话记录，每条消息一行：`You: <text>` 或 `AI: <text>`。
//!
//! 导入时以 `You: ` 开头的行是用户消息，其余非空行都是助手消息
//! （开头的 `AI: ` 会被去掉）。

use crate::types::{ChatSession, Message};

/// 用户消息前缀
pub const USER_PREFIX: &str = "You: ";
/// 助手消息前缀
pub const ASSISTANT_PREFIX: &str = "AI: ";

/// 渲染会话为对话记录
pub fn render(session: &ChatSession) -> String {
    let mut out = String::new();
    for message in session.messages() {
        let prefix = if message.is_user() {
            USER_PREFIX
        } else {
            ASSISTANT_PREFIX
        };
        out.push_str(prefix);
        out.push_str(message.text());
        out.push('\n');
    }
    out
}

/// 解析对话记录
pub fn parse(content: &str) -> Vec<Message> {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| match line.strip_prefix(USER_PREFIX) {
            Some(text) => Message::user(text),
            None => Message::assistant(line.strip_prefix(ASSISTANT_PREFIX).unwrap_or(line)),
        })
        .collect()
}
