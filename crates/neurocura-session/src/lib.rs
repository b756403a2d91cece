//! # Neurocura Session Storage
//!
//! Neurocura 聊天会话模型与持久化存储。
//!
//! ## 功能特性
//!
//! - **消息模型**：文本、作者标记、只追加的编辑历史
//! - **会话模型**：有序消息列表、标题、创建时间，可与 JSON 记录互转
//! - **编辑与再生成**：编辑用户消息时丢弃紧随其后的旧回复
//! - **会话管理**：内存会话表与磁盘文件一一对应，每次修改立即保存
//! - **对话记录**：纯文本导入/导出
//!
//! ## 存储结构
//!
//! ```text
//! <base_path>/
//! ├── <session_id>.json      # 会话元数据和消息
//! └── ...
//! ```
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use neurocura_session::{JsonFileStore, JsonFileStoreConfig, Message, SessionManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonFileStore::new(JsonFileStoreConfig::new("~/.neurocura/sessions")).await?;
//!     let (mut manager, report) = SessionManager::open(Arc::new(store)).await?;
//!     for failure in &report.failures {
//!         eprintln!("skipped {}", failure);
//!     }
//!
//!     let session = manager.create(Some("Demo".to_string())).await?;
//!     manager.require_mut(session.id())?.add_message(Message::user("Hello"));
//!     manager.persist(session.id()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod json_storage;
pub mod record;
pub mod session_manager;
pub mod storage;
pub mod transcript;
pub mod types;

// 重新导出主要类型
pub use error::{SessionError, SessionResult};
pub use json_storage::{JsonFileStore, JsonFileStoreConfig};
pub use record::{MessageRecord, SessionRecord};
pub use session_manager::{LoadReport, SessionManager};
pub use storage::{LoadFailure, ScanOutcome, SessionStore};
pub use types::{Author, ChatSession, EditOutcome, Message, Regeneration};
