//! # Session Manager
//!
//! 管理全部会话的内存副本，并与存储保持一致。
//!
//! - 启动时全量扫描存储目录，把所有会话加载到内存
//! - 每个修改操作之后立即调用 `persist`/`delete`，没有自动保存和延迟写入
//! - 单个文件加载失败只会被跳过并报告，不影响其他会话
//! - 保存、创建、删除失败一律返回给调用方

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::storage::{LoadFailure, SessionStore};
use crate::transcript;
use crate::types::ChatSession;

/// `load_all` 的结果
#[derive(Debug, Default)]
pub struct LoadReport {
    /// 成功加载的会话 ID
    pub loaded: Vec<String>,
    /// 被跳过的文件
    pub failures: Vec<LoadFailure>,
}

impl LoadReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// SessionManager
///
/// 独占所有 `ChatSession` 及其文件；界面层只持有当前会话的 ID。
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    /// 内存会话表
    sessions: HashMap<String, ChatSession>,
}

impl SessionManager {
    /// 创建空的 SessionManager（不读取存储）
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            sessions: HashMap::new(),
        }
    }

    /// 创建 SessionManager 并加载存储中的全部会话
    pub async fn open(store: Arc<dyn SessionStore>) -> SessionResult<(Self, LoadReport)> {
        let mut manager = Self::new(store);
        let report = manager.load_all().await?;
        Ok((manager, report))
    }

    /// 全量加载存储目录，替换内存会话表
    ///
    /// 无法解析的文件被跳过并记入报告。
    pub async fn load_all(&mut self) -> SessionResult<LoadReport> {
        let outcome = self.store.scan().await?;

        let mut sessions = HashMap::with_capacity(outcome.records.len());
        let mut loaded = Vec::with_capacity(outcome.records.len());
        for record in outcome.records {
            let session = ChatSession::from_record(record);
            if sessions.contains_key(session.id()) {
                warn!("Duplicate session id in storage, skipping: {}", session.id());
                continue;
            }
            loaded.push(session.id().to_string());
            sessions.insert(session.id().to_string(), session);
        }
        self.sessions = sessions;

        info!(
            "Loaded {} sessions ({} files skipped)",
            loaded.len(),
            outcome.failures.len()
        );

        Ok(LoadReport {
            loaded,
            failures: outcome.failures,
        })
    }

    /// 创建新会话
    ///
    /// 未指定标题时使用当前时间生成；创建后立即保存。
    pub async fn create(&mut self, title: Option<String>) -> SessionResult<ChatSession> {
        let session_id = self.fresh_id().await?;
        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(ChatSession::default_title);

        let session = ChatSession::new(&session_id, title);
        self.store.save_record(&session.to_record()).await?;
        self.sessions.insert(session_id, session.clone());

        info!("Created session: {}", session.id());
        Ok(session)
    }

    /// 生成在内存和存储中都不存在的 ID
    async fn fresh_id(&self) -> SessionResult<String> {
        loop {
            let id = uuid::Uuid::new_v4().to_string();
            if !self.sessions.contains_key(&id) && !self.store.record_exists(&id).await? {
                return Ok(id);
            }
            debug!("Session id collision, drawing again: {}", id);
        }
    }

    /// 保存会话（完整替换），并登记到内存会话表
    pub async fn save(&mut self, session: ChatSession) -> SessionResult<()> {
        self.store.save_record(&session.to_record()).await?;
        debug!("Saved session: {}", session.id());
        self.sessions.insert(session.id().to_string(), session);
        Ok(())
    }

    /// 把内存中会话的当前状态写入存储
    pub async fn persist(&self, session_id: &str) -> SessionResult<()> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or_else(|| SessionError::not_found(session_id))?;
        self.store.save_record(&session.to_record()).await?;
        debug!("Persisted session: {}", session_id);
        Ok(())
    }

    /// 从存储重新加载会话
    ///
    /// 不要求会话已在内存中；加载成功后刷新内存副本。
    /// 文件中记录的 id 与请求的 id 不一致时跳过，返回 `None`。
    pub async fn load(&mut self, session_id: &str) -> SessionResult<Option<ChatSession>> {
        match self.store.load_record(session_id).await? {
            Some(record) if record.id != session_id => {
                warn!(
                    "Session file for {} holds id {}, skipping",
                    session_id, record.id
                );
                Ok(None)
            }
            Some(record) => {
                let session = ChatSession::from_record(record);
                self.sessions
                    .insert(session_id.to_string(), session.clone());
                debug!("Loaded session from storage: {}", session_id);
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    /// 删除会话（内存和文件）
    ///
    /// 未知 ID 不是错误，返回 `false`。
    pub async fn delete(&mut self, session_id: &str) -> SessionResult<bool> {
        let removed_file = self.store.delete_record(session_id).await?;
        let removed_entry = self.sessions.remove(session_id).is_some();

        if removed_file || removed_entry {
            info!("Deleted session: {}", session_id);
        }
        Ok(removed_file || removed_entry)
    }

    /// 获取会话
    pub fn get(&self, session_id: &str) -> Option<&ChatSession> {
        self.sessions.get(session_id)
    }

    /// 获取会话的可变引用；修改后需调用 `persist`
    pub fn get_mut(&mut self, session_id: &str) -> Option<&mut ChatSession> {
        self.sessions.get_mut(session_id)
    }

    /// 获取会话，不存在时返回错误
    pub fn require(&self, session_id: &str) -> SessionResult<&ChatSession> {
        self.get(session_id)
            .ok_or_else(|| SessionError::not_found(session_id))
    }

    /// 获取会话的可变引用，不存在时返回错误
    pub fn require_mut(&mut self, session_id: &str) -> SessionResult<&mut ChatSession> {
        self.get_mut(session_id)
            .ok_or_else(|| SessionError::not_found(session_id))
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// 列出会话，最新创建的在前
    pub fn list(&self) -> Vec<&ChatSession> {
        let mut sessions: Vec<_> = self.sessions.values().collect();
        sessions.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        sessions
    }

    /// 内存中的会话数量
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// 把会话导出为纯文本对话记录
    pub async fn export_transcript(&self, session_id: &str, path: &Path) -> SessionResult<()> {
        let session = self.require(session_id)?;
        let content = transcript::render(session);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;

        info!("Exported session {} to {:?}", session_id, path);
        Ok(())
    }

    /// 从纯文本对话记录导入，每次导入都创建一个新会话
    pub async fn import_transcript(&mut self, path: &Path) -> SessionResult<ChatSession> {
        let content = tokio::fs::read_to_string(path).await?;
        let messages = transcript::parse(&content);

        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .filter(|s| !s.is_empty());

        let session_id = self.fresh_id().await?;
        let mut session = ChatSession::new(
            session_id,
            title.unwrap_or_else(ChatSession::default_title),
        );
        for message in messages {
            session.add_message(message);
        }

        self.save(session.clone()).await?;
        info!(
            "Imported {} messages from {:?} into session {}",
            session.len(),
            path,
            session.id()
        );
        Ok(session)
    }
}
