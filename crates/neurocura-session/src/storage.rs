//! # Storage Traits
//!
//! 定义会话记录的存储接口。每个会话对应一条独立的记录，保存即整体覆盖。

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SessionResult;
use crate::record::SessionRecord;

/// 单个文件加载失败的信息
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// 出错的文件
    pub path: PathBuf,
    /// 失败原因
    pub reason: String,
}

impl std::fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}

/// 全量扫描的结果
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// 成功解析的记录
    pub records: Vec<SessionRecord>,
    /// 被跳过的文件
    pub failures: Vec<LoadFailure>,
}

/// 会话存储 trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 保存会话记录（完整替换）
    async fn save_record(&self, record: &SessionRecord) -> SessionResult<()>;

    /// 加载会话记录，不存在时返回 `None`
    async fn load_record(&self, session_id: &str) -> SessionResult<Option<SessionRecord>>;

    /// 删除会话记录
    ///
    /// 返回是否真的删除了内容；记录不存在不是错误。
    async fn delete_record(&self, session_id: &str) -> SessionResult<bool>;

    /// 检查会话记录是否存在
    async fn record_exists(&self, session_id: &str) -> SessionResult<bool>;

    /// 扫描全部记录
    ///
    /// 单条记录的读取或解析失败只记入 `failures`，不会中断扫描。
    async fn scan(&self) -> SessionResult<ScanOutcome>;
}
