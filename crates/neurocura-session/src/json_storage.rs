//! # JsonFileStore Implementation
//!
//! 基于 JSON 文件的会话持久化存储实现。
//!
//! 存储结构:
//! ```text
//! <base_path>/
//! ├── <session_id>.json      # 会话元数据和消息
//! └── ...
//! ```
//!
//! 写入时先写临时文件再重命名，避免半写的会话文件。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::error::SessionResult;
use crate::record::SessionRecord;
use crate::storage::{LoadFailure, ScanOutcome, SessionStore};

/// JsonFileStore 配置
#[derive(Debug, Clone)]
pub struct JsonFileStoreConfig {
    /// 存储目录（支持 `~`）
    pub base_path: PathBuf,
    /// 是否使用缩进格式写入
    pub pretty: bool,
}

impl JsonFileStoreConfig {
    /// 创建默认配置
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            pretty: true,
        }
    }

    /// 使用紧凑格式写入
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

impl Default for JsonFileStoreConfig {
    fn default() -> Self {
        Self::new("~/.neurocura/sessions")
    }
}

/// JsonFileStore 实现
pub struct JsonFileStore {
    config: JsonFileStoreConfig,
    sessions_path: PathBuf,
}

impl JsonFileStore {
    /// 创建新的 JsonFileStore 实例，目录不存在时自动创建
    pub async fn new(config: JsonFileStoreConfig) -> SessionResult<Self> {
        let base_path_str = config.base_path.to_string_lossy().to_string();
        let sessions_path = PathBuf::from(shellexpand::tilde(&base_path_str).as_ref());

        fs::create_dir_all(&sessions_path).await?;

        info!("JsonFileStore initialized at {:?}", sessions_path);

        Ok(Self {
            config,
            sessions_path,
        })
    }

    /// 存储目录
    pub fn path(&self) -> &Path {
        &self.sessions_path
    }

    /// 获取会话文件路径
    ///
    /// 文件名由 id 确定性地生成，`[A-Za-z0-9_-]` 以外的字符替换为 `_`。
    pub fn session_file_path(&self, session_id: &str) -> PathBuf {
        self.sessions_path
            .join(format!("{}.json", file_stem_for(session_id)))
    }

    async fn read_record(path: &Path) -> SessionResult<SessionRecord> {
        let content = fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

fn file_stem_for(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn save_record(&self, record: &SessionRecord) -> SessionResult<()> {
        let path = self.session_file_path(&record.id);
        let content = if self.config.pretty {
            serde_json::to_string_pretty(record)?
        } else {
            serde_json::to_string(record)?
        };

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &path).await?;

        debug!("Saved session: {}", record.id);
        Ok(())
    }

    async fn load_record(&self, session_id: &str) -> SessionResult<Option<SessionRecord>> {
        let path = self.session_file_path(session_id);
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Self::read_record(&path).await.map(Some)
    }

    async fn delete_record(&self, session_id: &str) -> SessionResult<bool> {
        let path = self.session_file_path(session_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted session file: {:?}", path);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn record_exists(&self, session_id: &str) -> SessionResult<bool> {
        Ok(fs::try_exists(self.session_file_path(session_id)).await?)
    }

    async fn scan(&self) -> SessionResult<ScanOutcome> {
        let mut entries = fs::read_dir(&self.sessions_path).await?;
        let mut outcome = ScanOutcome::default();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            match Self::read_record(&path).await {
                Ok(record) if path != self.session_file_path(&record.id) => {
                    warn!("Session file {:?} holds id {}, skipping", path, record.id);
                    outcome.failures.push(LoadFailure {
                        reason: format!("session id '{}' does not match the file name", record.id),
                        path,
                    });
                }
                Ok(record) => outcome.records.push(record),
                Err(e) => {
                    warn!("Failed to load session file {:?}: {}", path, e);
                    outcome.failures.push(LoadFailure {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Scanned {} session files ({} failed)",
            outcome.records.len() + outcome.failures.len(),
            outcome.failures.len()
        );
        Ok(outcome)
    }
}
