//! 结构化日志模块
//!
//! 提供基于 tracing 的结构化日志功能。日志文件按天滚动，经非阻塞 writer 写出。
//! 终端归界面所有，所以从不向控制台输出；未配置日志文件时不记录日志。

use std::path::{Path, PathBuf};

use neurocura_config::LoggingConfig;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::MakeWriter, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{ObservabilityError, Result};

/// 日志管理器
///
/// 持有文件 writer 的 guard；drop 时会刷新尚未写出的日志。
pub struct LogManager {
    config: LoggingConfig,
    log_file: Option<PathBuf>,
    _guard: Option<WorkerGuard>,
}

impl std::fmt::Debug for LogManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogManager")
            .field("level", &self.config.level)
            .field("log_file", &self.log_file)
            .field("json_format", &self.config.json_format)
            .finish()
    }
}

impl LogManager {
    /// 初始化全局日志系统
    ///
    /// 进程内只能成功调用一次。
    pub async fn init(config: &LoggingConfig) -> Result<Self> {
        let filter = build_filter(config)?;

        let log_file = match config.file.as_deref() {
            Some(path) => Some(resolve_log_file(path)?),
            None => None,
        };

        let (file_layer, guard) = match log_file.as_deref() {
            Some(path) => {
                let (directory, prefix) = split_log_file(path)?;
                tokio::fs::create_dir_all(&directory).await?;
                let appender = tracing_appender::rolling::daily(directory, prefix);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                (Some(fmt_layer(writer, config.json_format)), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .try_init()
            .map_err(|e| ObservabilityError::init(format!("Failed to install subscriber: {}", e)))?;

        tracing::info!(
            target: "neurocura_observability",
            "Log manager initialized with level: {}",
            config.level
        );

        Ok(Self {
            config: config.clone(),
            log_file,
            _guard: guard,
        })
    }

    /// 日志文件路径（滚动前的基础名）
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

fn fmt_layer<S, W>(writer: W, json: bool) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_line_number(true)
        .with_ansi(false);

    if json {
        layer.json().boxed()
    } else {
        layer.boxed()
    }
}

/// 构建环境过滤器
///
/// `RUST_LOG` 存在时优先使用，否则使用配置的级别和模块覆盖。
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(config.level.as_str())
        .map_err(|e| ObservabilityError::logging(format!("Invalid log level: {}", e)))?;

    for (module, level) in &config.module_levels {
        filter = filter.add_directive(
            format!("{}={}", module, level)
                .parse()
                .map_err(|e| ObservabilityError::logging(format!("Invalid directive: {}", e)))?,
        );
    }

    Ok(filter)
}

fn resolve_log_file(path: &str) -> Result<PathBuf> {
    neurocura_config::expand_tilde(path)
        .ok_or_else(|| ObservabilityError::config("Could not find home directory"))
}

fn split_log_file(path: &Path) -> Result<(PathBuf, String)> {
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ObservabilityError::config(format!("Invalid log file path: {:?}", path)))?
        .to_string();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, prefix))
}

/// 创建带有会话上下文的 span
pub fn create_session_span(session_id: &str, request_id: Option<&str>) -> tracing::Span {
    if let Some(req_id) = request_id {
        tracing::info_span!(
            "session",
            session_id = %session_id,
            request_id = %req_id,
        )
    } else {
        tracing::info_span!(
            "session",
            session_id = %session_id,
        )
    }
}
