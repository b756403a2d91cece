pub mod config;
pub mod manager;

pub use config::{
    Config, ConfigError, ConfigResult, GenerationSettings, LlmConfig, LogLevel, LoggingConfig,
    StorageConfig, DEFAULT_SYSTEM_INSTRUCTION,
};
pub use manager::ConfigManager;

use std::path::PathBuf;

/// 获取 Neurocura 数据目录路径
pub fn neurocura_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".neurocura"))
}

/// 获取默认配置文件路径
pub fn default_config_path() -> Option<PathBuf> {
    neurocura_dir().map(|dir| dir.join("config.json"))
}

/// 展开路径中的 ~ 为用户主目录
pub fn expand_tilde(path: &str) -> Option<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None if path == "~" => dirs::home_dir(),
        None => Some(PathBuf::from(path)),
    }
}
