use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 主配置结构体
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub version: String,
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            llm: LlmConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// 默认系统提示词
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are Neurocura, a supportive AI assistant specializing in neurological and cognitive health \
information. You help healthcare professionals and general users understand brain health, \
cognitive wellness and neurological conditions.

Explain neurological topics in clear, accessible language and adjust the level of detail to the \
user's background. Share evidence-based information, practical brain-health strategies and \
resources for further learning. Help users prepare questions for their healthcare providers and \
explain medical terminology.

You are an educational tool, not a diagnostic system. You cannot diagnose conditions, prescribe \
treatments or give personalized medical advice. Always encourage consulting a healthcare provider, \
and tell users that emergencies require immediate medical attention.";

/// LLM 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmConfig {
    /// 提供方 ID
    pub provider: String,
    /// API 根地址
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// 保存 API 密钥的环境变量名
    pub api_key_env: String,
    /// 请求超时（秒）
    pub timeout_seconds: u64,
    /// 生成参数（运行时不可修改）
    pub generation: GenerationSettings,
    /// 系统提示词
    pub system_instruction: String,
    /// 额外的请求头
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_seconds: 120,
            generation: GenerationSettings::default(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            headers: HashMap::new(),
        }
    }
}

impl LlmConfig {
    /// 从环境变量读取 API 密钥
    ///
    /// 启动时不校验；缺失时在第一次请求时才报错。
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }
}

/// 生成参数
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationSettings {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub response_mime_type: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            response_mime_type: "text/plain".to_string(),
        }
    }
}

/// Storage 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// 会话目录
    pub path: String,
    /// 是否以缩进格式写入会话文件
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_pretty() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "~/.neurocura/sessions".to_string(),
            pretty: true,
        }
    }
}

/// 日志级别
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> ConfigResult<Self> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::Validation(format!("Invalid log level: {}", s))),
        }
    }
}

/// Logging 配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// 日志文件路径；按天滚动，实际文件名带日期后缀
    pub file: Option<String>,
    /// 是否输出 JSON 格式
    #[serde(default)]
    pub json_format: bool,
    /// 模块级别覆盖，例如 `{"reqwest": "warn"}`
    #[serde(default)]
    pub module_levels: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: Some("~/.neurocura/logs/neurocura.log".to_string()),
            json_format: false,
            module_levels: HashMap::from([
                ("hyper".to_string(), "warn".to_string()),
                ("reqwest".to_string(), "warn".to_string()),
            ]),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.model, "gemini-1.5-flash");
        assert_eq!(config.llm.api_key_env, "API_KEY");
        assert_eq!(config.llm.generation.top_k, 64);
        assert_eq!(config.llm.generation.max_output_tokens, 8192);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("WARNING".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("debug".parse::<LogLevel>().unwrap().to_string(), "debug");
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_optional_logging_fields_default() {
        let json = r#"{ "level": "error", "file": null }"#;
        let logging: LoggingConfig = serde_json::from_str(json).unwrap();
        assert_eq!(logging.level, LogLevel::Error);
        assert!(!logging.json_format);
        assert!(logging.module_levels.is_empty());
    }
}
