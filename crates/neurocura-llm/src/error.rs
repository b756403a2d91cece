use thiserror::Error;

/// Unified error type for gateway operations
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("api error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("rate limited{}", retry_after.map(|s| format!(", retry after {}s", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("response blocked: {0}")]
    Blocked(String),

    #[error("request aborted: {0}")]
    Aborted(String),

    #[error("transform error: {0}")]
    Transform(#[from] ConversionError),
}

impl LlmError {
    /// Short label for the status line
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Network(_) => "network",
            LlmError::Api { .. } => "api",
            LlmError::Auth(_) => "auth",
            LlmError::RateLimited { .. } => "rate_limited",
            LlmError::Config(_) => "config",
            LlmError::InvalidResponse(_) => "invalid_response",
            LlmError::Blocked(_) => "blocked",
            LlmError::Aborted(_) => "aborted",
            LlmError::Transform(_) => "transform",
        }
    }
}

/// Error during schema transformation
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, LlmError>;
