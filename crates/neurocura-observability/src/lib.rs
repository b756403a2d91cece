//! Neurocura Observability
//!
//! 统一的结构化日志初始化。

pub mod error;
pub mod logging;

pub use error::{ObservabilityError, Result};
pub use logging::{build_filter, create_session_span, LogManager};

