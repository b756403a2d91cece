pub mod auth;
pub mod error;
pub mod provider;
pub mod providers;
pub mod transformer;

pub use auth::ApiKeyAuth;
pub use error::{ConversionError, LlmError, Result};
pub use provider::{ChatGateway, GenerationConfig, ProviderConfig};
pub use providers::GeminiProvider;
pub use transformer::{GeminiTransformer, SchemaTransformer};

use std::sync::Arc;

/// Build the gateway named by `config.provider_id`
pub fn create_gateway(config: ProviderConfig) -> Result<Arc<dyn ChatGateway>> {
    match config.provider_id.as_str() {
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        other => Err(LlmError::Config(format!("Unknown provider: {}", other))),
    }
}
