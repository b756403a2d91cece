mod config;

pub use config::{GenerationConfig, ProviderConfig};

use async_trait::async_trait;

use crate::error::Result;

/// Gateway to a text generation backend
///
/// One prompt in, exactly one reply or one error out. Each call is a fresh
/// single-turn exchange.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Send a prompt and wait for the complete reply
    async fn request(&self, prompt: &str, credentials: &str) -> Result<String>;
}
