pub mod gemini;

pub use gemini::GeminiTransformer;

use serde_json::Value;

use crate::error::{ConversionError, Result};

/// Converts prompts to a provider's wire format and replies back to text
pub trait SchemaTransformer: Send + Sync {
    /// Get the provider ID
    fn provider_id(&self) -> &str;

    /// Build the request body for a single-turn prompt
    fn transform_request(&self, prompt: &str) -> std::result::Result<Value, ConversionError>;

    /// Extract the reply text from a complete response
    fn parse_response(&self, data: &Value) -> Result<String>;

    /// Extract a human readable message from an error body
    fn parse_error(&self, body: &str) -> String {
        body.to_string()
    }
}
