use reqwest::header::{HeaderName, HeaderValue};

use crate::error::{LlmError, Result};

/// Header carrying the Gemini API key
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// API key authenticator
#[derive(Clone)]
pub struct ApiKeyAuth {
    api_key: String,
}

impl std::fmt::Debug for ApiKeyAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuth").field("api_key", &"***").finish()
    }
}

impl ApiKeyAuth {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Build the authentication header
    ///
    /// A blank key is rejected here, so a missing credential only surfaces
    /// when a request is actually made.
    pub fn auth_header(&self) -> Result<(HeaderName, HeaderValue)> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(LlmError::Auth("API key is not set".to_string()));
        }

        let mut value = HeaderValue::from_str(key)
            .map_err(|e| LlmError::Auth(format!("Invalid API key: {}", e)))?;
        value.set_sensitive(true);

        Ok((HeaderName::from_static(API_KEY_HEADER), value))
    }
}
