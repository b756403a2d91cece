use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, warn};

use crate::auth::ApiKeyAuth;
use crate::error::{LlmError, Result};
use crate::provider::{ChatGateway, ProviderConfig};
use crate::transformer::{GeminiTransformer, SchemaTransformer};

/// Gemini provider
///
/// Sends every prompt as a fresh single-turn `generateContent` call. No
/// retries are attempted.
pub struct GeminiProvider {
    config: ProviderConfig,
    http_client: Client,
    transformer: GeminiTransformer,
}

impl GeminiProvider {
    /// Create a provider from configuration
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        let transformer =
            GeminiTransformer::new(config.generation.clone(), config.system_instruction.clone());

        Ok(Self {
            config,
            http_client,
            transformer,
        })
    }

    /// Get the config
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn build_headers(&self, credentials: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let (name, value) = ApiKeyAuth::new(credentials).auth_header()?;
        headers.insert(name, value);

        for (key, value) in &self.config.headers {
            let header_name = header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| LlmError::Config(format!("Invalid header name: {}", e)))?;
            let header_value = header::HeaderValue::from_str(value)
                .map_err(|e| LlmError::Config(format!("Invalid header value: {}", e)))?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }

    fn status_error(&self, status: StatusCode, retry_after: Option<u64>, body: &str) -> LlmError {
        let message = self.transformer.parse_error(body);
        match status.as_u16() {
            401 | 403 => LlmError::Auth(message),
            429 => LlmError::RateLimited { retry_after },
            code => LlmError::Api {
                status: code,
                message,
            },
        }
    }
}

#[async_trait]
impl ChatGateway for GeminiProvider {
    fn provider_id(&self) -> &str {
        self.transformer.provider_id()
    }

    async fn request(&self, prompt: &str, credentials: &str) -> Result<String> {
        let headers = self.build_headers(credentials)?;
        let body = self.transformer.transform_request(prompt)?;
        let url = self.config.endpoint();

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Sending generateContent request");

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Gemini request failed");
            return Err(self.status_error(status, retry_after, &error_text));
        }

        let response_data: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        self.transformer.parse_response(&response_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_provider() {
        let provider = GeminiProvider::new(ProviderConfig::default()).unwrap();
        assert_eq!(provider.provider_id(), "gemini");
        assert_eq!(provider.config().model, "gemini-1.5-flash");
    }

    #[test]
    fn test_status_error_mapping() {
        let provider = GeminiProvider::new(ProviderConfig::default()).unwrap();

        assert!(matches!(
            provider.status_error(StatusCode::FORBIDDEN, None, "denied"),
            LlmError::Auth(_)
        ));
        assert!(matches!(
            provider.status_error(StatusCode::TOO_MANY_REQUESTS, Some(7), ""),
            LlmError::RateLimited { retry_after: Some(7) }
        ));
        assert!(matches!(
            provider.status_error(StatusCode::INTERNAL_SERVER_ERROR, None, "boom"),
            LlmError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_invalid_custom_header() {
        let config = ProviderConfig::default().with_header("bad header", "x");
        let provider = GeminiProvider::new(config).unwrap();
        assert!(matches!(
            provider.build_headers("key"),
            Err(LlmError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let config = ProviderConfig::new("gemini", "http://127.0.0.1:9");
        let provider = GeminiProvider::new(config).unwrap();

        let err = provider.request("Hello", "").await.unwrap_err();
        assert!(matches!(err, LlmError::Auth(_)));
    }
}
