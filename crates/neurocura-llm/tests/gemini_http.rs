use mockito::Matcher;
use neurocura_llm::{ChatGateway, GeminiProvider, LlmError, ProviderConfig};
use serde_json::json;

const PATH: &str = "/models/gemini-1.5-flash:generateContent";

fn provider(base_url: String) -> GeminiProvider {
    let config = ProviderConfig::new("gemini", base_url)
        .with_model("gemini-1.5-flash")
        .with_system_instruction("You are Neurocura.");
    GeminiProvider::new(config).unwrap()
}

#[tokio::test]
async fn test_successful_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-goog-api-key", "test-key")
        .match_body(Matcher::PartialJson(json!({
            "contents": [{ "role": "user", "parts": [{ "text": "Hello" }] }],
            "generationConfig": { "topK": 64, "maxOutputTokens": 8192 }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{
                    "content": { "role": "model", "parts": [{ "text": "Hi there" }] },
                    "finishReason": "STOP"
                }]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let reply = provider(server.url()).request("Hello", "test-key").await.unwrap();

    assert_eq!(reply, "Hi there");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(403)
        .with_body(r#"{"error":{"code":403,"message":"API key not valid"}}"#)
        .create_async()
        .await;

    let err = provider(server.url()).request("Hello", "bad").await.unwrap_err();
    assert!(matches!(err, LlmError::Auth(message) if message == "API key not valid"));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(429)
        .with_header("retry-after", "12")
        .create_async()
        .await;

    let err = provider(server.url()).request("Hello", "key").await.unwrap_err();
    assert!(matches!(err, LlmError::RateLimited { retry_after: Some(12) }));
}

#[tokio::test]
async fn test_server_error_maps_to_api() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(500)
        .with_body("internal")
        .create_async()
        .await;

    let err = provider(server.url()).request("Hello", "key").await.unwrap_err();
    assert!(matches!(err, LlmError::Api { status: 500, message } if message == "internal"));
}

#[tokio::test]
async fn test_blocked_prompt() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
        .create_async()
        .await;

    let err = provider(server.url()).request("Hello", "key").await.unwrap_err();
    assert!(matches!(err, LlmError::Blocked(_)));
}

#[tokio::test]
async fn test_non_json_body_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", PATH)
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let err = provider(server.url()).request("Hello", "key").await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_unreachable_host_is_network_error() {
    let err = provider("http://127.0.0.1:1".to_string())
        .request("Hello", "key")
        .await
        .unwrap_err();
    assert!(matches!(err, LlmError::Network(_)));
}
