use serde_json::{json, Value};

use crate::error::{ConversionError, LlmError, Result};
use crate::provider::GenerationConfig;
use crate::transformer::SchemaTransformer;

/// Gemini `generateContent` schema transformer
#[derive(Debug, Clone)]
pub struct GeminiTransformer {
    generation: GenerationConfig,
    system_instruction: String,
}

impl GeminiTransformer {
    pub fn new(generation: GenerationConfig, system_instruction: impl Into<String>) -> Self {
        Self {
            generation,
            system_instruction: system_instruction.into(),
        }
    }

    fn block_reason(data: &Value) -> Option<&str> {
        data.pointer("/promptFeedback/blockReason")
            .and_then(Value::as_str)
    }
}

impl SchemaTransformer for GeminiTransformer {
    fn provider_id(&self) -> &str {
        "gemini"
    }

    fn transform_request(&self, prompt: &str) -> std::result::Result<Value, ConversionError> {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
            "generationConfig": serde_json::to_value(&self.generation)?,
        });

        if !self.system_instruction.is_empty() {
            body["systemInstruction"] = json!({
                "parts": [{ "text": self.system_instruction }],
            });
        }

        Ok(body)
    }

    fn parse_response(&self, data: &Value) -> Result<String> {
        if let Some(reason) = Self::block_reason(data) {
            return Err(LlmError::Blocked(reason.to_string()));
        }

        let candidate = data
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first())
            .ok_or_else(|| LlmError::InvalidResponse("response has no candidates".to_string()))?;

        let text: String = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(Value::as_str))
                    .collect()
            })
            .unwrap_or_default();

        if !text.is_empty() {
            return Ok(text);
        }

        match candidate.get("finishReason").and_then(Value::as_str) {
            Some(reason @ ("SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT")) => {
                Err(LlmError::Blocked(reason.to_string()))
            }
            _ => Err(LlmError::InvalidResponse(
                "candidate has no text".to_string(),
            )),
        }
    }

    fn parse_error(&self, body: &str) -> String {
        serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.to_string())
    }
}
