use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Chat-style generative endpoint: one free-text prompt in, raw text out,
/// with an optional JSON-mode hint. The pipeline only depends on this
/// trait, so tests inject scripted models.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, prompt: &str, json_mode: bool) -> Result<String, LlmError>;
}

/// Single chokepoint for generative calls. Always returns a string and
/// never an error: transport/model failures come back as an error-shaped
/// payload (`{"error": ...}` in JSON mode, `ERROR: ...` otherwise), which
/// downstream JSON parsing then treats like any other malformed output.
///
/// In JSON mode, output that is not already valid JSON gets a best-effort
/// repair: slice between the first `{` and the last `}`; if that still
/// fails to parse, return the literal empty object.
pub async fn invoke(model: &dyn ChatModel, prompt: &str, json_expected: bool) -> String {
    match model.complete(prompt, json_expected).await {
        Ok(content) => {
            if !json_expected {
                return content;
            }
            if serde_json::from_str::<serde_json::Value>(&content).is_ok() {
                return content;
            }
            match extract_json_object(&content) {
                Some(slice) => slice,
                None => {
                    log::warn!("Model returned unrecoverable non-JSON output");
                    "{}".to_string()
                }
            }
        }
        Err(e) => {
            log::error!("Generative call failed: {e}");
            if json_expected {
                serde_json::json!({ "error": e.to_string() }).to_string()
            } else {
                format!("ERROR: {e}")
            }
        }
    }
}

fn extract_json_object(content: &str) -> Option<String> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end <= start {
        return None;
    }
    let slice = &content[start..=end];
    if serde_json::from_str::<serde_json::Value>(slice).is_ok() {
        Some(slice.to_string())
    } else {
        None
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible chat client.
///
/// Configuration comes from the environment:
/// - `LLM_API_KEY` (required)
/// - `LLM_API_URL` (default: OpenAI chat completions endpoint)
/// - `LLM_MODEL` (default: `gpt-4.1-mini`)
/// - `LLM_TEMPERATURE` (default: 0.2)
/// - `LLM_TIMEOUT_SECS` (default: 60; expiry surfaces as a network error
///   and rides the normal fallback path)
pub struct OpenAiChat {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    pub const DEFAULT_API_URL: &'static str = "https://api.openai.com/v1/chat/completions";
    pub const DEFAULT_MODEL: &'static str = "gpt-4.1-mini";

    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = env::var("LLM_API_KEY")
            .map_err(|_| LlmError::Config("LLM_API_KEY is not set".to_string()))?;
        if api_key.trim().is_empty() {
            return Err(LlmError::Config("LLM_API_KEY is empty".to_string()));
        }

        let api_url =
            env::var("LLM_API_URL").unwrap_or_else(|_| Self::DEFAULT_API_URL.to_string());
        let model = env::var("LLM_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_string());
        let temperature = env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.2);
        let timeout_secs = env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LlmError::Config(format!("HTTP client build failed: {e}")))?;

        log::info!("Chat client ready (model: {model}, endpoint: {api_url})");
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            temperature,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, prompt: &str, json_mode: bool) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
            response_format: json_mode.then(|| serde_json::json!({ "type": "json_object" })),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Network(format!("request timed out: {e}"))
                } else {
                    LlmError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| LlmError::Parse("no choices in response".to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::ScriptedModel;
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn valid_json_passes_through_untouched() {
        let model = ScriptedModel::replying(r#"{"mechanisms": []}"#);
        let out = invoke(&model, "p", true).await;
        assert_eq!(out, r#"{"mechanisms": []}"#);
    }

    #[tokio::test]
    async fn json_wrapped_in_prose_is_sliced_out() {
        let model = ScriptedModel::replying("Sure, here you go:\n{\"a\": 1}\nHope that helps!");
        let out = invoke(&model, "p", true).await;
        assert_eq!(out, r#"{"a": 1}"#);
    }

    #[tokio::test]
    async fn unrecoverable_output_becomes_empty_object() {
        let model = ScriptedModel::replying("not json at all");
        let out = invoke(&model, "p", true).await;
        assert_eq!(out, "{}");
    }

    #[tokio::test]
    async fn transport_failure_becomes_error_payload() {
        let model = ScriptedModel::new(vec![Err(LlmError::Network("timeout".to_string()))]);
        let out = invoke(&model, "p", true).await;
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert!(value["error"].as_str().unwrap().contains("timeout"));
    }

    #[tokio::test]
    async fn prose_mode_failure_uses_error_prefix() {
        let model = ScriptedModel::new(vec![Err(LlmError::Network("down".to_string()))]);
        let out = invoke(&model, "p", false).await;
        assert!(out.starts_with("ERROR: "));
    }

    #[tokio::test]
    async fn prose_mode_passes_text_through() {
        let model = ScriptedModel::replying("plain answer");
        let out = invoke(&model, "p", false).await;
        assert_eq!(out, "plain answer");
    }
}
