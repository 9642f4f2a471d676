use async_trait::async_trait;
use serde_json::json;

use crate::{ChatRequest, ChatResponse, ChatProvider};
use squeeze_types::SqueezeError;

// ---------------------------------------------------------------------------
// OpenAiChat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OpenAiChat {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
    default_model: String,
}

impl OpenAiChat {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            base_url: "https://api.openai.com".to_string(),
            default_model: "gpt-4o-mini".to_string(),
        }
    }

    pub fn from_env() -> Result<Self, SqueezeError> {
        let key = std::env::var("OPENAI_API_KEY").map_err(|_| SqueezeError::AuthError {
            provider: "openai".into(),
        })?;
        Ok(Self::new(key))
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    /// Generate a single image and return its URL.
    ///
    /// `size` is the literal API size string, e.g. `"1792x1024"`.
    pub async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, SqueezeError> {
        let url = format!("{}/v1/images/generations", self.base_url);
        let body = json!({
            "prompt": prompt,
            "size": size,
            "n": 1,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SqueezeError::Provider {
                provider: "openai".into(),
                status: 0,
                message: format!("request failed: {e}"),
                retryable: true,
            })?;

        let status = resp.status();
        let response_body = resp.text().await.map_err(|e| SqueezeError::Provider {
            provider: "openai".into(),
            status: 0,
            message: format!("failed to read response body: {e}"),
            retryable: true,
        })?;

        if !status.is_success() {
            return Err(map_error(status, &response_body));
        }

        let parsed: serde_json::Value = serde_json::from_str(&response_body)?;
        parse_image_response(&parsed)
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, SqueezeError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.build_request_body(request);

        tracing::debug!(model = %request.model, "Sending chat completion request");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SqueezeError::Provider {
                provider: "openai".into(),
                status: 0,
                message: format!("request failed: {e}"),
                retryable: true,
            })?;

        let status = resp.status();
        let response_body = resp.text().await.map_err(|e| SqueezeError::Provider {
            provider: "openai".into(),
            status: 0,
            message: format!("failed to read response body: {e}"),
            retryable: true,
        })?;

        if !status.is_success() {
            return Err(map_error(status, &response_body));
        }

        let parsed: serde_json::Value = serde_json::from_str(&response_body)?;
        parse_chat_response(&parsed)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

fn parse_chat_response(body: &serde_json::Value) -> Result<ChatResponse, SqueezeError> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| SqueezeError::Provider {
            provider: "openai".into(),
            status: 200,
            message: "response missing choices[0].message.content".into(),
            retryable: false,
        })?
        .to_string();
    let model = body["model"].as_str().unwrap_or("").to_string();
    Ok(ChatResponse { text, model })
}

fn parse_image_response(body: &serde_json::Value) -> Result<String, SqueezeError> {
    body["data"][0]["url"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| SqueezeError::Provider {
            provider: "openai".into(),
            status: 200,
            message: "image response missing data[0].url".into(),
            retryable: false,
        })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn map_error(status: reqwest::StatusCode, body: &str) -> SqueezeError {
    let status_u16 = status.as_u16();
    match status_u16 {
        429 => {
            let retry_ms = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v["error"]["retry_after"].as_f64())
                .map(|s| (s * 1000.0) as u64)
                .unwrap_or(1000);
            SqueezeError::RateLimited {
                provider: "openai".into(),
                retry_after_ms: retry_ms,
            }
        }
        401 => SqueezeError::AuthError {
            provider: "openai".into(),
        },
        500 | 502 | 503 => SqueezeError::Provider {
            provider: "openai".into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: true,
        },
        _ => SqueezeError::Provider {
            provider: "openai".into(),
            status: status_u16,
            message: extract_error_message(body),
            retryable: false,
        },
    }
}

fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(String::from))
        .unwrap_or_else(|| body.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
