//! Anthropic Messages API client

use crate::*;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic provider
pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    api_base: String,
    default_model: String,
}

impl AnthropicProvider {
    pub fn new(
        api_key: impl Into<String>,
        api_base: Option<String>,
        default_model: Option<String>,
    ) -> Self {
        let api_base = api_base
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            client: Client::new(),
            api_key: api_key.into(),
            api_base,
            default_model: default_model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Replace the HTTP client with one that gives up after `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let mut body = json!({
            "model": model,
            "messages": &params.messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.system.is_empty() {
            body["system"] = json!(params.system);
        }

        if !params.tools.is_empty() {
            body["tools"] = json!(&params.tools);
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        if !json["content"].is_array() {
            return Err(ProviderError::InvalidResponse);
        }
        let response: ChatResponse = serde_json::from_value(json)?;
        Ok(response)
    }
}

/// Pull the human-readable message out of an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/messages", self.api_base);
        trace!("POST {}", url);
        let body = self.build_request(&params);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        let json: serde_json::Value = response.json().await?;
        let parsed = self.parse_response(json)?;
        log_response(&parsed);
        Ok(parsed)
    }

    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
