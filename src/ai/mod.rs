use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::{debug, warn};

mod error;
mod response;

use crate::config::AIConfig;
pub use error::{AIError, REMOTE_ERROR_PREFIX};
use response::{ChatMessage, ChatRequest, ChatResponse};

/// Something that can explain an error text. The orchestrator only sees this seam.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, error_text: &str) -> Result<String, AIError>;
}

/// Single-attempt client for an OpenAI-compatible chat-completion endpoint.
pub struct ChatCompletionClient {
    config: AIConfig,
    client: reqwest::Client,
}

impl ChatCompletionClient {
    pub fn new(config: AIConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap, AIError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AIError::ConfigMissing(format!("Invalid API key: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl Analyzer for ChatCompletionClient {
    async fn analyze(&self, error_text: &str) -> Result<String, AIError> {
        let api_key = self.config.credential().ok_or_else(|| {
            AIError::ConfigMissing(
                "API key not set. Cannot use fallback analysis.".to_string(),
            )
        })?;

        let prompt = format_prompt(error_text);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            url = %self.config.api_url,
            model = %self.config.model,
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .headers(self.headers(api_key)?)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            let detail = format!("status {} - Response: {}", status, error_body);
            warn!(%status, "chat completion failed");
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => AIError::RateLimitError(detail),
                StatusCode::UNAUTHORIZED => AIError::AuthenticationError(detail),
                _ => AIError::APIError(format!("Unexpected {}", detail)),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AIError::NetworkError(format!("Failed to read response body: {}", e)))?;

        ChatResponse::parse(&body)?.into_answer()
    }
}

pub fn format_prompt(error_text: &str) -> String {
    format!(
        "You are an expert in computational chemistry.\n\
         A Gaussian job failed with this error log or message:\n\
         \"{}\"\n\
         \n\
         Explain what went wrong and suggest a fix in 3-4 sentences.\n",
        error_text
    )
}
