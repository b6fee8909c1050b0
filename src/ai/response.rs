use serde::{Deserialize, Serialize};

use super::error::AIError;

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    pub fn parse(body: &str) -> Result<Self, AIError> {
        serde_json::from_str(body).map_err(|e| {
            AIError::ParseError(format!(
                "Failed to parse chat completion: {} - Raw response: {}",
                e,
                body.chars().take(200).collect::<String>()
            ))
        })
    }

    /// Trimmed text of `choices[0].message.content`.
    pub fn into_answer(self) -> Result<String, AIError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::ParseError("Response contained no choices".to_string()))?;

        let content = choice
            .message
            .content
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(AIError::ParseError("Response message was empty".to_string()));
        }
        Ok(content)
    }
}
