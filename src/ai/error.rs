use serde_json::Error as JsonError;
use std::fmt;

/// Every failure displays with this prefix so a rendered answer can be told apart from an error.
pub const REMOTE_ERROR_PREFIX: &str = "Error calling remote model:";

#[derive(Debug, Clone, PartialEq)]
pub enum AIError {
    ConfigMissing(String),
    NetworkError(String),
    ParseError(String),
    AuthenticationError(String),
    RateLimitError(String),
    APIError(String),
}

impl fmt::Display for AIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", REMOTE_ERROR_PREFIX)?;
        match self {
            Self::ConfigMissing(msg) => write!(f, "configuration missing: {}", msg),
            Self::NetworkError(msg) => write!(f, "network error: {}", msg),
            Self::ParseError(msg) => write!(f, "parse error: {}", msg),
            Self::AuthenticationError(msg) => write!(f, "authentication error: {}", msg),
            Self::RateLimitError(msg) => write!(f, "rate limit error: {}", msg),
            Self::APIError(msg) => write!(f, "API error: {}", msg),
        }
    }
}

impl std::error::Error for AIError {}

impl From<JsonError> for AIError {
    fn from(error: JsonError) -> Self {
        AIError::ParseError(format!("JSON serialization error: {}", error))
    }
}

impl From<reqwest::Error> for AIError {
    fn from(error: reqwest::Error) -> Self {
        AIError::NetworkError(error.to_string())
    }
}
