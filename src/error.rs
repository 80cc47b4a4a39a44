use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {}", .detail.as_deref().unwrap_or("no detail"))]
    Api {
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Unexpected response for {context}: {source}")]
    Decode {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not logged in")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session storage error")]
    Session(#[from] std::io::Error),

    #[error("Session file is malformed")]
    SessionFormat(#[source] serde_json::Error),
}

impl AppError {
    /// Message shown to the user: the API's `detail` when it sent one,
    /// otherwise `fallback`. Local errors carry their own wording.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Api {
                detail: Some(detail),
                ..
            } => detail.clone(),
            AppError::Api { detail: None, .. }
            | AppError::Network(_)
            | AppError::Decode { .. } => fallback.to_string(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
