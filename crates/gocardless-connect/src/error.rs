//! Connect Error Types

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Connect-related errors
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Callback signature did not match the recomputed one
    #[error("Signature invalid: {0}")]
    Signature(String),

    /// Required callback field was blank
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Outbound resource failed validation
    #[error("Invalid resource: {0}")]
    InvalidResource(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Base URL could not be parsed
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Transport failure from the HTTP client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConnectError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::HttpStatus { status: 500..=599, .. })
    }

    /// Get user-friendly message
    pub const fn user_message(&self) -> &str {
        match self {
            Self::Signature(_) => "The payment callback could not be verified.",
            Self::MissingField(_) => "The payment callback is incomplete.",
            Self::InvalidResource(_) => "The payment details are incomplete or invalid.",
            Self::Config(_) | Self::Url(_) => "Service configuration error.",
            Self::Http(_) | Self::HttpStatus { .. } => {
                "Could not reach the payment provider. Please try again."
            }
            Self::Json(_) => "An error occurred processing your request.",
        }
    }
}
