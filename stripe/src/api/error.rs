use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No such object: {0}")]
    NotFound(String),

    #[error("API returned error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}
