use thiserror::Error;

/// Errors from the resource API.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Resource API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl GraphError {
    /// Upstream HTTP status, where one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GraphError::Api { status, .. } => Some(*status),
            GraphError::Http(e) => e.status().map(|s| s.as_u16()),
            GraphError::Decode(_) => None,
        }
    }
}

pub type GraphResult<T> = Result<T, GraphError>;
