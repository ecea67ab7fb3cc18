use thiserror::Error;

/// Failure taxonomy for remote generation calls.
///
/// Every failure is local to the attempt that produced it: the orchestrator
/// records it on one scene and keeps going. Nothing here retries.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("API quota exhausted: {0}")]
    Quota(String),

    #[error("Invalid API credential: {0}")]
    Credential(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Malformed API response: {0}")]
    Malformed(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GenerateError>;

impl GenerateError {
    /// Map a non-success HTTP status plus response body to an error category.
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        use reqwest::StatusCode;
        match status {
            StatusCode::TOO_MANY_REQUESTS => GenerateError::Quota(body),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerateError::Credential(body),
            _ => GenerateError::Generation(format!("HTTP {}: {}", status, body)),
        }
    }

    /// One user-facing line per category, recorded on the failed scene.
    pub fn user_message(&self) -> String {
        match self {
            GenerateError::Quota(_) => {
                "Generation quota exhausted. Wait a while or switch to another API plan.".to_string()
            }
            GenerateError::Credential(_) => {
                "The API credential was rejected. Please re-enter your API key.".to_string()
            }
            GenerateError::Network(e) => {
                format!("Network error while contacting the generation service: {}", e)
            }
            GenerateError::Malformed(detail) => {
                format!("The generation service returned an unexpected response: {}", detail)
            }
            GenerateError::Generation(detail) => format!("Generation failed: {}", detail),
            GenerateError::Io(e) => format!("Could not store the generated media locally: {}", e),
        }
    }

    /// Credential-class failures additionally tell the host to re-prompt
    /// for authentication.
    pub fn needs_credentials(&self) -> bool {
        matches!(self, GenerateError::Credential(_))
    }
}
