use crate::services::authoring_service::PartialCreation;
use crate::services::authoring_service::ValidationReport;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(ValidationReport),

    #[error("Quiz partially created: {0}")]
    PartialCreation(PartialCreation),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed store payload: {0}")]
    Malformed(String),

    #[error("Answer required for question {}", .index + 1)]
    AnswerRequired { index: usize },

    #[error("Invalid answer: {0}")]
    InvalidAnswer(String),

    #[error("Illegal transition from {from} to {to}")]
    State {
        from: &'static str,
        to: &'static str,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Transient failures a submission may be retried after.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    pub fn user_message(&self) -> String {
        match self {
            Error::NotFound(_) | Error::Malformed(_) => "Quiz not found or unavailable".to_string(),
            Error::Network(_) => "Could not reach the quiz service, please retry".to_string(),
            Error::Unauthorized(_) => "Your session has expired, please sign in again".to_string(),
            Error::AnswerRequired { index } => format!("Question {} requires an answer", index + 1),
            Error::Validation(report) => report.to_string(),
            Error::PartialCreation(partial) => partial.to_string(),
            Error::InvalidAnswer(msg) => msg.clone(),
            _ => "An unexpected error occurred".to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status)
                if status == reqwest::StatusCode::UNAUTHORIZED
                    || status == reqwest::StatusCode::FORBIDDEN =>
            {
                Error::Unauthorized(err.to_string())
            }
            Some(status) if status == reqwest::StatusCode::NOT_FOUND => {
                Error::NotFound("Resource not found".to_string())
            }
            _ if err.is_decode() => Error::Malformed(err.to_string()),
            _ => Error::Network(err.to_string()),
        }
    }
}
