//! Error model used by Jira API client operations.

use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JiraError>;

/// Represents the failure modes of a Jira round trip: transport failures, non-success
/// statuses, rejected credentials, undecodable payloads and invalid client configuration.
#[derive(Debug, Error)]
pub enum JiraError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("http {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("authentication error: {0}")]
    Authentication(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("unexpected error: {0}")]
    Other(String),
}

impl JiraError {
    /// Constructs a status error from a response status and body text.
    pub fn status(status: StatusCode, message: impl Into<String>) -> Self {
        JiraError::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns the HTTP status carried by a status failure.
    pub fn http_status(&self) -> Option<StatusCode> {
        match self {
            JiraError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for JiraError {
    /// Converts reqwest errors into semantic JiraError variants.
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            JiraError::Timeout(err.to_string())
        } else if err.is_status() {
            let status = err.status().unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            JiraError::Status {
                status,
                message: err.to_string(),
            }
        } else if err.is_decode() {
            JiraError::Decode(err.to_string())
        } else if err.is_connect() || err.is_request() || err.is_body() {
            JiraError::Transport(err.to_string())
        } else {
            JiraError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for JiraError {
    /// Converts serde_json decode/encode failures into decode errors.
    fn from(err: serde_json::Error) -> Self {
        JiraError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::JiraError;
    use reqwest::StatusCode;

    #[test]
    fn status_error_displays_code_and_message() {
        let err = JiraError::status(StatusCode::NOT_FOUND, "Issue does not exist");
        assert_eq!(err.to_string(), "http 404 Not Found: Issue does not exist");
        assert_eq!(err.http_status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn json_failures_become_decode_errors() {
        let err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        assert!(matches!(JiraError::from(err), JiraError::Decode(_)));
    }
}
