//! Error model of the timesheet engine.

use jira_api::JiraError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimesheetError>;

#[derive(Debug, Error)]
pub enum TimesheetError {
    #[error(transparent)]
    Api(#[from] JiraError),
    #[error("user '{0}' not found")]
    UserNotFound(String),
    #[error("user '{user}' is ambiguous: {}", .candidates.join(", "))]
    AmbiguousUser { user: String, candidates: Vec<String> },
    #[error("validation error: {0}")]
    Validation(String),
    #[error("malformed table: {0}")]
    Table(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for TimesheetError {
    fn from(err: tokio::task::JoinError) -> Self {
        TimesheetError::Task(err.to_string())
    }
}
