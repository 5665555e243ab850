//! Typed Jira REST client crate used by the timesheet engine.

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod jql;
pub mod models;
pub mod pagination;

pub use api::{connect, CloudApi, ServerApi, WorklogApi};
pub use auth::Credentials;
pub use client::JiraClient;
pub use config::{ApiFlavor, JiraConfig};
pub use error::{JiraError, Result};
pub use gate::{GatePass, RequestGate, DEFAULT_CONCURRENCY};
pub use jql::Jql;
pub use models::{
    Account, AccountId, Author, Issue, IssueKey, IssueSearch, Project, ProjectKey, WorklogEntry,
    WorklogId,
};
pub use pagination::{paginate, LastPage, Page, PageState};
