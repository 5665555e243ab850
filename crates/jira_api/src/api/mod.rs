//! Flavor-specific implementations of the worklog capability surface.
//!
//! Jira Server/Data Center (REST v2) and Jira Cloud (REST v3) share the issue,
//! worklog and project endpoints but identify users differently. Both
//! variants sit behind [`WorklogApi`]; [`connect`] picks one per run from the
//! `serverInfo` request.

mod cloud;
mod rest;
mod server;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::client::JiraClient;
use crate::config::{ApiFlavor, JiraConfig};
use crate::error::Result;
use crate::jql::Jql;
use crate::models::{Account, AccountId, IssueKey, IssueSearch, Project, WorklogEntry, WorklogId};

pub use cloud::CloudApi;
pub use server::ServerApi;

#[async_trait]
pub trait WorklogApi: Send + Sync {
    fn flavor(&self) -> ApiFlavor;

    async fn projects(&self) -> Result<Vec<Project>>;

    /// Account of the authenticated caller.
    async fn myself(&self) -> Result<Account>;

    /// Looks up a single account by its remote identifier.
    async fn account(&self, id: &AccountId) -> Result<Account>;

    /// Directory search by free text; candidates are not filtered further.
    async fn find_accounts(&self, query: &str) -> Result<Vec<Account>>;

    /// All issues matching `jql`, across every result page.
    async fn issues(&self, jql: &Jql) -> Result<IssueSearch>;

    /// Full worklog of an issue, across every result page.
    async fn worklog(&self, issue: &IssueKey) -> Result<Vec<WorklogEntry>>;

    async fn add_worklog(
        &self,
        issue: &IssueKey,
        started: DateTime<FixedOffset>,
        duration: Duration,
    ) -> Result<WorklogEntry>;

    async fn remove_worklog(&self, issue: &IssueKey, id: &WorklogId) -> Result<()>;
}

/// Builds the API variant matching the remote deployment. The flavor pinned
/// in `config` wins; otherwise `serverInfo` is asked once.
pub async fn connect(config: JiraConfig) -> Result<Arc<dyn WorklogApi>> {
    let pinned = config.flavor;
    let client = JiraClient::new(config)?;
    let flavor = match pinned {
        Some(flavor) => flavor,
        None => {
            let info = client.server_info().await?;
            tracing::info!(
                version = info.version.as_deref().unwrap_or("unknown"),
                deployment = info.deployment_type.as_deref().unwrap_or("unknown"),
                "connected to jira"
            );
            info.flavor()
        }
    };
    Ok(match flavor {
        ApiFlavor::Server => Arc::new(ServerApi::new(client)),
        ApiFlavor::Cloud => Arc::new(CloudApi::new(client)),
    })
}
