use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use super::rest::RestCore;
use super::WorklogApi;
use crate::client::JiraClient;
use crate::config::ApiFlavor;
use crate::error::Result;
use crate::jql::Jql;
use crate::models::{Account, AccountId, IssueKey, IssueSearch, Project, WorklogEntry, WorklogId};

const USER_SEARCH_LIMIT: &str = "50";

/// Jira Server / Data Center: users are addressed by user name.
#[derive(Clone)]
pub struct ServerApi {
    core: RestCore,
}

impl ServerApi {
    pub fn new(client: JiraClient) -> Self {
        Self {
            core: RestCore::new(client, ApiFlavor::Server),
        }
    }
}

#[async_trait]
impl WorklogApi for ServerApi {
    fn flavor(&self) -> ApiFlavor {
        self.core.flavor()
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        self.core.projects().await
    }

    async fn myself(&self) -> Result<Account> {
        self.core.myself().await
    }

    async fn account(&self, id: &AccountId) -> Result<Account> {
        self.core.user("user", &[("username", id.to_string())]).await
    }

    async fn find_accounts(&self, query: &str) -> Result<Vec<Account>> {
        let params = [
            ("username", query.to_string()),
            ("maxResults", USER_SEARCH_LIMIT.to_string()),
        ];
        self.core.users("user/search", &params).await
    }

    async fn issues(&self, jql: &Jql) -> Result<IssueSearch> {
        self.core.issues(jql).await
    }

    async fn worklog(&self, issue: &IssueKey) -> Result<Vec<WorklogEntry>> {
        self.core.worklog(issue).await
    }

    async fn add_worklog(
        &self,
        issue: &IssueKey,
        started: DateTime<FixedOffset>,
        duration: Duration,
    ) -> Result<WorklogEntry> {
        self.core.add_worklog(issue, started, duration).await
    }

    async fn remove_worklog(&self, issue: &IssueKey, id: &WorklogId) -> Result<()> {
        self.core.remove_worklog(issue, id).await
    }
}
