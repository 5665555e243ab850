use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::client::JiraClient;
use crate::config::ApiFlavor;
use crate::error::Result;
use crate::jql::Jql;
use crate::models::{
    Account, IssueKey, IssueSearch, IssueSearchPage, IssueSearchRequest, Project, ProjectPage,
    UserRecord, WorklogCreateRequest, WorklogEntry, WorklogId, WorklogPage, WorklogRecord,
};
use crate::pagination::{paginate, Page};

/// Response header carrying the caller's account id on issue searches.
const ACCOUNT_ID_HEADER: &str = "X-AACCOUNTID";

/// Endpoints identical across flavors apart from the version prefix.
#[derive(Clone)]
pub(crate) struct RestCore {
    client: JiraClient,
    flavor: ApiFlavor,
}

impl RestCore {
    pub(crate) fn new(client: JiraClient, flavor: ApiFlavor) -> Self {
        Self { client, flavor }
    }

    pub(crate) fn flavor(&self) -> ApiFlavor {
        self.flavor
    }

    pub(crate) fn path(&self, endpoint: &str) -> String {
        format!("{}{}", self.flavor.base_path(), endpoint)
    }

    pub(crate) async fn users(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<Account>> {
        let records: Vec<UserRecord> = self.client.get(&self.path(endpoint), query).await?;
        Ok(records
            .into_iter()
            .filter_map(|record| match record.into_account() {
                Ok(account) => Some(account),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping user record");
                    None
                }
            })
            .collect())
    }

    pub(crate) async fn user(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Account> {
        let record: UserRecord = self.client.get(&self.path(endpoint), query).await?;
        record.into_account()
    }

    pub(crate) async fn projects(&self) -> Result<Vec<Project>> {
        let path = self.path("project/search");
        paginate(|offset| {
            let client = &self.client;
            let path = &path;
            async move {
                let page: ProjectPage = client.get(path, &[("startAt", offset.to_string())]).await?;
                Ok(Page::new(page.values, page.state))
            }
        })
        .await
    }

    pub(crate) async fn myself(&self) -> Result<Account> {
        self.user("myself", &[]).await
    }

    pub(crate) async fn issues(&self, jql: &Jql) -> Result<IssueSearch> {
        let query = jql.build();
        let path = self.path("search");
        let account = Mutex::new(None::<String>);
        let issues = paginate(|offset| {
            let request = IssueSearchRequest::new(&query, offset);
            let client = &self.client;
            let path = &path;
            let account = &account;
            async move {
                let (page, header): (IssueSearchPage, _) = client
                    .post_with_header(path, &request, Some(ACCOUNT_ID_HEADER))
                    .await?;
                if let (Some(id), Ok(mut slot)) = (header, account.lock()) {
                    *slot = Some(id);
                }
                let items = page.issues.into_iter().map(Into::into).collect();
                Ok(Page::new(items, page.state))
            }
        })
        .await?;
        tracing::debug!(count = issues.len(), jql = %query, "issues matched");
        Ok(IssueSearch {
            issues,
            account: account.into_inner().ok().flatten().map(Into::into),
        })
    }

    pub(crate) async fn worklog(&self, issue: &IssueKey) -> Result<Vec<WorklogEntry>> {
        let path = self.path(&format!("issue/{issue}/worklog"));
        paginate(|offset| {
            let client = &self.client;
            let path = &path;
            async move {
                let page: WorklogPage = client
                    .get(path, &[("startAt", offset.to_string())])
                    .await?;
                let items = page
                    .worklogs
                    .into_iter()
                    .filter_map(|record| match WorklogEntry::try_from(record) {
                        Ok(entry) => Some(entry),
                        Err(err) => {
                            tracing::warn!(error = %err, "skipping worklog record");
                            None
                        }
                    })
                    .collect();
                Ok(Page::new(items, page.state))
            }
        })
        .await
    }

    pub(crate) async fn add_worklog(
        &self,
        issue: &IssueKey,
        started: DateTime<FixedOffset>,
        duration: Duration,
    ) -> Result<WorklogEntry> {
        let path = self.path(&format!("issue/{issue}/worklog"));
        let request = WorklogCreateRequest::new(started, duration);
        let record: WorklogRecord = self.client.post(&path, &request).await?;
        WorklogEntry::try_from(record)
    }

    pub(crate) async fn remove_worklog(&self, issue: &IssueKey, id: &WorklogId) -> Result<()> {
        self.client
            .delete(&self.path(&format!("issue/{issue}/worklog/{id}")))
            .await
    }
}
