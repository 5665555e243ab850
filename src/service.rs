//! Entry points used by the command line and other front ends.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use jira_api::{
    IssueKey, Project, ProjectKey, RequestGate, WorklogApi, WorklogEntry, DEFAULT_CONCURRENCY,
};
use log::{error, info};

use crate::config::Config;
use crate::consolidate::{Clock, ConsolidationReport, Consolidator, SystemClock};
use crate::error::Result;
use crate::pipeline::{build_timesheet, AuthorScope};
use crate::resolver::{resolve_accounts, UserRequest};
use crate::timesheet::{DateWindow, Timesheet};

#[derive(Clone)]
pub struct TimesheetService {
    api: Arc<dyn WorklogApi>,
    clock: Arc<dyn Clock>,
    concurrency: usize,
}

impl TimesheetService {
    pub fn new(api: Arc<dyn WorklogApi>) -> Self {
        Self {
            api,
            clock: Arc::new(SystemClock),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Connects to the configured Jira and detects its API flavor.
    pub async fn connect(config: &Config) -> Result<Self> {
        let api = jira_api::connect(config.jira_config()?).await?;
        info!("Using Jira {:?} API at {}", api.flavor(), config.base_url()?);
        Ok(Self::new(api).with_concurrency(config.max_concurrent_requests))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit.max(1);
        self
    }

    pub fn api(&self) -> &Arc<dyn WorklogApi> {
        &self.api
    }

    /// Efforts of the authenticated user. Errors yield an empty timesheet.
    pub async fn get_timesheet(&self, window: DateWindow, projects: &[ProjectKey]) -> Timesheet {
        self.try_timesheet(window, projects)
            .await
            .unwrap_or_else(|err| {
                error!("Failed to build timesheet: {}", err);
                Timesheet::new()
            })
    }

    pub async fn try_timesheet(
        &self,
        window: DateWindow,
        projects: &[ProjectKey],
    ) -> Result<Timesheet> {
        build_timesheet(
            Arc::clone(&self.api),
            AuthorScope::Me,
            window,
            projects,
            self.gate(),
        )
        .await
    }

    /// Efforts of several users. Errors, including unknown or ambiguous
    /// users, yield an empty timesheet.
    pub async fn get_bulk_timesheet(
        &self,
        window: DateWindow,
        projects: &[ProjectKey],
        users: Vec<UserRequest>,
    ) -> Timesheet {
        self.try_bulk_timesheet(window, projects, users)
            .await
            .unwrap_or_else(|err| {
                error!("Failed to build timesheet: {}", err);
                Timesheet::new()
            })
    }

    pub async fn try_bulk_timesheet(
        &self,
        window: DateWindow,
        projects: &[ProjectKey],
        users: Vec<UserRequest>,
    ) -> Result<Timesheet> {
        let resolved = resolve_accounts(Arc::clone(&self.api), users).await?;
        build_timesheet(
            Arc::clone(&self.api),
            AuthorScope::Accounts(resolved),
            window,
            projects,
            self.gate(),
        )
        .await
    }

    pub async fn add_worklog_item<F>(
        &self,
        task: &IssueKey,
        day: NaiveDate,
        duration: Duration,
        summarize: bool,
        confirm: F,
    ) -> Result<ConsolidationReport>
    where
        F: FnMut(&WorklogEntry) -> bool + Send,
    {
        self.consolidator()
            .add(task, day, duration, summarize, confirm)
            .await
    }

    pub async fn remove_worklog_item<F>(
        &self,
        task: &IssueKey,
        day: NaiveDate,
        confirm: F,
    ) -> Result<ConsolidationReport>
    where
        F: FnMut(&WorklogEntry) -> bool + Send,
    {
        self.consolidator().remove(task, day, confirm).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.api.projects().await?)
    }

    fn gate(&self) -> RequestGate {
        RequestGate::new(self.concurrency)
    }

    fn consolidator(&self) -> Consolidator<'_> {
        Consolidator::new(self.api.as_ref(), self.clock.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::TimesheetService;
    use crate::consolidate::FixedClock;
    use crate::resolver::parse_users;
    use crate::testing::{account, day, issue, worklog, FakeApi};
    use crate::timesheet::DateWindow;
    use chrono::{DateTime, Utc};
    use chrono_tz::Tz;
    use jira_api::IssueKey;
    use std::sync::Arc;
    use std::time::Duration;

    fn service(api: FakeApi) -> TimesheetService {
        let now = DateTime::parse_from_rfc3339("2024-03-11T15:00:00Z").unwrap().with_timezone(&Utc);
        TimesheetService::new(Arc::new(api)).with_clock(Arc::new(FixedClock(now)))
    }

    #[tokio::test]
    async fn ambiguous_user_yields_empty_timesheet() {
        let api = FakeApi::new()
            .with_account(account("a", "John Doe", None))
            .with_account(account("b", "John Doe Jr", None))
            .with_issue(
                issue("ABC-1"),
                vec![worklog("1", "a", "2024-03-05T10:00:00.000+0000", 3600, "")],
            );
        let users = parse_users(["John Doe"]).unwrap();
        let svc = service(api);

        let sheet = svc
            .get_bulk_timesheet(DateWindow::month(2024, 3).unwrap(), &[], users.clone())
            .await;
        assert!(sheet.is_empty());
        assert!(svc
            .try_bulk_timesheet(DateWindow::month(2024, 3).unwrap(), &[], users)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn bulk_timesheet_attributes_requested_names() {
        let api = FakeApi::new()
            .with_account(account("a", "John Edward Doe", Some(Tz::UTC)))
            .with_issue(
                issue("ABC-1"),
                vec![worklog("1", "a", "2024-03-05T10:00:00.000+0000", 3600, "")],
            );
        let users = parse_users(["John Doe"]).unwrap();

        let sheet = service(api)
            .get_bulk_timesheet(DateWindow::month(2024, 3).unwrap(), &[], users)
            .await;
        assert_eq!(sheet.len(), 1);
        assert_eq!(sheet.efforts()[0].user.as_ref().unwrap().name, "John Doe");
    }

    #[tokio::test]
    async fn failing_search_yields_empty_own_timesheet() {
        let sheet = service(FakeApi::new().failing_issues())
            .get_timesheet(DateWindow::month(2024, 3).unwrap(), &[])
            .await;
        assert!(sheet.is_empty());
    }

    #[tokio::test]
    async fn add_and_remove_go_through_the_consolidator() {
        let api = FakeApi::new()
            .with_me(account("jdoe", "John Doe", Some(Tz::UTC)))
            .with_issue(issue("ABC-1"), Vec::new());
        let svc = service(api);
        let task = IssueKey::from("ABC-1");

        let added = svc
            .add_worklog_item(&task, day(2024, 3, 11), Duration::from_secs(1800), true, |_| true)
            .await
            .unwrap();
        let created = added.created.unwrap();
        assert_eq!(created.started.to_rfc3339(), "2024-03-11T14:30:00+00:00");

        let removed = svc
            .remove_worklog_item(&task, day(2024, 3, 11), |_| true)
            .await
            .unwrap();
        assert_eq!(removed.removed, vec![created.id]);
        assert_eq!(svc.projects().await.unwrap()[0].key.as_str(), "ABC");
    }
}
