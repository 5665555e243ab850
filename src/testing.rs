//! In-memory `WorklogApi` used by unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use jira_api::{
    Account, AccountId, ApiFlavor, Author, Issue, IssueKey, IssueSearch, JiraError, Jql, Project,
    Result, WorklogApi, WorklogEntry, WorklogId,
};

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn account(id: &str, name: &str, zone: Option<Tz>) -> Account {
    Account {
        id: id.into(),
        display_name: name.to_string(),
        time_zone: zone,
    }
}

pub fn issue(key: &str) -> Issue {
    Issue {
        key: key.into(),
        project: key.split('-').next().unwrap_or_default().into(),
    }
}

pub fn worklog(id: &str, author: &str, started: &str, seconds: u64, comment: &str) -> WorklogEntry {
    WorklogEntry {
        id: id.into(),
        author: Author {
            id: author.into(),
            display_name: author.to_string(),
        },
        started: jira_api::models::parse_started(started).unwrap(),
        duration: Duration::from_secs(seconds),
        comment: comment.to_string(),
    }
}

pub struct FakeApi {
    me: Account,
    accounts: Vec<Account>,
    issues: Vec<Issue>,
    worklogs: Mutex<HashMap<IssueKey, Vec<WorklogEntry>>>,
    failing_worklogs: HashSet<IssueKey>,
    failing_removals: HashSet<WorklogId>,
    fail_issues: bool,
    caller: Option<AccountId>,
    worklog_delay: Option<Duration>,
    queries: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
    next_id: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            me: account("me", "Current User", None),
            accounts: Vec::new(),
            issues: Vec::new(),
            worklogs: Mutex::new(HashMap::new()),
            failing_worklogs: HashSet::new(),
            failing_removals: HashSet::new(),
            fail_issues: false,
            caller: None,
            worklog_delay: None,
            queries: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1000),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_me(mut self, me: Account) -> Self {
        self.accounts.push(me.clone());
        self.me = me;
        self
    }

    pub fn with_account(mut self, account: Account) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn with_issue(mut self, issue: Issue, entries: Vec<WorklogEntry>) -> Self {
        self.worklogs
            .get_mut()
            .unwrap()
            .insert(issue.key.clone(), entries);
        self.issues.push(issue);
        self
    }

    pub fn failing_worklog(mut self, key: &str) -> Self {
        self.failing_worklogs.insert(key.into());
        self
    }

    pub fn failing_removal(mut self, id: &str) -> Self {
        self.failing_removals.insert(id.into());
        self
    }

    pub fn failing_issues(mut self) -> Self {
        self.fail_issues = true;
        self
    }

    /// Account reported by the issue search as the caller.
    pub fn with_caller(mut self, id: &str) -> Self {
        self.caller = Some(id.into());
        self
    }

    pub fn with_worklog_delay(mut self, delay: Duration) -> Self {
        self.worklog_delay = Some(delay);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

fn not_found(what: &str) -> JiraError {
    JiraError::Other(format!("{what} does not exist"))
}

#[async_trait]
impl WorklogApi for FakeApi {
    fn flavor(&self) -> ApiFlavor {
        ApiFlavor::Cloud
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        let mut keys: Vec<_> = self.issues.iter().map(|issue| issue.project.clone()).collect();
        keys.dedup();
        Ok(keys
            .into_iter()
            .map(|key| Project {
                id: None,
                name: key.to_string(),
                key,
            })
            .collect())
    }

    async fn myself(&self) -> Result<Account> {
        Ok(self.me.clone())
    }

    async fn account(&self, id: &AccountId) -> Result<Account> {
        self.accounts
            .iter()
            .find(|account| &account.id == id)
            .cloned()
            .ok_or_else(|| not_found(&format!("user {id}")))
    }

    async fn find_accounts(&self, _query: &str) -> Result<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    async fn issues(&self, jql: &Jql) -> Result<IssueSearch> {
        self.queries.lock().unwrap().push(jql.build());
        if self.fail_issues {
            return Err(JiraError::Transport("connection refused".into()));
        }
        Ok(IssueSearch {
            issues: self.issues.clone(),
            account: self.caller.clone(),
        })
    }

    async fn worklog(&self, issue: &IssueKey) -> Result<Vec<WorklogEntry>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.worklog_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_worklogs.contains(issue) {
            return Err(JiraError::Transport(format!("reset while reading {issue}")));
        }
        Ok(self
            .worklogs
            .lock()
            .unwrap()
            .get(issue)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_worklog(
        &self,
        issue: &IssueKey,
        started: DateTime<FixedOffset>,
        duration: Duration,
    ) -> Result<WorklogEntry> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let entry = WorklogEntry {
            id: WorklogId::new(id.to_string()),
            author: Author {
                id: self.me.id.clone(),
                display_name: self.me.display_name.clone(),
            },
            started,
            duration,
            comment: String::new(),
        };
        self.worklogs
            .lock()
            .unwrap()
            .entry(issue.clone())
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }

    async fn remove_worklog(&self, issue: &IssueKey, id: &WorklogId) -> Result<()> {
        if self.failing_removals.contains(id) {
            return Err(JiraError::Transport(format!("reset while removing {id}")));
        }
        let mut worklogs = self.worklogs.lock().unwrap();
        let entries = worklogs.get_mut(issue).ok_or_else(|| not_found(&format!("issue {issue}")))?;
        entries.retain(|entry| &entry.id != id);
        self.removed.lock().unwrap().push(id.to_string());
        Ok(())
    }
}
