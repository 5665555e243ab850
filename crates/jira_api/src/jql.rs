//! Incremental builder for the worklog JQL filter.

use chrono::NaiveDate;

use crate::models::{AccountId, ProjectKey};

const JQL_DATE_FORMAT: &str = "%Y/%m/%d";
const CURRENT_USER: &str = "currentUser()";

/// Ordered list of JQL clauses joined with `AND`. Builder methods consume and
/// return the value so queries chain; clauses keep call order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Jql {
    clauses: Vec<String>,
}

impl Jql {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to worklogs dated in `[from, to)`.
    pub fn between(self, from: NaiveDate, to: NaiveDate) -> Self {
        self.push(format!(
            "worklogDate >= '{}' AND worklogDate < '{}'",
            from.format(JQL_DATE_FORMAT),
            to.format(JQL_DATE_FORMAT)
        ))
    }

    /// Restricts to worklogs of the authenticated user.
    pub fn me(self) -> Self {
        self.push(format!("worklogAuthor in ({CURRENT_USER})"))
    }

    /// Restricts to worklogs of the given accounts; no clause for an empty list.
    pub fn for_accounts(self, accounts: &[AccountId]) -> Self {
        if accounts.is_empty() {
            return self;
        }
        let clause = format!(
            "worklogAuthor in ({})",
            quoted_list(accounts.iter().map(AccountId::as_str))
        );
        self.push(clause)
    }

    /// Restricts to the given projects; no clause for an empty list.
    pub fn for_projects(self, projects: &[ProjectKey]) -> Self {
        if projects.is_empty() {
            return self;
        }
        let clause = format!(
            "project in ({})",
            quoted_list(projects.iter().map(ProjectKey::as_str))
        );
        self.push(clause)
    }

    pub fn clauses(&self) -> &[String] {
        &self.clauses
    }

    pub fn build(&self) -> String {
        self.clauses.join(" AND ")
    }

    fn push(mut self, clause: String) -> Self {
        self.clauses.push(clause);
        self
    }
}

fn quoted_list<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values
        .map(|value| format!("'{}'", value.replace('\'', "\\'")))
        .collect::<Vec<_>>()
        .join(",")
}
