use serde::{Deserialize, Serialize};

use crate::models::{AccountId, IssueKey, ProjectKey};
use crate::pagination::PageState;

/// Issue reduced to the keys the timesheet needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub key: IssueKey,
    pub project: ProjectKey,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueRecord {
    pub key: IssueKey,
    pub fields: IssueFields,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IssueFields {
    pub project: ProjectRef,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProjectRef {
    pub key: ProjectKey,
}

impl From<IssueRecord> for Issue {
    fn from(record: IssueRecord) -> Self {
        Issue {
            key: record.key,
            project: record.fields.project.key,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSearchRequest<'a> {
    pub jql: &'a str,
    pub start_at: usize,
    pub fields: [&'static str; 1],
}

impl<'a> IssueSearchRequest<'a> {
    pub fn new(jql: &'a str, start_at: usize) -> Self {
        Self {
            jql,
            start_at,
            fields: ["project"],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueSearchPage {
    #[serde(flatten)]
    pub state: PageState,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
}

/// Issues matching a query plus the account id the server reported for the
/// authenticated caller, when it sent one.
#[derive(Debug, Clone, Default)]
pub struct IssueSearch {
    pub issues: Vec<Issue>,
    pub account: Option<AccountId>,
}

#[cfg(test)]
mod tests {
    use super::{Issue, IssueSearchPage, IssueSearchRequest};
    use crate::pagination::LastPage;

    #[test]
    fn search_page_keeps_only_project_key() {
        let page: IssueSearchPage = serde_json::from_str(
            r#"{"startAt":0,"maxResults":50,"total":1,"issues":[
                {"id":"10002","key":"ABC-7",
                 "fields":{"project":{"id":"10000","key":"ABC","name":"Alphabet"}}}
            ]}"#,
        )
        .unwrap();
        assert_eq!(page.state.total, 1);
        assert_eq!(page.state.is_last, LastPage::Unknown);

        let issue: Issue = page.issues.into_iter().next().unwrap().into();
        assert_eq!(issue.key.as_str(), "ABC-7");
        assert_eq!(issue.project.as_str(), "ABC");
    }

    #[test]
    fn request_asks_for_project_field_only() {
        let body = serde_json::to_value(IssueSearchRequest::new("project in ('ABC')", 50)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"jql":"project in ('ABC')","startAt":50,"fields":["project"]})
        );
    }
}
