use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::{JiraError, Result};
use crate::models::{AccountId, UserRecord, WorklogId};
use crate::pagination::PageState;

/// Timestamp layout Jira uses for `started`, e.g. `2024-03-11T09:00:00.000+0100`.
pub const STARTED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%z";

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WorklogRecord {
    pub id: WorklogId,
    #[serde(default)]
    pub author: Option<UserRecord>,
    pub started: String,
    #[serde(default)]
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub comment: Option<CommentBody>,
}

/// Worklog comment: plain text on API v2, an Atlassian document on v3.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum CommentBody {
    Text(String),
    Document(DocumentNode),
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DocumentNode {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub content: Vec<DocumentNode>,
}

impl CommentBody {
    pub fn plain_text(&self) -> String {
        match self {
            CommentBody::Text(text) => text.trim().to_string(),
            CommentBody::Document(node) => {
                let mut out = String::new();
                collect_text(node, &mut out);
                out.trim().to_string()
            }
        }
    }
}

fn collect_text(node: &DocumentNode, out: &mut String) {
    if let Some(text) = &node.text {
        out.push_str(text);
    }
    if node.kind == "hardBreak" {
        out.push('\n');
    }
    for child in &node.content {
        collect_text(child, out);
    }
    if node.kind == "paragraph" {
        out.push('\n');
    }
}

#[derive(Debug, Deserialize)]
pub struct WorklogPage {
    #[serde(flatten)]
    pub state: PageState,
    #[serde(default)]
    pub worklogs: Vec<WorklogRecord>,
}

/// Worklog author as far as matching and display need it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: AccountId,
    pub display_name: String,
}

/// Single unit of logged time on an issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklogEntry {
    pub id: WorklogId,
    pub author: Author,
    pub started: DateTime<FixedOffset>,
    pub duration: Duration,
    pub comment: String,
}

impl TryFrom<WorklogRecord> for WorklogEntry {
    type Error = JiraError;

    fn try_from(record: WorklogRecord) -> Result<Self> {
        let author = record
            .author
            .ok_or_else(|| JiraError::Decode(format!("worklog {} has no author", record.id)))?;
        let id = author
            .identifier()
            .ok_or_else(|| JiraError::Decode(format!("worklog {} author has no id", record.id)))?;
        let started = parse_started(&record.started)?;
        Ok(WorklogEntry {
            id: record.id,
            author: Author {
                id: AccountId::new(id),
                display_name: author.display_name.unwrap_or_default(),
            },
            started,
            duration: Duration::from_secs(record.time_spent_seconds),
            comment: record
                .comment
                .as_ref()
                .map(CommentBody::plain_text)
                .unwrap_or_default(),
        })
    }
}

impl fmt::Display for WorklogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.duration.as_secs();
        let (hours, minutes) = (total / 3600, (total % 3600) / 60);
        write!(f, "{} ", self.started.format("%Y-%m-%d %H:%M %z"))?;
        match (hours, minutes) {
            (0, m) => write!(f, "{m}m")?,
            (h, 0) => write!(f, "{h}h")?,
            (h, m) => write!(f, "{h}h{m}m")?,
        }
        write!(f, " by {} ({})", self.author.display_name, self.author.id)
    }
}

/// Parses a worklog `started` value in Jira's layout or RFC 3339.
pub fn parse_started(value: &str) -> Result<DateTime<FixedOffset>> {
    let trimmed = value.trim();
    DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f%z")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed))
        .map_err(|err| JiraError::Decode(format!("invalid worklog start '{trimmed}': {err}")))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogCreateRequest {
    pub started: String,
    pub time_spent_seconds: u64,
}

impl WorklogCreateRequest {
    pub fn new(started: DateTime<FixedOffset>, duration: Duration) -> Self {
        Self {
            started: started.format(STARTED_FORMAT).to_string(),
            time_spent_seconds: duration.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_started, WorklogCreateRequest, WorklogEntry, WorklogPage};
    use std::time::Duration;

    #[test]
    fn server_worklog_page_decodes() {
        let page: WorklogPage = serde_json::from_str(
            r#"{"startAt":0,"maxResults":20,"total":1,"worklogs":[{
                "id":"10100",
                "author":{"name":"jdoe","key":"JIRAUSER10000","displayName":"John Doe"},
                "comment":"  standup ",
                "started":"2024-03-11T09:00:00.000+0100",
                "timeSpentSeconds":5400
            }]}"#,
        )
        .unwrap();
        let entry = WorklogEntry::try_from(page.worklogs[0].clone()).unwrap();
        assert_eq!(entry.id.as_str(), "10100");
        assert_eq!(entry.author.id.as_str(), "jdoe");
        assert_eq!(entry.duration, Duration::from_secs(5400));
        assert_eq!(entry.comment, "standup");
        assert_eq!(entry.to_string(), "2024-03-11 09:00 +0100 1h30m by John Doe (jdoe)");
    }

    #[test]
    fn cloud_document_comment_is_flattened() {
        let page: WorklogPage = serde_json::from_str(
            r#"{"worklogs":[{
                "id":10101,
                "author":{"accountId":"5b10ac8d82e05b22cc7d4ef5","displayName":"Mia"},
                "comment":{"type":"doc","version":1,"content":[
                    {"type":"paragraph","content":[{"type":"text","text":"Review"}]},
                    {"type":"paragraph","content":[{"type":"text","text":"and merge"}]}
                ]},
                "started":"2024-03-11T23:15:00.000-0500",
                "timeSpentSeconds":900
            }]}"#,
        )
        .unwrap();
        let entry = WorklogEntry::try_from(page.worklogs[0].clone()).unwrap();
        assert_eq!(entry.id.as_str(), "10101");
        assert_eq!(entry.comment, "Review\nand merge");
        assert_eq!(
            entry.to_string(),
            "2024-03-11 23:15 -0500 15m by Mia (5b10ac8d82e05b22cc7d4ef5)"
        );
    }

    #[test]
    fn started_accepts_rfc3339() {
        let parsed = parse_started("2024-03-11T00:30:00-05:00").unwrap();
        assert_eq!(parsed, parse_started("2024-03-11T00:30:00.000-0500").unwrap());
        assert!(parse_started("11.03.2024").is_err());
    }

    #[test]
    fn create_request_uses_jira_layout() {
        let started = parse_started("2024-03-11T08:00:00+01:00").unwrap();
        let request = WorklogCreateRequest::new(started, Duration::from_secs(3600));
        let body = serde_json::to_value(request).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"started":"2024-03-11T08:00:00.000+0100","timeSpentSeconds":3600})
        );
    }
}
