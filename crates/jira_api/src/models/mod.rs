mod ids;
mod issue;
mod project;
mod server_info;
mod user;
mod worklog;

pub use ids::{AccountId, IssueKey, ProjectKey, WorklogId};
pub use issue::{Issue, IssueRecord, IssueSearch, IssueSearchPage, IssueSearchRequest};
pub use project::{Project, ProjectPage};
pub use server_info::ServerInfo;
pub use user::{Account, UserRecord};
pub use worklog::{
    parse_started, Author, CommentBody, WorklogCreateRequest, WorklogEntry, WorklogPage,
    WorklogRecord, STARTED_FORMAT,
};
