//! Read path: issues and worklogs to a flat timesheet.
//!
//! One worker per matching issue fetches the full worklog while holding a
//! [`RequestGate`] pass; matching entries travel over a channel to a single
//! collector task that owns the resulting [`Timesheet`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate};
use chrono_tz::Tz;
use jira_api::{AccountId, Issue, Jql, ProjectKey, RequestGate, WorklogApi, WorklogEntry};
use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::error::Result;
use crate::resolver::ResolvedUser;
use crate::timesheet::{DateWindow, Effort, Timesheet, User};

const EFFORT_CHANNEL_CAPACITY: usize = 256;

/// Whose worklogs the read path collects.
#[derive(Clone, Debug)]
pub enum AuthorScope {
    /// The authenticated caller.
    Me,
    /// Previously resolved accounts.
    Accounts(Vec<ResolvedUser>),
}

/// Author identity and zone used to attribute and bucket worklog entries.
#[derive(Clone, Debug)]
struct Attribution {
    user: User,
    zone: Tz,
}

/// Calendar day of `started` in the author's zone.
pub fn bucket_day(started: DateTime<FixedOffset>, zone: Tz) -> NaiveDate {
    started.with_timezone(&zone).date_naive()
}

/// Collects efforts of `scope` dated inside `window`, optionally limited to
/// `projects`. Failing to list issues is fatal; a failing worklog fetch only
/// drops that issue. The result is unsorted.
pub async fn build_timesheet(
    api: Arc<dyn WorklogApi>,
    scope: AuthorScope,
    window: DateWindow,
    projects: &[ProjectKey],
    gate: RequestGate,
) -> Result<Timesheet> {
    let jql = Jql::new().between(window.from, window.to);
    // Only the "me" scope may alias the caller reported by the search.
    let (jql, mut authors, caller_alias) = match scope {
        AuthorScope::Me => {
            let me = api.myself().await?;
            let attribution = Attribution {
                user: User::new(me.display_name.clone()).with_id(me.id.clone()),
                zone: me.zone(),
            };
            let authors = HashMap::from([(me.id, attribution.clone())]);
            (jql.me(), authors, Some(attribution))
        }
        AuthorScope::Accounts(resolved) => {
            let ids: Vec<AccountId> = resolved.iter().map(|r| r.account.id.clone()).collect();
            let authors = resolved
                .into_iter()
                .map(|r| {
                    let zone = r.account.zone();
                    (r.account.id, Attribution { user: r.user, zone })
                })
                .collect();
            (jql.for_accounts(&ids), authors, None)
        }
    };
    let jql = jql.for_projects(projects);

    let search = api.issues(&jql).await?;
    info!("{} issue(s) match {}", search.issues.len(), jql.build());
    if let (Some(caller), Some(author)) = (search.account, caller_alias) {
        if !authors.contains_key(&caller) {
            debug!("Caller reported as {}, aliasing to {}", caller, author.user);
            authors.insert(caller, author);
        }
    }

    let authors = Arc::new(authors);
    let (tx, mut rx) = mpsc::channel::<Effort>(EFFORT_CHANNEL_CAPACITY);
    let collector = tokio::spawn(async move {
        let mut sheet = Timesheet::new();
        while let Some(effort) = rx.recv().await {
            sheet.push(effort);
        }
        sheet
    });

    let mut workers = JoinSet::new();
    for issue in search.issues {
        let api = Arc::clone(&api);
        let authors = Arc::clone(&authors);
        let gate = gate.clone();
        let tx = tx.clone();
        workers.spawn(async move {
            let Some(entries) = fetch_worklog(api.as_ref(), &issue, &gate).await else {
                return;
            };
            for entry in entries {
                if let Some(effort) = to_effort(entry, &issue, &authors, &window) {
                    if tx.send(effort).await.is_err() {
                        break;
                    }
                }
            }
        });
    }
    drop(tx);

    while let Some(joined) = workers.join_next().await {
        if let Err(err) = joined {
            warn!("Worklog worker failed: {}", err);
        }
    }
    Ok(collector.await?)
}

async fn fetch_worklog(
    api: &dyn WorklogApi,
    issue: &Issue,
    gate: &RequestGate,
) -> Option<Vec<WorklogEntry>> {
    let _pass = match gate.enter().await {
        Ok(pass) => pass,
        Err(err) => {
            warn!("Skipping worklog of {}: {}", issue.key, err);
            return None;
        }
    };
    match api.worklog(&issue.key).await {
        Ok(entries) => {
            debug!("{} worklog entries on {}", entries.len(), issue.key);
            Some(entries)
        }
        Err(err) => {
            warn!("Skipping worklog of {}: {}", issue.key, err);
            None
        }
    }
}

fn to_effort(
    entry: WorklogEntry,
    issue: &Issue,
    authors: &HashMap<AccountId, Attribution>,
    window: &DateWindow,
) -> Option<Effort> {
    let author = authors.get(&entry.author.id)?;
    let date = bucket_day(entry.started, author.zone);
    if !window.contains(date) {
        return None;
    }
    Some(Effort {
        user: Some(author.user.clone()),
        project: issue.project.to_string(),
        task: issue.key.to_string(),
        description: entry.comment,
        date,
        duration: entry.duration,
    })
}
