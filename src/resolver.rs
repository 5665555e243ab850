//! Maps requested people to remote accounts.

use std::str::FromStr;
use std::sync::Arc;

use chrono_tz::Tz;
use jira_api::{Account, AccountId, WorklogApi};
use log::{debug, warn};
use tokio::task::JoinSet;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, TimesheetError};
use crate::timesheet::User;

/// Person requested on the command line or in the config: a display name,
/// optionally pinned to an account id (`Name=accountId`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserRequest {
    pub name: String,
    pub id: Option<AccountId>,
    /// Zone a fuzzy match must agree with, when known.
    pub time_zone: Option<Tz>,
}

impl UserRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            time_zone: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<AccountId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_time_zone(mut self, zone: Tz) -> Self {
        self.time_zone = Some(zone);
        self
    }
}

impl FromStr for UserRequest {
    type Err = TimesheetError;

    fn from_str(value: &str) -> Result<Self> {
        let (name, id) = match value.split_once('=') {
            Some((name, id)) => (name.trim(), Some(id.trim())),
            None => (value.trim(), None),
        };
        if name.is_empty() {
            return Err(TimesheetError::Validation(format!("missing user name in '{value}'")));
        }
        let request = UserRequest::new(name);
        match id {
            Some("") => Err(TimesheetError::Validation(format!("missing account id in '{value}'"))),
            Some(id) => Ok(request.with_id(id)),
            None => Ok(request),
        }
    }
}

/// Parses user entries; a name given more than once keeps its last entry.
pub fn parse_users<I, S>(entries: I) -> Result<Vec<UserRequest>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parsed = entries
        .into_iter()
        .map(|entry| entry.as_ref().parse::<UserRequest>())
        .collect::<Result<Vec<_>>>()?;
    let mut requests: Vec<UserRequest> = Vec::with_capacity(parsed.len());
    for request in parsed {
        requests.retain(|existing| existing.name != request.name);
        requests.push(request);
    }
    Ok(requests)
}

/// Strips diacritics and punctuation, lowercases and collapses whitespace.
pub fn normalize(name: &str) -> String {
    let stripped: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when every token of `query` occurs in the candidate's name and the
/// zones agree wherever both are known.
pub fn matches(query: &str, zone: Option<Tz>, candidate: &Account) -> bool {
    let name = normalize(&candidate.display_name);
    let query = normalize(query);
    let mut tokens = query.split_whitespace().peekable();
    if tokens.peek().is_none() {
        return false;
    }
    let zones_agree = match (zone, candidate.time_zone) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    };
    zones_agree && tokens.all(|token| name.contains(token))
}

/// Requested person bound to the account backing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user: User,
    pub account: Account,
}

/// Resolves every request in parallel. The first failure aborts the
/// resolutions still running and is returned.
pub async fn resolve_accounts(
    api: Arc<dyn WorklogApi>,
    requests: Vec<UserRequest>,
) -> Result<Vec<ResolvedUser>> {
    let mut tasks = JoinSet::new();
    for request in requests {
        let api = Arc::clone(&api);
        tasks.spawn(async move { resolve_one(api.as_ref(), request).await });
    }

    let mut resolved = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(TimesheetError::from).and_then(|result| result) {
            Ok(user) => resolved.push(user),
            Err(err) => {
                warn!("Account resolution failed: {}", err);
                tasks.abort_all();
                return Err(err);
            }
        }
    }
    Ok(resolved)
}

async fn resolve_one(api: &dyn WorklogApi, request: UserRequest) -> Result<ResolvedUser> {
    let account = match &request.id {
        Some(id) => api.account(id).await?,
        None => {
            let candidates = api.find_accounts(&normalize(&request.name)).await?;
            pick_candidate(&request, candidates)?
        }
    };
    debug!("Resolved '{}' to account {}", request.name, account.id);
    Ok(ResolvedUser {
        user: User::new(request.name).with_id(account.id.clone()),
        account,
    })
}

fn pick_candidate(request: &UserRequest, candidates: Vec<Account>) -> Result<Account> {
    let mut matching: Vec<Account> = candidates
        .into_iter()
        .filter(|candidate| matches(&request.name, request.time_zone, candidate))
        .collect();
    match matching.len() {
        0 => Err(TimesheetError::UserNotFound(request.name.clone())),
        1 => Ok(matching.remove(0)),
        _ => Err(TimesheetError::AmbiguousUser {
            user: request.name.clone(),
            candidates: matching
                .into_iter()
                .map(|candidate| format!("{} ({})", candidate.display_name, candidate.id))
                .collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{matches, normalize, parse_users, pick_candidate, resolve_accounts, UserRequest};
    use crate::error::TimesheetError;
    use crate::testing::{account, FakeApi};
    use chrono_tz::Tz;
    use std::sync::Arc;

    #[test]
    fn parses_plain_and_pinned_entries() {
        let plain: UserRequest = "John Doe".parse().unwrap();
        assert_eq!(plain, UserRequest::new("John Doe"));

        let pinned: UserRequest = " Mia Krystof = 5b10ac8d ".parse().unwrap();
        assert_eq!(pinned.name, "Mia Krystof");
        assert_eq!(pinned.id.unwrap().as_str(), "5b10ac8d");

        assert!("=5b10".parse::<UserRequest>().is_err());
        assert!("Mia=".parse::<UserRequest>().is_err());
    }

    #[test]
    fn duplicate_names_keep_last_entry() {
        let users = parse_users(["John Doe=1", "Mia", "John Doe=2"]).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Mia");
        assert_eq!(users[1].id.as_ref().unwrap().as_str(), "2");
    }

    #[test]
    fn normalize_strips_diacritics_and_punctuation() {
        assert_eq!(normalize("  Jiří  Dvořák-Nový "), "jiri dvoraknovy");
        assert_eq!(normalize("O'Brien, Jr."), "obrien jr");
    }

    #[test]
    fn punctuation_inside_names_is_ignored() {
        assert!(matches("OBrien", None, &account("1", "O'Brien", None)));
        assert!(matches("O'Brien", None, &account("2", "Sean OBrien", None)));
        assert!(matches("Smith-Jones", None, &account("3", "Anna SmithJones", None)));
    }

    #[test]
    fn every_query_token_must_be_contained() {
        assert!(!matches("John Doe", None, &account("1", "Jonathan Doe Jr", None)));
        assert!(matches("John Doe", None, &account("2", "John Edward Doe", None)));
        assert!(matches("jiri", None, &account("3", "Jiří Novák", None)));
        assert!(!matches("   ", None, &account("4", "Anyone", None)));
    }

    #[test]
    fn zones_must_agree_when_both_known() {
        let prague = account("1", "John Doe", Some(Tz::Europe__Prague));
        assert!(matches("John Doe", Some(Tz::Europe__Prague), &prague));
        assert!(!matches("John Doe", Some(Tz::America__New_York), &prague));
        assert!(matches("John Doe", Some(Tz::America__New_York), &account("2", "John Doe", None)));
    }

    #[test]
    fn candidate_count_decides_outcome() {
        let request = UserRequest::new("John Doe");
        let err =
            pick_candidate(&request, vec![account("1", "Jonathan Doe Jr", None)]).unwrap_err();
        assert!(matches!(err, TimesheetError::UserNotFound(name) if name == "John Doe"));

        let err = pick_candidate(
            &request,
            vec![account("1", "John Doe", None), account("2", "John Edward Doe", None)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TimesheetError::AmbiguousUser { candidates, .. } if candidates.len() == 2
        ));
    }

    #[tokio::test]
    async fn resolves_pinned_and_fuzzy_users() {
        let api = FakeApi::new()
            .with_account(account("jdoe", "John Edward Doe", Some(Tz::America__New_York)))
            .with_account(account("mia", "Mia Krystof", None));
        let requests = parse_users(["John Doe", "Mia=mia"]).unwrap();

        let mut resolved = resolve_accounts(Arc::new(api), requests).await.unwrap();
        resolved.sort_by(|a, b| a.user.name.cmp(&b.user.name));

        assert_eq!(resolved[0].user.name, "John Doe");
        assert_eq!(resolved[0].account.id.as_str(), "jdoe");
        assert_eq!(resolved[0].account.zone(), Tz::America__New_York);
        assert_eq!(resolved[1].user.id.as_ref().unwrap().as_str(), "mia");
    }

    #[tokio::test]
    async fn one_unknown_user_fails_the_whole_resolution() {
        let api = FakeApi::new().with_account(account("jdoe", "John Doe", None));
        let requests = parse_users(["John Doe", "Nobody Here"]).unwrap();

        let err = resolve_accounts(Arc::new(api), requests).await.unwrap_err();
        assert!(matches!(err, TimesheetError::UserNotFound(name) if name == "Nobody Here"));
    }
}
