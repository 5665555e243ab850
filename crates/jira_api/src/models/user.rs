//! User records returned by Jira identity and directory endpoints.

use chrono_tz::Tz;
use serde::Deserialize;

use crate::error::{JiraError, Result};
use crate::models::AccountId;

/// Represents a user record as returned by Jira: Cloud fills `accountId`, Server fills
/// `name` and `key`.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl UserRecord {
    /// Returns the identifier Jira expects in JQL and lookups for this user.
    pub fn identifier(&self) -> Option<String> {
        [&self.account_id, &self.name, &self.key]
            .into_iter()
            .flatten()
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn into_account(self) -> Result<Account> {
        let id = self
            .identifier()
            .ok_or_else(|| JiraError::Decode("user record without identifier".to_string()))?;
        let time_zone = self.time_zone.as_deref().and_then(parse_time_zone);
        Ok(Account {
            id: AccountId::new(id),
            display_name: self.display_name.unwrap_or_default(),
            time_zone,
        })
    }
}

/// Remote identity with the time zone its worklog timestamps are localized in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub display_name: String,
    pub time_zone: Option<Tz>,
}

impl Account {
    /// Time zone used for day bucketing; UTC when the server reported none.
    pub fn zone(&self) -> Tz {
        self.time_zone.unwrap_or(Tz::UTC)
    }
}

fn parse_time_zone(name: &str) -> Option<Tz> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<Tz>() {
        Ok(zone) => Some(zone),
        Err(_) => {
            tracing::warn!(zone = trimmed, "unknown time zone reported by server");
            None
        }
    }
}
