use std::time::Duration;

use crate::auth::Credentials;

pub const DEFAULT_USER_AGENT: &str = "jira-timesheet";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const SERVER_INFO_PATH: &str = "rest/api/2/serverInfo";

/// Remote API generation a Jira deployment speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiFlavor {
    /// Jira Server / Data Center, REST API v2.
    Server,
    /// Jira Cloud, REST API v3.
    Cloud,
}

impl ApiFlavor {
    pub fn base_path(&self) -> &'static str {
        match self {
            ApiFlavor::Server => "rest/api/2/",
            ApiFlavor::Cloud => "rest/api/3/",
        }
    }

    /// Picks the flavor from the `deploymentType` reported by `serverInfo`.
    pub fn from_deployment_type(value: Option<&str>) -> Self {
        match value {
            Some(kind) if kind.trim().eq_ignore_ascii_case("cloud") => ApiFlavor::Cloud,
            _ => ApiFlavor::Server,
        }
    }
}

#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub credentials: Credentials,
    pub user_agent: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub flavor: Option<ApiFlavor>,
}

impl JiraConfig {
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            flavor: None,
        }
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn with_connect_timeout(mut self, duration: Duration) -> Self {
        self.connect_timeout = duration;
        self
    }

    /// Skips the `serverInfo` request and always talks the given API flavor.
    pub fn with_flavor(mut self, flavor: ApiFlavor) -> Self {
        self.flavor = Some(flavor);
        self
    }

    /// Base URL with exactly one trailing slash.
    pub fn root(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}
