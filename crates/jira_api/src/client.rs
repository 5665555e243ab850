use crate::config::{JiraConfig, SERVER_INFO_PATH};
use crate::error::{JiraError, Result};
use crate::models::ServerInfo;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Thin authenticated transport over the Jira REST root. Paths are relative to
/// the configured base URL and carry their own API prefix.
#[derive(Clone)]
pub struct JiraClient {
    http: HttpClient,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(JiraError::InvalidConfig("Jira host is empty".to_string()));
        }
        let http = build_http_client(&config)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    pub async fn get<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::GET, path).query(query);
        let response = request.send().await?;
        Self::parse_json(response).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_with_header(path, body, None).await.map(|(value, _)| value)
    }

    /// Posts `body` and additionally returns the percent-decoded value of
    /// response header `header`, when requested and present.
    pub async fn post_with_header<B, T>(
        &self,
        path: &str,
        body: &B,
        header: Option<&str>,
    ) -> Result<(T, Option<String>)>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.request(Method::POST, path).json(body).send().await?;
        let captured = header.and_then(|name| decoded_header(&response, name));
        let value = Self::parse_json(response).await?;
        Ok((value, captured))
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.request(Method::DELETE, path).send().await?;
        Self::ensure_success(response).await
    }

    pub async fn server_info(&self) -> Result<ServerInfo> {
        self.get(SERVER_INFO_PATH, &[]).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(method = method.as_str(), path, "jira request");
        self.http.request(method, self.url_for(path))
    }

    fn url_for(&self, path: &str) -> String {
        let mut base = self.config.root();
        base.push_str(path.trim_start_matches('/'));
        base
    }

    async fn parse_json<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::failure(status, response).await);
        }
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return serde_json::from_slice(b"null").map_err(JiraError::from);
        }
        serde_json::from_slice(&bytes).map_err(JiraError::from)
    }

    async fn ensure_success(response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::failure(status, response).await)
        }
    }

    async fn failure(status: StatusCode, response: Response) -> JiraError {
        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            JiraError::Authentication(format!(
                "Access denied ({}) - {}",
                status,
                error_message(&body)
            ))
        } else {
            JiraError::status(status, error_message(&body))
        }
    }
}

fn build_http_client(config: &JiraConfig) -> Result<HttpClient> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, header_value(config.credentials.header_value())?);
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(config.user_agent.clone())?);

    HttpClient::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .build()
        .map_err(|err| JiraError::InvalidConfig(err.to_string()))
}

fn header_value(value: String) -> Result<HeaderValue> {
    let mut value =
        HeaderValue::from_str(&value).map_err(|err| JiraError::InvalidConfig(err.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}

fn decoded_header(response: &Response, name: &str) -> Option<String> {
    let raw = response.headers().get(name)?.to_str().ok()?;
    let decoded = urlencoding::decode(raw).ok()?.trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

/// Extracts Jira's `errorMessages`/`errors` from a failure body, falling back
/// to the raw text.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };
    let mut messages: Vec<String> = value
        .get("errorMessages")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| item.as_str().map(str::to_string))
        .collect();
    if let Some(errors) = value.get("errors").and_then(Value::as_object) {
        messages.extend(
            errors
                .iter()
                .filter_map(|(field, msg)| msg.as_str().map(|text| format!("{field}: {text}"))),
        );
    }
    if messages.is_empty() {
        body.trim().to_string()
    } else {
        messages.join("; ")
    }
}
