use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::error::{Error, Result};
use crate::hosting::cache::ResponseCache;
use crate::observability::{
    HOSTING_CACHE_HITS, HOSTING_CACHE_MISSES, HOSTING_REQUESTS, HOSTING_REVALIDATIONS,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CACHE_MAX_AGE: time::Duration = time::Duration::seconds(60);

/// Supplies the access token for hosting-API requests.
///
/// The source resolved a shared token at call time through a dynamic module
/// lookup; here the provider is injected into the client that needs it.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, or `None` for anonymous access.
    async fn token(&self) -> Result<Option<String>>;
}

/// A fixed token known at construction time.
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    /// Creates a provider that always returns the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Result<Option<String>> {
        Ok(Some(self.token.clone()))
    }
}

/// Anonymous access: no token is ever attached.
pub struct Anonymous;

#[async_trait::async_trait]
impl TokenProvider for Anonymous {
    async fn token(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// Repository metadata, as returned by the hosting API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Repository {
    /// The `owner/name` form of the repository name.
    pub full_name: String,
    /// The repository description, if set.
    #[serde(default)]
    pub description: Option<String>,
    /// The default branch name.
    pub default_branch: String,
}

/// A pull request, as returned by the hosting API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequest {
    /// The pull-request number.
    pub number: u64,
    /// The title.
    pub title: String,
    /// The description body, if any.
    #[serde(default)]
    pub body: Option<String>,
    /// The state string ("open", "closed", ...).
    pub state: String,
}

/// One file changed by a pull request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PullRequestFile {
    /// The path of the changed file.
    pub filename: String,
    /// The change kind ("added", "modified", "removed", ...).
    pub status: String,
    /// Lines added.
    pub additions: u64,
    /// Lines removed.
    pub deletions: u64,
    /// The unified diff hunk, when the API provides one.
    #[serde(default)]
    pub patch: Option<String>,
}

/// Read-only client for a code-hosting REST API.
///
/// Every fetch goes through a keyed response cache: entries inside the
/// freshness window are served without a request, and stale entries are
/// revalidated with `If-None-Match` so a 304 refreshes the entry without
/// refetching the body.
pub struct HostingClient {
    client: ReqwestClient,
    base_url: String,
    token_provider: Arc<dyn TokenProvider>,
    cache: ResponseCache,
}

impl std::fmt::Debug for HostingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostingClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HostingClient {
    /// Creates a new hosting client for the given API base URL.
    pub fn new(base_url: impl Into<String>, token_provider: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::with_options(base_url, token_provider, None, None)
    }

    /// Creates a new client with custom timeout and cache freshness window.
    pub fn with_options(
        base_url: impl Into<String>,
        token_provider: Arc<dyn TokenProvider>,
        timeout: Option<Duration>,
        cache_max_age: Option<time::Duration>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        Url::parse(&base_url)?;

        let client = ReqwestClient::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            token_provider,
            cache: ResponseCache::new(cache_max_age.unwrap_or(DEFAULT_CACHE_MAX_AGE)),
        })
    }

    /// Returns the response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Returns the response cache for mutation.
    pub fn cache_mut(&mut self) -> &mut ResponseCache {
        &mut self.cache
    }

    async fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("geminius"));
        if let Some(token) = self.token_provider.token().await? {
            let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                Error::authentication("access token contains invalid header characters")
            })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn process_error_response(response: Response, path: &str) -> Error {
        let status = response.status();
        let status_code = status.as_u16();

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        #[derive(Deserialize)]
        struct ErrorResponse {
            message: Option<String>,
        }

        let error_body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Error::http_client(
                    format!("Failed to read error response: {}", e),
                    Some(Box::new(e)),
                );
            }
        };

        let error_message = serde_json::from_str::<ErrorResponse>(&error_body)
            .ok()
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        match status_code {
            401 => Error::authentication(error_message),
            403 => Error::permission(error_message),
            404 => Error::not_found(error_message, Some(path.to_string())),
            429 => Error::rate_limit(error_message, retry_after),
            500 => Error::internal_server(error_message),
            502..=504 => Error::service_unavailable(error_message, retry_after),
            _ => Error::api(status_code, None, error_message),
        }
    }

    /// Fetches a JSON resource, serving from and updating the cache.
    pub async fn get_json(&mut self, path: &str) -> Result<Value> {
        if let Some(value) = self.cache.fresh(path) {
            HOSTING_CACHE_HITS.click();
            return Ok(value.clone());
        }
        HOSTING_CACHE_MISSES.click();

        let url = format!("{}{}", self.base_url, path);
        let mut headers = self.default_headers().await?;
        if let Some(etag) = self.cache.validator(path) {
            if let Ok(value) = HeaderValue::from_str(etag) {
                headers.insert(header::IF_NONE_MATCH, value);
            }
        }

        HOSTING_REQUESTS.click();
        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::timeout(format!("Request timed out: {}", e), None)
                } else if e.is_connect() {
                    Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
                } else {
                    Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
                }
            })?;

        if response.status() == StatusCode::NOT_MODIFIED {
            HOSTING_REVALIDATIONS.click();
            self.cache.touch(path);
            return self.cache.value(path).cloned().ok_or_else(|| {
                Error::api(
                    304,
                    None,
                    format!("server revalidated {path} but no entry is cached"),
                )
            });
        }

        if !response.status().is_success() {
            return Err(Self::process_error_response(response, path).await);
        }

        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|val| val.to_str().ok())
            .map(String::from);

        let value = response.json::<Value>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })?;

        self.cache.insert(path, value.clone(), etag);
        Ok(value)
    }

    /// Fetches repository metadata.
    pub async fn repository(&mut self, owner: &str, repo: &str) -> Result<Repository> {
        let value = self.get_json(&format!("repos/{owner}/{repo}")).await?;
        serde_json::from_value(value).map_err(Error::from)
    }

    /// Fetches one pull request.
    pub async fn pull_request(&mut self, owner: &str, repo: &str, number: u64) -> Result<PullRequest> {
        let value = self
            .get_json(&format!("repos/{owner}/{repo}/pulls/{number}"))
            .await?;
        serde_json::from_value(value).map_err(Error::from)
    }

    /// Fetches the files changed by a pull request.
    pub async fn pull_request_files(
        &mut self,
        owner: &str,
        repo: &str,
        number: u64,
    ) -> Result<Vec<PullRequestFile>> {
        let value = self
            .get_json(&format!("repos/{owner}/{repo}/pulls/{number}/files"))
            .await?;
        serde_json::from_value(value).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn invalid_base_url_rejected() {
        let err = HostingClient::new("not a url", Arc::new(Anonymous)).unwrap_err();
        assert!(matches!(err, Error::Url { .. }));
    }

    #[tokio::test]
    async fn static_token_provider() {
        let provider = StaticToken::new("tok_123");
        assert_eq!(provider.token().await.unwrap(), Some("tok_123".to_string()));
    }

    #[tokio::test]
    async fn anonymous_provider() {
        assert_eq!(Anonymous.token().await.unwrap(), None);
    }

    #[test]
    fn pull_request_file_deserialization() {
        let value = json!({
            "filename": "src/main.rs",
            "status": "modified",
            "additions": 10,
            "deletions": 2,
            "patch": "@@ -1 +1 @@"
        });
        let file: PullRequestFile = serde_json::from_value(value).unwrap();
        assert_eq!(file.filename, "src/main.rs");
        assert_eq!(file.additions, 10);
        assert_eq!(file.patch.as_deref(), Some("@@ -1 +1 @@"));
    }

    #[test]
    fn repository_deserialization_tolerates_missing_description() {
        let value = json!({
            "full_name": "octo/widgets",
            "default_branch": "main"
        });
        let repo: Repository = serde_json::from_value(value).unwrap();
        assert_eq!(repo.full_name, "octo/widgets");
        assert_eq!(repo.description, None);
    }
}
