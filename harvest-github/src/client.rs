//! GitHub GraphQL client
//!
//! [`GraphQlTransport`] is the only capability the harvester needs: send a
//! query with variables, get JSON back. [`GitHubClient`] implements it over
//! HTTPS with a bearer token and retries transport failures.

use std::time::Duration;

use async_trait::async_trait;
use harvest_core::config::GitHubConfig;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::{Error, Result};

/// Executes GraphQL documents against an endpoint
#[async_trait]
pub trait GraphQlTransport: Send + Sync {
    /// Send one query and return the whole JSON response body
    async fn execute(&self, query: &str, variables: &Value) -> Result<Value>;
}

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphQLResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

/// Run a query and deserialize its `data`
///
/// Any `errors` payload is fatal, whatever the query.
pub async fn query<T: DeserializeOwned>(
    transport: &dyn GraphQlTransport,
    query: &str,
    variables: &Value,
) -> Result<T> {
    let body = transport.execute(query, variables).await?;
    let response: GraphQLResponse = serde_json::from_value(body)
        .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        return Err(Error::GraphQl(errors));
    }

    let data = response
        .data
        .ok_or_else(|| Error::Parse("GraphQL response missing data".to_string()))?;
    serde_json::from_value(data).map_err(|e| Error::Parse(format!("Unexpected GraphQL data: {}", e)))
}

/// Bounded exponential backoff for transport failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl From<&GitHubConfig> for RetryPolicy {
    fn from(config: &GitHubConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
        }
    }
}

/// GitHub GraphQL API client
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    endpoint: Url,
    token: String,
    retry: RetryPolicy,
}

impl GitHubClient {
    /// Create a client for `endpoint` authenticated with `token`
    pub fn new(endpoint: &str, token: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Parse(format!("Invalid GraphQL endpoint {}: {}", endpoint, e)))?;
        let http = Client::builder()
            .user_agent(concat!("harvest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            token: token.into(),
            retry,
        })
    }

    /// Create a client from the `[github]` config section
    pub fn from_config(config: &GitHubConfig, token: impl Into<String>) -> Result<Self> {
        Self::new(&config.api_url, token, RetryPolicy::from(config))
    }

    /// Build the POST request for one query
    pub fn build_request(&self, query: &str, variables: &Value) -> Result<reqwest::Request> {
        let body = json!({
            "query": query,
            "variables": variables,
        });
        self.http
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&body)
            .build()
            .map_err(|e| Error::Parse(format!("Failed to build GraphQL request: {}", e)))
    }

    async fn execute_once(&self, query: &str, variables: &Value) -> Result<Value> {
        let request = self.build_request(query, variables)?;
        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| Error::Transport(format!("GraphQL request failed: {}", e)))?;

        let status = response.status();
        if status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Transport(format!("HTTP {}: {}", status, body)));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        response.json().await.map_err(|e| {
            if e.is_decode() {
                Error::Parse(format!("GraphQL response is not JSON: {}", e))
            } else {
                Error::Transport(format!("Failed to read GraphQL response: {}", e))
            }
        })
    }
}

#[async_trait]
impl GraphQlTransport for GitHubClient {
    async fn execute(&self, query: &str, variables: &Value) -> Result<Value> {
        let mut retry = 0;
        loop {
            debug!(endpoint = %self.endpoint, attempt = retry + 1, "Sending GraphQL request");
            match self.execute_once(query, variables).await {
                Err(e) if e.is_retryable() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay_for(retry);
                    warn!(error = %e, retry = retry + 1, delay_ms = delay.as_millis() as u64, "Transport failure, retrying");
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                other => return other,
            }
        }
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
