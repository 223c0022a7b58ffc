//! HTTP client for the eBay Browse API.
//!
//! Wraps `reqwest` with OAuth2 client-credentials token management, typed
//! response deserialization, and an eBay-specific error taxonomy. The token
//! is fetched lazily, cached behind a `tokio::sync::Mutex`, and refreshed
//! 60 seconds before its stated expiry.

use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode, Url};
use tokio::sync::Mutex;

use crate::error::EbayError;
use crate::retry::retry_with_backoff;
use crate::types::{BrowseSearchPage, TokenResponse};

const DEFAULT_BASE_URL: &str = "https://api.ebay.com/";
const OAUTH_SCOPE: &str = "https://api.ebay.com/oauth/api_scope";

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 1_000;

/// Refresh the cached token this long before it actually expires.
const TOKEN_EXPIRY_SLACK: Duration = Duration::from_secs(60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Client for the eBay Browse API.
///
/// Manages the HTTP client, OAuth credentials, and base URLs. Use
/// [`EbayClient::new`] for production or [`EbayClient::with_base_urls`] to
/// point at a mock server in tests.
pub struct EbayClient {
    client: Client,
    client_id: String,
    client_secret: String,
    api_base: Url,
    auth_base: Url,
    max_retries: u32,
    backoff_base_ms: u64,
    token: Mutex<Option<CachedToken>>,
}

impl EbayClient {
    /// Creates a new client pointed at the production eBay API.
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
    ) -> Result<Self, EbayError> {
        Self::with_base_urls(
            client_id,
            client_secret,
            timeout_secs,
            DEFAULT_BASE_URL,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a new client with custom API and auth base URLs (for testing
    /// with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`EbayError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`EbayError::InvalidBaseUrl`] if either
    /// base URL is not a valid URL.
    pub fn with_base_urls(
        client_id: &str,
        client_secret: &str,
        timeout_secs: u64,
        api_base: &str,
        auth_base: &str,
    ) -> Result<Self, EbayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("wmdb/0.1 (watch-market)")
            .build()?;

        // Normalise: ensure base URLs end with exactly one slash so that
        // Url::join appends rather than replacing the last path segment.
        let parse_base = |raw: &str| -> Result<Url, EbayError> {
            let normalised = format!("{}/", raw.trim_end_matches('/'));
            Url::parse(&normalised).map_err(|_| EbayError::InvalidBaseUrl(raw.to_owned()))
        };

        Ok(Self {
            client,
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            api_base: parse_base(api_base)?,
            auth_base: parse_base(auth_base)?,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            token: Mutex::new(None),
        })
    }

    /// Overrides the retry policy for [`EbayClient::search_items`]. A
    /// `max_retries` of 0 disables retrying.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Searches Browse API item summaries for `query`.
    ///
    /// Calls `GET /buy/browse/v1/item_summary/search` with a bearer token,
    /// fetching (and caching) the token first if needed. `limit` is clamped
    /// to eBay's maximum of 200. Transient failures (network errors, 5xx,
    /// 429) are retried with exponential back-off per the client's retry
    /// policy before the error surfaces.
    ///
    /// # Errors
    ///
    /// - [`EbayError::Auth`] if the token fetch fails or the API rejects
    ///   the bearer token.
    /// - [`EbayError::RateLimited`] on HTTP 429, once retries are spent.
    /// - [`EbayError::Http`] on network failure, once retries are spent.
    /// - [`EbayError::Deserialize`] if the response does not match the
    ///   expected shape.
    pub async fn search_items(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<BrowseSearchPage, EbayError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.search_items_once(query, limit, offset)
        })
        .await
    }

    /// One un-retried search request.
    async fn search_items_once(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<BrowseSearchPage, EbayError> {
        let token = self.bearer_token().await?;

        let mut url = self
            .api_base
            .join("buy/browse/v1/item_summary/search")
            .map_err(|_| EbayError::InvalidBaseUrl(self.api_base.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", query);
            pairs.append_pair("limit", &limit.min(200).to_string());
            pairs.append_pair("offset", &offset.to_string());
        }

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                // Token revoked out from under us; drop the cache so the
                // next call refreshes.
                *self.token.lock().await = None;
                Err(EbayError::Auth("bearer token rejected".to_owned()))
            }
            StatusCode::TOO_MANY_REQUESTS => Err(EbayError::RateLimited {
                retry_after_secs: parse_retry_after(&response),
            }),
            status if !status.is_success() => Err(EbayError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }),
            _ => {
                let body = response.text().await?;
                serde_json::from_str(&body).map_err(|e| EbayError::Deserialize {
                    context: format!("item_summary/search(q={query})"),
                    source: e,
                })
            }
        }
    }

    /// Returns a valid access token, fetching a new one when the cache is
    /// empty or within [`TOKEN_EXPIRY_SLACK`] of expiry.
    ///
    /// The mutex is held across the refresh so concurrent callers make a
    /// single token request rather than a stampede.
    async fn bearer_token(&self) -> Result<String, EbayError> {
        let mut guard = self.token.lock().await;

        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > Instant::now() {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self.fetch_token().await?;
        let expires_in = Duration::from_secs(token.expires_in);
        let expires_at = Instant::now() + expires_in.saturating_sub(TOKEN_EXPIRY_SLACK);
        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            expires_at,
        });
        tracing::debug!(expires_in_secs = token.expires_in, "fetched eBay access token");
        Ok(access_token)
    }

    /// Performs the OAuth2 client-credentials grant against the auth base.
    async fn fetch_token(&self) -> Result<TokenResponse, EbayError> {
        let url = self
            .auth_base
            .join("identity/v1/oauth2/token")
            .map_err(|_| EbayError::InvalidBaseUrl(self.auth_base.to_string()))?;

        let response = self
            .client
            .post(url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", OAUTH_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(EbayError::Auth(format!(
                "token request failed with status {status}: {body}"
            )));
        }

        serde_json::from_str(&body).map_err(|e| EbayError::Deserialize {
            context: "oauth2/token".to_owned(),
            source: e,
        })
    }
}

/// Extracts the `Retry-After` header as whole seconds, if present and numeric.
fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_base_urls_rejects_invalid_url() {
        let result = EbayClient::with_base_urls("id", "secret", 30, "not a url", "also bad");
        assert!(matches!(result, Err(EbayError::InvalidBaseUrl(_))));
    }

    #[test]
    fn with_base_urls_normalises_trailing_slash() {
        let client = EbayClient::with_base_urls(
            "id",
            "secret",
            30,
            "https://api.ebay.com",
            "https://api.ebay.com/",
        )
        .expect("client construction should not fail");
        assert_eq!(client.api_base.as_str(), "https://api.ebay.com/");
        assert_eq!(client.auth_base.as_str(), "https://api.ebay.com/");
    }
}
