//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with a bounded request timeout
//! - GET requests for listing and article pages
//! - Retry with exponential backoff for transient failures
//! - Prompt cancellation of in-flight requests and backoff sleeps

use crate::config::{FetchConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// How failed requests are retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per URL before giving up; `None` retries forever
    pub max_attempts: Option<u32>,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

impl RetryPolicy {
    /// Builds a policy from the `[fetch]` section; `max-attempts = 0` means unbounded
    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_attempts: (config.max_attempts > 0).then_some(config.max_attempts),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }

    /// Policy that never gives up on a URL
    pub fn unbounded(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: None,
            base_delay,
            max_delay,
        }
    }

    /// Returns true once `attempts` failed attempts exhaust the policy
    pub fn is_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Delay before the next attempt after `attempt` failures
    ///
    /// Doubles from `base_delay` with every failure and is capped at
    /// `max_delay`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = base_ms.saturating_mul(1u64 << exponent);
        Duration::from_millis(delay_ms).min(self.max_delay)
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Bound on a single request, connect included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL)
    let user_agent = match &config.contact_url {
        Some(contact) => format!(
            "{}/{} (+{})",
            config.crawler_name, config.crawler_version, contact
        ),
        None => format!("{}/{}", config.crawler_name, config.crawler_version),
    };

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with retry and cancellation
///
/// The fetcher holds no mutable state, so one instance is shared by all
/// workers.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Creates a fetcher from an existing client
    pub fn new(client: Client, policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            client,
            policy,
            cancel,
        }
    }

    /// Builds the client and retry policy from configuration
    pub fn from_config(
        fetch: &FetchConfig,
        user_agent: &UserAgentConfig,
        cancel: CancellationToken,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(fetch.timeout_secs))?;
        Ok(Self::new(client, RetryPolicy::from_config(fetch), cancel))
    }

    /// Fetches `url` and returns the response body
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Return body |
    /// | Any other status | Retry after backoff |
    /// | Timeout / connection error | Retry after backoff |
    /// | Attempts exhausted | `FetchError::Exhausted` |
    /// | Token cancelled | `FetchError::Cancelled` |
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempts = 0;

        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled {
                    url: url.to_string(),
                });
            }

            attempts += 1;
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url: url.to_string() });
                }
                outcome = self.attempt(url) => outcome,
            };

            let reason = match outcome {
                Ok(body) => return Ok(body),
                Err(FetchError::Transient { reason, .. }) => reason,
                Err(other) => return Err(other),
            };

            if self.policy.is_exhausted(attempts) {
                tracing::warn!("Giving up on {} after {} attempts: {}", url, attempts, reason);
                return Err(FetchError::Exhausted {
                    url: url.to_string(),
                    attempts,
                    last: reason,
                });
            }

            let delay = self.policy.backoff_delay(attempts);
            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempts,
                url,
                reason,
                delay
            );

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url: url.to_string() });
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Performs a single GET; every failure is transient
    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let transient = |reason: String| FetchError::Transient {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                transient("request timeout".to_string())
            } else if e.is_connect() {
                transient(format!("connection failed: {}", e))
            } else {
                transient(e.to_string())
            }
        })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(transient(format!("HTTP {}", status.as_u16())));
        }

        response.text().await.map_err(|e| transient(e.to_string()))
    }
}
