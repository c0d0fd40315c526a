// Rate-limit-aware request executor shared by the Vimeo and webhook clients.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{RequestError, Result};

const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

/// Retry and pacing policy, injected into the executor so call spacing is
/// decoupled from the clients and testable with pinned times.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per call before giving up.
    pub max_attempts: u32,
    /// Sleep between failed attempts.
    pub retry_interval: Duration,
    /// Sleep after a successful call when quota is not near exhaustion.
    pub default_pause: Duration,
    /// Safety margin added on top of server-advertised reset/retry delays.
    pub reset_margin: Duration,
    /// Cap on 429 retries on the write path. These carry a server-suggested
    /// delay and are not counted against `max_attempts`.
    pub max_quota_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_interval: Duration::from_secs(2),
            default_pause: Duration::from_secs(2),
            reset_margin: Duration::from_secs(1),
            max_quota_retries: 10,
        }
    }
}

/// Wraps every outbound call with bounded retries and adaptive sleeping
/// driven by rate-limit response headers. The pause runs after a success,
/// so it paces the *next* call rather than reacting to a rejection.
pub struct Executor {
    policy: RetryPolicy,
}

impl Executor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Read path: perform a GET-style call and decode the JSON body.
    ///
    /// `build` is invoked once per attempt because a `RequestBuilder` cannot
    /// be reused after `send`.
    pub async fn get_json<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last = RequestError::Network("no attempt made".to_string());
        for attempt in 1..=self.policy.max_attempts {
            match self.try_get(&build).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %e,
                        "Request failed"
                    );
                    last = e;
                    tokio::time::sleep(self.policy.retry_interval).await;
                }
            }
        }
        Err(RequestError::Exhausted {
            attempts: self.policy.max_attempts,
            last: Box::new(last),
        })
    }

    async fn try_get<T, F>(&self, build: &F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let resp = build().send().await?;
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RequestError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let headers = resp.headers().clone();
        let body = resp
            .json::<T>()
            .await
            .map_err(|e| RequestError::Decode(e.to_string()))?;
        self.pause(&headers).await;
        Ok(body)
    }

    /// Write path: perform a POST-style call, success signal only.
    ///
    /// A 429 is distinguished from generic failure: the server tells us how
    /// long to wait (`retry_after` in the body), so we sleep exactly that
    /// plus the margin and retry without spending the generic budget.
    pub async fn post<F>(&self, build: F) -> Result<()>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut quota_retries = 0u32;
        let mut attempt = 0u32;
        let mut last = RequestError::Network("no attempt made".to_string());
        while attempt < self.policy.max_attempts {
            let resp = match build().send().await {
                Ok(resp) => resp,
                Err(e) => {
                    attempt += 1;
                    last = e.into();
                    warn!(attempt, error = %last, "Request failed");
                    tokio::time::sleep(self.policy.retry_interval).await;
                    continue;
                }
            };

            let status = resp.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let body = resp.text().await.unwrap_or_default();
                if let Some(wait) = parse_retry_after(&body) {
                    if quota_retries < self.policy.max_quota_retries {
                        quota_retries += 1;
                        let wait = wait + self.policy.reset_margin;
                        info!(wait_secs = wait.as_secs_f64(), "Quota rejected, honoring server delay");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                }
                // No usable retry_after (or too many quota rounds): fall back
                // to the generic retry path.
                attempt += 1;
                last = RequestError::Api {
                    status: status.as_u16(),
                    message: body,
                };
                warn!(attempt, error = %last, "Request failed");
                tokio::time::sleep(self.policy.retry_interval).await;
                continue;
            }

            if !status.is_success() {
                attempt += 1;
                last = RequestError::Api {
                    status: status.as_u16(),
                    message: resp.text().await.unwrap_or_default(),
                };
                warn!(attempt, error = %last, "Request failed");
                tokio::time::sleep(self.policy.retry_interval).await;
                continue;
            }

            self.pause(resp.headers()).await;
            return Ok(());
        }
        Err(RequestError::Exhausted {
            attempts: self.policy.max_attempts,
            last: Box::new(last),
        })
    }

    async fn pause(&self, headers: &HeaderMap) {
        let wait = pause_after_success(headers, Utc::now(), &self.policy);
        if wait > self.policy.default_pause {
            info!(wait_secs = wait.as_secs_f64(), "Rate limit near exhaustion, pacing down");
        } else {
            debug!(wait_secs = wait.as_secs_f64(), "Pacing next call");
        }
        tokio::time::sleep(wait).await;
    }
}

/// How long to sleep after a successful call, given its rate-limit headers.
/// Remaining quota at or below 1 means waiting out the advertised reset
/// (clamped to now) plus the margin; anything else gets the default pause.
pub fn pause_after_success(headers: &HeaderMap, now: DateTime<Utc>, policy: &RetryPolicy) -> Duration {
    let remaining = headers
        .get(RATE_LIMIT_REMAINING)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<i64>().ok());
    let reset_at = headers
        .get(RATE_LIMIT_RESET)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_reset);

    match (remaining, reset_at) {
        (Some(remaining), Some(reset_at)) if remaining <= 1 => {
            let until_reset = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
            until_reset + policy.reset_margin
        }
        _ => policy.default_pause,
    }
}

/// Reset time arrives as either epoch seconds or an ISO-8601 instant.
pub fn parse_reset(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(epoch) = value.parse::<i64>() {
        return Utc.timestamp_opt(epoch, 0).single();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Deserialize)]
struct QuotaRejection {
    retry_after: f64,
}

/// Discord's 429 body carries `retry_after` in (fractional) seconds.
fn parse_retry_after(body: &str) -> Option<Duration> {
    serde_json::from_str::<QuotaRejection>(body)
        .ok()
        .map(|r| Duration::from_secs_f64(r.retry_after.max(0.0)))
}
