//! One outbound GET with a timeout and bounded exponential backoff.

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::thread;
use std::time::Duration;

use crate::config::FetchOptions;

pub fn build_client(options: &FetchOptions) -> reqwest::Result<Client> {
    Client::builder()
        .user_agent(options.user_agent.clone())
        .timeout(options.timeout)
        .build()
}

/// GET `url`, retrying on transport errors, HTTP 429 and HTTP 5xx.
///
/// Waits `base_backoff * 2^(n-1)` after the n-th failed attempt. When the
/// attempts run out the last response is returned as-is, so callers still
/// have to check the status. A transport error on the final attempt is
/// returned to the caller.
pub fn fetch_with_retry(client: &Client, url: &str, options: &FetchOptions) -> reqwest::Result<Response> {
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let result = client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(options.timeout)
            .send();

        let last = attempt >= max_attempts;
        match result {
            Ok(response) if !last && is_retryable(response.status()) => {
                tracing::debug!(url, attempt, status = %response.status(), "retryable status");
            }
            Ok(response) => return Ok(response),
            Err(e) if !last => {
                tracing::debug!(url, attempt, error = %e, timeout = e.is_timeout(), "request failed");
            }
            Err(e) => return Err(e),
        }

        let delay = backoff_delay(options.base_backoff, attempt);
        tracing::debug!(url, attempt, delay_ms = delay.as_millis() as u64, "backing off");
        thread::sleep(delay);
        attempt += 1;
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// 400ms, 800ms, 1600ms, ... for the default base.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_from_base() {
        let base = Duration::from_millis(400);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(400));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(800));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(1600));
    }

    #[test]
    fn retries_only_throttling_and_server_errors() {
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable(StatusCode::NOT_FOUND));
        assert!(!is_retryable(StatusCode::OK));
    }
}
