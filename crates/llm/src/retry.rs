//! Bounded, cancellable completion calls.
//!
//! Every completion made by the pipeline goes through
//! [`complete_with_policy`]: each attempt is bounded by a timeout, retryable
//! failures are retried with exponential backoff up to a fixed number of
//! attempts, and a cancellation token can abort the call at any point.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use pulse_core::{AppConfig, AppError, AppResult};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Initial backoff between attempts.
const INITIAL_BACKOFF_MS: u64 = 100;

/// Timeout and retry bounds for one logical completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPolicy {
    /// Budget for a single attempt
    pub timeout: Duration,

    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles afterwards
    pub initial_backoff: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }
}

impl CallPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timeout: config.llm_timeout(),
            max_attempts: config.max_attempts,
            ..Self::default()
        }
    }

    /// Backoff after the given (1-based) failed attempt.
    fn backoff_after(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2_u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run a completion under `policy`, aborting when `cancel` fires.
///
/// Returns the last error once attempts are exhausted, the first
/// non-retryable error immediately, and `AppError::Cancelled` on cancellation.
pub async fn complete_with_policy(
    client: &dyn LlmClient,
    request: &LlmRequest,
    policy: &CallPolicy,
    cancel: &CancellationToken,
) -> AppResult<LlmResponse> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if cancel.is_cancelled() {
            return Err(AppError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            result = tokio::time::timeout(policy.timeout, client.complete(request)) => result,
        };

        let error = match outcome {
            Ok(Ok(response)) => return Ok(response),
            Ok(Err(e)) => e,
            Err(_) => AppError::Timeout(format!(
                "{} completion exceeded {:?}",
                client.provider_name(),
                policy.timeout
            )),
        };

        if !error.is_retryable() || attempt >= max_attempts {
            return Err(error);
        }

        let backoff = policy.backoff_after(attempt);
        tracing::warn!(
            "Completion failed (attempt {}/{}), retrying in {:?}: {}",
            attempt,
            max_attempts,
            backoff,
            error
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            _ = tokio::time::sleep(backoff) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{status_error, MockLlmClient, MockReply};
    use reqwest::StatusCode;
    use std::sync::Arc;

    fn fast_policy(max_attempts: u32) -> CallPolicy {
        CallPolicy {
            timeout: Duration::from_millis(200),
            max_attempts,
            initial_backoff: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = CallPolicy {
            initial_backoff: Duration::from_millis(100),
            ..CallPolicy::default()
        };
        assert_eq!(policy.backoff_after(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            llm_timeout_secs: 5,
            max_attempts: 2,
            ..AppConfig::default()
        };
        let policy = CallPolicy::from_config(&config);
        assert_eq!(policy.timeout, Duration::from_secs(5));
        assert_eq!(policy.max_attempts, 2);
    }

    #[tokio::test]
    async fn test_transient_error_then_success() {
        let client = MockLlmClient::with_replies([
            MockReply::Error("connection reset".to_string()),
            MockReply::Text("live".to_string()),
        ]);

        let response = complete_with_policy(
            &client,
            &LlmRequest::new("q", "m"),
            &fast_policy(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(response.content, "live");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let client = MockLlmClient::with_replies([
            MockReply::Error("a".to_string()),
            MockReply::Error("b".to_string()),
            MockReply::Text("never reached".to_string()),
        ]);

        let err = complete_with_policy(
            &client,
            &LlmRequest::new("q", "m"),
            &fast_policy(2),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("b"));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let client =
            MockLlmClient::with_handler(|_| Err(AppError::Prompt("bad template".to_string())));

        let err = complete_with_policy(
            &client,
            &LlmRequest::new("q", "m"),
            &fast_policy(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Prompt(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_per_attempt() {
        let client = MockLlmClient::scripted(["late", "late"]).with_delay(Duration::from_secs(5));
        let policy = CallPolicy {
            timeout: Duration::from_millis(20),
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
        };

        let err = complete_with_policy(
            &client,
            &LlmRequest::new("q", "m"),
            &policy,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Timeout(_)));
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let client = MockLlmClient::scripted(["vector"]);
        let token = CancellationToken::new();
        token.cancel();

        let err = complete_with_policy(&client, &LlmRequest::new("q", "m"), &fast_policy(3), &token)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_not_retried() {
        let client = MockLlmClient::with_handler(|_| {
            Err(status_error(
                "Gemini",
                StatusCode::UNAUTHORIZED,
                "API key not valid",
            ))
        });

        let err = complete_with_policy(
            &client,
            &LlmRequest::new("q", "m"),
            &fast_policy(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_throttled_call_is_retried() {
        let client = MockLlmClient::with_handler(|_| {
            Err(status_error("Gemini", StatusCode::TOO_MANY_REQUESTS, "slow down"))
        });

        let err = complete_with_policy(
            &client,
            &LlmRequest::new("q", "m"),
            &fast_policy(3),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_cancelled_mid_flight() {
        let client =
            Arc::new(MockLlmClient::scripted(["slow"]).with_delay(Duration::from_secs(5)));
        let token = CancellationToken::new();

        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let policy = CallPolicy {
            timeout: Duration::from_secs(10),
            ..fast_policy(1)
        };
        let err = complete_with_policy(client.as_ref(), &LlmRequest::new("q", "m"), &policy, &token)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
    }
}
