//! Retry policy and error classification (spec.md 4.D), grounded on the
//! teacher's `copilot_sdk::error::CopilotError::is_retryable`/`status_code`
//! status-driven classification, extended with the message-sniffing rules
//! spec.md adds for errors that carry no HTTP status.

use chrono::Utc;
use membench_core::{CaseError, CaseResult, ErrorCategory, RetryConfig, RetryAttempt};
use rand::Rng;
use std::future::Future;

const TRANSIENT_MESSAGE_MARKERS: &[&str] = &[
    "timeout",
    "econnreset",
    "econnrefused",
    "network",
    "socket hang up",
    "etimedout",
    "enotfound",
];

/// Classify an error as transient (worth retrying) or permanent.
pub fn classify(error: &CaseError) -> ErrorCategory {
    if let Some(status) = error.status {
        return match status {
            429 | 500 | 502 | 503 | 504 => ErrorCategory::Transient,
            400 | 401 | 403 | 404 | 422 => ErrorCategory::Permanent,
            s if s >= 500 => ErrorCategory::Transient,
            _ => ErrorCategory::Permanent,
        };
    }
    let message = error.message.to_lowercase();
    if TRANSIENT_MESSAGE_MARKERS.iter().any(|marker| message.contains(marker)) {
        ErrorCategory::Transient
    } else {
        ErrorCategory::Permanent
    }
}

/// `delay = min(base * 2^attempt, max) * U(1-jitter, 1+jitter)`.
fn compute_delay_ms(policy: &RetryConfig, attempt: u32) -> u64 {
    let exp = policy.base_delay_ms as f64 * 2f64.powi(attempt as i32);
    let capped = exp.min(policy.max_delay_ms as f64);
    let jitter = policy.jitter_factor.clamp(0.0, 1.0);
    let factor = rand::thread_rng().gen_range((1.0 - jitter)..=(1.0 + jitter));
    (capped * factor).round() as u64
}

/// Run `attempt` under the retry policy. Transient errors are retried up to
/// `max_retries` times with exponential backoff and jitter; permanent
/// errors fail fast. The final outcome is always a `CaseResult` — a case
/// that exhausts its retries is recorded with `status = error`, never
/// propagated as an exception (spec.md 4.D, 7).
pub async fn execute_with_retry<F, Fut>(
    policy: &RetryConfig,
    case_id: &str,
    mut attempt: F,
) -> (CaseResult, Vec<RetryAttempt>)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<CaseResult, CaseError>>,
{
    let mut history = Vec::new();
    let mut current_attempt = 0u32;

    loop {
        match attempt().await {
            Ok(result) => return (result, history),
            Err(error) => {
                let category = classify(&error);
                let retryable = category == ErrorCategory::Transient && current_attempt < policy.max_retries;

                if !retryable {
                    let result = CaseResult::new(case_id, membench_core::CaseStatus::Error, 0).with_error(error);
                    return (result, history);
                }

                let delay_ms = compute_delay_ms(policy, current_attempt);
                history.push(RetryAttempt {
                    attempt: current_attempt + 1,
                    category: category.to_string(),
                    message: error.message.clone(),
                    timestamp: Utc::now(),
                    delay_ms,
                });
                tokio::time::sleep(std::time::Duration::from_millis(delay_ms)).await;
                current_attempt += 1;
            }
        }
    }
}
