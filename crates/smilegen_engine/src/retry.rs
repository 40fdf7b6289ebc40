use std::time::Duration;

use crate::FailureKind;

/// What happens after a failed attempt.
///
/// A call moves `Idle -> Sending -> {Succeeded | Retrying -> Sending | Failed}`;
/// this is the `Retrying`/`Failed` branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { retry: u32, delay: Duration },
    GiveUp,
}

/// Bounded retries with linear backoff (`base_delay * retry`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Timeouts and 4xx responses are final; local and payload errors never reach the wire twice.
    pub fn is_retryable(kind: &FailureKind) -> bool {
        match kind {
            FailureKind::Timeout => false,
            FailureKind::Api { status: Some(code) } => !(400..500).contains(code),
            // The server answered and rejected the job in its payload.
            FailureKind::Api { status: None } => false,
            FailureKind::Network => true,
            FailureKind::Validation
            | FailureKind::MissingCredential
            | FailureKind::InvalidResponse
            | FailureKind::ResultNotReady => false,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Next state after `attempt` (1-based) failed with `kind`.
    pub fn after_failure(&self, attempt: u32, kind: &FailureKind) -> RetryDecision {
        if attempt <= self.max_retries && Self::is_retryable(kind) {
            RetryDecision::Retry {
                retry: attempt,
                delay: self.delay_for(attempt),
            }
        } else {
            RetryDecision::GiveUp
        }
    }
}

/// Suspension point used for backoff, polling and pacing.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
