//! The per-request retry state machine.
//!
//! ```text
//! Pending -> Sent -> Succeeded
//!                 -> ProtocolFailed
//!                 -> TransportFailed -> Sent -> ...
//!                                    -> Exhausted
//! ```
//!
//! The machine does no I/O and never sleeps; the caller performs the attempt and waits for the
//! delay reported by [`RetryState::delay_before_next`].

use std::{convert::TryFrom, time::Duration};

use serde_json::Value;

use crate::{
    config::ExponentialBackoffConfig,
    transport::{RpcErrorObject, TransportError},
};

/// How often and how patiently to retry transport failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: usize,
    backoff: ExponentialBackoffConfig,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, backoff: ExponentialBackoffConfig) -> Self {
        RetryPolicy {
            max_retries,
            backoff,
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Wait before attempt number `attempt`, counting from zero.
    ///
    /// Attempt 0 goes out immediately. Attempt `n` waits `initial_delay_ms * coefficient^n`,
    /// capped at `max_delay_ms`.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let max = self.backoff.max_delay_ms;
        let delay_ms = u32::try_from(attempt)
            .ok()
            .and_then(|exponent| self.backoff.coefficient.checked_pow(exponent))
            .and_then(|factor| self.backoff.initial_delay_ms.checked_mul(factor))
            .map_or(max, |delay| delay.min(max));
        Duration::from_millis(delay_ms)
    }
}

/// What a single attempt produced.
#[derive(Clone, Debug, PartialEq)]
pub enum AttemptOutcome {
    Succeeded(Value),
    ProtocolFailed(RpcErrorObject),
    TransportFailed(TransportError),
}

/// Where a request is in its lifecycle. `attempt` counts from zero; `attempts` is a total.
#[derive(Clone, Debug, PartialEq)]
pub enum RetryState {
    Pending,
    Sent {
        attempt: usize,
    },
    Succeeded {
        attempts: usize,
        result: Value,
    },
    ProtocolFailed {
        attempts: usize,
        error: RpcErrorObject,
    },
    TransportFailed {
        attempt: usize,
        error: TransportError,
    },
    Exhausted {
        attempts: usize,
        error: TransportError,
    },
}

impl RetryState {
    /// The attempt about to be sent: `Pending` and `TransportFailed` move to `Sent`.
    ///
    /// Any other state is returned unchanged.
    pub fn send(self) -> Self {
        match self {
            RetryState::Pending => RetryState::Sent { attempt: 0 },
            RetryState::TransportFailed { attempt, .. } => RetryState::Sent {
                attempt: attempt + 1,
            },
            other => other,
        }
    }

    /// Records the outcome of the attempt in flight. Only meaningful in the `Sent` state.
    pub fn record(self, outcome: AttemptOutcome, policy: &RetryPolicy) -> Self {
        let RetryState::Sent { attempt } = self else {
            return self;
        };
        match outcome {
            AttemptOutcome::Succeeded(result) => RetryState::Succeeded {
                attempts: attempt + 1,
                result,
            },
            AttemptOutcome::ProtocolFailed(error) => RetryState::ProtocolFailed {
                attempts: attempt + 1,
                error,
            },
            AttemptOutcome::TransportFailed(error) if attempt < policy.max_retries => {
                RetryState::TransportFailed { attempt, error }
            }
            AttemptOutcome::TransportFailed(error) => RetryState::Exhausted {
                attempts: attempt + 1,
                error,
            },
        }
    }

    /// How long to wait before the next attempt, or `None` when no attempt should follow.
    pub fn delay_before_next(&self, policy: &RetryPolicy) -> Option<Duration> {
        match self {
            RetryState::Pending => Some(policy.delay_for_attempt(0)),
            RetryState::TransportFailed { attempt, .. } => {
                Some(policy.delay_for_attempt(attempt + 1))
            }
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. }
                | RetryState::ProtocolFailed { .. }
                | RetryState::Exhausted { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(max_retries, ExponentialBackoffConfig::default())
    }

    fn refused() -> AttemptOutcome {
        AttemptOutcome::TransportFailed(TransportError::Connection("refused".to_string()))
    }

    #[test]
    fn default_delays_should_double_from_two_seconds() {
        let policy = policy(10);
        let delays: Vec<_> = (0..5).map(|n| policy.delay_for_attempt(n)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(16),
            ]
        );
    }

    #[test]
    fn delays_should_be_capped() {
        let policy = RetryPolicy::new(
            100,
            ExponentialBackoffConfig {
                initial_delay_ms: 500,
                max_delay_ms: 3_000,
                coefficient: 3,
            },
        );
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(1_500));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(3_000));
        assert_eq!(policy.delay_for_attempt(64), Duration::from_millis(3_000));
    }

    #[test]
    fn should_retry_transport_failures_until_exhausted() {
        let policy = policy(2);
        let mut state = RetryState::Pending;
        let mut sent = 0;
        while !state.is_terminal() {
            assert!(state.delay_before_next(&policy).is_some());
            state = state.send();
            sent += 1;
            state = state.record(refused(), &policy);
        }
        assert_eq!(sent, 3);
        assert_eq!(
            state,
            RetryState::Exhausted {
                attempts: 3,
                error: TransportError::Connection("refused".to_string()),
            }
        );
        assert_eq!(state.delay_before_next(&policy), None);
    }

    #[test]
    fn protocol_failures_should_be_terminal() {
        let policy = policy(5);
        let error = RpcErrorObject {
            code: -32008,
            message: "invalid deploy".to_string(),
            data: None,
        };
        let state = RetryState::Pending
            .send()
            .record(AttemptOutcome::ProtocolFailed(error.clone()), &policy);
        assert_eq!(state, RetryState::ProtocolFailed { attempts: 1, error });
        assert!(state.is_terminal());
    }

    #[test]
    fn should_succeed_after_a_transport_failure() {
        let policy = policy(1);
        let state = RetryState::Pending.send().record(refused(), &policy);
        assert_eq!(
            state.delay_before_next(&policy),
            Some(Duration::from_secs(2))
        );
        let state = state
            .send()
            .record(AttemptOutcome::Succeeded(json!("ok")), &policy);
        assert_eq!(
            state,
            RetryState::Succeeded {
                attempts: 2,
                result: json!("ok"),
            }
        );
    }

    #[test]
    fn zero_retries_should_exhaust_on_first_failure() {
        let policy = policy(0);
        let state = RetryState::Pending.send().record(refused(), &policy);
        assert!(matches!(state, RetryState::Exhausted { attempts: 1, .. }));
    }
}
