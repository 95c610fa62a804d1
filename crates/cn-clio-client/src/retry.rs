//! Retry decisions as an explicit state machine.
//!
//! `RetryState` sees one attempt outcome at a time and answers what to do
//! next. The client loop only sleeps or stops on its answer, which keeps the
//! bounded-retry guarantee checkable without a network.

use std::time::Duration;

/// What a single attempt produced, reduced to what the policy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Any response with status below 400.
    Success,
    /// An error status. `retry_after` is the parsed `Retry-After` header.
    Status {
        status: u16,
        retry_after: Option<Duration>,
    },
    /// Connection refused, DNS failure, per-attempt timeout, ...
    Transport,
}

/// Next step after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the response to the caller.
    Accept,
    /// Server asked us to wait; does not consume a retry.
    Throttle(Duration),
    /// Transient failure; wait and retry (consumed one retry).
    Backoff(Duration),
    /// Surface the last failure.
    GiveUp,
}

/// Attempt bookkeeping for one logical request.
#[derive(Debug, Clone)]
pub struct RetryState {
    max_retries: u32,
    backoff_base: Duration,
    /// Retries consumed by transient failures.
    retries_used: u32,
    /// Every attempt made, throttled ones included.
    attempts: u32,
}

impl RetryState {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self {
            max_retries,
            backoff_base,
            retries_used: 0,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn retries_used(&self) -> u32 {
        self.retries_used
    }

    pub fn decide(&mut self, outcome: Outcome) -> Decision {
        self.attempts += 1;
        match outcome {
            Outcome::Success => Decision::Accept,
            Outcome::Status {
                status: 429,
                retry_after: Some(delay),
            } => Decision::Throttle(delay),
            Outcome::Status { status, .. } if status == 429 || status >= 500 => self.backoff(),
            Outcome::Status { .. } => Decision::GiveUp,
            Outcome::Transport => self.backoff(),
        }
    }

    fn backoff(&mut self) -> Decision {
        if self.retries_used >= self.max_retries {
            return Decision::GiveUp;
        }
        let delay = self
            .backoff_base
            .saturating_mul(2u32.saturating_pow(self.retries_used));
        self.retries_used += 1;
        Decision::Backoff(delay)
    }
}

/// Parse a `Retry-After` header given in whole seconds.
///
/// HTTP-date values are not supported and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
