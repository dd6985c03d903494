//! Retry policy and the explicit retry state machine for narrative turns.
//!
//! ```text
//! Attempting -> Failed -> Retrying -> Attempting ...
//!                      -> AwaitingUserChoice -> Retrying (bound reset)
//!                                            -> Aborted
//! ```

use rand::Rng;
use std::time::Duration;

use crate::infrastructure::ports::{FailureSummary, RetryChoice};

/// How many unusable responses are retried automatically, and how long to
/// wait in between.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts made before the user is asked (at least 1)
    pub max_auto_attempts: u32,
    /// Wait after the first failure; grows linearly with the attempt number
    pub base_delay: Duration,
    /// Jitter factor (0.0-1.0) applied around each delay
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_auto_attempts: 3,
            base_delay: Duration::from_millis(1000),
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// `base * attempt`, then +/- jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let linear = (self.base_delay.as_millis() as u64).saturating_mul(u64::from(attempt.max(1)));

        let jitter_range = (linear as f64 * self.jitter_factor.clamp(0.0, 1.0)) as i64;
        let millis = if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (linear as i64 + jitter).max(0) as u64
        } else {
            linear
        };
        Duration::from_millis(millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryState {
    Attempting { attempt: u32 },
    Failed { attempt: u32, reason: String },
    AwaitingUserChoice { attempts: u32, reason: String },
    Retrying { attempt: u32 },
    Aborted { attempts: u32, reason: String },
}

/// What the caller does after a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum NextStep {
    RetryAfter(Duration),
    AskUser(FailureSummary),
}

pub struct RetryMachine {
    policy: RetryPolicy,
    state: RetryState,
    total_attempts: u32,
}

impl RetryMachine {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Attempting { attempt: 1 },
            total_attempts: 1,
        }
    }

    pub fn state(&self) -> &RetryState {
        &self.state
    }

    /// Attempts made so far, across user-approved rounds.
    pub fn total_attempts(&self) -> u32 {
        self.total_attempts
    }

    /// Record an unusable response from the current attempt.
    pub fn record_failure(&mut self, reason: impl Into<String>) -> NextStep {
        let RetryState::Attempting { attempt } = self.state else {
            tracing::warn!(state = ?self.state, "Failure recorded outside an attempt");
            return NextStep::AskUser(self.summary(String::new()));
        };
        let reason = reason.into();
        self.state = RetryState::Failed {
            attempt,
            reason: reason.clone(),
        };

        if attempt < self.policy.max_auto_attempts.max(1) {
            self.state = RetryState::Retrying { attempt: attempt + 1 };
            NextStep::RetryAfter(self.policy.delay_for(attempt))
        } else {
            let summary = self.summary(reason.clone());
            self.state = RetryState::AwaitingUserChoice {
                attempts: self.total_attempts,
                reason,
            };
            NextStep::AskUser(summary)
        }
    }

    /// Leave `Retrying` for the next attempt.
    pub fn begin_attempt(&mut self) {
        if let RetryState::Retrying { attempt } = self.state {
            self.state = RetryState::Attempting { attempt };
            self.total_attempts += 1;
        }
    }

    /// Apply the user's answer. Returns `true` when another round starts.
    pub fn resolve(&mut self, choice: RetryChoice) -> bool {
        let RetryState::AwaitingUserChoice { attempts, reason } = &self.state else {
            return false;
        };
        let (attempts, reason) = (*attempts, reason.clone());
        match choice {
            RetryChoice::Retry => {
                self.state = RetryState::Retrying { attempt: 1 };
                true
            }
            RetryChoice::Abort => {
                self.state = RetryState::Aborted { attempts, reason };
                false
            }
        }
    }

    fn summary(&self, reason: String) -> FailureSummary {
        FailureSummary {
            attempts: self.total_attempts,
            reason,
        }
    }
}
