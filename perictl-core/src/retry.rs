//! Fixed-interval retry state machine
//!
//! The sequence decides, after each sensor read attempt, whether to hand
//! back the value, wait and try again, or give up. It does no I/O and no
//! waiting itself, so the blocking and async sensor wrappers share it and
//! cannot drift apart on attempt counting.
//!
//! ```text
//! Idle ──▶ Attempting ──ok──▶ Success
//!              │ err
//!              ▼
//!     attempts <= max_retries ──▶ Retrying ──(wait interval)──▶ Attempting
//!     attempts >  max_retries ──▶ Exhausted
//!     permanent error         ──▶ Exhausted
//!
//! abort() from any non-terminal state ──▶ Aborted
//! ```
//!
//! The interval is the same before every retry: no backoff, no jitter. All
//! transient sensor errors are retried alike. A permanent error
//! ([`SensorError::Released`]) ends the sequence at once.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::traits::SensorError;

/// How often and how patiently to retry a failed read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryPolicy {
    max_retries: u32,
    retry_interval_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_interval_ms: 1000,
        }
    }
}

impl RetryPolicy {
    /// Create a policy
    ///
    /// # Arguments
    /// - `max_retries`: Retries after the first attempt (0 = single attempt)
    /// - `retry_interval_ms`: Wait before each retry
    pub const fn new(max_retries: u32, retry_interval_ms: u32) -> Self {
        Self {
            max_retries,
            retry_interval_ms,
        }
    }

    /// Single attempt, never wait
    pub const fn no_retry() -> Self {
        Self::new(0, 0)
    }

    /// Retries after the first attempt
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Wait before each retry (ms)
    pub const fn retry_interval_ms(&self) -> u32 {
        self.retry_interval_ms
    }

    /// Upper bound on attempts per sequence
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Where a retry sequence is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryState {
    /// No attempt made yet
    #[default]
    Idle,
    /// A read is in flight
    Attempting,
    /// Last attempt failed, waiting before the next one
    Retrying,
    /// A read succeeded (terminal)
    Success,
    /// Every allowed attempt failed, or the fault is permanent (terminal)
    Exhausted,
    /// The caller stopped the sequence (terminal)
    Aborted,
}

impl RetryState {
    /// Check if no further attempts will be made
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RetryState::Success | RetryState::Exhausted | RetryState::Aborted
        )
    }
}

/// What the caller should do after recording an attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryStep<T> {
    /// The attempt succeeded
    Done(T),
    /// Wait this long, then attempt again
    Wait {
        /// Interval from the policy (ms)
        interval_ms: u32,
    },
    /// Stop: no attempts left
    GiveUp(Exhausted),
}

/// No attempt produced a reading
///
/// Absence of a reading, not a crash. Unless `last_error` is permanent
/// (see [`SensorError::is_transient`]), trying again later may succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Exhausted {
    /// Attempts made (`max_retries + 1`, fewer after a permanent error)
    pub attempts: u32,
    /// Error of the final attempt
    pub last_error: SensorError,
}

impl fmt::Display for Exhausted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no reading after {} attempts (last error: {})",
            self.attempts, self.last_error
        )
    }
}

/// A retrying read that did not produce a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryError {
    /// Every allowed attempt failed
    Exhausted(Exhausted),
    /// The caller asked to stop between attempts
    Aborted {
        /// Attempts made before the abort
        attempts: u32,
        /// Error of the last attempt, if any attempt was made
        last_error: Option<SensorError>,
    },
}

impl From<Exhausted> for RetryError {
    fn from(e: Exhausted) -> Self {
        RetryError::Exhausted(e)
    }
}

impl fmt::Display for RetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted(e) => e.fmt(f),
            RetryError::Aborted { attempts, .. } => {
                write!(f, "aborted after {} attempts", attempts)
            }
        }
    }
}

/// One run of the retry state machine
///
/// Create a fresh sequence per top-level read; nothing carries over.
#[derive(Debug, Clone)]
pub struct RetrySequence {
    policy: RetryPolicy,
    state: RetryState,
    attempts: u32,
    last_error: Option<SensorError>,
}

impl RetrySequence {
    /// Start a sequence in [`RetryState::Idle`]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            state: RetryState::Idle,
            attempts: 0,
            last_error: None,
        }
    }

    /// Current state
    pub fn state(&self) -> RetryState {
        self.state
    }

    /// Attempts recorded so far
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Error of the most recent failed attempt
    pub fn last_error(&self) -> Option<SensorError> {
        self.last_error
    }

    /// Policy driving this sequence
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Mark an attempt as started
    ///
    /// Returns the 1-based number of the attempt, or `None` if the sequence
    /// is already finished.
    pub fn begin_attempt(&mut self) -> Option<u32> {
        if self.state.is_terminal() {
            return None;
        }
        self.state = RetryState::Attempting;
        Some(self.attempts + 1)
    }

    /// Record the outcome of an attempt and decide what comes next
    pub fn record<T>(&mut self, result: Result<T, SensorError>) -> RetryStep<T> {
        match result {
            Ok(value) => {
                self.state = RetryState::Success;
                RetryStep::Done(value)
            }
            Err(error) => {
                self.attempts = self.attempts.saturating_add(1);
                self.last_error = Some(error);

                if error.is_transient() && self.attempts <= self.policy.max_retries {
                    self.state = RetryState::Retrying;
                    RetryStep::Wait {
                        interval_ms: self.policy.retry_interval_ms,
                    }
                } else {
                    self.state = RetryState::Exhausted;
                    RetryStep::GiveUp(Exhausted {
                        attempts: self.attempts,
                        last_error: error,
                    })
                }
            }
        }
    }

    /// Stop the sequence early
    pub fn abort(&mut self) -> RetryError {
        self.state = RetryState::Aborted;
        RetryError::Aborted {
            attempts: self.attempts,
            last_error: self.last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a sequence against a script of failures, counting reads and waits
    fn run(policy: RetryPolicy, failures: u32) -> (Result<u32, Exhausted>, u32, u32) {
        let mut seq = RetrySequence::new(policy);
        let mut reads = 0;
        let mut waits = 0;

        loop {
            seq.begin_attempt().unwrap();
            reads += 1;
            let result = if reads <= failures {
                Err(SensorError::IoTimeout)
            } else {
                Ok(reads)
            };
            match seq.record(result) {
                RetryStep::Done(v) => return (Ok(v), reads, waits),
                RetryStep::Wait { interval_ms } => {
                    assert_eq!(interval_ms, policy.retry_interval_ms());
                    waits += 1;
                }
                RetryStep::GiveUp(e) => return (Err(e), reads, waits),
            }
        }
    }

    #[test]
    fn test_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.retry_interval_ms(), 1000);
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(RetryPolicy::new(u32::MAX, 0).max_attempts(), u32::MAX);
    }

    #[test]
    fn test_first_attempt_succeeds() {
        let (result, reads, waits) = run(RetryPolicy::new(3, 10), 0);
        assert_eq!(result, Ok(1));
        assert_eq!(reads, 1);
        assert_eq!(waits, 0);
    }

    #[test]
    fn test_failures_within_budget() {
        for n in 0..5 {
            for k in 0..=n {
                let (result, reads, waits) = run(RetryPolicy::new(n, 10), k);
                assert_eq!(result, Ok(k + 1), "n={} k={}", n, k);
                assert_eq!(reads, k + 1);
                assert_eq!(waits, k);
            }
        }
    }

    #[test]
    fn test_failures_beyond_budget() {
        for n in 0..5 {
            for k in (n + 1)..(n + 4) {
                let (result, reads, waits) = run(RetryPolicy::new(n, 10), k);
                let exhausted = result.unwrap_err();
                assert_eq!(exhausted.attempts, n + 1);
                assert_eq!(exhausted.last_error, SensorError::IoTimeout);
                assert_eq!(reads, n + 1);
                // No wait after the final failure
                assert_eq!(waits, n);
            }
        }
    }

    #[test]
    fn test_state_transitions() {
        let mut seq = RetrySequence::new(RetryPolicy::new(1, 5));
        assert_eq!(seq.state(), RetryState::Idle);

        assert_eq!(seq.begin_attempt(), Some(1));
        assert_eq!(seq.state(), RetryState::Attempting);

        let step: RetryStep<()> = seq.record(Err(SensorError::MalformedData));
        assert_eq!(step, RetryStep::Wait { interval_ms: 5 });
        assert_eq!(seq.state(), RetryState::Retrying);

        assert_eq!(seq.begin_attempt(), Some(2));
        let step: RetryStep<()> = seq.record(Err(SensorError::DeviceNotFound));
        assert_eq!(
            step,
            RetryStep::GiveUp(Exhausted {
                attempts: 2,
                last_error: SensorError::DeviceNotFound,
            })
        );
        assert_eq!(seq.state(), RetryState::Exhausted);
        assert_eq!(seq.begin_attempt(), None);
    }

    #[test]
    fn test_transient_errors_retried_alike() {
        for error in [
            SensorError::DeviceNotFound,
            SensorError::MalformedData,
            SensorError::IoTimeout,
            SensorError::BusFault,
        ] {
            let mut seq = RetrySequence::new(RetryPolicy::new(1, 0));
            seq.begin_attempt();
            let step: RetryStep<()> = seq.record(Err(error));
            assert_eq!(step, RetryStep::Wait { interval_ms: 0 });
        }
    }

    #[test]
    fn test_abort_reports_progress() {
        let mut seq = RetrySequence::new(RetryPolicy::new(3, 5));
        seq.begin_attempt();
        let _: RetryStep<()> = seq.record(Err(SensorError::IoTimeout));

        assert_eq!(
            seq.abort(),
            RetryError::Aborted {
                attempts: 1,
                last_error: Some(SensorError::IoTimeout),
            }
        );
        assert_eq!(seq.state(), RetryState::Aborted);
        assert!(seq.state().is_terminal());
        assert_eq!(seq.begin_attempt(), None);
    }

    #[test]
    fn test_permanent_error_gives_up_at_once() {
        let mut seq = RetrySequence::new(RetryPolicy::new(3, 1000));
        seq.begin_attempt();
        let step: RetryStep<()> = seq.record(Err(SensorError::Released));
        assert_eq!(
            step,
            RetryStep::GiveUp(Exhausted {
                attempts: 1,
                last_error: SensorError::Released,
            })
        );
        assert_eq!(seq.state(), RetryState::Exhausted);
    }
}
