//! Fixed-interval retrying wrapper around a single-attempt sensor
//!
//! The attempt counting lives in [`RetrySequence`]; this module only runs
//! it against a real sensor and a real delay. Three front ends share it:
//!
//! - [`RetryingSensor::read_with_retry`]: blocking, embedded-hal delay
//! - [`RetryingSensor::read_with_retry_async`]: async, embedded-hal-async
//!   delay. Dropping the future between attempts abandons the read cleanly.
//! - [`RetryingSensor::read_with_retry_or_abort`]: blocking, checks an abort
//!   flag before every attempt

use core::sync::atomic::{AtomicBool, Ordering};

use perictl_core::traits::{Cleanup, SensorReader};
use perictl_core::{Exhausted, Reading, RetryError, RetryPolicy, RetrySequence, RetryStep};

/// Sensor read with bounded, fixed-interval retries
pub struct RetryingSensor<S> {
    sensor: S,
    policy: RetryPolicy,
}

impl<S: SensorReader> RetryingSensor<S> {
    /// Wrap a sensor
    pub fn new(sensor: S, policy: RetryPolicy) -> Self {
        Self { sensor, policy }
    }

    /// Retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Replace the retry policy
    pub fn set_policy(&mut self, policy: RetryPolicy) {
        self.policy = policy;
    }

    /// The wrapped sensor
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// The wrapped sensor, mutably
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    /// Unwrap the sensor
    pub fn into_inner(self) -> S {
        self.sensor
    }

    /// Read, retrying failed attempts
    ///
    /// Makes at most `max_retries + 1` attempts and waits the policy
    /// interval before each retry. There is no wait after the final
    /// failure.
    pub fn read_with_retry<D>(&mut self, delay: &mut D) -> Result<Reading, Exhausted>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let mut seq = RetrySequence::new(self.policy);
        loop {
            seq.begin_attempt();
            match seq.record(self.sensor.read_once()) {
                RetryStep::Done(reading) => return Ok(reading),
                RetryStep::Wait { interval_ms } => {
                    log_retry(&seq, interval_ms);
                    delay.delay_ms(interval_ms);
                }
                RetryStep::GiveUp(exhausted) => {
                    log_exhausted(&exhausted);
                    return Err(exhausted);
                }
            }
        }
    }

    /// Async version of [`Self::read_with_retry`]
    ///
    /// The only suspension points are the waits between attempts.
    pub async fn read_with_retry_async<D>(&mut self, delay: &mut D) -> Result<Reading, Exhausted>
    where
        D: embedded_hal_async::delay::DelayNs,
    {
        let mut seq = RetrySequence::new(self.policy);
        loop {
            seq.begin_attempt();
            match seq.record(self.sensor.read_once()) {
                RetryStep::Done(reading) => return Ok(reading),
                RetryStep::Wait { interval_ms } => {
                    log_retry(&seq, interval_ms);
                    delay.delay_ms(interval_ms).await;
                }
                RetryStep::GiveUp(exhausted) => {
                    log_exhausted(&exhausted);
                    return Err(exhausted);
                }
            }
        }
    }

    /// Blocking read that stops early once `abort` is set
    ///
    /// The flag is checked before every attempt, so a wait that is already
    /// running completes first. An attempt in progress is never interrupted.
    pub fn read_with_retry_or_abort<D>(
        &mut self,
        delay: &mut D,
        abort: &AtomicBool,
    ) -> Result<Reading, RetryError>
    where
        D: embedded_hal::delay::DelayNs,
    {
        let mut seq = RetrySequence::new(self.policy);
        loop {
            if abort.load(Ordering::Acquire) {
                #[cfg(feature = "defmt")]
                defmt::info!("sensor read aborted after {} attempts", seq.attempts());
                return Err(seq.abort());
            }

            seq.begin_attempt();
            match seq.record(self.sensor.read_once()) {
                RetryStep::Done(reading) => return Ok(reading),
                RetryStep::Wait { interval_ms } => {
                    log_retry(&seq, interval_ms);
                    delay.delay_ms(interval_ms);
                }
                RetryStep::GiveUp(exhausted) => {
                    log_exhausted(&exhausted);
                    return Err(exhausted.into());
                }
            }
        }
    }
}

#[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
fn log_retry(seq: &RetrySequence, interval_ms: u32) {
    #[cfg(feature = "defmt")]
    defmt::warn!(
        "sensor read attempt {}/{} failed: {}, retrying in {} ms",
        seq.attempts(),
        seq.policy().max_attempts(),
        seq.last_error(),
        interval_ms
    );
}

#[cfg_attr(not(feature = "defmt"), allow(unused_variables))]
fn log_exhausted(exhausted: &Exhausted) {
    #[cfg(feature = "defmt")]
    defmt::error!(
        "sensor read failed after {} attempts: {}",
        exhausted.attempts,
        exhausted.last_error
    );
}

impl<S: Cleanup> Cleanup for RetryingSensor<S> {
    type Error = S::Error;

    fn cleanup(&mut self) -> Result<(), S::Error> {
        self.sensor.cleanup()
    }

    fn is_released(&self) -> bool {
        self.sensor.is_released()
    }
}
