//! Polling loop for conditions
//!
//! Drives a [`Condition`] until it reports done, fails, or runs out of time.
//!
//! # Example
//!
//! ```ignore
//! use kube_conditions::poll;
//! use std::time::Duration;
//!
//! poll::until(conditions.job_completed(&mut job))
//!     .timeout(Duration::from_secs(120))
//!     .interval(Duration::from_secs(1))
//!     .immediate(true)
//!     .await_condition()
//!     .await?;
//! ```

use crate::conditions::{Condition, ConditionError};
use crate::wait::WaitError;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Errors that stop polling
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("{0}")]
    Timeout(#[from] WaitError),

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

/// Builder for a polling run
pub struct Poll<C> {
    condition: C,
    timeout: Duration,
    interval: Duration,
    immediate: bool,
}

/// Poll `condition` until it holds
///
/// Default timeout: 5 minutes
/// Default interval: 2 seconds
/// The first check runs after one interval unless `immediate(true)` is set.
pub fn until<C: Condition>(condition: C) -> Poll<C> {
    Poll {
        condition,
        timeout: Duration::from_secs(300),
        interval: Duration::from_secs(2),
        immediate: false,
    }
}

impl<C: Condition> Poll<C> {
    /// Set the timeout duration
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the polling interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the first check right away instead of after one interval
    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Run the checks until success, error, or timeout
    pub async fn await_condition(mut self) -> Result<(), PollError> {
        let start = Instant::now();
        let mut attempts = 0u32;

        if !self.immediate {
            sleep(self.interval).await;
        }

        loop {
            attempts += 1;

            if self.condition.check().await? {
                debug!(
                    resource = %self.condition.resource(),
                    attempts = attempts,
                    elapsed = ?start.elapsed(),
                    "Condition met"
                );
                return Ok(());
            }

            let elapsed = start.elapsed();
            debug!(
                resource = %self.condition.resource(),
                attempts = attempts,
                elapsed = ?elapsed,
                "Condition not met, waiting..."
            );

            if elapsed >= self.timeout {
                return Err(WaitError::new(self.condition.resource(), self.timeout, elapsed)
                    .with_state(self.condition.last_state())
                    .into());
            }

            sleep(self.interval).await;
        }
    }
}
