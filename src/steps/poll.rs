//! Bounded polling for values the UI fills in asynchronously

use std::time::Duration;

use crate::common::Result;

/// How many times to read and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryBudget {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

/// Default acceptability predicate: not the empty string
pub fn non_empty(value: &String) -> bool {
    !value.is_empty()
}

/// Read until `accept` holds or the budget runs out
///
/// Returns the last value read, acceptable or not; exhaustion is not an
/// error here and callers re-apply the predicate if they care. An error from
/// `read` is returned immediately without retrying. Zero attempts still read
/// once.
pub fn poll_until<T, R, P>(mut read: R, accept: P, budget: RetryBudget) -> Result<T>
where
    R: FnMut() -> Result<T>,
    P: Fn(&T) -> bool,
{
    let attempts = budget.attempts.max(1);
    let mut attempt = 1;

    loop {
        let value = read()?;
        if accept(&value) || attempt >= attempts {
            if !accept(&value) {
                tracing::warn!(attempts, "poll exhausted without an acceptable value");
            }
            return Ok(value);
        }
        tracing::debug!(attempt, "value not ready, retrying");
        attempt += 1;
        if !budget.delay.is_zero() {
            std::thread::sleep(budget.delay);
        }
    }
}
