//! Bookkeeping for one open/invoke retry loop.

use std::time::{Duration, Instant};

/// Ephemeral state of a single retry loop. Never outlives the loop.
#[derive(Debug, Clone)]
pub struct RetryContext {
    attempt: u32,
    max_retries: u32,
    started: Instant,
}

impl RetryContext {
    /// Start a loop allowing `max_retries` retries after the first attempt.
    pub fn start(max_retries: u32) -> Self {
        Self {
            attempt: 0,
            max_retries,
            started: Instant::now(),
        }
    }

    /// 0-based index of the current attempt.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempts made so far, counting the current one.
    pub fn attempts(&self) -> u32 {
        self.attempt + 1
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns `true` once the current attempt is the last one allowed.
    pub fn exhausted(&self) -> bool {
        self.attempt >= self.max_retries
    }

    pub fn advance(&mut self) {
        self.attempt += 1;
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Sleep for `delay`, skipping the timer entirely for a zero wait.
pub(crate) async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_retries_exhausted_immediately() {
        let ctx = RetryContext::start(0);
        assert_eq!(ctx.attempts(), 1);
        assert!(ctx.exhausted());
    }

    #[test]
    fn advance_until_exhausted() {
        let mut ctx = RetryContext::start(2);
        assert!(!ctx.exhausted());
        ctx.advance();
        assert!(!ctx.exhausted());
        ctx.advance();
        assert!(ctx.exhausted());
        assert_eq!(ctx.attempts(), 3);
    }
}
