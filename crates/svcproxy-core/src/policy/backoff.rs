//! Exponential backoff with full jitter.

use std::time::Duration;

/// Computes the wait before the retry that follows a failed attempt.
///
/// The wait after 0-based attempt `n` is `U(0,1) · (2^n − 1) · time_slot`:
/// the first retry is immediate and later ones spread out exponentially.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    time_slot: Duration,
}

impl Backoff {
    pub fn new(time_slot: Duration) -> Self {
        Self { time_slot }
    }

    pub fn time_slot(&self) -> Duration {
        self.time_slot
    }

    /// Upper bound of the wait after `attempt`: `(2^attempt − 1) · time_slot`.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        if self.time_slot.is_zero() {
            return Duration::ZERO;
        }
        let factor = 2f64.powi(attempt.min(i32::MAX as u32) as i32) - 1.0;
        Duration::try_from_secs_f64(self.time_slot.as_secs_f64() * factor).unwrap_or(Duration::MAX)
    }

    /// Wait after `attempt` for a given jitter draw `unit` (clamped to `[0, 1]`).
    pub fn delay(&self, attempt: u32, unit: f64) -> Duration {
        let unit = if unit.is_nan() { 0.0 } else { unit.clamp(0.0, 1.0) };
        let ceiling = self.ceiling(attempt);
        Duration::try_from_secs_f64(ceiling.as_secs_f64() * unit).unwrap_or(ceiling)
    }

    /// Wait after `attempt` with a fresh random jitter draw.
    pub fn jittered(&self, attempt: u32) -> Duration {
        self.delay(attempt, rand::random::<f64>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_is_immediate() {
        let backoff = Backoff::new(Duration::from_millis(100));
        assert_eq!(backoff.ceiling(0), Duration::ZERO);
        for _ in 0..100 {
            assert_eq!(backoff.jittered(0), Duration::ZERO);
        }
    }

    #[test]
    fn ceiling_grows_exponentially() {
        let backoff = Backoff::new(Duration::from_millis(100));
        assert_eq!(backoff.ceiling(1).as_millis(), 100);
        assert_eq!(backoff.ceiling(2).as_millis(), 300);
        assert_eq!(backoff.ceiling(3).as_millis(), 700);
        assert_eq!(backoff.delay(3, 1.0).as_millis(), 700);
        assert_eq!(backoff.delay(3, 0.5).as_millis(), 350);
    }

    #[test]
    fn jitter_stays_under_ceiling() {
        let backoff = Backoff::new(Duration::from_millis(50));
        for attempt in 1..8 {
            let ceiling = backoff.ceiling(attempt);
            for _ in 0..50 {
                let d = backoff.jittered(attempt);
                assert!(d <= ceiling, "attempt {attempt}: {d:?} exceeds {ceiling:?}");
            }
        }
    }

    #[test]
    fn out_of_range_unit_is_clamped() {
        let backoff = Backoff::new(Duration::from_millis(10));
        assert_eq!(backoff.delay(2, 7.0), backoff.ceiling(2));
        assert_eq!(backoff.delay(2, -1.0), Duration::ZERO);
        assert_eq!(backoff.delay(2, f64::NAN), Duration::ZERO);
    }
}
