//! Exponential backoff with symmetric jitter.

use std::time::Duration;

use rand::Rng;

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;

/// Maximum jitter as a fraction of the un-jittered delay (±10%).
pub const JITTER: f64 = 0.1;

/// Delay schedule `base * 2^(attempt - 1)`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before retry number `attempt` (1-based) with an explicit jitter
    /// factor in `[-JITTER, JITTER]`. The result never exceeds `max`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, jitter: f64) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let capped = self.base.saturating_mul(1_u32 << exp).min(self.max);
        let factor = 1.0 + jitter.clamp(-JITTER, JITTER);
        Duration::try_from_secs_f64(capped.as_secs_f64() * factor)
            .unwrap_or(self.max)
            .min(self.max)
    }

    /// Delay before retry number `attempt` with random jitter.
    #[must_use]
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let jitter = rand::rng().random_range(-JITTER..=JITTER);
        self.delay_for(attempt, jitter)
    }
}
