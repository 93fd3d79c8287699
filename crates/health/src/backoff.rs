use std::time::Duration;

/// Exponential backoff schedule with a hard cap.
///
/// `delay_for` is a pure function of the attempt number so callers that
/// track attempts in an atomic counter can derive delays without holding a
/// mutable handle.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    cap: Duration,
    factor: f64,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            factor: 2.0,
            attempt: 0,
        }
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    /// Delay for the given 0-based attempt number
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.base.min(self.cap);
        }
        let scaled = self.base.as_millis() as f64 * self.factor.powi(attempt as i32);
        let capped = scaled.min(self.cap.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Delay for the current attempt, then advance
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.delay_for(self.attempt);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }
}
