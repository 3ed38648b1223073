// ============================================
// TIMING UTILITY - Performance Measurement
// ============================================
// Usage:
//   1. Manual tracking: let timer = Timer::start("name"); ... timer.stop();
//   2. Scope tracking: let _timer = Timer::start("name"); logs when dropped
//   3. Async wrapper: Timer::measure_async("name", || async { ... }).await;
// ============================================

use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Anything slower than this is logged at warn level
const SLOW_MS: u128 = 5000;

/// Timer for measuring execution time
pub struct Timer {
    name: String,
    start: Instant,
    threshold_ms: u128,
    silent: bool,
}

impl Timer {
    fn new(name: impl Into<String>, threshold_ms: u128, silent: bool) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            threshold_ms,
            silent,
        }
    }

    /// Create a new timer with a name
    pub fn start(name: impl Into<String>) -> Self {
        Self::new(name, 0, false)
    }

    /// Create a timer that only logs if execution exceeds threshold (in milliseconds)
    pub fn start_with_threshold(name: impl Into<String>, threshold_ms: u128) -> Self {
        Self::new(name, threshold_ms, false)
    }

    /// Create a silent timer (won't log, use elapsed() manually)
    pub fn silent(name: impl Into<String>) -> Self {
        Self::new(name, 0, true)
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop the timer and log the result
    pub fn stop(mut self) -> Duration {
        let duration = self.start.elapsed();
        self.log_duration(duration);
        self.silent = true;
        duration
    }

    fn log_duration(&self, duration: Duration) {
        if self.silent {
            return;
        }

        let ms = duration.as_millis();
        if ms < self.threshold_ms {
            return;
        }

        if ms > SLOW_MS {
            warn!(timer = %self.name, elapsed_ms = ms as u64, "{} - slow ({})", self.name, Self::speed_label(ms));
        } else {
            info!(timer = %self.name, elapsed_ms = ms as u64, "{} - {}ms ({})", self.name, ms, Self::speed_label(ms));
        }
    }

    fn speed_label(ms: u128) -> &'static str {
        match ms {
            0..=100 => "very fast",
            101..=500 => "fast",
            501..=1000 => "acceptable",
            1001..=5000 => "slow",
            _ => "very slow",
        }
    }

    /// Time an async function
    pub async fn measure_async<F, Fut, R>(name: impl Into<String>, f: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        let timer = Self::start(name);
        let result = f().await;
        timer.stop();
        result
    }
}

// Auto-log on drop if not silent
impl Drop for Timer {
    fn drop(&mut self) {
        if !self.silent {
            let duration = self.start.elapsed();
            self.log_duration(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_labels() {
        assert_eq!(Timer::speed_label(50), "very fast");
        assert_eq!(Timer::speed_label(750), "acceptable");
        assert_eq!(Timer::speed_label(60_000), "very slow");
    }

    #[tokio::test]
    async fn test_measure_async_returns_result() {
        let v = Timer::measure_async("answer", || async { 42 }).await;
        assert_eq!(v, 42);
    }

    #[test]
    fn test_silent_timer_tracks_time() {
        let timer = Timer::silent("quiet");
        std::thread::sleep(Duration::from_millis(5));
        assert!(timer.elapsed() >= Duration::from_millis(5));
    }
}
