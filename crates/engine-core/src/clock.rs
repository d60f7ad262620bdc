use async_trait::async_trait;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Injectable time source. The job monitor measures elapsed wall-clock
/// time and sleeps between poll cycles exclusively through this trait,
/// so polling behavior is testable without real waits.
#[async_trait]
pub trait Clock: Send + Sync {
    /// Monotonic offset since the clock was created.
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}

/// Real clock: monotonic `Instant` plus `tokio::time::sleep`.
pub struct TokioClock {
    start: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        TokioClock {
            start: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Test clock: `sleep` advances the offset immediately instead of
/// suspending, so poll loops run at full speed while still observing
/// time passing.
#[derive(Default)]
pub struct ManualClock {
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap();
        *offset += by;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.offset.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
        // Yield so concurrent tasks make progress between poll cycles.
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_advances_without_suspending() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.sleep(Duration::from_secs(30)).await;
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.now(), Duration::from_secs(35));
    }
}
