//! Restartable one-shot flush timer

use std::future;
use std::time::Duration;

use tokio::time::{self, Instant};

/// One-shot timer the orchestrator rearms after every flush
///
/// Unlike `tokio::time::Interval`, the next deadline is measured from when
/// the previous flush finished, so a slow flush never causes a burst of
/// catch-up ticks.
#[derive(Debug)]
pub struct FlushScheduler {
    interval: Duration,
    deadline: Option<Instant>,
}

impl FlushScheduler {
    /// Create a disarmed scheduler
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fire one interval from now, replacing any pending deadline
    pub fn arm(&mut self) {
        self.deadline = Some(Instant::now() + self.interval);
    }

    /// Drop the pending deadline; no-op when nothing is armed
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolve once the armed deadline passes, then disarm
    ///
    /// Never resolves while disarmed. Cancel safe: dropping the future keeps
    /// the deadline armed.
    pub async fn fired(&mut self) {
        match self.deadline {
            Some(deadline) => {
                time::sleep_until(deadline).await;
                self.deadline = None;
            }
            None => future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(250);

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_interval() {
        let mut scheduler = FlushScheduler::new(INTERVAL);
        scheduler.arm();
        let start = Instant::now();

        scheduler.fired().await;

        assert!(start.elapsed() >= INTERVAL);
        assert!(!scheduler.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_fires() {
        let mut scheduler = FlushScheduler::new(INTERVAL);
        let result = time::timeout(Duration::from_secs(60), scheduler.fired()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_fire() {
        let mut scheduler = FlushScheduler::new(INTERVAL);
        scheduler.arm();
        scheduler.cancel();
        assert!(!scheduler.is_armed());

        let result = time::timeout(INTERVAL * 10, scheduler.fired()).await;
        assert!(result.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_after_fire_is_noop() {
        let mut scheduler = FlushScheduler::new(INTERVAL);
        scheduler.arm();
        scheduler.fired().await;

        scheduler.cancel();
        assert!(!scheduler.is_armed());

        scheduler.arm();
        scheduler.fired().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_wait_keeps_deadline() {
        let mut scheduler = FlushScheduler::new(INTERVAL);
        scheduler.arm();

        let early = time::timeout(INTERVAL / 2, scheduler.fired()).await;
        assert!(early.is_err());
        assert!(scheduler.is_armed());

        let start = Instant::now();
        scheduler.fired().await;
        assert!(start.elapsed() <= INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_moves_deadline() {
        let mut scheduler = FlushScheduler::new(INTERVAL);
        scheduler.arm();
        time::sleep(INTERVAL / 2).await;
        scheduler.arm();

        let start = Instant::now();
        scheduler.fired().await;
        assert!(start.elapsed() >= INTERVAL);
    }
}
