//! Write failure log throttling
//!
//! A store outage makes every flush fail. The orchestrator logs the first
//! failure of each interval and folds the rest into a count carried by the
//! next line it emits.

use std::time::Duration;

use tokio::time::Instant;

/// Decides which write failures get a log line
///
/// Owned by the orchestrator task; nothing else observes it.
#[derive(Debug)]
pub struct ErrorThrottle {
    min_interval: Duration,
    last_logged: Option<Instant>,
    /// Failures swallowed since the last line
    suppressed: u64,
}

impl ErrorThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_logged: None,
            suppressed: 0,
        }
    }

    /// Log a failure unless a line was emitted within the interval
    ///
    /// Returns false when the failure was only counted.
    pub fn record(&mut self, table: &str, error: &dyn std::fmt::Display) -> bool {
        let now = Instant::now();
        if let Some(at) = self.last_logged
            && now.duration_since(at) < self.min_interval
        {
            self.suppressed += 1;
            return false;
        }
        self.last_logged = Some(now);

        let suppressed = std::mem::take(&mut self.suppressed);
        if suppressed > 0 {
            tracing::error!(
                table = %table,
                error = %error,
                suppressed,
                "batch write failed, batch dropped (earlier failures not logged)"
            );
        } else {
            tracing::error!(table = %table, error = %error, "batch write failed, batch dropped");
        }
        true
    }

    /// Failures counted since the last log line
    pub fn suppressed(&self) -> u64 {
        self.suppressed
    }
}
