//! Sliding-window rate limiter for outbound API requests.
//!
//! Keeps the timestamps of recent requests and blocks (cooperatively) until
//! both the per-minute and per-hour windows have room. The window belongs to
//! one client; two clients never share quota state.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);

/// Ordered record of recent request times.
///
/// Invariant: after `record`, at most `per_minute` entries fall within the
/// trailing 60 s and at most `per_hour` within the trailing 3600 s.
#[derive(Debug)]
pub struct RateWindow {
    stamps: VecDeque<Instant>,
    per_minute: usize,
    per_hour: usize,
}

impl RateWindow {
    /// Caps below 1 are raised to 1 (a zero cap would block forever).
    pub fn new(per_minute: usize, per_hour: usize) -> Self {
        Self {
            stamps: VecDeque::new(),
            per_minute: per_minute.max(1),
            per_hour: per_hour.max(1),
        }
    }

    /// Drop entries that have aged out of the hourly window.
    pub fn prune(&mut self, now: Instant) {
        while let Some(&oldest) = self.stamps.front() {
            if now.duration_since(oldest) >= HOUR {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// How long to wait before a request may be issued at `now`, if at all.
    ///
    /// Call `prune` first.
    pub fn delay_needed(&self, now: Instant) -> Option<Duration> {
        if self.stamps.len() >= self.per_hour {
            let oldest = self.stamps[self.stamps.len() - self.per_hour];
            return Some(HOUR.saturating_sub(now.duration_since(oldest)));
        }

        let in_minute = self.count_within(now, MINUTE);
        if in_minute >= self.per_minute {
            let oldest = self.stamps[self.stamps.len() - self.per_minute];
            return Some(MINUTE.saturating_sub(now.duration_since(oldest)));
        }

        None
    }

    pub fn record(&mut self, at: Instant) {
        self.stamps.push_back(at);
    }

    /// Number of entries younger than `span` at `now`.
    pub fn count_within(&self, now: Instant, span: Duration) -> usize {
        self.stamps
            .iter()
            .rev()
            .take_while(|&&t| now.duration_since(t) < span)
            .count()
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }
}

/// Serialises the check-and-record step for concurrent callers.
///
/// No fairness: whichever task takes the lock first proceeds.
#[derive(Debug)]
pub struct RateLimiter {
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    pub fn new(per_minute: usize, per_hour: usize) -> Self {
        Self {
            window: Mutex::new(RateWindow::new(per_minute, per_hour)),
        }
    }

    /// Wait until the window has capacity, then record one request.
    ///
    /// The lock is held across the wait so only one caller performs the
    /// wait-and-append sequence at a time. Cancelling the future releases it.
    pub async fn acquire(&self) {
        let mut window = self.window.lock().await;
        loop {
            let now = Instant::now();
            window.prune(now);
            match window.delay_needed(now) {
                Some(delay) => {
                    tracing::warn!(
                        wait_ms = delay.as_millis() as u64,
                        recorded = window.len(),
                        "rate limit reached, waiting for window capacity"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => {
                    window.record(now);
                    return;
                }
            }
        }
    }

    /// Requests recorded within the trailing hour.
    pub async fn recorded(&self) -> usize {
        let mut window = self.window.lock().await;
        window.prune(Instant::now());
        window.len()
    }
}
