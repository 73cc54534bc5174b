//! Process-wide admission control for upstream calls.
//!
//! A single shared window caps how many upstream requests are admitted per
//! 60-second period, across all concurrent QA calls in the process. When the
//! cap is reached, `admit()` suspends the caller until the window rolls
//! over — admission never fails and never returns an error.
//!
//! The clock is `tokio::time`, so tests run under a paused clock and assert
//! exact suspension behavior.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

const WINDOW: Duration = Duration::from_secs(60);

/// Shared admission window state. Reset exactly once per rollover.
#[derive(Debug)]
struct RateWindow {
    started_at: Instant,
    admitted: usize,
}

/// Process-wide rate limiter over a fixed 60-second window.
///
/// One instance is shared (via `Arc`) by every upstream call in the process.
/// Updates are serialized through an async mutex; suspended callers resume
/// in lock-acquisition order.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests_per_minute: usize,
    window: Mutex<RateWindow>,
}

impl RateLimiter {
    pub fn new(max_requests_per_minute: usize) -> Self {
        Self {
            max_requests_per_minute,
            window: Mutex::new(RateWindow {
                started_at: Instant::now(),
                admitted: 0,
            }),
        }
    }

    /// Admit one upstream call, suspending until the current window has room.
    ///
    /// If the window has already admitted `max_requests_per_minute` calls,
    /// the caller sleeps for the remainder of the window, then the window
    /// resets and the call is admitted as the first of the new window.
    pub async fn admit(&self) {
        loop {
            let mut window = self.window.lock().await;
            let now = Instant::now();

            if now.duration_since(window.started_at) >= WINDOW {
                window.started_at = now;
                window.admitted = 0;
            }

            if window.admitted < self.max_requests_per_minute {
                window.admitted += 1;
                return;
            }

            let wait = WINDOW - now.duration_since(window.started_at);
            drop(window);
            debug!(wait_ms = wait.as_millis() as u64, "rate window full, suspending");
            tokio::time::sleep(wait).await;
        }
    }

    /// Requests admitted in the current window (diagnostics only).
    pub async fn admitted_in_window(&self) -> usize {
        self.window.lock().await.admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn admits_up_to_cap_without_suspension() {
        let limiter = RateLimiter::new(5);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.admit().await;
        }

        // No time passed under the paused clock — nothing slept.
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(limiter.admitted_in_window().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn over_cap_call_waits_for_window_rollover() {
        let limiter = RateLimiter::new(3);
        let start = Instant::now();

        for _ in 0..3 {
            limiter.admit().await;
        }
        // Fourth call must suspend for the remainder of the window.
        limiter.admit().await;

        assert_eq!(start.elapsed(), WINDOW);
        // Admitted as the first call of the new window.
        assert_eq!(limiter.admitted_in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn window_rolls_over_after_sixty_seconds() {
        let limiter = RateLimiter::new(2);

        limiter.admit().await;
        limiter.admit().await;
        assert_eq!(limiter.admitted_in_window().await, 2);

        tokio::time::advance(WINDOW).await;

        limiter.admit().await;
        assert_eq!(limiter.admitted_in_window().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_admissions_never_exceed_cap() {
        let limiter = Arc::new(RateLimiter::new(4));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.admit().await;
                Instant::now()
            }));
        }

        let mut admitted_at = Vec::new();
        for handle in handles {
            admitted_at.push(handle.await.unwrap());
        }

        // Four calls went through immediately, four waited a full window.
        let immediate = admitted_at.iter().filter(|t| **t == start).count();
        let delayed = admitted_at.iter().filter(|t| **t == start + WINDOW).count();
        assert_eq!(immediate, 4);
        assert_eq!(delayed, 4);
    }
}
