//! Rate limiting for outbound HTTP calls.
//!
//! Sliding-window limiter shared by every upstream client so a poll cycle
//! cannot trip public endpoint throttling (request count per window plus
//! a cap on requests in flight).

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Poll period while waiting for capacity.
const WAIT_STEP: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct LimiterState {
    /// Timestamps of recent requests.
    timestamps: VecDeque<Instant>,
    /// Requests currently awaiting a response.
    inflight: u32,
}

/// Sliding-window rate limiter with an in-flight cap.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum requests per window.
    max_requests: u32,
    /// Window length.
    window: Duration,
    /// Maximum concurrent requests.
    max_inflight: u32,
    state: Arc<Mutex<LimiterState>>,
}

/// Held for the duration of one request; frees the in-flight slot on drop.
#[derive(Debug)]
pub struct RatePermit {
    state: Arc<Mutex<LimiterState>>,
}

impl Drop for RatePermit {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.inflight = state.inflight.saturating_sub(1);
    }
}

impl RateLimiter {
    /// Create a new rate limiter.
    ///
    /// # Arguments
    /// * `max_requests` - Maximum requests per window
    /// * `window` - Window length
    /// * `max_inflight` - Maximum concurrent requests
    pub fn new(max_requests: u32, window: Duration, max_inflight: u32) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window,
            max_inflight: max_inflight.max(1),
            state: Arc::new(Mutex::new(LimiterState {
                timestamps: VecDeque::with_capacity(max_requests as usize),
                inflight: 0,
            })),
        }
    }

    /// Try to take a slot without waiting.
    pub fn try_acquire(&self) -> Option<RatePermit> {
        let mut state = self.state.lock();
        self.cleanup_old_timestamps(&mut state);

        if state.timestamps.len() >= self.max_requests as usize
            || state.inflight >= self.max_inflight
        {
            return None;
        }

        state.timestamps.push_back(Instant::now());
        state.inflight += 1;

        if state.timestamps.len() >= self.max_requests as usize {
            warn!(
                count = state.timestamps.len(),
                max = self.max_requests,
                "Approaching outbound rate limit"
            );
        }

        Some(RatePermit {
            state: self.state.clone(),
        })
    }

    /// Wait until a slot is available and take it.
    ///
    /// Cancel-safe: dropping the future before it resolves takes no slot.
    pub async fn acquire(&self) -> RatePermit {
        let mut waited = false;
        loop {
            if let Some(permit) = self.try_acquire() {
                return permit;
            }
            if !waited {
                debug!(
                    window_count = self.current_count(),
                    inflight = self.inflight_count(),
                    "Waiting for outbound capacity"
                );
                waited = true;
            }
            tokio::time::sleep(WAIT_STEP).await;
        }
    }

    /// Get current request count in window.
    pub fn current_count(&self) -> u32 {
        let mut state = self.state.lock();
        self.cleanup_old_timestamps(&mut state);
        state.timestamps.len() as u32
    }

    /// Get current in-flight count.
    pub fn inflight_count(&self) -> u32 {
        self.state.lock().inflight
    }

    fn cleanup_old_timestamps(&self, state: &mut LimiterState) {
        let Some(cutoff) = Instant::now().checked_sub(self.window) else {
            return;
        };
        while state.timestamps.front().is_some_and(|&t| t < cutoff) {
            state.timestamps.pop_front();
        }
    }
}

impl Default for RateLimiter {
    /// 10 requests per second, 4 in flight.
    fn default() -> Self {
        Self::new(10, Duration::from_secs(1), 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_basic() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60), 100);

        assert_eq!(limiter.current_count(), 0);

        let permits: Vec<_> = (0..5).filter_map(|_| limiter.try_acquire()).collect();
        assert_eq!(permits.len(), 5);
        assert_eq!(limiter.current_count(), 5);
        assert_eq!(limiter.inflight_count(), 5);

        drop(permits);
        assert_eq!(limiter.current_count(), 5);
        assert_eq!(limiter.inflight_count(), 0);
    }

    #[test]
    fn test_rate_limiter_at_limit() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60), 100);

        for _ in 0..5 {
            drop(limiter.try_acquire().unwrap());
        }

        assert!(limiter.try_acquire().is_none());
        assert_eq!(limiter.current_count(), 5);
    }

    #[test]
    fn test_inflight_released_on_drop() {
        let limiter = RateLimiter::new(100, Duration::from_secs(60), 2);

        let a = limiter.try_acquire().unwrap();
        let _b = limiter.try_acquire().unwrap();
        assert_eq!(limiter.inflight_count(), 2);
        assert!(limiter.try_acquire().is_none());

        drop(a);
        assert_eq!(limiter.inflight_count(), 1);
        assert!(limiter.try_acquire().is_some());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(100), 10);
        drop(limiter.acquire().await);

        let start = Instant::now();
        drop(limiter.acquire().await);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
