use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Per-key sliding-window request limiter. Keys are caller IPs; state is
/// process-local, which is all an anonymous single-node service needs.
#[derive(Debug, Clone)]
pub struct RequestRateLimiter {
    hits: Arc<Mutex<HashMap<String, Vec<Instant>>>>,
    window: Duration,
    limit: usize,
}

impl RequestRateLimiter {
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            hits: Arc::new(Mutex::new(HashMap::new())),
            window,
            limit,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut guard = self.hits.lock();
        let hits = guard.entry(key.to_string()).or_default();

        hits.retain(|hit| now.duration_since(*hit) <= self.window);

        if hits.len() >= self.limit {
            return false;
        }

        hits.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_per_key() {
        let limiter = RequestRateLimiter::new(Duration::from_secs(60), 3);

        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
    }

    #[test]
    fn keys_are_limited_independently() {
        let limiter = RequestRateLimiter::new(Duration::from_secs(60), 1);

        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
    }

    #[test]
    fn hits_expire_with_the_window() {
        let limiter = RequestRateLimiter::new(Duration::from_millis(10), 1);

        assert!(limiter.allow("a"));
        std::thread::sleep(Duration::from_millis(25));
        assert!(limiter.allow("a"));
    }
}
