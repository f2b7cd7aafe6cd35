//! Per-client request rate limiting for the IPC dispatch path.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::ClientId;

/// Token bucket per client: each request spends a token, and a full refill
/// lands once the interval has elapsed since the last one.
#[derive(Debug)]
pub struct RateLimiter {
    capacity: u32,
    interval: Duration,
    buckets: HashMap<ClientId, Bucket>,
}

#[derive(Debug)]
struct Bucket {
    tokens: u32,
    refilled_at: Instant,
}

impl RateLimiter {
    /// `capacity` requests allowed per `interval`, tracked per client.
    pub fn new(capacity: u32, interval: Duration) -> Self {
        Self {
            capacity,
            interval,
            buckets: HashMap::new(),
        }
    }

    /// Spend a token for `client_id`. Returns false when the client has
    /// exhausted its allowance for the current interval.
    pub fn check(&mut self, client_id: ClientId) -> bool {
        self.check_at(client_id, Instant::now())
    }

    fn check_at(&mut self, client_id: ClientId, now: Instant) -> bool {
        let capacity = self.capacity;
        let bucket = self.buckets.entry(client_id).or_insert(Bucket {
            tokens: capacity,
            refilled_at: now,
        });

        if now.duration_since(bucket.refilled_at) >= self.interval {
            bucket.tokens = capacity;
            bucket.refilled_at = now;
        }

        if bucket.tokens == 0 {
            return false;
        }
        bucket.tokens -= 1;
        true
    }

    /// Drop the bucket for a disconnected client.
    pub fn remove_client(&mut self, client_id: ClientId) {
        self.buckets.remove(&client_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowance_is_exhausted_then_denied() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));
        let client = ClientId::new();
        let t0 = Instant::now();

        assert!(limiter.check_at(client, t0));
        assert!(limiter.check_at(client, t0));
        assert!(limiter.check_at(client, t0));
        assert!(!limiter.check_at(client, t0));
    }

    #[test]
    fn allowance_refills_after_interval() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
        let client = ClientId::new();
        let t0 = Instant::now();

        assert!(limiter.check_at(client, t0));
        assert!(limiter.check_at(client, t0));
        assert!(!limiter.check_at(client, t0));

        // Partway through the interval nothing comes back
        assert!(!limiter.check_at(client, t0 + Duration::from_millis(500)));

        // A full interval restores the whole allowance
        let t1 = t0 + Duration::from_secs(1);
        assert!(limiter.check_at(client, t1));
        assert!(limiter.check_at(client, t1));
        assert!(!limiter.check_at(client, t1));
    }

    #[test]
    fn clients_are_limited_independently() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(1));
        let noisy = ClientId::new();
        let quiet = ClientId::new();
        let t0 = Instant::now();

        assert!(limiter.check_at(noisy, t0));
        assert!(!limiter.check_at(noisy, t0));

        assert!(limiter.check_at(quiet, t0));
    }

    #[test]
    fn removed_client_starts_fresh_on_reconnect() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(1));
        let client = ClientId::new();
        let t0 = Instant::now();

        assert!(limiter.check_at(client, t0));
        assert!(!limiter.check_at(client, t0));

        limiter.remove_client(client);
        assert!(limiter.check_at(client, t0));
    }
}
