use prometheus::Gauge;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::metrics::{EVICTED_CLIENTS, TRACKED_CLIENTS};

// Per-client bucket: 5 tokens/s, burst of 10
pub const REFILL_PER_SECOND: f64 = 5.0;
pub const BURST: f64 = 10.0;
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);
// idle longer than this -> dropped on the next sweep
pub const STALE_AFTER: Duration = Duration::from_secs(10 * 60);

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

// Token bucket with continuous refill, own lock so handles outlive the registry lock
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    // starts full
    pub fn new(rate: f64, capacity: f64, now: Instant) -> Self {
        Self {
            rate,
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: now,
            }),
        }
    }

    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    // never waits; a denial consumes nothing
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        if now > state.last_refill {
            state.last_refill = now;
        }

        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    fn available_at(&self, now: Instant) -> f64 {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        (state.tokens + elapsed * self.rate).min(self.capacity)
    }
}

pub type LimiterHandle = Arc<TokenBucket>;

// Rate limit entry - one bucket per client identifier
pub struct LimiterEntry {
    pub limiter: LimiterHandle,
    pub last_seen: Instant,
}

// Client identifier -> limiter, one coarse lock for lookups, inserts and sweeps
pub struct RateLimitRegistry {
    entries: Mutex<HashMap<String, LimiterEntry>>,
    tracked: Gauge, // adjusted by deltas, so several registries can share it
}

impl Default for RateLimitRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitRegistry {
    pub fn new() -> Self {
        Self::with_gauge(TRACKED_CLIENTS.clone())
    }

    pub fn with_gauge(tracked: Gauge) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            tracked,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, LimiterEntry>> {
        // a panic elsewhere never leaves an entry half-written
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn acquire(&self, client_id: &str) -> LimiterHandle {
        self.acquire_at(client_id, Instant::now())
    }

    // creates on first sight, refreshes last_seen on every call, never evicts
    pub fn acquire_at(&self, client_id: &str, now: Instant) -> LimiterHandle {
        let mut entries = self.lock();

        if let Some(entry) = entries.get_mut(client_id) {
            entry.last_seen = now;
            return Arc::clone(&entry.limiter);
        }

        let limiter = Arc::new(TokenBucket::new(REFILL_PER_SECOND, BURST, now));
        entries.insert(
            client_id.to_string(),
            LimiterEntry {
                limiter: Arc::clone(&limiter),
                last_seen: now,
            },
        );
        self.tracked.inc();
        debug!(client = %client_id, tracked = entries.len(), "created limiter");

        limiter
    }

    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    // lock held for the whole pass; returns how many were removed
    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();

        entries.retain(|_, entry| now.saturating_duration_since(entry.last_seen) <= STALE_AFTER);

        let removed = before - entries.len();
        self.tracked.sub(removed as f64);
        EVICTED_CLIENTS.inc_by(removed as f64);
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.lock().contains_key(client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn fresh_bucket_allows_burst_then_refills() {
        let start = Instant::now();
        let bucket = TokenBucket::new(REFILL_PER_SECOND, BURST, start);

        for i in 0..10 {
            assert!(bucket.try_acquire_at(start), "request {} should pass", i + 1);
        }
        assert!(!bucket.try_acquire_at(start), "11th request should be denied");

        let later = start + Duration::from_secs(1);
        let admitted = (0..10).filter(|_| bucket.try_acquire_at(later)).count();
        assert!(admitted >= 5, "only {} admitted after one second", admitted);
        assert_eq!(admitted, 5);
    }

    #[test]
    fn denial_consumes_nothing() {
        let start = Instant::now();
        let bucket = TokenBucket::new(REFILL_PER_SECOND, BURST, start);
        for _ in 0..10 {
            bucket.try_acquire_at(start);
        }
        for _ in 0..50 {
            assert!(!bucket.try_acquire_at(start));
        }
        // 200ms refills exactly one token regardless of the denials above
        let later = start + Duration::from_millis(200);
        assert!(bucket.try_acquire_at(later));
        assert!(!bucket.try_acquire_at(later));
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let start = Instant::now();
        let bucket = TokenBucket::new(REFILL_PER_SECOND, BURST, start);
        let much_later = start + Duration::from_secs(3600);
        assert_eq!(bucket.available_at(much_later), BURST);
        let admitted = (0..20).filter(|_| bucket.try_acquire_at(much_later)).count();
        assert_eq!(admitted, 10);
    }

    #[test]
    fn identifiers_do_not_share_buckets() {
        let registry = RateLimitRegistry::new();
        let now = Instant::now();

        let a = registry.acquire_at("a", now);
        while a.try_acquire_at(now) {}
        assert!(!registry.acquire_at("a", now).try_acquire_at(now));

        let b = registry.acquire_at("b", now);
        let admitted = (0..10).filter(|_| b.try_acquire_at(now)).count();
        assert_eq!(admitted, 10);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn repeated_acquire_returns_same_limiter() {
        let registry = RateLimitRegistry::new();
        let first = registry.acquire("client");
        let second = registry.acquire("client");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn concurrent_first_acquire_creates_one_entry() {
        let registry = Arc::new(RateLimitRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.acquire("203.0.113.7"))
            })
            .collect();
        let limiters: Vec<LimiterHandle> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(registry.len(), 1);
        for limiter in &limiters[1..] {
            assert!(Arc::ptr_eq(&limiters[0], limiter));
        }
    }

    #[test]
    fn concurrent_consumers_never_exceed_burst() {
        let registry = Arc::new(RateLimitRegistry::new());
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..5)
                        .filter(|_| registry.acquire_at("shared", now).try_acquire_at(now))
                        .count()
                })
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 10);
    }

    #[test]
    fn sweep_removes_only_stale_entries() {
        let registry = RateLimitRegistry::new();
        let start = Instant::now();

        registry.acquire_at("idle", start);
        registry.acquire_at("busy", start);
        registry.acquire_at("busy", start + Duration::from_secs(9 * 60));

        let removed = registry.sweep_at(start + STALE_AFTER + Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert!(!registry.contains("idle"));
        assert!(registry.contains("busy"));
    }

    #[test]
    fn entry_exactly_at_threshold_survives() {
        let registry = RateLimitRegistry::new();
        let start = Instant::now();
        registry.acquire_at("edge", start);

        assert_eq!(registry.sweep_at(start + STALE_AFTER), 0);
        assert!(registry.contains("edge"));
    }

    #[test]
    fn registries_sharing_a_gauge_keep_an_honest_total() {
        let gauge = Gauge::new("test_tracked_clients", "tracked clients").unwrap();
        let first = RateLimitRegistry::with_gauge(gauge.clone());
        let second = RateLimitRegistry::with_gauge(gauge.clone());
        let start = Instant::now();

        first.acquire_at("a", start);
        first.acquire_at("b", start);
        first.acquire_at("a", start);
        second.acquire_at("c", start + STALE_AFTER);
        assert_eq!(gauge.get(), 3.0);

        // only the first registry's entries are stale
        assert_eq!(first.sweep_at(start + STALE_AFTER + Duration::from_secs(1)), 2);
        assert_eq!(gauge.get(), 1.0);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn evicted_client_starts_with_fresh_bucket() {
        let registry = RateLimitRegistry::new();
        let start = Instant::now();

        let old = registry.acquire_at("returning", start);
        while old.try_acquire_at(start) {}

        let later = start + STALE_AFTER + Duration::from_secs(1);
        registry.sweep_at(later);
        assert!(registry.is_empty());

        let fresh = registry.acquire_at("returning", later);
        assert!(!Arc::ptr_eq(&old, &fresh));
        assert_eq!(fresh.available_at(later), BURST);
    }
}
