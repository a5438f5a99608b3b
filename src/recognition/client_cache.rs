//! Time-bounded cache for a backend client handle.
//!
//! Backend clients are often expensive to build (credential exchange,
//! connection setup), so callers keep one around and rebuild it once it is
//! older than a fixed time-to-live. The cache is an ordinary value owned by
//! the caller; nothing here is process-global.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Holds at most one client and rebuilds it once `ttl` has passed.
pub struct ClientCache<C, K = SystemClock> {
    ttl: Duration,
    clock: K,
    slot: Mutex<Option<(Arc<C>, Instant)>>,
}

impl<C> ClientCache<C, SystemClock> {
    /// Create an empty cache using the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, SystemClock)
    }
}

impl<C, K: Clock> ClientCache<C, K> {
    /// Create an empty cache reading time from `clock`.
    pub fn with_clock(ttl: Duration, clock: K) -> Self {
        Self {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Time-to-live of a cached client.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached client, building a new one if none is cached or
    /// the cached one has expired.
    ///
    /// A failed build leaves the cache empty and returns the error.
    pub fn get_or_try_init<E, F>(&self, build: F) -> Result<Arc<C>, E>
    where
        F: FnOnce() -> Result<C, E>,
    {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();
        if let Some((client, created)) = slot.as_ref() {
            if now.saturating_duration_since(*created) < self.ttl {
                return Ok(Arc::clone(client));
            }
            log::debug!("Cached client expired after {:?}, rebuilding", self.ttl);
        }
        *slot = None;
        let client = Arc::new(build()?);
        *slot = Some((Arc::clone(&client), now));
        Ok(client)
    }

    /// Drop the cached client, if any.
    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Whether a client is currently cached, expired or not.
    pub fn is_populated(&self) -> bool {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Clock advanced by hand.
    struct ManualClock {
        start: Instant,
        offset: Mutex<Duration>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                start: Instant::now(),
                offset: Mutex::new(Duration::ZERO),
            }
        }

        fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for &ManualClock {
        fn now(&self) -> Instant {
            self.start + *self.offset.lock().unwrap()
        }
    }

    #[test]
    fn test_reuses_client_within_ttl() {
        let clock = ManualClock::new();
        let cache = ClientCache::with_clock(Duration::from_secs(60), &clock);
        let mut builds = 0;

        let a = cache
            .get_or_try_init(|| {
                builds += 1;
                Ok::<_, ()>(builds)
            })
            .unwrap();
        clock.advance(Duration::from_secs(30));
        let b = cache
            .get_or_try_init(|| {
                builds += 1;
                Ok::<_, ()>(builds)
            })
            .unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(builds, 1);
    }

    #[test]
    fn test_rebuilds_after_ttl() {
        let clock = ManualClock::new();
        let cache = ClientCache::with_clock(Duration::from_secs(60), &clock);

        let first = cache.get_or_try_init(|| Ok::<_, ()>("first")).unwrap();
        clock.advance(Duration::from_secs(61));
        let second = cache.get_or_try_init(|| Ok::<_, ()>("second")).unwrap();

        assert_eq!(*first, "first");
        assert_eq!(*second, "second");
    }

    #[test]
    fn test_failed_build_leaves_cache_empty() {
        let cache: ClientCache<u32> = ClientCache::new(Duration::from_secs(60));
        let err = cache.get_or_try_init(|| Err("no credentials"));
        assert_eq!(err, Err("no credentials"));
        assert!(!cache.is_populated());

        assert_eq!(*cache.get_or_try_init(|| Ok::<_, &str>(7)).unwrap(), 7);
        assert!(cache.is_populated());
    }

    #[test]
    fn test_invalidate_forces_rebuild() {
        let cache = ClientCache::new(Duration::from_secs(3600));
        cache.get_or_try_init(|| Ok::<_, ()>(1)).unwrap();
        cache.invalidate();
        assert_eq!(*cache.get_or_try_init(|| Ok::<_, ()>(2)).unwrap(), 2);
    }
}
