//! The pending-intent cache.
//!
//! When a customer starts a checkout we mint an external reference, hand it to the gateway, and park the basket
//! here until the payment settles. Entries are bounded by a TTL so abandoned checkouts do not accumulate
//! forever; the expiry worker in the server sweeps the cache periodically via [`PendingIntentCache::evict_expired`].
//!
//! The cache also hands out per-reference async locks so that two racing confirmations of the same reference
//! (duplicate webhook deliveries, or a webhook racing the manual fallback endpoint) are serialized.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Duration, Utc};
use log::*;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::db_types::{ExternalRef, PendingIntent};

/// Time source for the cache. Injected so expiry behavior can be tested without sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The wall clock. Production code always uses this.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct CacheEntry {
    intent: PendingIntent,
    stored_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PendingIntentCache {
    entries: Arc<Mutex<HashMap<ExternalRef, CacheEntry>>>,
    locks: Arc<Mutex<HashMap<ExternalRef, Arc<AsyncMutex<()>>>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl PendingIntentCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())), locks: Arc::new(Mutex::new(HashMap::new())), ttl, clock }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores an intent under its external reference. If an intent with the same reference is already cached, it
    /// is replaced and its TTL starts over.
    pub fn put(&self, intent: PendingIntent) {
        let now = self.clock.now();
        let external_ref = intent.external_ref.clone();
        let mut entries = lock_poison_safe(&self.entries);
        if entries.insert(external_ref.clone(), CacheEntry { intent, stored_at: now }).is_some() {
            debug!("🕰️ Replaced pending intent for reference {external_ref}");
        }
    }

    /// Fetches the intent stored under `external_ref`, if one exists and has not expired. An expired entry is
    /// removed on the spot and treated as absent.
    pub fn get(&self, external_ref: &ExternalRef) -> Option<PendingIntent> {
        let now = self.clock.now();
        let mut entries = lock_poison_safe(&self.entries);
        let expired = matches!(entries.get(external_ref), Some(entry) if now - entry.stored_at >= self.ttl);
        if expired {
            entries.remove(external_ref);
            debug!("🕰️ Pending intent for reference {external_ref} had expired and was dropped on access");
            return None;
        }
        entries.get(external_ref).map(|entry| entry.intent.clone())
    }

    /// Removes and returns the intent stored under `external_ref`.
    pub fn remove(&self, external_ref: &ExternalRef) -> Option<PendingIntent> {
        lock_poison_safe(&self.entries).remove(external_ref).map(|entry| entry.intent)
    }

    pub fn len(&self) -> usize {
        lock_poison_safe(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock_poison_safe(&self.entries).is_empty()
    }

    /// Acquires the confirmation lock for `external_ref`. Everything between checking the cache and evicting the
    /// entry must happen under this lock, so that duplicate notifications for one reference run one at a time.
    pub async fn lock_ref(&self, external_ref: &ExternalRef) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = lock_poison_safe(&self.locks);
            Arc::clone(locks.entry(external_ref.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))))
        };
        lock.lock_owned().await
    }

    /// Removes every entry older than the TTL and returns the evicted references. Also prunes confirmation locks
    /// that no longer guard anything.
    pub fn evict_expired(&self) -> Vec<ExternalRef> {
        let now = self.clock.now();
        let mut evicted = Vec::new();
        {
            let mut entries = lock_poison_safe(&self.entries);
            entries.retain(|external_ref, entry| {
                let keep = now - entry.stored_at < self.ttl;
                if !keep {
                    evicted.push(external_ref.clone());
                }
                keep
            });
        }
        let entries = lock_poison_safe(&self.entries);
        let mut locks = lock_poison_safe(&self.locks);
        locks.retain(|external_ref, lock| entries.contains_key(external_ref) || Arc::strong_count(lock) > 1);
        evicted
    }
}

// A poisoned mutex only means another thread panicked mid-operation; the map itself is always in a consistent
// state, so recover the guard rather than propagating the panic.
fn lock_poison_safe<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, Duration, Utc};

    use super::{Clock, PendingIntentCache};
    use crate::db_types::{ExternalRef, LineItem, PendingIntent};

    #[derive(Clone)]
    struct ManualClock {
        now: Arc<Mutex<DateTime<Utc>>>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self { now: Arc::new(Mutex::new(Utc::now())) }
        }

        fn advance(&self, by: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    fn intent(reference: &str) -> PendingIntent {
        PendingIntent::new(ExternalRef::from(reference), 1, vec![LineItem::new("item-1", 2)])
    }

    #[test]
    fn put_get_remove() {
        let cache = PendingIntentCache::new(Duration::hours(24));
        cache.put(intent("sps-a"));
        assert_eq!(cache.len(), 1);
        let fetched = cache.get(&ExternalRef::from("sps-a")).unwrap();
        assert_eq!(fetched.customer_id, 1);
        assert!(cache.remove(&ExternalRef::from("sps-a")).is_some());
        assert!(cache.get(&ExternalRef::from("sps-a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn replacing_an_intent_restarts_its_ttl() {
        let clock = ManualClock::new();
        let cache = PendingIntentCache::with_clock(Duration::hours(1), Arc::new(clock.clone()));
        cache.put(intent("sps-a"));
        clock.advance(Duration::minutes(50));
        cache.put(intent("sps-a"));
        clock.advance(Duration::minutes(50));
        // 100 minutes after first put, but only 50 after the replacement
        assert!(cache.get(&ExternalRef::from("sps-a")).is_some());
    }

    #[test]
    fn expired_entries_are_invisible() {
        let clock = ManualClock::new();
        let cache = PendingIntentCache::with_clock(Duration::hours(1), Arc::new(clock.clone()));
        cache.put(intent("sps-a"));
        clock.advance(Duration::minutes(59));
        assert!(cache.get(&ExternalRef::from("sps-a")).is_some());
        clock.advance(Duration::minutes(1));
        assert!(cache.get(&ExternalRef::from("sps-a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn evict_expired_returns_the_evicted_references() {
        let clock = ManualClock::new();
        let cache = PendingIntentCache::with_clock(Duration::hours(1), Arc::new(clock.clone()));
        cache.put(intent("sps-old"));
        clock.advance(Duration::minutes(45));
        cache.put(intent("sps-young"));
        clock.advance(Duration::minutes(30));
        let evicted = cache.evict_expired();
        assert_eq!(evicted, vec![ExternalRef::from("sps-old")]);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&ExternalRef::from("sps-young")).is_some());
    }

    #[tokio::test]
    async fn reference_locks_serialize_access() {
        let cache = PendingIntentCache::new(Duration::hours(1));
        let reference = ExternalRef::from("sps-a");
        let guard = cache.lock_ref(&reference).await;
        let cache2 = cache.clone();
        let reference2 = reference.clone();
        let contender = tokio::spawn(async move {
            let _guard = cache2.lock_ref(&reference2).await;
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!contender.is_finished());
        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn locks_for_distinct_references_are_independent() {
        let cache = PendingIntentCache::new(Duration::hours(1));
        let _a = cache.lock_ref(&ExternalRef::from("sps-a")).await;
        // would deadlock if the lock were global
        let _b = cache.lock_ref(&ExternalRef::from("sps-b")).await;
    }
}
