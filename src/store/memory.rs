//! In-process stores backed by `moka`.
//!
//! Both caches are bounded. The pending cache's TTL only reclaims memory;
//! the authoritative expiry check is done from `created_at` by the caller.
//! Sessions expire per entry at their own `expires_at`.
//!
//! `reclaim_expired` on the pending store runs moka's maintenance at most once
//! per interval, however many handshakes start.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use moka::future::Cache;
use moka::Expiry;

use super::{PendingHandshakeStore, SessionStore, StoreError};
use crate::auth::oauth::PendingHandshake;
use crate::auth::session::{Session, SessionId};
use crate::config::ShopDomain;

const PENDING_CAPACITY: u64 = 100_000;
const SESSION_CAPACITY: u64 = 100_000;
const MAINTENANCE_INTERVAL: Duration = Duration::from_secs(30);

/// Lets one caller through per interval.
struct Throttle {
    origin: Instant,
    interval_ms: u64,
    next_due_ms: AtomicU64,
}

impl Throttle {
    fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
            next_due_ms: AtomicU64::new(0),
        }
    }

    fn try_acquire(&self) -> bool {
        let now = u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX);
        let due = self.next_due_ms.load(Ordering::Acquire);
        if now < due {
            return false;
        }
        self.next_due_ms
            .compare_exchange(
                due,
                now.saturating_add(self.interval_ms),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

/// Pending handshakes held in memory.
#[derive(Clone)]
pub struct MemoryPendingStore {
    cache: Cache<String, PendingHandshake>,
    maintenance: Arc<Throttle>,
}

impl MemoryPendingStore {
    /// Creates a store whose entries are reclaimed after `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(PENDING_CAPACITY)
                .time_to_live(ttl)
                .build(),
            maintenance: Arc::new(Throttle::new(MAINTENANCE_INTERVAL)),
        }
    }

    /// Sets the minimum gap between two maintenance runs (default 30s).
    #[must_use]
    pub fn with_maintenance_interval(mut self, interval: Duration) -> Self {
        self.maintenance = Arc::new(Throttle::new(interval));
        self
    }

    /// Number of records currently held (approximate until pending tasks run).
    #[must_use]
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Returns `true` if no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PendingHandshakeStore for MemoryPendingStore {
    async fn insert(&self, pending: PendingHandshake) -> Result<(), StoreError> {
        self.cache
            .insert(pending.state.as_ref().to_string(), pending)
            .await;
        Ok(())
    }

    async fn take(&self, state: &str) -> Result<Option<PendingHandshake>, StoreError> {
        Ok(self.cache.remove(state).await)
    }

    async fn reclaim_expired(&self) {
        if self.maintenance.try_acquire() {
            self.cache.run_pending_tasks().await;
        }
    }
}

struct SessionExpiry;

impl Expiry<String, Session> for SessionExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        session: &Session,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(session.remaining_at(Utc::now()))
    }
}

/// Sessions held in memory.
#[derive(Clone)]
pub struct MemorySessionStore {
    cache: Cache<String, Session>,
}

impl MemorySessionStore {
    /// Creates an empty session store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(SESSION_CAPACITY)
                .expire_after(SessionExpiry)
                .build(),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) -> Result<(), StoreError> {
        self.cache
            .insert(session.id.as_str().to_string(), session)
            .await;
        Ok(())
    }

    async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.cache.get(id.as_str()).await)
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        self.cache.invalidate(id.as_str()).await;
        Ok(())
    }

    async fn delete_shop(&self, shop: &ShopDomain) -> Result<usize, StoreError> {
        let ids: Vec<String> = self
            .cache
            .iter()
            .filter(|(_, session)| session.shop == *shop)
            .map(|(id, _)| (*id).clone())
            .collect();

        for id in &ids {
            self.cache.invalidate(id).await;
        }
        Ok(ids.len())
    }
}
