use dashmap::DashMap;
use hostq_domain::{LookupAnswer, LookupMethod};
use parking_lot::RwLock;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::cancel::CancelToken;

/// Clamp applied whenever the cache TTL is configured.
///
/// Replaces a hard-wired ceiling with explicit bounds so callers are never
/// silently pinned to a surprising TTL.
#[derive(Debug, Clone, Copy)]
pub struct TtlBounds {
    pub floor: Duration,
    pub ceiling: Duration,
}

impl TtlBounds {
    pub fn new(floor: Duration, ceiling: Duration) -> Self {
        Self { floor, ceiling }
    }

    fn clamp(&self, ttl: Duration) -> Duration {
        ttl.max(self.floor).min(self.ceiling)
    }
}

impl Default for TtlBounds {
    fn default() -> Self {
        Self {
            floor: Duration::from_secs(1),
            ceiling: Duration::from_secs(86_400),
        }
    }
}

/// Point-in-time counters for cache effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

#[derive(Debug, Default)]
struct CacheCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: LookupMethod,
    argument: String,
}

impl CacheKey {
    fn new(method: LookupMethod, argument: &str) -> Self {
        Self {
            method,
            argument: argument.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedAnswer {
    answer: LookupAnswer,
    inserted_at: Instant,
}

/// Time-bounded answer store shared by every worker in a pool.
///
/// Entries are keyed by `(method, argument)` so answers of one lookup shape
/// never satisfy a request of another. An entry older than the TTL in effect
/// at read time is treated as absent and removed on read; the background
/// pruner bounds memory growth independent of read traffic. TTL reads and
/// reconfiguration go through one lock so a scan never mixes old and new
/// TTL values.
pub struct HostCache {
    entries: DashMap<CacheKey, CachedAnswer, FxBuildHasher>,
    ttl: RwLock<Duration>,
    bounds: TtlBounds,
    counters: CacheCounters,
}

impl HostCache {
    pub fn new(ttl: Duration, bounds: TtlBounds) -> Self {
        let clamped = bounds.clamp(ttl);
        if clamped != ttl {
            warn!(
                requested_secs = ttl.as_secs(),
                clamped_secs = clamped.as_secs(),
                "Initial cache TTL outside bounds, clamping"
            );
        }
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            ttl: RwLock::new(clamped),
            bounds,
            counters: CacheCounters::default(),
        }
    }

    /// Fresh answer for `(method, argument)`, or `None`. Expired entries are
    /// removed as they are observed.
    pub fn lookup(&self, method: LookupMethod, argument: &str) -> Option<LookupAnswer> {
        let ttl = self.ttl.read();
        let key = CacheKey::new(method, argument);

        if let Some(entry) = self.entries.get(&key) {
            if entry.inserted_at.elapsed() < *ttl {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.answer.clone());
            }
        }

        // Expired or absent. The predicate re-checks age so a concurrent
        // overwrite with a fresh timestamp survives.
        if self
            .entries
            .remove_if(&key, |_, entry| entry.inserted_at.elapsed() >= *ttl)
            .is_some()
        {
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store or overwrite an answer, stamped with the current time.
    pub fn insert(&self, method: LookupMethod, argument: &str, answer: LookupAnswer) {
        self.entries.insert(
            CacheKey::new(method, argument),
            CachedAnswer {
                answer,
                inserted_at: Instant::now(),
            },
        );
        self.counters.insertions.fetch_add(1, Ordering::Relaxed);
    }

    /// Reconfigure the TTL, clamped into the bounds. Takes effect atomically
    /// for subsequent reads and scans.
    pub fn set_ttl(&self, requested: Duration) {
        let clamped = self.bounds.clamp(requested);
        if clamped != requested {
            warn!(
                requested_secs = requested.as_secs(),
                clamped_secs = clamped.as_secs(),
                "Requested cache TTL outside bounds, clamping"
            );
        }
        *self.ttl.write() = clamped;
    }

    pub fn ttl(&self) -> Duration {
        *self.ttl.read()
    }

    /// Drop every entry older than the current TTL. Returns how many were
    /// evicted.
    pub fn prune_expired(&self) -> usize {
        let ttl = self.ttl.read();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.inserted_at.elapsed() < *ttl);
        let evicted = before.saturating_sub(self.entries.len());
        self.counters
            .evictions
            .fetch_add(evicted as u64, Ordering::Relaxed);
        evicted
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            insertions: self.counters.insertions.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
        }
    }
}

/// Background pruning loop on a dedicated thread.
///
/// Wakes every `tick`, scans at most once per half-TTL window, and exits
/// once the stop token is observed. The owning pool joins the handle on
/// shutdown.
pub(crate) fn spawn_pruner(
    cache: Arc<HostCache>,
    stop: CancelToken,
    tick: Duration,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("hostq-cache".to_string())
        .spawn(move || {
            debug!("Cache pruner started");
            let mut last_prune: Option<Instant> = None;
            while !stop.is_cancelled() {
                thread::sleep(tick);
                let window = cache.ttl() / 2;
                if last_prune.map_or(true, |at| at.elapsed() > window) {
                    last_prune = Some(Instant::now());
                    let evicted = cache.prune_expired();
                    if evicted > 0 {
                        debug!(evicted, remaining = cache.len(), "Pruned expired cache entries");
                    }
                }
            }
            debug!("Cache pruner stopped");
        })
}
