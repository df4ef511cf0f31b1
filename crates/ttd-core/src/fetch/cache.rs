//! Ephemeral link cache.
//!
//! Maps a short opaque token to a previously resolved media URL so the full
//! URL never has to travel through a size-constrained callback payload.
//! Entries die in one of two independent ways: a periodic sweep removes
//! everything older than the TTL, and a capacity guard evicts the single
//! oldest-inserted entry whenever an insert pushes the cache over its limit
//! (FIFO by insertion order, deliberately not LRU; `get` never touches an
//! entry's lifetime).

use std::collections::{HashMap, VecDeque};
use std::hash::{BuildHasher, Hasher, RandomState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Clone, Copy, Debug)]
pub struct LinkCacheConfig {
    /// Hard upper bound on stored entries.
    pub max_entries: usize,
    /// Maximum age an entry may reach before a sweep removes it.
    pub ttl: Duration,
    /// How often the background sweep runs. Independent of `ttl`.
    pub cleanup_interval: Duration,
}

impl Default for LinkCacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            ttl: Duration::from_secs(30 * 60),
            cleanup_interval: Duration::from_secs(5 * 60),
        }
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    created_at: Instant,
}

#[derive(Default)]
struct State {
    entries: HashMap<String, Entry>,
    /// Insertion order; kept consistent with `entries` on every mutation.
    order: VecDeque<String>,
}

struct Sweeper {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

struct Inner {
    cfg: LinkCacheConfig,
    state: Mutex<State>,
    sweeper: Mutex<Option<Sweeper>>,
    seq: AtomicU64,
}

/// Bounded, time-boxed token-to-URL store. Cheap to clone; all clones share
/// the same entries and the same sweeper task.
#[derive(Clone)]
pub struct LinkCache {
    inner: Arc<Inner>,
}

impl LinkCache {
    pub fn new(cfg: LinkCacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                state: Mutex::new(State::default()),
                sweeper: Mutex::new(None),
                seq: AtomicU64::new(0),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under a freshly issued token and return the token.
    ///
    /// Tokens are URL-safe base36: a millisecond timestamp prefix, a
    /// per-instance sequence number and a short random suffix. Unique per
    /// cache instance; no cryptographic guarantee intended.
    pub fn put(&self, value: impl Into<String>) -> String {
        let token = self.issue_token();
        self.insert(token.clone(), value.into());
        token
    }

    /// Store `value` under a caller-chosen token, for code paths that must
    /// agree on the same token. A live token keeps its original value; the
    /// call is a no-op if `token` is already bound.
    pub fn put_with_token(&self, token: &str, value: impl Into<String>) {
        self.insert(token.to_string(), value.into());
    }

    /// Pure lookup. Never extends an entry's lifetime and never checks the
    /// TTL itself; only the sweep removes expired entries.
    pub fn get(&self, token: &str) -> Option<String> {
        self.state().entries.get(token).map(|e| e.value.clone())
    }

    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, token: String, value: String) {
        let mut st = self.state();
        if st.entries.contains_key(&token) {
            debug!(token = %token, "link cache token already live, keeping existing value");
            return;
        }

        st.entries.insert(
            token.clone(),
            Entry {
                value,
                created_at: Instant::now(),
            },
        );
        st.order.push_back(token);

        // Capacity guard: at most one entry is added per call, so evicting a
        // single oldest-inserted entry is enough to restore the bound.
        if st.entries.len() > self.inner.cfg.max_entries {
            if let Some(oldest) = st.order.pop_front() {
                st.entries.remove(&oldest);
                debug!(token = %oldest, "link cache evicted oldest entry over capacity");
            }
        }
    }

    /// Remove every entry whose age exceeds the TTL. Returns how many were
    /// dropped. Called by the background sweeper; public for direct use in
    /// tests and shutdown paths.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.inner.cfg.ttl;

        let mut st = self.state();
        let before = st.entries.len();
        let State { entries, order } = &mut *st;
        entries.retain(|_, e| now.duration_since(e.created_at) <= ttl);
        order.retain(|t| entries.contains_key(t));
        before - entries.len()
    }

    /// Spawn the periodic sweep task if it is not already running. The task
    /// is owned by this cache and lives until [`LinkCache::shutdown`].
    pub fn start_sweeper(&self) {
        let mut guard = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let cancel_for_task = cancel.clone();
        let cache = self.clone();
        let interval = self.inner.cfg.cleanup_interval;

        let handle = tokio::spawn(async move {
            let mut tick = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so sweeps run on
            // interval boundaries only.
            tick.tick().await;
            loop {
                tokio::select! {
                    _ = cancel_for_task.cancelled() => break,
                    _ = tick.tick() => {
                        let removed = cache.sweep_expired();
                        if removed > 0 {
                            debug!(removed, remaining = cache.len(), "link cache sweep");
                        }
                    }
                }
            }
        });

        *guard = Some(Sweeper { cancel, handle });
    }

    /// Stop the sweep task. Safe to call multiple times; entries survive
    /// (the store itself is dropped with the last clone).
    pub fn shutdown(&self) {
        let sweeper = self
            .inner
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(s) = sweeper {
            s.cancel.cancel();
            s.handle.abort();
        }
    }

    fn issue_token(&self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}{}{}",
            base36(millis),
            base36(seq),
            random_suffix(seq, 4)
        )
    }
}

fn base36(mut v: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if v == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while v > 0 {
        buf.push(DIGITS[(v % 36) as usize]);
        v /= 36;
    }
    buf.reverse();
    String::from_utf8_lossy(&buf).into_owned()
}

fn random_suffix(salt: u64, len: usize) -> String {
    let mut hasher = RandomState::new().build_hasher();
    hasher.write_u64(salt);
    hasher.write_u128(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos(),
    );
    let mut out = base36(hasher.finish());
    out.truncate(len);
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn small_cache(max_entries: usize, ttl_ms: u64) -> LinkCache {
        LinkCache::new(LinkCacheConfig {
            max_entries,
            ttl: Duration::from_millis(ttl_ms),
            cleanup_interval: Duration::from_millis(ttl_ms),
        })
    }

    #[test]
    fn put_then_get_round_trips() {
        let cache = LinkCache::new(LinkCacheConfig::default());
        let token = cache.put("https://vt.tiktok.com/ZS2qsMU1W/");
        assert_eq!(
            cache.get(&token).as_deref(),
            Some("https://vt.tiktok.com/ZS2qsMU1W/")
        );
        assert_eq!(cache.get("no-such-token"), None);
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let cache = LinkCache::new(LinkCacheConfig::default());
        let mut seen = HashSet::new();
        for i in 0..50 {
            let token = cache.put(format!("value-{i}"));
            assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
            assert!(seen.insert(token), "token issued twice");
        }
    }

    #[test]
    fn overflow_evicts_single_oldest_inserted_entry() {
        // maxEntries=2: put a, b, c -> a evicted, b and c still resolve.
        let cache = small_cache(2, 1000);
        let ta = cache.put("a");
        let tb = cache.put("b");
        let tc = cache.put("c");

        assert_eq!(cache.get(&ta), None);
        assert_eq!(cache.get(&tb).as_deref(), Some("b"));
        assert_eq!(cache.get(&tc).as_deref(), Some("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn eviction_is_fifo_not_lru() {
        let cache = small_cache(2, 1000);
        let ta = cache.put("a");
        let tb = cache.put("b");

        // Reading `a` must not protect it from eviction.
        assert_eq!(cache.get(&ta).as_deref(), Some("a"));
        let tc = cache.put("c");

        assert_eq!(cache.get(&ta), None);
        assert_eq!(cache.get(&tb).as_deref(), Some("b"));
        assert_eq!(cache.get(&tc).as_deref(), Some("c"));
    }

    #[test]
    fn live_token_is_never_rebound() {
        let cache = small_cache(10, 1000);
        let token = cache.put("original");
        cache.put_with_token(&token, "imposter");
        assert_eq!(cache.get(&token).as_deref(), Some("original"));
    }

    #[test]
    fn put_with_token_allows_agreed_tokens() {
        let cache = small_cache(10, 1000);
        cache.put_with_token("agreed", "value");
        assert_eq!(cache.get("agreed").as_deref(), Some("value"));
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_removes_only_expired_entries() {
        let cache = small_cache(10, 1000);
        let old = cache.put("old");

        tokio::time::advance(Duration::from_millis(800)).await;
        let young = cache.put("young");

        tokio::time::advance(Duration::from_millis(300)).await;
        let removed = cache.sweep_expired();

        assert_eq!(removed, 1);
        assert_eq!(cache.get(&old), None);
        assert_eq!(cache.get(&young).as_deref(), Some("young"));
    }

    #[tokio::test(start_paused = true)]
    async fn get_does_not_extend_lifetime() {
        let cache = small_cache(10, 1000);
        let token = cache.put("v");

        tokio::time::advance(Duration::from_millis(900)).await;
        assert!(cache.get(&token).is_some());

        tokio::time::advance(Duration::from_millis(200)).await;
        cache.sweep_expired();
        assert_eq!(cache.get(&token), None);
    }

    #[tokio::test(start_paused = true)]
    async fn background_sweeper_expires_entries() {
        let cache = small_cache(10, 1000);
        cache.start_sweeper();
        let token = cache.put("v");

        // Past the TTL and past at least one cleanup tick.
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(cache.get(&token), None);
        cache.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_shutdown_is_idempotent() {
        let cache = small_cache(10, 1000);
        cache.start_sweeper();
        cache.shutdown();
        cache.shutdown();
    }
}
