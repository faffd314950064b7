//! Parsed-document cache with idle expiry
//!
//! Keeps parsed documents in memory so that consecutive page requests for the
//! same handle do not re-fetch and re-parse the PDF.
//!
//! # Thread Safety
//!
//! The entry map sits behind a `parking_lot::Mutex` that is never held across
//! an `.await`. Each entry owns a `tokio::sync::OnceCell`, so concurrent
//! misses for one handle all await a single load instead of racing parses.
//! Rendering happens after the caller has its `Arc` and takes no lock here.
//!
//! # Eviction
//!
//! - Idle expiry: a background sweep removes entries untouched for longer
//!   than the TTL. Entries whose load is still in flight are never swept.
//! - Capacity: the map is an LRU bounded by `max_entries`.

use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};
use std::time::Duration;

use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::{watch, OnceCell};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::storage::DocumentHandle;

use super::error::DocumentResult;
use super::traits::{DocumentLoader, DocumentModel};

type Slot = Arc<OnceCell<Arc<dyn DocumentModel>>>;

/// Cache configuration options
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Idle time after which an entry is evicted
    pub ttl: Duration,
    /// How often the background sweep runs
    pub sweep_interval: Duration,
    /// Maximum number of parsed documents held at once
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(5 * 60),
            sweep_interval: Duration::from_secs(60),
            max_entries: 64,
        }
    }
}

struct CacheEntry {
    slot: Slot,
    last_access: Instant,
}

struct Sweeper {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently in the map, loaded or loading
    pub entries: usize,
    /// Entries whose document has finished loading
    pub loaded: usize,
    /// Capacity bound
    pub capacity: usize,
}

/// Shared cache of parsed documents keyed by handle
pub struct CacheService {
    loader: Arc<dyn DocumentLoader>,
    entries: Mutex<LruCache<DocumentHandle, CacheEntry>>,
    config: CacheConfig,
    sweeper: Mutex<Option<Sweeper>>,
}

impl CacheService {
    /// Create a cache; call [`CacheService::start_sweeper`] to enable idle expiry
    pub fn new(loader: Arc<dyn DocumentLoader>, config: CacheConfig) -> Arc<Self> {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);

        Arc::new(Self {
            loader,
            entries: Mutex::new(LruCache::new(capacity)),
            config,
            sweeper: Mutex::new(None),
        })
    }

    /// Return the parsed document for `handle`, loading it on a miss
    ///
    /// A hit refreshes the entry's access time. Concurrent misses for the
    /// same handle share one load. A failed load leaves nothing behind, so
    /// the next request tries again.
    pub async fn get_or_load(&self, handle: &DocumentHandle) -> DocumentResult<Arc<dyn DocumentModel>> {
        let slot = {
            let mut entries = self.entries.lock();
            let now = Instant::now();
            match entries.get_mut(handle) {
                Some(entry) => {
                    entry.last_access = now;
                    entry.slot.clone()
                }
                None => {
                    let slot: Slot = Arc::new(OnceCell::new());
                    entries.put(
                        handle.clone(),
                        CacheEntry {
                            slot: slot.clone(),
                            last_access: now,
                        },
                    );
                    slot
                }
            }
        };

        if let Some(doc) = slot.get() {
            tracing::debug!("Document cache hit: {}", handle);
            return Ok(doc.clone());
        }

        let result = slot
            .get_or_try_init(|| async {
                tracing::debug!("Document cache miss: {}", handle);
                self.loader.load(handle).await
            })
            .await
            .map(Arc::clone);

        match result {
            Ok(doc) => {
                self.touch_if_current(handle, &slot);
                Ok(doc)
            }
            Err(e) => {
                self.discard_if_unloaded(handle, &slot);
                Err(e)
            }
        }
    }

    fn touch_if_current(&self, handle: &DocumentHandle, slot: &Slot) {
        let mut entries = self.entries.lock();
        if let Some(entry) = entries.peek_mut(handle) {
            if Arc::ptr_eq(&entry.slot, slot) {
                entry.last_access = Instant::now();
            }
        }
    }

    fn discard_if_unloaded(&self, handle: &DocumentHandle, slot: &Slot) {
        let mut entries = self.entries.lock();
        let stale = entries
            .peek(handle)
            .map(|entry| Arc::ptr_eq(&entry.slot, slot) && !entry.slot.initialized())
            .unwrap_or(false);
        if stale {
            entries.pop(handle);
        }
    }

    /// Remove every loaded entry idle for longer than the TTL
    ///
    /// Returns the number of evicted entries.
    pub fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let now = Instant::now();
        let ttl = self.config.ttl;

        // LruCache has no retain, so collect keys and pop
        let expired: Vec<DocumentHandle> = entries
            .iter()
            .filter(|(_, entry)| {
                entry.slot.initialized() && now.saturating_duration_since(entry.last_access) > ttl
            })
            .map(|(handle, _)| handle.clone())
            .collect();

        for handle in &expired {
            entries.pop(handle);
        }
        expired.len()
    }

    /// Start the background sweep task
    ///
    /// Calling this while a sweeper is already running is a no-op.
    pub fn start_sweeper(self: &Arc<Self>) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return;
        }

        let (stop, mut stopped) = watch::channel(false);
        let cache: Weak<Self> = Arc::downgrade(self);
        let period = self.config.sweep_interval;

        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        let evicted = cache.sweep_expired();
                        if evicted > 0 {
                            tracing::debug!("Cache sweep evicted {} idle documents", evicted);
                        }
                    }
                    _ = stopped.changed() => break,
                }
            }
        });

        tracing::debug!("Cache sweeper started (every {:?})", period);
        *sweeper = Some(Sweeper { stop, task });
    }

    /// Stop the background sweep and wait for it to finish
    pub async fn shutdown(&self) {
        let sweeper = self.sweeper.lock().take();
        if let Some(sweeper) = sweeper {
            let _ = sweeper.stop.send(true);
            if let Err(e) = sweeper.task.await {
                tracing::warn!("Cache sweeper ended abnormally: {}", e);
            }
            tracing::debug!("Cache sweeper stopped");
        }
    }

    /// Whether the background sweep is running
    pub fn sweeper_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Check if a handle has an entry (loaded or loading)
    pub fn contains(&self, handle: &DocumentHandle) -> bool {
        self.entries.lock().contains(handle)
    }

    /// Drop a handle's entry
    pub fn remove(&self, handle: &DocumentHandle) -> bool {
        self.entries.lock().pop(handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entries: entries.len(),
            loaded: entries.iter().filter(|(_, e)| e.slot.initialized()).count(),
            capacity: entries.cap().get(),
        }
    }
}
