//! Cached rule snapshots with TTL refresh and explicit invalidation.
//!
//! Reload semantics, fixed once: the first-ever load for a dimension blocks
//! concurrent callers on a single in-flight load. Once a snapshot exists,
//! refreshes are stale-while-revalidate — the caller that observes expiry
//! performs the reload while every other reader keeps receiving the
//! last-good snapshot, and a failed refresh keeps serving stale with a
//! logged warning. Staleness is bounded by the configured TTL plus store
//! recovery time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::RuleLoadError;
use crate::rules::store::RuleStore;
use crate::rules::{Dimension, RuleSet};

#[derive(Default)]
struct DimensionCache {
    current: RwLock<Option<Arc<RuleSet>>>,
    /// Serializes loads; concurrent triggers coalesce on this.
    reload: Mutex<()>,
    /// Set by `invalidate`; forces the next read to reload regardless of TTL.
    dirty: AtomicBool,
}

/// Owns the active rule snapshots for both dimensions.
///
/// Injected into the engine; readers never block each other, only
/// transiently on a first load in progress.
pub struct RuleRepository {
    store: Arc<dyn RuleStore>,
    ttl: Duration,
    parts: DimensionCache,
    labor: DimensionCache,
}

impl RuleRepository {
    pub fn new(store: Arc<dyn RuleStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            parts: DimensionCache::default(),
            labor: DimensionCache::default(),
        }
    }

    fn cache(&self, dimension: Dimension) -> &DimensionCache {
        match dimension {
            Dimension::Parts => &self.parts,
            Dimension::Labor => &self.labor,
        }
    }

    fn fresh_snapshot(&self, cache: &DimensionCache) -> Option<Arc<RuleSet>> {
        if cache.dirty.load(Ordering::Acquire) {
            return None;
        }
        let guard = cache.current.read().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|set| !set.is_expired(self.ttl))
            .map(Arc::clone)
    }

    fn stale_snapshot(cache: &DimensionCache) -> Option<Arc<RuleSet>> {
        cache
            .current
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(Arc::clone)
    }

    /// Return the current snapshot for a dimension, loading or refreshing it
    /// as needed.
    ///
    /// Fails only when the store is unreachable and no snapshot has ever
    /// been published for the dimension.
    pub fn get_ruleset(&self, dimension: Dimension) -> Result<Arc<RuleSet>, RuleLoadError> {
        let cache = self.cache(dimension);

        if let Some(set) = self.fresh_snapshot(cache) {
            return Ok(set);
        }

        // Slow path: one load at a time per dimension. While a refresh is
        // in flight, other callers keep the last-good snapshot; only a
        // first-ever load blocks them.
        let _guard = match cache.reload.try_lock() {
            Ok(guard) => guard,
            Err(std::sync::TryLockError::WouldBlock) => {
                if let Some(stale) = Self::stale_snapshot(cache) {
                    return Ok(stale);
                }
                cache.reload.lock().unwrap_or_else(|e| e.into_inner())
            }
            Err(std::sync::TryLockError::Poisoned(e)) => e.into_inner(),
        };

        // Someone else may have finished the load while we waited.
        if let Some(set) = self.fresh_snapshot(cache) {
            return Ok(set);
        }

        match self.store.load_rules(dimension) {
            Ok(input) => {
                let set = Arc::new(RuleSet::build(dimension, input));
                log::debug!(
                    "loaded {dimension} rules: {} categories, {} keywords",
                    set.categories().len(),
                    set.keywords().len()
                );
                *cache.current.write().unwrap_or_else(|e| e.into_inner()) =
                    Some(Arc::clone(&set));
                cache.dirty.store(false, Ordering::Release);
                Ok(set)
            }
            Err(source) => match Self::stale_snapshot(cache) {
                Some(stale) => {
                    log::warn!(
                        "refresh of {dimension} rules failed, serving snapshot loaded {:.0}s ago: {source}",
                        stale.loaded_at().elapsed().as_secs_f64()
                    );
                    Ok(stale)
                }
                None => Err(RuleLoadError { dimension, source }),
            },
        }
    }

    /// Force the next `get_ruleset` for the given dimension (or all
    /// dimensions) to reload regardless of TTL.
    ///
    /// Call after any administrative create/update/deactivate of a category
    /// or keyword.
    pub fn invalidate(&self, dimension: Option<Dimension>) {
        match dimension {
            Some(d) => self.cache(d).dirty.store(true, Ordering::Release),
            None => {
                for d in Dimension::ALL {
                    self.cache(d).dirty.store(true, Ordering::Release);
                }
            }
        }
    }
}
